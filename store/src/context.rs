//! The active-module stack.
//!
//! Entities and statements are attributed to the module on top of the stack.
//! [`Store::enter_module`] returns a guard that pops the stack back to its
//! previous depth when dropped, so an early return or `?` inside the scope
//! cannot leave a stale module active.
//!
//! ```
//! use kgraph_store::Store;
//!
//! let mut store = Store::with_defaults().unwrap();
//! store.register_module("local/demo", None).unwrap();
//! {
//!     let mut scope = store.enter_module("local/demo");
//!     scope.create_item("I100", [])?;
//! }
//! assert_eq!(store.context_depth(), 0);
//! # Ok::<(), kgraph_store::StoreError>(())
//! ```

use std::ops::{Deref, DerefMut};

use crate::error::{Result, StoreError};
use crate::store::Store;

/// Stack of module URIs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleStack {
    stack: Vec<String>,
}

impl ModuleStack {
    pub(crate) fn push(&mut self, uri: String) {
        self.stack.push(uri);
    }

    pub(crate) fn truncate(&mut self, depth: usize) {
        self.stack.truncate(depth);
    }

    /// Number of entered, not yet left, module scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// URI of the innermost module.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoActiveModule`] if the stack is empty.
    pub fn active(&self) -> Result<&str> {
        self.stack
            .last()
            .map(String::as_str)
            .ok_or(StoreError::NoActiveModule)
    }

    /// Module URIs from outermost to innermost.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.stack.iter().map(String::as_str)
    }
}

/// Guard returned by [`Store::enter_module`].
///
/// Dereferences to the store; restores the stack depth on drop.
#[derive(Debug)]
pub struct ModuleScope<'a> {
    store: &'a mut Store,
    depth: usize,
}

impl Deref for ModuleScope<'_> {
    type Target = Store;

    fn deref(&self) -> &Store {
        self.store
    }
}

impl DerefMut for ModuleScope<'_> {
    fn deref_mut(&mut self) -> &mut Store {
        self.store
    }
}

impl Drop for ModuleScope<'_> {
    fn drop(&mut self) {
        self.store.context.truncate(self.depth);
    }
}

impl Store {
    /// Makes `uri` the active module until the returned guard is dropped.
    ///
    /// The module does not need to be registered yet; creation calls check
    /// that when they run.
    pub fn enter_module(&mut self, uri: impl Into<String>) -> ModuleScope<'_> {
        let depth = self.context.depth();
        self.context.push(uri.into());
        ModuleScope { store: self, depth }
    }

    /// Runs `f` with `uri` as the active module.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns; the stack is restored either way.
    pub fn with_module<T>(
        &mut self,
        uri: impl Into<String>,
        f: impl FnOnce(&mut Store) -> Result<T>,
    ) -> Result<T> {
        let mut scope = self.enter_module(uri);
        f(&mut *scope)
    }

    /// Current depth of the module stack.
    #[must_use]
    pub fn context_depth(&self) -> usize {
        self.context.depth()
    }

    /// URI of the active module.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoActiveModule`] outside any module scope.
    pub fn active_module(&self) -> Result<&str> {
        self.context.active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack_has_no_active_module() {
        let stack = ModuleStack::default();
        assert!(matches!(stack.active(), Err(StoreError::NoActiveModule)));
    }

    #[test]
    fn nested_scopes_restore_depth() {
        let mut store = Store::with_defaults().unwrap();
        {
            let mut outer = store.enter_module("local/outer");
            assert_eq!(outer.active_module().unwrap(), "local/outer");
            {
                let inner = outer.enter_module("local/inner");
                assert_eq!(inner.context_depth(), 2);
                assert_eq!(inner.active_module().unwrap(), "local/inner");
            }
            assert_eq!(outer.active_module().unwrap(), "local/outer");
        }
        assert_eq!(store.context_depth(), 0);
    }

    #[test]
    fn depth_restored_after_failure() {
        let mut store = Store::with_defaults().unwrap();
        let result: Result<()> = store.with_module("local/never_registered", |store| {
            store.create_item("I100", [])?;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::ModuleNotLoaded { .. })));
        assert_eq!(store.context_depth(), 0);
        assert!(matches!(store.active_module(), Err(StoreError::NoActiveModule)));
    }
}
