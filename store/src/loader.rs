//! Loading modules with rollback.
//!
//! A [`ModuleSource`] describes a module and knows how to build its content.
//! [`Store::load_module`] registers it, runs the builder with the module
//! active and unloads whatever was created if the builder fails.
//!
//! ```
//! use kgraph_store::{builtins, FnModule, ModuleRegistration, Store, Value};
//!
//! let mut store = Store::with_defaults().unwrap();
//! let module = FnModule::new(ModuleRegistration::new("local/demo").prefix("demo"), |store| {
//!     store.create_item("I1000", [(builtins::HAS_LABEL, Value::from("example"))])?;
//!     Ok(())
//! });
//! let handle = store.load_module(&module).unwrap();
//! assert!(handle.get(&store, "I1000__example").is_ok());
//! assert!(store.get_entity("demo__I1000", None).is_ok());
//! ```

use tracing::{info, warn};

use crate::error::Result;
use crate::model::EntityId;
use crate::module::ModuleRegistration;
use crate::store::Store;

/// Something that can populate a module.
pub trait ModuleSource {
    /// How to register the module.
    fn registration(&self) -> ModuleRegistration;

    /// Creates the module's entities and statements. Runs with the module
    /// active.
    ///
    /// # Errors
    ///
    /// Any error aborts the load; the partially built module is unloaded.
    fn build(&self, store: &mut Store) -> Result<()>;
}

/// A [`ModuleSource`] backed by a closure.
pub struct FnModule<F> {
    registration: ModuleRegistration,
    build: F,
}

impl<F> FnModule<F>
where
    F: Fn(&mut Store) -> Result<()>,
{
    /// Wraps `build` as the builder of the module described by `registration`.
    pub fn new(registration: ModuleRegistration, build: F) -> Self {
        Self {
            registration,
            build,
        }
    }
}

impl<F> ModuleSource for FnModule<F>
where
    F: Fn(&mut Store) -> Result<()>,
{
    fn registration(&self) -> ModuleRegistration {
        self.registration.clone()
    }

    fn build(&self, store: &mut Store) -> Result<()> {
        (self.build)(store)
    }
}

/// A loaded module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHandle {
    uri: String,
    prefix: Option<String>,
}

impl ModuleHandle {
    /// Module URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Prefix, if the module was registered with one.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Resolves `key` against this module (then the builtins).
    ///
    /// # Errors
    ///
    /// As [`Store::get_entity`].
    pub fn get(&self, store: &Store, key: &str) -> Result<EntityId> {
        store.get_entity(key, Some(&self.uri))
    }
}

impl Store {
    /// Registers and builds a module.
    ///
    /// # Errors
    ///
    /// Registration errors are returned as is. If the builder fails, the
    /// module is unloaded and the builder's error returned.
    pub fn load_module(&mut self, source: &dyn ModuleSource) -> Result<ModuleHandle> {
        let registration = source.registration();
        let handle = ModuleHandle {
            uri: registration.uri().to_owned(),
            prefix: registration.prefix_str().map(str::to_owned),
        };
        self.register(registration)?;

        if let Err(err) = self.with_module(handle.uri.clone(), |store| source.build(store)) {
            warn!(module = %handle.uri, error = %err, "module build failed, unloading");
            self.unload(&handle.uri, false)?;
            return Err(err);
        }

        let record = self.module(&handle.uri);
        info!(
            module = %handle.uri,
            entities = record.map_or(0, |r| r.entities().len()),
            statements = record.map_or(0, |r| r.statements().len()),
            "loaded module"
        );
        Ok(handle)
    }
}
