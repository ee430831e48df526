//! Attachable behavior.
//!
//! Methods are attached to single entities or to every entity of a kind.
//! A method attached to an entity also becomes one of its prototypes: items
//! created later as subclasses receive the prototypes, instances receive
//! them as bound methods and keep them as prototypes. This happens once,
//! when the child is created.

use std::sync::Arc;

use crate::builtins::{IS_INSTANCE_OF, IS_SUBCLASS_OF};
use crate::entity::{Method, CALL};
use crate::error::{Result, StoreError};
use crate::model::{EntityId, EntityKind, Object};
use crate::store::Store;

impl Store {
    /// Attaches `method` to `entity` under `name`, replacing an earlier
    /// method of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the entity is dead.
    pub fn attach_method<F>(&mut self, entity: EntityId, name: &str, method: F) -> Result<()>
    where
        F: Fn(&mut Store, EntityId, &[Object]) -> Result<Object> + Send + Sync + 'static,
    {
        let method: Method = Arc::new(method);
        let entity = self.entity_mut(entity)?;
        entity.methods.insert(name.to_owned(), Arc::clone(&method));
        entity.prototypes.retain(|(existing, _)| existing != name);
        entity.prototypes.push((name.to_owned(), method));
        Ok(())
    }

    /// Attaches `method` to every entity of `kind` that has no method of its
    /// own under `name`.
    pub fn attach_kind_method<F>(&mut self, kind: EntityKind, name: &str, method: F)
    where
        F: Fn(&mut Store, EntityId, &[Object]) -> Result<Object> + Send + Sync + 'static,
    {
        self.kind_methods
            .entry(kind)
            .or_default()
            .insert(name.to_owned(), Arc::new(method));
    }

    /// Returns true if `entity` can be called with `name`.
    #[must_use]
    pub fn has_method(&self, entity: EntityId, name: &str) -> bool {
        self.find_method(entity, name).is_some()
    }

    fn find_method(&self, entity: EntityId, name: &str) -> Option<Method> {
        let entity = self.entity(entity).ok()?;
        entity
            .methods
            .get(name)
            .or_else(|| self.kind_methods.get(&entity.kind)?.get(name))
            .cloned()
    }

    /// Invokes the method `name` of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotCallable`] if there is no such method, and
    /// otherwise whatever the method returns.
    pub fn call_method(&mut self, entity: EntityId, name: &str, args: &[Object]) -> Result<Object> {
        let Some(method) = self.find_method(entity, name) else {
            return Err(StoreError::NotCallable {
                key: self.entity(entity)?.uri.clone(),
                method: name.to_owned(),
            });
        };
        method(self, entity, args)
    }

    /// Calls `entity` itself, i.e. its [`CALL`] method.
    ///
    /// # Errors
    ///
    /// As [`Store::call_method`].
    pub fn call(&mut self, entity: EntityId, args: &[Object]) -> Result<Object> {
        self.call_method(entity, CALL, args)
    }

    fn first_object_entity(&self, id: EntityId, relation: EntityId) -> Option<EntityId> {
        let first = *self.get_statements(id, Some(relation)).first()?;
        self.statement(first).ok()?.object().as_entity()
    }

    /// Copies prototypes from the parent class and binds the class's
    /// prototypes as methods. Bound methods become prototypes as well, so
    /// the entity hands them on to its own instances and subclasses.
    pub(crate) fn inherit_behavior(&mut self, id: EntityId) -> Result<()> {
        let parent = self.first_object_entity(id, IS_SUBCLASS_OF);
        let class = self.first_object_entity(id, IS_INSTANCE_OF);

        let inherited = match parent {
            Some(parent) => self.entity(parent)?.prototypes.clone(),
            None => Vec::new(),
        };
        let bound = match class {
            Some(class) => self.entity(class)?.prototypes.clone(),
            None => Vec::new(),
        };
        if inherited.is_empty() && bound.is_empty() {
            return Ok(());
        }

        let entity = self.entity_mut(id)?;
        entity.prototypes.extend(inherited);
        for (name, method) in bound {
            if !entity.prototypes.iter().any(|(existing, _)| *existing == name) {
                entity.prototypes.push((name.clone(), Arc::clone(&method)));
            }
            entity.methods.insert(name, method);
        }
        Ok(())
    }
}
