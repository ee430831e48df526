//! Entities: items and relations.
//!
//! An [`Entity`] only holds identity and attached behavior. Everything else
//! about it (label, class, functionality flags) is expressed as statements
//! and read through [`Store::relation_value`](crate::Store::relation_value).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{EntityId, EntityKind, Object};
use crate::store::Store;

/// Name under which the behavior of [`Store::call`](crate::Store::call) is attached.
pub const CALL: &str = "call";

/// A callable attached to an entity.
///
/// Receives the store, the entity it was invoked on and the call arguments.
pub type Method = Arc<dyn Fn(&mut Store, EntityId, &[Object]) -> Result<Object> + Send + Sync>;

/// An addressable graph node.
#[derive(Clone)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) kind: EntityKind,
    pub(crate) short_key: String,
    pub(crate) module_uri: String,
    pub(crate) uri: String,
    /// Bound behavior, callable on this entity.
    pub(crate) methods: BTreeMap<String, Method>,
    /// Behavior handed down to subclasses and bound on instances.
    pub(crate) prototypes: Vec<(String, Method)>,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        kind: EntityKind,
        short_key: String,
        module_uri: String,
        uri: String,
    ) -> Self {
        Self {
            id,
            kind,
            short_key,
            module_uri,
            uri,
            methods: BTreeMap::new(),
            prototypes: Vec::new(),
        }
    }

    /// Store handle of this entity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Item or relation.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns true for items.
    #[must_use]
    pub fn is_item(&self) -> bool {
        self.kind == EntityKind::Item
    }

    /// Returns true for relations.
    #[must_use]
    pub fn is_relation(&self) -> bool {
        self.kind == EntityKind::Relation
    }

    /// Short key, e.g. `I1234`.
    #[must_use]
    pub fn short_key(&self) -> &str {
        &self.short_key
    }

    /// URI of the owning module.
    #[must_use]
    pub fn module_uri(&self) -> &str {
        &self.module_uri
    }

    /// Globally unique URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Names of the methods bound to this entity.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Names of the prototypes this entity passes on, in attachment order.
    pub fn prototype_names(&self) -> impl Iterator<Item = &str> {
        self.prototypes.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("uri", &self.uri)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("prototypes", &self.prototypes.len())
            .finish()
    }
}
