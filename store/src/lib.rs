//! Module-scoped knowledge graph store.
//!
//! The `kgraph-store` crate keeps a graph of typed entities (items `I…` and
//! relations `R…`) connected by statements. Statements about entities come
//! in dual pairs so they can be followed in both directions; any statement
//! can carry qualifiers (statements about statements), be tied to a scope
//! item and carry a proxy item. Every entity and statement belongs to the
//! module that was active when it was created, and unloading a module
//! removes all of it, including statements other modules made about it.
//!
//! # Entry Point
//!
//! ```
//! use kgraph_store::builtins::{HAS_LABEL, IS_INSTANCE_OF, METACLASS};
//! use kgraph_store::{Store, Value};
//!
//! let mut store = Store::with_defaults().unwrap();
//! store.register_module("local/geometry", None).unwrap();
//! {
//!     let mut scope = store.enter_module("local/geometry");
//!     scope
//!         .create_item(
//!             "I1000",
//!             [
//!                 (HAS_LABEL, Value::from("polygon")),
//!                 (IS_INSTANCE_OF, Value::from(METACLASS)),
//!             ],
//!         )
//!         .unwrap();
//! }
//! let polygon = store.get_entity("I1000__polygon", Some("local/geometry")).unwrap();
//! assert_eq!(store.label(polygon).as_deref(), Some("polygon"));
//!
//! let report = store.unload("local/geometry", true).unwrap();
//! assert_eq!(report.entities, 1);
//! assert!(!store.contains_entity(polygon));
//! ```
//!
//! # Serialization
//!
//! ```
//! let store = kgraph_store::Store::with_defaults().unwrap();
//! let nt = kgraph_store::serializer::ntriples::to_ntriples(&store).unwrap();
//! assert!(!nt.is_empty());
//!
//! #[cfg(feature = "serializers")]
//! {
//!     let json_ld = kgraph_store::serializer::jsonld::to_json_ld(&store).unwrap();
//!     assert!(json_ld.get("@graph").is_some());
//! }
//! ```
//!
//! JSON-LD output needs the `serializers` feature (on by default).

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod authoring;
pub mod behavior;
pub mod builtins;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod export;
pub mod keys;
pub mod loader;
pub mod model;
pub mod module;
pub mod reservoir;
pub mod resolve;
pub mod serializer;
pub mod statement;
pub mod store;

pub use config::{ReservoirConfig, StoreConfig};
pub use context::{ModuleScope, ModuleStack};
pub use entity::{Entity, Method, CALL};
pub use error::{ConfigError, Result, StoreError};
pub use export::{Triple, TripleObject};
pub use keys::ParsedKey;
pub use loader::{FnModule, ModuleHandle, ModuleSource};
pub use model::{
    EntityId, EntityKind, Literal, Object, RelationValue, Role, StatementId, Subject, Value,
};
pub use module::{ModuleRecord, ModuleRegistration, UnloadReport};
pub use reservoir::KeyReservoir;
pub use resolve::Functionality;
pub use statement::{Qualifier, Statement, StatementOptions};
pub use store::{IndexSnapshot, Store};
