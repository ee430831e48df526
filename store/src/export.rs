//! Triple export.
//!
//! Every forward statement becomes one `(subject, predicate, object)` triple
//! in statement-log order. Qualifiers use the URI of the qualified statement
//! as their subject. Inverse statements are not exported; they carry no
//! information of their own.

use serde::Serialize;

use crate::error::Result;
use crate::model::{Literal, Object};
use crate::store::Store;

/// Object position of a [`Triple`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TripleObject {
    /// An entity URI.
    Iri(String),
    /// A literal value.
    Literal(Literal),
}

/// One exported statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Triple {
    /// Subject URI (entity or statement).
    pub subject: String,
    /// Relation URI.
    pub predicate: String,
    /// Object URI or literal.
    pub object: TripleObject,
}

impl Store {
    /// Exports all statements as triples.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) if the
    /// log references a dead entity, which [`Store::check_integrity`] would
    /// also report.
    pub fn triples(&self) -> Result<Vec<Triple>> {
        self.log
            .iter()
            .map(|id| {
                let stmt = self.statement(*id)?;
                let object = match stmt.object() {
                    Object::Entity(entity) => TripleObject::Iri(self.entity(*entity)?.uri().to_owned()),
                    Object::Literal(literal) => TripleObject::Literal(literal.clone()),
                };
                Ok(Triple {
                    subject: self.subject_uri(stmt.subject())?.to_owned(),
                    predicate: self.entity(stmt.relation())?.uri().to_owned(),
                    object,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{HAS_LABEL, IS_INSTANCE_OF, METACLASS};
    use crate::model::Value;
    use crate::statement::StatementOptions;

    #[test]
    fn triples_follow_log_order() {
        let mut store = Store::with_defaults().unwrap();
        let builtin_count = store.triples().unwrap().len();
        store.register_module("local/export", None).unwrap();
        {
            let mut scope = store.enter_module("local/export");
            let class = scope
                .create_item(
                    "I1000",
                    [
                        (HAS_LABEL, Value::from("class")),
                        (IS_INSTANCE_OF, Value::from(METACLASS)),
                    ],
                )
                .unwrap();
            let rel = scope.create_relation("R1000", []).unwrap();
            scope
                .create_statement(
                    class,
                    rel,
                    "value",
                    StatementOptions::new().qualifier(HAS_LABEL, "qualifier"),
                )
                .unwrap();
        }

        let triples = store.triples().unwrap();
        let added = &triples[builtin_count..];
        assert_eq!(added.len(), 4);
        assert_eq!(added[0].subject, "local/export#I1000");
        assert_eq!(added[0].predicate, "kgraph:/builtins#R1");
        assert_eq!(added[1].object, TripleObject::Iri("kgraph:/builtins#I2".to_owned()));
        assert_eq!(added[2].predicate, "local/export#R1000");
        assert!(added[3].subject.starts_with("local/export#RE"));
        assert!(added[3].subject.ends_with(":S"));
    }
}
