//! Relation-attribute resolution.
//!
//! Whether a relation yields one value or many is decided when it is read,
//! from the relation's own "is functional" and "is functional for each
//! language" statements.

use crate::builtins::{HAS_LABEL, IS_FUNCTIONAL, IS_FUNCTIONAL_PER_LANGUAGE};
use crate::error::{Result, StoreError};
use crate::model::{EntityId, Literal, Object, RelationValue, Subject};
use crate::store::Store;

/// How many values a relation admits per subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Functionality {
    /// Any number, read back in creation order.
    Multi,
    /// At most one.
    Functional,
    /// At most one per language tag; untagged strings count as the default
    /// language.
    PerLanguage,
}

impl Store {
    /// Functionality of `relation`.
    ///
    /// "has label" is functional per language, and the two functionality
    /// flags are themselves functional, regardless of statements.
    #[must_use]
    pub fn functionality(&self, relation: EntityId) -> Functionality {
        match relation {
            IS_FUNCTIONAL | IS_FUNCTIONAL_PER_LANGUAGE => Functionality::Functional,
            HAS_LABEL => Functionality::PerLanguage,
            _ if self.flag(relation, IS_FUNCTIONAL) => Functionality::Functional,
            _ if self.flag(relation, IS_FUNCTIONAL_PER_LANGUAGE) => Functionality::PerLanguage,
            _ => Functionality::Multi,
        }
    }

    /// Returns true if `relation` admits at most one value (per language).
    #[must_use]
    pub fn is_functional(&self, relation: EntityId) -> bool {
        self.functionality(relation) != Functionality::Multi
    }

    fn flag(&self, relation: EntityId, flag: EntityId) -> bool {
        self.forward
            .get(&Subject::Entity(relation))
            .and_then(|by_rel| by_rel.get(&flag))
            .and_then(|ids| ids.first())
            .and_then(|id| self.statements.get(id.index()))
            .and_then(|stmt| stmt.object.as_literal())
            .and_then(Literal::as_bool)
            .unwrap_or(false)
    }

    /// Language a value counts as for per-language uniqueness.
    pub(crate) fn effective_language<'a>(&'a self, object: &'a Object) -> Option<&'a str> {
        match object {
            Object::Literal(Literal::Str { lang, .. }) => {
                Some(lang.as_deref().unwrap_or(&self.config.default_language))
            }
            _ => None,
        }
    }

    /// Reads `relation` on `entity`, filtering per-language relations by the
    /// configured default language.
    ///
    /// # Errors
    ///
    /// As [`Store::relation_value_in`].
    pub fn relation_value(&self, entity: EntityId, relation: EntityId) -> Result<RelationValue> {
        self.relation_value_in(entity, relation, &self.config.default_language)
    }

    /// Reads `relation` on `entity`.
    ///
    /// - No statements: [`RelationValue::None`].
    /// - Functional: [`RelationValue::Single`].
    /// - Functional per language: the one value tagged `language` (or
    ///   untagged, if `language` is the default language; non-string
    ///   literals and entities always match).
    /// - Otherwise [`RelationValue::Many`], in creation order.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if either handle is dead.
    /// - [`StoreError::TypeMismatch`] if `relation` is an item.
    /// - [`StoreError::AmbiguousLanguageResult`] if several values match
    ///   `language`.
    pub fn relation_value_in(
        &self,
        entity: EntityId,
        relation: EntityId,
        language: &str,
    ) -> Result<RelationValue> {
        let subject_uri = &self.entity(entity)?.uri;
        let relation_uri = &self.expect_relation(relation)?.uri;

        let objects: Vec<&Object> = self
            .get_statements(entity, Some(relation))
            .into_iter()
            .filter_map(|id| self.statements.get(id.index()))
            .map(|stmt| &stmt.object)
            .collect();
        if objects.is_empty() {
            return Ok(RelationValue::None);
        }

        match self.functionality(relation) {
            Functionality::Multi => Ok(RelationValue::Many(
                objects.into_iter().cloned().collect(),
            )),
            Functionality::Functional => Ok(RelationValue::Single(objects[0].clone())),
            Functionality::PerLanguage => {
                let mut matching = objects
                    .into_iter()
                    .filter(|object| match object {
                        Object::Literal(Literal::Str { lang: Some(tag), .. }) => tag == language,
                        Object::Literal(Literal::Str { lang: None, .. }) => {
                            language == self.config.default_language
                        }
                        _ => true,
                    });
                match (matching.next(), matching.next()) {
                    (None, _) => Ok(RelationValue::None),
                    (Some(object), None) => Ok(RelationValue::Single(object.clone())),
                    (Some(_), Some(_)) => Err(StoreError::AmbiguousLanguageResult {
                        subject: subject_uri.clone(),
                        relation: relation_uri.clone(),
                        language: language.to_owned(),
                    }),
                }
            }
        }
    }

    /// Every value of `relation` on `entity`, ignoring functionality and
    /// language.
    #[must_use]
    pub fn relation_values(&self, entity: EntityId, relation: EntityId) -> Vec<Object> {
        self.get_statements(entity, Some(relation))
            .into_iter()
            .filter_map(|id| self.statements.get(id.index()))
            .map(|stmt| stmt.object.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{HAS_DESCRIPTION, IS_SUBCLASS_OF};
    use crate::model::Value;

    const MODULE: &str = "local/resolve_test";

    fn store() -> Store {
        let mut store = Store::with_defaults().unwrap();
        store.register_module(MODULE, None).unwrap();
        store
    }

    #[test]
    fn builtin_functionality() {
        let store = Store::with_defaults().unwrap();
        assert_eq!(store.functionality(HAS_LABEL), Functionality::PerLanguage);
        assert_eq!(store.functionality(HAS_DESCRIPTION), Functionality::PerLanguage);
        assert_eq!(store.functionality(IS_SUBCLASS_OF), Functionality::Functional);
        assert_eq!(store.functionality(IS_FUNCTIONAL), Functionality::Functional);
        assert!(!store.is_functional(crate::builtins::HAS_PROPERTY));
    }

    #[test]
    fn non_functional_keeps_creation_order() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let rel = scope.create_relation("R1000", []).unwrap();
        let a = scope
            .create_item("I1000", [(rel, Value::from(vec!["x", "y", "z"]))])
            .unwrap();
        let value = scope.relation_value(a, rel).unwrap();
        let texts: Vec<String> = value
            .to_vec()
            .iter()
            .filter_map(|o| o.as_literal().and_then(Literal::as_str).map(str::to_owned))
            .collect();
        assert_eq!(texts, ["x", "y", "z"]);
        assert!(scope.relation_value(a, HAS_DESCRIPTION).unwrap().is_none());
    }

    #[test]
    fn per_language_filters_by_default_language() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let a = scope
            .create_item(
                "I1000",
                [(
                    HAS_LABEL,
                    Value::from(vec![
                        Value::from(Literal::lang("sentence", "en")),
                        Value::from(Literal::lang("Satz", "de")),
                    ]),
                )],
            )
            .unwrap();
        assert_eq!(scope.relation_value(a, HAS_LABEL).unwrap().as_str(), Some("sentence"));
        assert_eq!(
            scope.relation_value_in(a, HAS_LABEL, "de").unwrap().as_str(),
            Some("Satz")
        );
        assert_eq!(scope.label(a).as_deref(), Some("sentence"));
    }

    #[test]
    fn untagged_string_counts_as_default_language() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let a = scope
            .create_item("I1000", [(HAS_LABEL, Value::from("plain"))])
            .unwrap();
        let err = scope
            .set_relation(a, HAS_LABEL, Literal::lang("also plain", "en"))
            .unwrap_err();
        assert!(matches!(err, StoreError::UniquenessViolation { .. }));
        scope.set_relation(a, HAS_LABEL, Literal::lang("schlicht", "de")).unwrap();
    }

    #[test]
    fn ambiguous_language_result() {
        // the flag is set after both values exist
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let rel = scope.create_relation("R1000", []).unwrap();
        let a = scope
            .create_item("I1000", [(rel, Value::from(vec!["one", "two"]))])
            .unwrap();
        scope
            .set_relation(rel, IS_FUNCTIONAL_PER_LANGUAGE, true)
            .unwrap();
        assert!(matches!(
            scope.relation_value(a, rel),
            Err(StoreError::AmbiguousLanguageResult { .. })
        ));
    }

    #[test]
    fn reading_an_item_as_relation_fails() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let a = scope.create_item("I1000", []).unwrap();
        assert!(matches!(
            scope.relation_value(a, a),
            Err(StoreError::TypeMismatch { .. })
        ));
    }
}
