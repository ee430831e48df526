//! Authoring helpers built on the creation calls.

use std::collections::{BTreeSet, VecDeque};

use crate::builtins::{
    HAS_DESCRIPTION, HAS_ELEMENT, HAS_LABEL, HAS_LENGTH, HAS_SCOPE_TYPE, IS_INSTANCE_OF,
    IS_SCOPE_OF, IS_SUBCLASS_OF, IS_SUBPROPERTY_OF, METACLASS, SCOPE, TUPLE,
};
use crate::error::{Result, StoreError};
use crate::keys::auto_key;
use crate::model::{EntityId, EntityKind, Literal, Object, Value};
use crate::store::Store;

impl Store {
    /// Draws an unused automatic key (`Ia1234` / `Ra1234`) from the active
    /// module's reservoir.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NoActiveModule`] / [`StoreError::ModuleNotLoaded`].
    /// - [`StoreError::ReservoirExhausted`] if no unused key is left.
    pub fn new_key(&mut self, kind: EntityKind) -> Result<String> {
        self.draw_key(kind).map(|(key, _)| key)
    }

    /// Pops until a free key turns up. Returns the key and every number
    /// popped on the way, the key's own number last.
    fn draw_key(&mut self, kind: EntityKind) -> Result<(String, Vec<u32>)> {
        let module_uri = self.context.active()?.to_owned();
        let mut popped = Vec::new();
        loop {
            let reservoir = &mut self.modules.record_mut(&module_uri)?.reservoir;
            let number = match reservoir.pop() {
                Ok(number) => number,
                Err(err) => {
                    reservoir.restore(&popped);
                    return Err(err);
                }
            };
            popped.push(number);
            let key = auto_key(kind, number);
            let uri = self.config.make_uri(&module_uri, &key);
            if !self.items.contains_key(&uri) && !self.relations.contains_key(&uri) {
                return Ok((key, popped));
            }
        }
    }

    /// Creates an item under a fresh automatic key. A rejected create hands
    /// the drawn keys back to the reservoir.
    fn create_auto_item(&mut self, relations: Vec<(EntityId, Value)>) -> Result<EntityId> {
        let (key, popped) = self.draw_key(EntityKind::Item)?;
        let created = self.create_item(&key, relations);
        if created.is_err() {
            let module_uri = self.context.active()?.to_owned();
            self.modules.record_mut(&module_uri)?.reservoir.restore(&popped);
        }
        created
    }

    /// Creates an auto-keyed instance of `class`.
    ///
    /// # Errors
    ///
    /// [`StoreError::TypeMismatch`] if `class` is a relation, otherwise the
    /// errors of [`Store::new_key`] and [`Store::create_item`].
    pub fn instance_of(
        &mut self,
        class: EntityId,
        label: &str,
        description: Option<&str>,
    ) -> Result<EntityId> {
        let entity = self.entity(class)?;
        if !entity.is_item() {
            return Err(StoreError::TypeMismatch {
                context: entity.uri().to_owned(),
                expected: "an item as class",
                found: entity.kind().as_str().to_owned(),
            });
        }
        let mut relations = vec![
            (IS_INSTANCE_OF, Value::from(class)),
            (HAS_LABEL, Value::from(label)),
        ];
        if let Some(description) = description {
            relations.push((HAS_DESCRIPTION, Value::from(description)));
        }
        self.create_auto_item(relations)
    }

    /// Creates a scope named `name` (e.g. "premises") belonging to `parent`.
    ///
    /// # Errors
    ///
    /// As [`Store::create_item`].
    pub fn create_scope(&mut self, parent: EntityId, name: &str) -> Result<EntityId> {
        self.entity(parent)?;
        self.create_auto_item(vec![
            (HAS_LABEL, Value::from(format!("scope:{name}"))),
            (IS_INSTANCE_OF, Value::from(SCOPE)),
            (IS_SCOPE_OF, Value::from(parent)),
            (HAS_SCOPE_TYPE, Value::from(name)),
        ])
    }

    /// Finds the scope named `name` of `parent`.
    #[must_use]
    pub fn scope_of(&self, parent: EntityId, name: &str) -> Option<EntityId> {
        self.inverse_subjects(parent, IS_SCOPE_OF)
            .into_iter()
            .find(|scope| {
                self.relation_value(*scope, HAS_SCOPE_TYPE)
                    .ok()
                    .and_then(|value| value.as_str().map(|s| s == name))
                    .unwrap_or(false)
            })
    }

    /// Returns true if `item` is an instance of the metaclass, or a subclass
    /// (at any depth) of such an instance. In other words: if `item` is a
    /// class.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `item` is dead.
    pub fn is_instance_of_generalized_metaclass(&self, item: EntityId) -> Result<bool> {
        let mut visited = BTreeSet::new();
        let mut current = item;
        loop {
            if self.relation_value(current, IS_INSTANCE_OF)?.entity() == Some(METACLASS) {
                return Ok(true);
            }
            match self.relation_value(current, IS_SUBCLASS_OF)?.entity() {
                Some(parent) if visited.insert(parent) => current = parent,
                _ => return Ok(false),
            }
        }
    }

    /// Creates a tuple of `values`, preserving their order.
    ///
    /// # Errors
    ///
    /// As [`Store::create_item`].
    pub fn new_tuple(&mut self, values: Vec<Value>) -> Result<EntityId> {
        let length = i64::try_from(values.len()).map_err(|_| StoreError::TypeMismatch {
            context: "tuple".to_owned(),
            expected: "a representable length",
            found: values.len().to_string(),
        })?;
        self.create_auto_item(vec![
            (IS_INSTANCE_OF, Value::from(TUPLE)),
            (HAS_LENGTH, Value::Literal(Literal::from(length))),
            (HAS_ELEMENT, Value::Sequence(values)),
        ])
    }

    /// Elements of a tuple in order.
    #[must_use]
    pub fn tuple_elements(&self, tuple: EntityId) -> Vec<Object> {
        self.relation_values(tuple, HAS_ELEMENT)
    }

    /// Relations `relation` specializes, directly or transitively, nearest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `relation` is dead.
    pub fn super_relations(&self, relation: EntityId) -> Result<Vec<EntityId>> {
        self.expect_relation(relation)?;
        let mut seen = BTreeSet::from([relation]);
        let mut queue = VecDeque::from([relation]);
        let mut found = Vec::new();
        while let Some(current) = queue.pop_front() {
            for parent in self.relation_values(current, IS_SUBPROPERTY_OF) {
                let Some(parent) = parent.as_entity() else {
                    continue;
                };
                if seen.insert(parent) {
                    found.push(parent);
                    queue.push_back(parent);
                }
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::GENERAL_ITEM;
    use crate::statement::StatementOptions;

    const MODULE: &str = "local/authoring_test";

    fn store() -> Store {
        let mut store = Store::with_defaults().unwrap();
        store.register_module(MODULE, None).unwrap();
        store
    }

    #[test]
    fn auto_keys_are_unique_and_marked() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let a = scope.new_key(EntityKind::Item).unwrap();
        let b = scope.new_key(EntityKind::Relation).unwrap();
        assert!(a.starts_with("Ia"));
        assert!(b.starts_with("Ra"));
        assert_ne!(a[2..], b[2..]);
    }

    #[test]
    fn new_key_skips_taken_keys() {
        let mut store = Store::with_defaults().unwrap();
        store
            .register_module(MODULE, Some(crate::KeyReservoir::with_seed(100, 105, 1750)))
            .unwrap();
        let mut scope = store.enter_module(MODULE);
        // 104 pops first; take its key so it must be skipped
        scope.create_item("Ia104", []).unwrap();
        assert_eq!(scope.new_key(EntityKind::Item).unwrap(), "Ia103");
    }

    #[test]
    fn rejected_auto_item_gives_its_key_back() {
        let mut store = Store::with_defaults().unwrap();
        store
            .register_module(MODULE, Some(crate::KeyReservoir::with_seed(100, 105, 1750)))
            .unwrap();
        let mut scope = store.enter_module(MODULE);
        scope.create_item("Ia104", []).unwrap();
        let reservoir = scope.module(MODULE).unwrap().reservoir().clone();
        let before = scope.index_snapshot();

        assert!(matches!(
            scope.new_tuple(vec![Value::from(Literal::lang("x", "fr"))]),
            Err(StoreError::UnsupportedLanguage { .. })
        ));
        assert_eq!(scope.module(MODULE).unwrap().reservoir(), &reservoir);
        assert_eq!(scope.index_snapshot(), before);
        assert_eq!(scope.new_key(EntityKind::Item).unwrap(), "Ia103");
    }

    #[test]
    fn exhausted_reservoir_during_instance_of_keeps_keys() {
        let mut store = Store::with_defaults().unwrap();
        store
            .register_module(MODULE, Some(crate::KeyReservoir::with_seed(100, 102, 7)))
            .unwrap();
        let mut scope = store.enter_module(MODULE);

        // one key for the item, then two statements with one key left
        assert!(matches!(
            scope.instance_of(GENERAL_ITEM, "x", None),
            Err(StoreError::ReservoirExhausted { .. })
        ));
        assert_eq!(scope.module(MODULE).unwrap().reservoir().remaining(), 2);
        assert!(scope.module(MODULE).unwrap().entities().is_empty());
    }

    #[test]
    fn instances_carry_class_and_label() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let class = scope
            .create_item("I1000", [(IS_SUBCLASS_OF, Value::from(GENERAL_ITEM))])
            .unwrap();
        let x = scope.instance_of(class, "x", Some("an example")).unwrap();
        assert_eq!(scope.relation_value(x, IS_INSTANCE_OF).unwrap().entity(), Some(class));
        assert_eq!(scope.label(x).as_deref(), Some("x"));
        assert!(scope.entity(x).unwrap().short_key().starts_with("Ia"));
        assert!(matches!(
            scope.instance_of(HAS_LABEL, "y", None),
            Err(StoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn scopes_group_statements() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let theorem = scope.create_item("I1000", []).unwrap();
        let premises = scope.create_scope(theorem, "premises").unwrap();
        assert_eq!(scope.scope_of(theorem, "premises"), Some(premises));
        assert_eq!(scope.scope_of(theorem, "assertions"), None);

        let rel = scope.create_relation("R1000", []).unwrap();
        let x = scope.create_item("I1001", []).unwrap();
        let stmt = scope
            .create_statement(x, rel, "positive", StatementOptions::new().scope(premises))
            .unwrap();
        assert_eq!(scope.scope_statements(premises), vec![stmt]);
        assert_eq!(scope.statement(stmt).unwrap().scope(), Some(premises));

        let qualifiers = scope.qualifiers_of(stmt).unwrap();
        assert_eq!(qualifiers.len(), 1);
        let qualifier = scope.statement(qualifiers[0]).unwrap();
        assert_eq!(qualifier.relation(), crate::builtins::HAS_DEFINING_SCOPE);
        assert_eq!(qualifier.object().as_entity(), Some(premises));
    }

    #[test]
    fn non_scope_items_are_rejected_as_scope() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let x = scope.create_item("I1000", []).unwrap();
        let before = scope.index_snapshot();
        assert!(matches!(
            scope.create_statement(x, HAS_DESCRIPTION, "d", StatementOptions::new().scope(x)),
            Err(StoreError::TypeMismatch { .. })
        ));
        assert_eq!(scope.index_snapshot(), before);
    }

    #[test]
    fn generalized_metaclass() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let class = scope
            .create_item("I1000", [(IS_INSTANCE_OF, Value::from(METACLASS))])
            .unwrap();
        let subclass = scope
            .create_item("I1001", [(IS_SUBCLASS_OF, Value::from(class))])
            .unwrap();
        let instance = scope.instance_of(subclass, "instance", None).unwrap();

        assert!(scope.is_instance_of_generalized_metaclass(class).unwrap());
        assert!(scope.is_instance_of_generalized_metaclass(subclass).unwrap());
        assert!(!scope.is_instance_of_generalized_metaclass(instance).unwrap());
        assert!(!scope.is_instance_of_generalized_metaclass(METACLASS).unwrap());
    }

    #[test]
    fn tuples_keep_order() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let a = scope.create_item("I1000", []).unwrap();
        let tuple = scope
            .new_tuple(vec![Value::from(a), Value::from(2i64), Value::from("c")])
            .unwrap();
        let elements = scope.tuple_elements(tuple);
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0], Object::Entity(a));
        assert_eq!(elements[2], Object::Literal(Literal::from("c")));
        assert_eq!(
            scope.relation_value(tuple, HAS_LENGTH).unwrap().literal().and_then(Literal::as_int),
            Some(3)
        );
    }

    #[test]
    fn super_relations_follow_subproperty_chain() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let top = scope.create_relation("R1000", []).unwrap();
        let middle = scope
            .create_relation("R1001", [(IS_SUBPROPERTY_OF, Value::from(top))])
            .unwrap();
        let bottom = scope
            .create_relation("R1002", [(IS_SUBPROPERTY_OF, Value::from(middle))])
            .unwrap();
        assert_eq!(scope.super_relations(bottom).unwrap(), vec![middle, top]);
        assert!(scope.super_relations(top).unwrap().is_empty());
    }
}
