//! The builtin vocabulary.
//!
//! Created in the permanent builtin module when a [`Store`] is constructed.
//! The handles are fixed, so they are exported as constants.

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::model::EntityId;
use crate::store::Store;

/// `R1` has label. Functional per language.
pub const HAS_LABEL: EntityId = EntityId(0);
/// `R2` has description. Functional per language.
pub const HAS_DESCRIPTION: EntityId = EntityId(1);
/// `R3` is subclass of. Functional.
pub const IS_SUBCLASS_OF: EntityId = EntityId(2);
/// `R4` is instance of. Functional.
pub const IS_INSTANCE_OF: EntityId = EntityId(3);
/// `R5` is part of.
pub const IS_PART_OF: EntityId = EntityId(4);
/// `R16` has property.
pub const HAS_PROPERTY: EntityId = EntityId(5);
/// `R17` is subproperty of.
pub const IS_SUBPROPERTY_OF: EntityId = EntityId(6);
/// `R20` has defining scope. Functional; attached as a qualifier.
pub const HAS_DEFINING_SCOPE: EntityId = EntityId(7);
/// `R21` is scope of. Functional.
pub const IS_SCOPE_OF: EntityId = EntityId(8);
/// `R22` is functional. Functional.
pub const IS_FUNCTIONAL: EntityId = EntityId(9);
/// `R32` is functional for each language. Functional.
pub const IS_FUNCTIONAL_PER_LANGUAGE: EntityId = EntityId(10);
/// `R34` has proxy item. Functional; attached as a qualifier.
pub const HAS_PROXY_ITEM: EntityId = EntityId(11);
/// `R38` has length. Functional.
pub const HAS_LENGTH: EntityId = EntityId(12);
/// `R39` has element.
pub const HAS_ELEMENT: EntityId = EntityId(13);
/// `R64` has scope type. Functional.
pub const HAS_SCOPE_TYPE: EntityId = EntityId(14);

/// `I1` general item.
pub const GENERAL_ITEM: EntityId = EntityId(15);
/// `I2` metaclass: instances of it are classes.
pub const METACLASS: EntityId = EntityId(16);
/// `I16` scope.
pub const SCOPE: EntityId = EntityId(17);
/// `I33` tuple.
pub const TUPLE: EntityId = EntityId(18);

type Definition = (EntityId, &'static str, &'static str, &'static str);

const RELATIONS: &[Definition] = &[
    (HAS_LABEL, "R1", "has label", "human readable name of the entity"),
    (HAS_DESCRIPTION, "R2", "has description", "natural language description of the entity"),
    (IS_SUBCLASS_OF, "R3", "is subclass of", "the subject is a subclass of the object"),
    (IS_INSTANCE_OF, "R4", "is instance of", "the subject is an instance of the object class"),
    (IS_PART_OF, "R5", "is part of", "the subject is a part of the object"),
    (HAS_PROPERTY, "R16", "has property", "the subject has the object as a property"),
    (IS_SUBPROPERTY_OF, "R17", "is subproperty of", "the subject relation specializes the object relation"),
    (HAS_DEFINING_SCOPE, "R20", "has defining scope", "the scope in which the statement was defined"),
    (IS_SCOPE_OF, "R21", "is scope of", "the entity this scope belongs to"),
    (IS_FUNCTIONAL, "R22", "is functional", "the relation has at most one value per subject"),
    (
        IS_FUNCTIONAL_PER_LANGUAGE,
        "R32",
        "is functional for each language",
        "the relation has at most one value per subject and language",
    ),
    (HAS_PROXY_ITEM, "R34", "has proxy item", "an auxiliary item representing the statement"),
    (HAS_LENGTH, "R38", "has length", "number of elements"),
    (HAS_ELEMENT, "R39", "has element", "an element, in order"),
    (HAS_SCOPE_TYPE, "R64", "has scope type", "the kind of section a scope represents"),
];

const ITEMS: &[Definition] = &[
    (GENERAL_ITEM, "I1", "general item", "the most general class"),
    (METACLASS, "I2", "Metaclass", "parent class of all classes"),
    (SCOPE, "I16", "scope", "a section of a definition or theorem"),
    (TUPLE, "I33", "tuple", "an ordered collection of entities or literals"),
];

const FUNCTIONAL: &[EntityId] = &[
    IS_SUBCLASS_OF,
    IS_INSTANCE_OF,
    HAS_DEFINING_SCOPE,
    IS_SCOPE_OF,
    IS_FUNCTIONAL,
    IS_FUNCTIONAL_PER_LANGUAGE,
    HAS_PROXY_ITEM,
    HAS_LENGTH,
    HAS_SCOPE_TYPE,
];

const PER_LANGUAGE: &[EntityId] = &[HAS_LABEL, HAS_DESCRIPTION];

const CLASSES: &[(EntityId, EntityId, EntityId)] = &[
    (GENERAL_ITEM, IS_INSTANCE_OF, METACLASS),
    (SCOPE, IS_INSTANCE_OF, METACLASS),
    (TUPLE, IS_INSTANCE_OF, METACLASS),
];

/// Short key of a builtin entity.
#[must_use]
pub fn short_key(id: EntityId) -> Option<&'static str> {
    RELATIONS
        .iter()
        .chain(ITEMS)
        .find(|(builtin, ..)| *builtin == id)
        .map(|(_, key, ..)| *key)
}

fn expect_handle(created: EntityId, expected: EntityId, key: &str) -> Result<()> {
    if created != expected {
        return Err(StoreError::InternalConsistency {
            context: "builtin bootstrap".to_owned(),
            detail: format!("{key} was created as {created}, expected {expected}"),
        });
    }
    Ok(())
}

/// Creates the builtin vocabulary. Must run on an empty store with the
/// builtin module registered.
pub(crate) fn bootstrap(store: &mut Store) -> Result<()> {
    let uri = store.config().builtin_uri.clone();
    let mut scope = store.enter_module(uri);

    // bare entities first; statements may reference any of them
    for (expected, key, ..) in RELATIONS {
        let created = scope.create_relation(key, [])?;
        expect_handle(created, *expected, key)?;
    }
    for (expected, key, ..) in ITEMS {
        let created = scope.create_item(key, [])?;
        expect_handle(created, *expected, key)?;
    }

    for (id, _, label, description) in RELATIONS.iter().chain(ITEMS) {
        scope.set_relation(*id, HAS_LABEL, *label)?;
        scope.set_relation(*id, HAS_DESCRIPTION, *description)?;
    }
    for relation in FUNCTIONAL {
        scope.set_relation(*relation, IS_FUNCTIONAL, true)?;
    }
    for relation in PER_LANGUAGE {
        scope.set_relation(*relation, IS_FUNCTIONAL_PER_LANGUAGE, true)?;
    }
    for (subject, relation, object) in CLASSES {
        scope.set_relation(*subject, *relation, *object)?;
    }

    debug!(
        entities = scope.entity_count(),
        statements = scope.statement_count(),
        "created builtin vocabulary"
    );
    Ok(())
}
