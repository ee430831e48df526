//! Core graph model types.
//!
//! Entities and statements live in arenas inside the [`Store`](crate::Store)
//! and are addressed by the copyable handles [`EntityId`] and
//! [`StatementId`]. Handles are never reused within a store, so a handle to a
//! removed entity or unlinked statement stays distinguishable from live ones.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle of an entity (item or relation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub(crate) u32);

impl EntityId {
    /// Position of the entity in the store's arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Handle of a statement (forward or inverse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatementId(pub(crate) u32);

impl StatementId {
    /// Position of the statement in the store's arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "statement#{}", self.0)
    }
}

/// Whether an entity is a class/instance node or a predicate definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// A class or instance node (`I…` keys).
    Item,
    /// A predicate definition (`R…` keys).
    Relation,
}

impl EntityKind {
    /// Leading character of short keys of this kind.
    #[must_use]
    pub fn key_prefix(self) -> char {
        match self {
            EntityKind::Item => 'I',
            EntityKind::Relation => 'R',
        }
    }

    /// Lower-case name used in messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Item => "item",
            EntityKind::Relation => "relation",
        }
    }
}

/// Which side of a dual pair a statement represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Stored under its subject (forward index, relation list, ordered log).
    Forward,
    /// Stored under its object (inverse index only).
    Inverse,
}

impl Role {
    /// Suffix used in statement URIs (`S` for the subject side, `O` for the
    /// object side).
    #[must_use]
    pub fn suffix(self) -> char {
        match self {
            Role::Forward => 'S',
            Role::Inverse => 'O',
        }
    }

    /// The opposite role.
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Role::Forward => Role::Inverse,
            Role::Inverse => Role::Forward,
        }
    }
}

/// A literal statement object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Literal {
    /// A string, optionally tagged with a language.
    Str {
        /// The text.
        value: String,
        /// IETF language tag, if any.
        lang: Option<String>,
    },
    /// A boolean.
    Bool {
        /// The value.
        value: bool,
    },
    /// An integer.
    Int {
        /// The value.
        value: i64,
    },
    /// A floating point number.
    Float {
        /// The value.
        value: f64,
    },
    /// A complex number.
    Complex {
        /// Real part.
        re: f64,
        /// Imaginary part.
        im: f64,
    },
}

impl Literal {
    /// A language-tagged string, e.g. `Literal::lang("Satz", "de")`.
    #[must_use]
    pub fn lang(value: impl Into<String>, tag: impl Into<String>) -> Self {
        Literal::Str {
            value: value.into(),
            lang: Some(tag.into()),
        }
    }

    /// A complex number literal.
    #[must_use]
    pub fn complex(re: f64, im: f64) -> Self {
        Literal::Complex { re, im }
    }

    /// Language tag of a string literal.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        match self {
            Literal::Str { lang, .. } => lang.as_deref(),
            _ => None,
        }
    }

    /// The text of a string literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The value of a boolean literal.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool { value } => Some(*value),
            _ => None,
        }
    }

    /// The value of an integer literal.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int { value } => Some(*value),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Str { .. } => "string",
            Literal::Bool { .. } => "boolean",
            Literal::Int { .. } => "integer",
            Literal::Float { .. } => "float",
            Literal::Complex { .. } => "complex",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str { value, lang: None } => write!(f, "{value:?}"),
            Literal::Str {
                value,
                lang: Some(tag),
            } => write!(f, "{value:?}@{tag}"),
            Literal::Bool { value } => write!(f, "{value}"),
            Literal::Int { value } => write!(f, "{value}"),
            Literal::Float { value } => write!(f, "{value}"),
            Literal::Complex { re, im } => {
                if *im < 0.0 {
                    write!(f, "{re}-{}i", -im)
                } else {
                    write!(f, "{re}+{im}i")
                }
            }
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str {
            value: value.to_owned(),
            lang: None,
        }
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str { value, lang: None }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool { value }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int { value }
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int {
            value: i64::from(value),
        }
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float { value }
    }
}

/// The object of a stored statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
    /// Another entity; such statements always have a dual.
    Entity(EntityId),
    /// A literal; such statements never have a dual.
    Literal(Literal),
}

impl Object {
    /// The entity handle, if the object is an entity.
    #[must_use]
    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            Object::Entity(id) => Some(*id),
            Object::Literal(_) => None,
        }
    }

    /// The literal, if the object is a literal.
    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Object::Entity(_) => None,
            Object::Literal(lit) => Some(lit),
        }
    }
}

impl From<EntityId> for Object {
    fn from(id: EntityId) -> Self {
        Object::Entity(id)
    }
}

impl From<Literal> for Object {
    fn from(lit: Literal) -> Self {
        Object::Literal(lit)
    }
}

/// A caller-supplied statement value.
///
/// Sequences are accepted where several statements are created at once (the
/// relation lists of [`Store::create_item`](crate::Store::create_item)) and
/// unpacked into one statement per element. Passing a sequence directly to
/// [`Store::create_statement`](crate::Store::create_statement) is a
/// [`TypeMismatch`](crate::StoreError::TypeMismatch).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An entity object.
    Entity(EntityId),
    /// A literal object.
    Literal(Literal),
    /// Several values for the same relation.
    Sequence(Vec<Value>),
}

impl Value {
    /// Short description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Value::Entity(id) => id.to_string(),
            Value::Literal(lit) => lit.type_name().to_owned(),
            Value::Sequence(items) => format!("sequence of {} values", items.len()),
        }
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Value::Entity(id)
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        Value::Literal(lit)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        match object {
            Object::Entity(id) => Value::Entity(id),
            Object::Literal(lit) => Value::Literal(lit),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Literal(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Literal(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Literal(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Literal(value.into())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Literal(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Literal(value.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Sequence(values.into_iter().map(Into::into).collect())
    }
}

/// The subject of a statement: an entity, or (for qualifiers) a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    /// An ordinary statement about an entity.
    Entity(EntityId),
    /// A qualifier refining another statement.
    Statement(StatementId),
}

impl Subject {
    /// The entity handle, if the subject is an entity.
    #[must_use]
    pub fn as_entity(self) -> Option<EntityId> {
        match self {
            Subject::Entity(id) => Some(id),
            Subject::Statement(_) => None,
        }
    }

    /// The statement handle, if the subject is a statement.
    #[must_use]
    pub fn as_statement(self) -> Option<StatementId> {
        match self {
            Subject::Entity(_) => None,
            Subject::Statement(id) => Some(id),
        }
    }
}

impl From<EntityId> for Subject {
    fn from(id: EntityId) -> Self {
        Subject::Entity(id)
    }
}

impl From<StatementId> for Subject {
    fn from(id: StatementId) -> Self {
        Subject::Statement(id)
    }
}

/// Result of resolving a relation on an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationValue {
    /// No statement exists (or none matched the language filter).
    None,
    /// Functional relation, or exactly one language-filtered match.
    Single(Object),
    /// Non-functional relation; objects in creation order.
    Many(Vec<Object>),
}

impl RelationValue {
    /// Returns true if there is no value.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, RelationValue::None)
    }

    /// The single object of a functional relation.
    #[must_use]
    pub fn single(&self) -> Option<&Object> {
        match self {
            RelationValue::Single(object) => Some(object),
            _ => None,
        }
    }

    /// The single object, if it is an entity.
    #[must_use]
    pub fn entity(&self) -> Option<EntityId> {
        self.single().and_then(Object::as_entity)
    }

    /// The single object, if it is a literal.
    #[must_use]
    pub fn literal(&self) -> Option<&Literal> {
        self.single().and_then(Object::as_literal)
    }

    /// The text of a single string literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.literal().and_then(Literal::as_str)
    }

    /// All objects, regardless of functionality.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Object> {
        match self {
            RelationValue::None => Vec::new(),
            RelationValue::Single(object) => vec![object.clone()],
            RelationValue::Many(objects) => objects.clone(),
        }
    }

    /// All entity objects, regardless of functionality.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityId> {
        self.to_vec().iter().filter_map(Object::as_entity).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_flip_is_involution() {
        assert_eq!(Role::Forward.flip(), Role::Inverse);
        assert_eq!(Role::Forward.flip().flip(), Role::Forward);
        assert_eq!(Role::Forward.suffix(), 'S');
        assert_eq!(Role::Inverse.suffix(), 'O');
    }

    #[test]
    fn literal_display() {
        assert_eq!(Literal::from("x").to_string(), "\"x\"");
        assert_eq!(Literal::lang("Satz", "de").to_string(), "\"Satz\"@de");
        assert_eq!(Literal::complex(1.0, -2.0).to_string(), "1-2i");
        assert_eq!(Literal::from(true).to_string(), "true");
    }

    #[test]
    fn vec_converts_to_sequence() {
        let value = Value::from(vec!["a", "b"]);
        assert!(matches!(value, Value::Sequence(ref items) if items.len() == 2));
    }

    #[test]
    fn relation_value_accessors() {
        let single = RelationValue::Single(Object::Literal("a".into()));
        assert_eq!(single.as_str(), Some("a"));
        assert_eq!(single.to_vec().len(), 1);

        let many = RelationValue::Many(vec![
            Object::Entity(EntityId(3)),
            Object::Literal(1i64.into()),
        ]);
        assert!(many.single().is_none());
        assert_eq!(many.entities(), vec![EntityId(3)]);
        assert!(RelationValue::None.is_none());
    }
}
