//! Statements: typed, directed edges.
//!
//! A statement with an entity object is stored twice: the forward statement
//! under its subject and a dual with [`Role::Inverse`] under its object. The
//! two reference each other through [`Statement::dual`]. Qualifiers are
//! statements whose subject is another statement.

use crate::model::{EntityId, Object, Role, StatementId, Subject, Value};

/// One side of a relation edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub(crate) id: StatementId,
    pub(crate) key: String,
    pub(crate) uri: String,
    pub(crate) module_uri: String,
    pub(crate) subject: Subject,
    pub(crate) relation: EntityId,
    pub(crate) object: Object,
    pub(crate) role: Role,
    pub(crate) scope: Option<EntityId>,
    pub(crate) proxy: Option<EntityId>,
    pub(crate) qualifiers: Vec<StatementId>,
    pub(crate) dual: Option<StatementId>,
    pub(crate) unlinked: bool,
}

impl Statement {
    /// Store handle.
    #[must_use]
    pub fn id(&self) -> StatementId {
        self.id
    }

    /// Statement key (`RE1234`), shared by both sides of a dual pair.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// URI: module URI, separator, key and `:S` or `:O` for the role.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// URI of the module the statement was created in.
    #[must_use]
    pub fn module_uri(&self) -> &str {
        &self.module_uri
    }

    /// Subject (an entity, or a statement for qualifiers).
    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    /// Predicate.
    #[must_use]
    pub fn relation(&self) -> EntityId {
        self.relation
    }

    /// Object.
    #[must_use]
    pub fn object(&self) -> &Object {
        &self.object
    }

    /// Forward or inverse side.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Scope the statement was defined in.
    #[must_use]
    pub fn scope(&self) -> Option<EntityId> {
        self.scope
    }

    /// Proxy item associated with the statement.
    #[must_use]
    pub fn proxy(&self) -> Option<EntityId> {
        self.proxy
    }

    /// Qualifier statements (forward side only; see
    /// [`Store::qualifiers_of`](crate::Store::qualifiers_of)).
    #[must_use]
    pub fn qualifiers(&self) -> &[StatementId] {
        &self.qualifiers
    }

    /// The opposite-role counterpart, present iff the object is an entity.
    #[must_use]
    pub fn dual(&self) -> Option<StatementId> {
        self.dual
    }

    /// Returns true once the statement was removed.
    #[must_use]
    pub fn is_unlinked(&self) -> bool {
        self.unlinked
    }

    /// Returns true if this statement qualifies another statement.
    #[must_use]
    pub fn is_qualifier(&self) -> bool {
        matches!(self.subject, Subject::Statement(_))
    }

    /// The entity on the other end as seen from this side: the object for a
    /// forward statement, the subject for an inverse one.
    #[must_use]
    pub fn counterpart(&self) -> Option<EntityId> {
        match self.role {
            Role::Forward => self.object.as_entity(),
            Role::Inverse => self.subject.as_entity(),
        }
    }
}

/// A `(relation, value)` pair attached to a new statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Qualifier {
    /// Qualifying relation.
    pub relation: EntityId,
    /// Its value (an entity or literal; sequences are rejected).
    pub value: Value,
}

impl Qualifier {
    /// Creates a qualifier.
    pub fn new(relation: EntityId, value: impl Into<Value>) -> Self {
        Self {
            relation,
            value: value.into(),
        }
    }
}

/// Optional parts of [`Store::create_statement`](crate::Store::create_statement).
///
/// ```
/// # use kgraph_store::StatementOptions;
/// # fn demo(scope: kgraph_store::EntityId, start: kgraph_store::EntityId) {
/// let options = StatementOptions::new()
///     .scope(scope)
///     .qualifier(start, "2020");
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementOptions {
    pub(crate) scope: Option<EntityId>,
    pub(crate) qualifiers: Vec<Qualifier>,
    pub(crate) proxy: Option<EntityId>,
}

impl StatementOptions {
    /// No scope, no qualifiers, no proxy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines the statement inside `scope`.
    #[must_use]
    pub fn scope(mut self, scope: EntityId) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Adds a qualifier.
    #[must_use]
    pub fn qualifier(mut self, relation: EntityId, value: impl Into<Value>) -> Self {
        self.qualifiers.push(Qualifier::new(relation, value));
        self
    }

    /// Adds several qualifiers.
    #[must_use]
    pub fn qualifiers(mut self, qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        self.qualifiers.extend(qualifiers);
        self
    }

    /// Associates a proxy item.
    #[must_use]
    pub fn proxy(mut self, proxy: EntityId) -> Self {
        self.proxy = Some(proxy);
        self
    }
}
