//! The entity graph store.
//!
//! All entities and statements live in two arenas. Several indices point into
//! them:
//!
//! | index         | key                       | contents                         |
//! |---------------|---------------------------|----------------------------------|
//! | `items`       | URI                       | item handles                     |
//! | `relations`   | URI                       | relation handles                 |
//! | `registry`    | statement URI             | every live statement (both roles)|
//! | `forward`     | subject, then relation    | forward statements               |
//! | `inverse`     | object, then relation     | inverse (dual) statements        |
//! | `by_relation` | relation                  | forward statements               |
//! | `by_scope`    | scope item                | forward statements               |
//! | `log`         | -                         | forward statements, in order     |
//!
//! Every mutation keeps these in step; [`Store::check_integrity`] verifies it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

use tracing::debug;

use crate::builtins::{self, HAS_DEFINING_SCOPE, HAS_PROXY_ITEM, IS_INSTANCE_OF, SCOPE};
use crate::config::StoreConfig;
use crate::context::ModuleStack;
use crate::entity::{Entity, Method};
use crate::error::{Result, StoreError};
use crate::keys::{label_matches, parse_key};
use crate::model::{EntityId, EntityKind, Object, Role, StatementId, Subject, Value};
use crate::module::{ModuleRegistration, ModuleRegistry};
use crate::resolve::Functionality;
use crate::statement::{Statement, StatementOptions};

pub(crate) type NestedIndex<K> = HashMap<K, BTreeMap<EntityId, Vec<StatementId>>>;

/// In-memory knowledge graph.
///
/// A store always contains the builtin vocabulary (see [`builtins`]) in its
/// permanent builtin module. Everything else is created inside a module
/// scope (see [`Store::enter_module`]).
pub struct Store {
    pub(crate) config: StoreConfig,
    pub(crate) entities: Vec<Option<Entity>>,
    pub(crate) items: HashMap<String, EntityId>,
    pub(crate) relations: HashMap<String, EntityId>,
    pub(crate) statements: Vec<Statement>,
    pub(crate) registry: HashMap<String, StatementId>,
    pub(crate) forward: NestedIndex<Subject>,
    pub(crate) inverse: NestedIndex<EntityId>,
    pub(crate) by_relation: HashMap<EntityId, Vec<StatementId>>,
    pub(crate) by_scope: HashMap<EntityId, Vec<StatementId>>,
    pub(crate) log: Vec<StatementId>,
    pub(crate) modules: ModuleRegistry,
    pub(crate) context: ModuleStack,
    pub(crate) kind_methods: HashMap<EntityKind, BTreeMap<String, Method>>,
}

/// A copy of every index, for comparing store states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSnapshot {
    items: HashMap<String, EntityId>,
    relations: HashMap<String, EntityId>,
    registry: HashMap<String, StatementId>,
    forward: NestedIndex<Subject>,
    inverse: NestedIndex<EntityId>,
    by_relation: HashMap<EntityId, Vec<StatementId>>,
    by_scope: HashMap<EntityId, Vec<StatementId>>,
    log: Vec<StatementId>,
}

impl IndexSnapshot {
    /// Number of live statements (both roles) in the snapshot.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of live entities in the snapshot.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.items.len() + self.relations.len()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("builtin_uri", &self.config.builtin_uri)
            .field("items", &self.items.len())
            .field("relations", &self.relations.len())
            .field("statements", &self.registry.len())
            .field("modules", &self.modules.len())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

fn arena_index(len: usize, arena: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| StoreError::InternalConsistency {
        context: format!("{arena} arena"),
        detail: "handle space exhausted".to_owned(),
    })
}

fn remove_id(list: &mut Vec<StatementId>, id: StatementId) {
    if let Some(pos) = list.iter().position(|s| *s == id) {
        list.remove(pos);
    }
}

fn remove_flat<K: Hash + Eq>(index: &mut HashMap<K, Vec<StatementId>>, key: &K, id: StatementId) {
    if let Some(list) = index.get_mut(key) {
        remove_id(list, id);
        if list.is_empty() {
            index.remove(key);
        }
    }
}

fn remove_nested<K: Hash + Eq>(
    index: &mut NestedIndex<K>,
    key: &K,
    relation: EntityId,
    id: StatementId,
) {
    if let Some(by_rel) = index.get_mut(key) {
        if let Some(list) = by_rel.get_mut(&relation) {
            remove_id(list, id);
            if list.is_empty() {
                by_rel.remove(&relation);
            }
        }
        if by_rel.is_empty() {
            index.remove(key);
        }
    }
}

fn flatten(by_rel: Option<&BTreeMap<EntityId, Vec<StatementId>>>, relation: Option<EntityId>) -> Vec<StatementId> {
    let Some(by_rel) = by_rel else {
        return Vec::new();
    };
    match relation {
        Some(rel) => by_rel.get(&rel).cloned().unwrap_or_default(),
        None => by_rel.values().flatten().copied().collect(),
    }
}

impl Store {
    /// Creates a store holding only the builtin vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if `config` is invalid.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let builtin_uri = config.builtin_uri.clone();
        let mut store = Self {
            config,
            entities: Vec::new(),
            items: HashMap::new(),
            relations: HashMap::new(),
            statements: Vec::new(),
            registry: HashMap::new(),
            forward: HashMap::new(),
            inverse: HashMap::new(),
            by_relation: HashMap::new(),
            by_scope: HashMap::new(),
            log: Vec::new(),
            modules: ModuleRegistry::default(),
            context: ModuleStack::default(),
            kind_methods: HashMap::new(),
        };
        store.register(ModuleRegistration::new(builtin_uri))?;
        builtins::bootstrap(&mut store)?;
        Ok(store)
    }

    /// Creates a store with [`StoreConfig::default`].
    ///
    /// # Errors
    ///
    /// Only fails if the builtin vocabulary cannot be created, which
    /// indicates a defect.
    pub fn with_defaults() -> Result<Self> {
        Self::new(StoreConfig::default())
    }

    /// The configuration the store was created with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // --- creation ---------------------------------------------------------

    /// Creates an item in the active module.
    ///
    /// `key` must be a bare item key (`I1234`). Each `(relation, value)`
    /// pair becomes a statement about the new item; a [`Value::Sequence`]
    /// becomes one statement per element. Behavior is inherited from the
    /// item's class and parent class once the statements exist.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NoActiveModule`] / [`StoreError::ModuleNotLoaded`] if
    ///   no registered module is active.
    /// - [`StoreError::InvalidKey`] for a malformed, prefixed or labeled key
    ///   or a relation key.
    /// - [`StoreError::DuplicateUri`] if the key is taken in the module.
    /// - The validation errors of [`Store::create_statement`].
    pub fn create_item(
        &mut self,
        key: &str,
        relations: impl IntoIterator<Item = (EntityId, Value)>,
    ) -> Result<EntityId> {
        self.create_entity(EntityKind::Item, key, relations)
    }

    /// Creates a relation in the active module.
    ///
    /// # Errors
    ///
    /// As [`Store::create_item`], with `key` being a relation key (`R1234`).
    pub fn create_relation(
        &mut self,
        key: &str,
        relations: impl IntoIterator<Item = (EntityId, Value)>,
    ) -> Result<EntityId> {
        self.create_entity(EntityKind::Relation, key, relations)
    }

    fn create_entity(
        &mut self,
        kind: EntityKind,
        key: &str,
        relations: impl IntoIterator<Item = (EntityId, Value)>,
    ) -> Result<EntityId> {
        let module_uri = self.context.active()?.to_owned();
        self.modules.record(&module_uri)?;

        let parsed = parse_key(key)?;
        if parsed.prefix.is_some() || parsed.label.is_some() {
            return Err(StoreError::InvalidKey {
                key: key.to_owned(),
                reason: "entities are created with a bare short key",
            });
        }
        if parsed.kind != kind {
            return Err(StoreError::InvalidKey {
                key: key.to_owned(),
                reason: match kind {
                    EntityKind::Item => "item keys start with `I`",
                    EntityKind::Relation => "relation keys start with `R`",
                },
            });
        }
        let uri = self.config.make_uri(&module_uri, &parsed.short_key);
        if self.items.contains_key(&uri) || self.relations.contains_key(&uri) {
            return Err(StoreError::DuplicateUri { uri });
        }

        let mut pending: Vec<(EntityId, Object)> = Vec::new();
        for (relation, value) in relations {
            let values = match value {
                Value::Sequence(values) => values,
                single => vec![single],
            };
            for value in values {
                let object = self.validate_object(relation, value)?;
                self.check_uniqueness(None, &uri, relation, &object, &pending)?;
                pending.push((relation, object));
            }
        }
        self.modules.record(&module_uri)?.reservoir.ensure(pending.len())?;

        let id = EntityId(arena_index(self.entities.len(), "entity")?);
        let entity = Entity::new(id, kind, parsed.short_key, module_uri.clone(), uri.clone());
        self.entities.push(Some(entity));
        match kind {
            EntityKind::Item => self.items.insert(uri.clone(), id),
            EntityKind::Relation => self.relations.insert(uri.clone(), id),
        };
        self.modules.record_mut(&module_uri)?.entities.push(id);

        let statement_count = pending.len();
        for (relation, object) in pending {
            self.insert_statement(Subject::Entity(id), relation, object, None, None)?;
        }
        self.inherit_behavior(id)?;

        debug!(uri = %uri, kind = kind.as_str(), statements = statement_count, "created entity");
        Ok(id)
    }

    /// Creates a statement `subject relation value` in the active module.
    ///
    /// With a scope, the statement is registered under the scope and gets a
    /// "has defining scope" qualifier. With a proxy item, it gets a "has
    /// proxy item" qualifier. Explicit qualifiers are created in between, in
    /// the given order. Returns the forward statement.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NoActiveModule`] / [`StoreError::ModuleNotLoaded`] if
    ///   no registered module is active.
    /// - [`StoreError::NotFound`] if an entity handle is dead.
    /// - [`StoreError::TypeMismatch`] if `relation` is an item, a value is a
    ///   sequence, or `scope` is not a scope item.
    /// - [`StoreError::UnsupportedLanguage`] for an unknown language tag.
    /// - [`StoreError::UniquenessViolation`] if a functional relation already
    ///   has a value.
    /// - [`StoreError::ReservoirExhausted`] if the module has no keys left.
    ///
    /// Nothing is modified when an error is returned.
    pub fn create_statement(
        &mut self,
        subject: EntityId,
        relation: EntityId,
        value: impl Into<Value>,
        options: StatementOptions,
    ) -> Result<StatementId> {
        let module_uri = self.context.active()?.to_owned();
        self.modules.record(&module_uri)?;

        let subject_uri = self.entity(subject)?.uri.clone();
        let object = self.validate_object(relation, value.into())?;
        self.check_uniqueness(Some(Subject::Entity(subject)), &subject_uri, relation, &object, &[])?;

        let mut qualifiers: Vec<(EntityId, Object)> = Vec::new();
        if let Some(scope) = options.scope {
            self.expect_scope(scope)?;
            qualifiers.push((HAS_DEFINING_SCOPE, Object::Entity(scope)));
        }
        for qualifier in options.qualifiers {
            let object = self.validate_object(qualifier.relation, qualifier.value)?;
            self.check_uniqueness(None, &subject_uri, qualifier.relation, &object, &qualifiers)?;
            qualifiers.push((qualifier.relation, object));
        }
        if let Some(proxy) = options.proxy {
            self.entity(proxy)?;
            let object = Object::Entity(proxy);
            self.check_uniqueness(None, &subject_uri, HAS_PROXY_ITEM, &object, &qualifiers)?;
            qualifiers.push((HAS_PROXY_ITEM, object));
        }
        self.modules
            .record(&module_uri)?
            .reservoir
            .ensure(1 + qualifiers.len())?;

        let id = self.insert_statement(
            Subject::Entity(subject),
            relation,
            object,
            options.scope,
            options.proxy,
        )?;
        for (qualifier_relation, qualifier_object) in qualifiers {
            let qualifier = self.insert_statement(
                Subject::Statement(id),
                qualifier_relation,
                qualifier_object,
                None,
                None,
            )?;
            self.statement_mut(id)?.qualifiers.push(qualifier);
        }

        debug!(statement = %self.statement(id)?.uri, subject = %subject_uri, "created statement");
        Ok(id)
    }

    /// Shorthand for [`Store::create_statement`] without scope, qualifiers or
    /// proxy.
    ///
    /// # Errors
    ///
    /// As [`Store::create_statement`].
    pub fn set_relation(
        &mut self,
        subject: EntityId,
        relation: EntityId,
        value: impl Into<Value>,
    ) -> Result<StatementId> {
        self.create_statement(subject, relation, value, StatementOptions::new())
    }

    /// Checks a statement object: `relation` must be a live relation, the
    /// value a single entity or literal with a supported language.
    fn validate_object(&self, relation: EntityId, value: Value) -> Result<Object> {
        let relation_uri = self.expect_relation(relation)?.uri.clone();
        match value {
            Value::Sequence(values) => Err(StoreError::TypeMismatch {
                context: relation_uri,
                expected: "a single entity or literal",
                found: format!("sequence of {} values", values.len()),
            }),
            Value::Entity(id) => {
                self.entity(id)?;
                Ok(Object::Entity(id))
            }
            Value::Literal(literal) => {
                if let Some(tag) = literal.language() {
                    if !self.config.supports_language(tag) {
                        return Err(StoreError::UnsupportedLanguage { tag: tag.to_owned() });
                    }
                }
                Ok(Object::Literal(literal))
            }
        }
    }

    /// Fails if adding `object` under `relation` would give `subject` two
    /// values of a functional relation, counting statements not yet
    /// inserted in `pending`.
    fn check_uniqueness(
        &self,
        subject: Option<Subject>,
        subject_uri: &str,
        relation: EntityId,
        object: &Object,
        pending: &[(EntityId, Object)],
    ) -> Result<()> {
        let functionality = self.functionality(relation);
        if functionality == Functionality::Multi {
            return Ok(());
        }
        let existing = subject
            .and_then(|s| self.forward.get(&s))
            .and_then(|by_rel| by_rel.get(&relation))
            .into_iter()
            .flatten()
            .filter_map(|id| self.statements.get(id.index()))
            .map(|stmt| &stmt.object);
        let queued = pending
            .iter()
            .filter(|(rel, _)| *rel == relation)
            .map(|(_, obj)| obj);
        let language = self.effective_language(object);
        let conflict = existing.chain(queued).any(|other| match functionality {
            Functionality::PerLanguage => self.effective_language(other) == language,
            _ => true,
        });
        if conflict {
            return Err(StoreError::UniquenessViolation {
                subject: subject_uri.to_owned(),
                relation: self.entity(relation)?.uri.clone(),
            });
        }
        Ok(())
    }

    fn expect_scope(&self, scope: EntityId) -> Result<()> {
        let entity = self.entity(scope)?;
        let class = self.relation_value(scope, IS_INSTANCE_OF)?.entity();
        if !entity.is_item() || class != Some(SCOPE) {
            return Err(StoreError::TypeMismatch {
                context: entity.uri.clone(),
                expected: "a scope item",
                found: match class {
                    Some(class) => format!("instance of {}", self.entity(class)?.uri),
                    None => entity.kind.as_str().to_owned(),
                },
            });
        }
        Ok(())
    }

    /// Inserts a validated statement (and its dual) into every index.
    ///
    /// Pops one key from the active module's reservoir.
    pub(crate) fn insert_statement(
        &mut self,
        subject: Subject,
        relation: EntityId,
        object: Object,
        scope: Option<EntityId>,
        proxy: Option<EntityId>,
    ) -> Result<StatementId> {
        let module_uri = self.context.active()?.to_owned();
        let number = self.modules.record_mut(&module_uri)?.reservoir.pop()?;
        let key = format!("RE{number}");

        let id = StatementId(arena_index(self.statements.len(), "statement")?);
        let uri = self
            .config
            .make_uri(&module_uri, &format!("{key}:{}", Role::Forward.suffix()));
        let dual = match &object {
            Object::Entity(_) => Some(StatementId(arena_index(self.statements.len() + 1, "statement")?)),
            Object::Literal(_) => None,
        };
        self.registry.insert(uri.clone(), id);
        self.statements.push(Statement {
            id,
            key: key.clone(),
            uri,
            module_uri: module_uri.clone(),
            subject,
            relation,
            object: object.clone(),
            role: Role::Forward,
            scope,
            proxy,
            qualifiers: Vec::new(),
            dual,
            unlinked: false,
        });
        self.forward
            .entry(subject)
            .or_default()
            .entry(relation)
            .or_default()
            .push(id);
        self.by_relation.entry(relation).or_default().push(id);
        self.log.push(id);
        if let Some(scope) = scope {
            self.by_scope.entry(scope).or_default().push(id);
        }

        if let (Some(dual_id), Some(target)) = (dual, object.as_entity()) {
            let dual_uri = self
                .config
                .make_uri(&module_uri, &format!("{key}:{}", Role::Inverse.suffix()));
            self.registry.insert(dual_uri.clone(), dual_id);
            self.inverse
                .entry(target)
                .or_default()
                .entry(relation)
                .or_default()
                .push(dual_id);
            self.statements.push(Statement {
                id: dual_id,
                key,
                uri: dual_uri,
                module_uri: module_uri.clone(),
                subject,
                relation,
                object,
                role: Role::Inverse,
                scope,
                proxy,
                qualifiers: Vec::new(),
                dual: Some(id),
                unlinked: false,
            });
        }

        self.modules.record_mut(&module_uri)?.statements.push(id);
        Ok(id)
    }

    // --- removal ----------------------------------------------------------

    /// Removes a statement, its dual and its qualifiers from every index.
    ///
    /// Unlinking an already unlinked statement does nothing. Unlinking a
    /// "has proxy item" qualifier clears the proxy of its parent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `id` was never issued by this store.
    pub fn unlink(&mut self, id: StatementId) -> Result<()> {
        let stmt = self.statement(id)?;
        if stmt.unlinked {
            return Ok(());
        }
        let Statement {
            subject,
            relation,
            role,
            scope,
            dual,
            ref object,
            ref qualifiers,
            ref uri,
            ..
        } = *stmt;
        let target = object.as_entity();
        let qualifiers = qualifiers.clone();
        let uri = uri.clone();

        match role {
            Role::Forward => {
                if let Subject::Statement(parent) = subject {
                    let parent = self.statement_mut(parent)?;
                    parent.qualifiers.retain(|q| *q != id);
                    if relation == HAS_PROXY_ITEM {
                        parent.proxy = None;
                        if let Some(parent_dual) = parent.dual {
                            self.statement_mut(parent_dual)?.proxy = None;
                        }
                    }
                }
                remove_id(&mut self.log, id);
                remove_nested(&mut self.forward, &subject, relation, id);
                remove_flat(&mut self.by_relation, &relation, id);
                if let Some(scope) = scope {
                    remove_flat(&mut self.by_scope, &scope, id);
                }
            }
            Role::Inverse => {
                if let Some(target) = target {
                    remove_nested(&mut self.inverse, &target, relation, id);
                }
            }
        }
        self.statement_mut(id)?.unlinked = true;

        if let Some(dual) = dual {
            self.unlink(dual)?;
        }
        for qualifier in qualifiers {
            self.unlink(qualifier)?;
        }
        self.registry.remove(&uri);
        debug!(statement = %uri, "unlinked statement");
        Ok(())
    }

    // --- reads ------------------------------------------------------------

    /// Looks up a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the entity was removed or never
    /// existed.
    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| StoreError::NotFound { key: id.to_string() })
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| StoreError::NotFound { key: id.to_string() })
    }

    /// Returns true if `id` refers to a live entity.
    #[must_use]
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entity(id).is_ok()
    }

    pub(crate) fn expect_relation(&self, id: EntityId) -> Result<&Entity> {
        let entity = self.entity(id)?;
        if !entity.is_relation() {
            return Err(StoreError::TypeMismatch {
                context: entity.uri.clone(),
                expected: "a relation",
                found: entity.kind.as_str().to_owned(),
            });
        }
        Ok(entity)
    }

    /// Looks up a statement, including unlinked ones.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `id` was never issued by this store.
    pub fn statement(&self, id: StatementId) -> Result<&Statement> {
        self.statements
            .get(id.index())
            .ok_or_else(|| StoreError::NotFound { key: id.to_string() })
    }

    fn statement_mut(&mut self, id: StatementId) -> Result<&mut Statement> {
        self.statements
            .get_mut(id.index())
            .ok_or_else(|| StoreError::NotFound { key: id.to_string() })
    }

    /// Resolves a key string to an entity.
    ///
    /// Accepts short (`I1234`), labeled (`I1234__label`) and prefixed
    /// (`ct__I1234`) keys. Unprefixed keys are looked up in `module` (or the
    /// active module if `None`) and then among the builtins. A label part
    /// must match the entity's label.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidKey`] for a malformed key.
    /// - [`StoreError::UnknownPrefix`] if the prefix is bound to no module.
    /// - [`StoreError::NotFound`] if no entity has the key.
    /// - [`StoreError::LabelMismatch`] if the label part is wrong.
    pub fn get_entity(&self, key: &str, module: Option<&str>) -> Result<EntityId> {
        let parsed = parse_key(key)?;
        let module_uri = match (&parsed.prefix, module) {
            (Some(prefix), _) => Some(self.modules.uri_for_prefix(prefix).ok_or_else(|| {
                StoreError::UnknownPrefix {
                    prefix: prefix.clone(),
                }
            })?),
            (None, Some(module)) => Some(module),
            (None, None) => self.context.active().ok(),
        };

        let index = match parsed.kind {
            EntityKind::Item => &self.items,
            EntityKind::Relation => &self.relations,
        };
        let builtin = Some(self.config.builtin_uri.as_str());
        let candidates = if parsed.prefix.is_some() {
            vec![module_uri]
        } else {
            vec![module_uri, builtin]
        };
        let id = candidates
            .into_iter()
            .flatten()
            .find_map(|m| index.get(&self.config.make_uri(m, &parsed.short_key)).copied())
            .ok_or_else(|| StoreError::NotFound { key: key.to_owned() })?;

        if let Some(key_label) = &parsed.label {
            let label = self.label(id).unwrap_or_default();
            if !label_matches(key_label, &label) {
                return Err(StoreError::LabelMismatch {
                    key: key.to_owned(),
                    expected: label,
                });
            }
        }
        Ok(id)
    }

    /// Looks up an entity by its full URI.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no live entity has the URI.
    pub fn get_entity_by_uri(&self, uri: &str) -> Result<EntityId> {
        self.items
            .get(uri)
            .or_else(|| self.relations.get(uri))
            .copied()
            .ok_or_else(|| StoreError::NotFound { key: uri.to_owned() })
    }

    /// Looks up a live statement by its URI.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no live statement has the URI.
    pub fn get_statement_by_uri(&self, uri: &str) -> Result<StatementId> {
        self.registry
            .get(uri)
            .copied()
            .ok_or_else(|| StoreError::NotFound { key: uri.to_owned() })
    }

    /// Label of an entity in the default language, if it has one.
    #[must_use]
    pub fn label(&self, id: EntityId) -> Option<String> {
        self.relation_value(id, builtins::HAS_LABEL)
            .ok()
            .and_then(|value| value.as_str().map(str::to_owned))
    }

    /// Forward statements of `entity`, for one relation or all of them.
    ///
    /// Per relation, statements are in creation order.
    #[must_use]
    pub fn get_statements(&self, entity: EntityId, relation: Option<EntityId>) -> Vec<StatementId> {
        flatten(self.forward.get(&Subject::Entity(entity)), relation)
    }

    /// Inverse statements pointing at `entity`, for one relation or all.
    #[must_use]
    pub fn get_inverse_statements(
        &self,
        entity: EntityId,
        relation: Option<EntityId>,
    ) -> Vec<StatementId> {
        flatten(self.inverse.get(&entity), relation)
    }

    /// Entities `x` for which `x relation entity` holds.
    #[must_use]
    pub fn inverse_subjects(&self, entity: EntityId, relation: EntityId) -> Vec<EntityId> {
        self.get_inverse_statements(entity, Some(relation))
            .into_iter()
            .filter_map(|id| self.statements.get(id.index()))
            .filter_map(|stmt| stmt.subject.as_entity())
            .collect()
    }

    /// Qualifiers of a statement; for an inverse statement, those of its
    /// forward counterpart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `id` was never issued.
    pub fn qualifiers_of(&self, id: StatementId) -> Result<Vec<StatementId>> {
        let stmt = self.statement(id)?;
        let forward = match (stmt.role, stmt.dual) {
            (Role::Inverse, Some(dual)) => self.statement(dual)?,
            _ => stmt,
        };
        Ok(forward.qualifiers.clone())
    }

    /// Forward statements defined inside `scope`.
    #[must_use]
    pub fn scope_statements(&self, scope: EntityId) -> Vec<StatementId> {
        self.by_scope.get(&scope).cloned().unwrap_or_default()
    }

    /// Forward statements using `relation` as predicate, in creation order.
    #[must_use]
    pub fn statements_of_relation(&self, relation: EntityId) -> Vec<StatementId> {
        self.by_relation.get(&relation).cloned().unwrap_or_default()
    }

    /// Forward statements in creation order.
    #[must_use]
    pub fn log(&self) -> &[StatementId] {
        &self.log
    }

    /// Live entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().flatten()
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.items.len() + self.relations.len()
    }

    /// Number of live statements, counting both sides of dual pairs.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.registry.len()
    }

    /// URI of a statement subject.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for a dead entity or unknown statement.
    pub fn subject_uri(&self, subject: Subject) -> Result<&str> {
        match subject {
            Subject::Entity(id) => Ok(self.entity(id)?.uri()),
            Subject::Statement(id) => Ok(self.statement(id)?.uri()),
        }
    }

    /// Copies every index.
    #[must_use]
    pub fn index_snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            items: self.items.clone(),
            relations: self.relations.clone(),
            registry: self.registry.clone(),
            forward: self.forward.clone(),
            inverse: self.inverse.clone(),
            by_relation: self.by_relation.clone(),
            by_scope: self.by_scope.clone(),
            log: self.log.clone(),
        }
    }

    // --- integrity --------------------------------------------------------

    /// Verifies that every index only references live, mutually consistent
    /// entities and statements.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InternalConsistency`] describing the first
    /// dangling reference found.
    pub fn check_integrity(&self) -> Result<()> {
        let fail = |detail: String| {
            Err(StoreError::InternalConsistency {
                context: "integrity check".to_owned(),
                detail,
            })
        };
        let live = |id: &StatementId| {
            self.statements
                .get(id.index())
                .filter(|stmt| !stmt.unlinked)
        };
        let subject_live = |subject: &Subject| match subject {
            Subject::Entity(e) => self.contains_entity(*e),
            Subject::Statement(s) => live(s).is_some(),
        };

        for (uri, id) in self.items.iter().chain(&self.relations) {
            match self.entity(*id) {
                Ok(entity) if entity.uri == *uri => {}
                _ => return fail(format!("entity index entry `{uri}` is dangling")),
            }
        }
        for (uri, id) in &self.registry {
            match live(id) {
                Some(stmt) if stmt.uri == *uri => {}
                _ => return fail(format!("registry entry `{uri}` is dangling")),
            }
        }
        for (subject, by_rel) in &self.forward {
            if !subject_live(subject) {
                return fail(format!("forward index keeps dead subject {subject:?}"));
            }
            for (relation, ids) in by_rel {
                for id in ids {
                    match live(id) {
                        Some(stmt)
                            if stmt.role == Role::Forward
                                && stmt.subject == *subject
                                && stmt.relation == *relation => {}
                        _ => return fail(format!("forward index keeps {id}")),
                    }
                }
            }
        }
        for (target, by_rel) in &self.inverse {
            for (relation, ids) in by_rel {
                for id in ids {
                    match live(id) {
                        Some(stmt)
                            if stmt.role == Role::Inverse
                                && stmt.object.as_entity() == Some(*target)
                                && stmt.relation == *relation => {}
                        _ => return fail(format!("inverse index keeps {id}")),
                    }
                }
            }
        }
        let flat = self
            .by_relation
            .values()
            .chain(self.by_scope.values())
            .flatten()
            .chain(&self.log);
        for id in flat {
            if live(id).is_none() {
                return fail(format!("relation, scope or log index keeps {id}"));
            }
        }

        for stmt in self.statements.iter().filter(|s| !s.unlinked) {
            if !self.registry.contains_key(&stmt.uri) {
                return fail(format!("{} is live but unregistered", stmt.uri));
            }
            if !subject_live(&stmt.subject) || !self.contains_entity(stmt.relation) {
                return fail(format!("{} references a dead subject or relation", stmt.uri));
            }
            let referenced = [stmt.object.as_entity(), stmt.scope, stmt.proxy];
            if referenced.into_iter().flatten().any(|e| !self.contains_entity(e)) {
                return fail(format!("{} references a dead entity", stmt.uri));
            }
            match (&stmt.object, stmt.dual) {
                (Object::Entity(_), Some(dual)) => match live(&dual) {
                    Some(other) if other.dual == Some(stmt.id) && other.role == stmt.role.flip() => {}
                    _ => return fail(format!("{} has an asymmetric dual", stmt.uri)),
                },
                (Object::Literal(_), None) => {}
                _ => return fail(format!("{} has a dual that does not fit its object", stmt.uri)),
            }
            if stmt.qualifiers.iter().any(|q| live(q).is_none()) {
                return fail(format!("{} keeps an unlinked qualifier", stmt.uri));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{HAS_DESCRIPTION, HAS_LABEL, IS_FUNCTIONAL};
    use crate::model::Literal;

    const MODULE: &str = "local/store_test";

    fn store() -> Store {
        let mut store = Store::with_defaults().unwrap();
        store.register_module(MODULE, None).unwrap();
        store
    }

    #[test]
    fn builtin_store_is_consistent() {
        let store = Store::with_defaults().unwrap();
        store.check_integrity().unwrap();
        assert!(store.entity_count() > 0);
        assert_eq!(store.context_depth(), 0);
    }

    #[test]
    fn entity_uri_is_module_uri_and_key() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let id = scope.create_item("I1000", []).unwrap();
        assert_eq!(scope.entity(id).unwrap().uri(), "local/store_test#I1000");
        assert_eq!(scope.entity(id).unwrap().module_uri(), MODULE);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        scope.create_item("I1000", []).unwrap();
        assert!(matches!(
            scope.create_item("I1000", []),
            Err(StoreError::DuplicateUri { .. })
        ));
    }

    #[test]
    fn key_kind_must_match() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        assert!(matches!(
            scope.create_item("R1000", []),
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(matches!(
            scope.create_relation("I1000__label", []),
            Err(StoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn creation_without_module_fails() {
        let mut store = store();
        assert!(matches!(
            store.create_item("I1000", []),
            Err(StoreError::NoActiveModule)
        ));
    }

    #[test]
    fn entity_statement_has_symmetric_dual() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let rel = scope.create_relation("R1000", []).unwrap();
        let a = scope.create_item("I1000", []).unwrap();
        let b = scope.create_item("I1001", []).unwrap();
        let id = scope.set_relation(a, rel, b).unwrap();

        let stmt = scope.statement(id).unwrap();
        let dual = scope.statement(stmt.dual().unwrap()).unwrap();
        assert_eq!(dual.dual(), Some(id));
        assert_eq!(dual.role(), Role::Inverse);
        assert_eq!(dual.key(), stmt.key());
        assert!(stmt.uri().ends_with(":S"));
        assert!(dual.uri().ends_with(":O"));
        assert_eq!(scope.get_inverse_statements(b, Some(rel)), vec![dual.id()]);
        assert_eq!(scope.inverse_subjects(b, rel), vec![a]);
        scope.check_integrity().unwrap();
    }

    #[test]
    fn literal_statement_has_no_dual() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let a = scope.create_item("I1000", []).unwrap();
        let id = scope.set_relation(a, HAS_DESCRIPTION, "plain text").unwrap();
        assert_eq!(scope.statement(id).unwrap().dual(), None);
    }

    #[test]
    fn rejected_write_changes_nothing() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let rel = scope
            .create_relation("R1000", [(IS_FUNCTIONAL, Value::from(true))])
            .unwrap();
        let a = scope.create_item("I1000", []).unwrap();
        scope.set_relation(a, rel, "a").unwrap();
        let before = scope.index_snapshot();

        let err = scope.set_relation(a, rel, "b").unwrap_err();
        assert!(matches!(err, StoreError::UniquenessViolation { .. }));
        assert_eq!(scope.index_snapshot(), before);
    }

    #[test]
    fn functional_duplicates_in_one_batch_are_rejected() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let before = scope.index_snapshot();
        let err = scope
            .create_item(
                "I1000",
                [
                    (HAS_LABEL, Value::from("first")),
                    (HAS_LABEL, Value::from("second")),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::UniquenessViolation { .. }));
        assert_eq!(scope.index_snapshot(), before);
    }

    #[test]
    fn unsupported_language_is_rejected() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let a = scope.create_item("I1000", []).unwrap();
        let err = scope
            .set_relation(a, HAS_LABEL, Literal::lang("article", "fr"))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedLanguage { tag } if tag == "fr"));
    }

    #[test]
    fn item_is_not_a_relation() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let a = scope.create_item("I1000", []).unwrap();
        let b = scope.create_item("I1001", []).unwrap();
        assert!(matches!(
            scope.set_relation(a, b, "x"),
            Err(StoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn unlink_is_idempotent() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let rel = scope.create_relation("R1000", []).unwrap();
        let a = scope.create_item("I1000", []).unwrap();
        let b = scope.create_item("I1001", []).unwrap();
        let id = scope.set_relation(a, rel, b).unwrap();

        scope.unlink(id).unwrap();
        let after_first = scope.index_snapshot();
        scope.unlink(id).unwrap();
        assert_eq!(scope.index_snapshot(), after_first);

        let dual = scope.statement(id).unwrap().dual().unwrap();
        assert!(scope.statement(dual).unwrap().is_unlinked());
        assert!(scope.get_statements(a, Some(rel)).is_empty());
        assert!(scope.get_inverse_statements(b, None).is_empty());
        scope.check_integrity().unwrap();
    }

    #[test]
    fn unlink_from_inverse_side_removes_pair() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let rel = scope.create_relation("R1000", []).unwrap();
        let a = scope.create_item("I1000", []).unwrap();
        let b = scope.create_item("I1001", []).unwrap();
        let id = scope.set_relation(a, rel, b).unwrap();
        let dual = scope.statement(id).unwrap().dual().unwrap();

        scope.unlink(dual).unwrap();
        assert!(scope.statement(id).unwrap().is_unlinked());
        assert!(!scope.log().contains(&id));
    }

    #[test]
    fn get_entity_resolves_keys() {
        let mut store = store();
        let mut scope = store.enter_module(MODULE);
        let a = scope
            .create_item("I1000", [(HAS_LABEL, Value::from("dynamical system"))])
            .unwrap();
        assert_eq!(scope.get_entity("I1000", None).unwrap(), a);
        assert_eq!(scope.get_entity("I1000__Dynamical_System", None).unwrap(), a);
        assert!(matches!(
            scope.get_entity("I1000__static_system", None),
            Err(StoreError::LabelMismatch { .. })
        ));
        assert_eq!(scope.get_entity("R1", None).unwrap(), HAS_LABEL);
        assert!(matches!(
            scope.get_entity("I9999", None),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            scope.get_entity("nope__I1000", None),
            Err(StoreError::UnknownPrefix { .. })
        ));
    }
}
