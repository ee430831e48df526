//! Module bookkeeping and unload.
//!
//! Every module owns a key reservoir and remembers which entities and
//! statements were created while it was active. Unloading a module removes
//! all of them, along with every statement elsewhere that points at one of
//! its entities.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::error::{Result, StoreError};
use crate::model::{EntityId, StatementId, Subject};
use crate::reservoir::KeyReservoir;
use crate::store::Store;

/// What to register a module with.
///
/// ```
/// use kgraph_store::{KeyReservoir, ModuleRegistration};
///
/// let registration = ModuleRegistration::new("local/control_theory")
///     .prefix("ct")
///     .source("modules/control_theory.toml")
///     .reservoir(KeyReservoir::with_seed(1000, 9999, 7));
/// assert_eq!(registration.uri(), "local/control_theory");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRegistration {
    uri: String,
    prefix: Option<String>,
    source: Option<PathBuf>,
    reservoir: Option<KeyReservoir>,
}

impl ModuleRegistration {
    /// A registration with the store's default reservoir and no prefix.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            prefix: None,
            source: None,
            reservoir: None,
        }
    }

    /// Binds a prefix usable in keys (`prefix__I1234`).
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Records where the module's content comes from.
    #[must_use]
    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Uses `reservoir` instead of the store's default.
    #[must_use]
    pub fn reservoir(mut self, reservoir: KeyReservoir) -> Self {
        self.reservoir = Some(reservoir);
        self
    }

    /// Module URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Prefix, if any.
    #[must_use]
    pub fn prefix_str(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

/// Per-module bookkeeping.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub(crate) uri: String,
    pub(crate) prefix: Option<String>,
    pub(crate) source: Option<PathBuf>,
    pub(crate) reservoir: KeyReservoir,
    pub(crate) entities: Vec<EntityId>,
    pub(crate) statements: Vec<StatementId>,
}

impl ModuleRecord {
    /// Module URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Source locator, if any.
    #[must_use]
    pub fn source(&self) -> Option<&std::path::Path> {
        self.source.as_deref()
    }

    /// The module's key reservoir.
    #[must_use]
    pub fn reservoir(&self) -> &KeyReservoir {
        &self.reservoir
    }

    /// Entities created in the module, in creation order.
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Forward statements created in the module, in creation order.
    #[must_use]
    pub fn statements(&self) -> &[StatementId] {
        &self.statements
    }
}

/// All registered modules.
#[derive(Debug, Clone, Default)]
pub(crate) struct ModuleRegistry {
    records: HashMap<String, ModuleRecord>,
    prefixes: HashMap<String, String>,
    sources: HashMap<PathBuf, String>,
}

impl ModuleRegistry {
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn get(&self, uri: &str) -> Option<&ModuleRecord> {
        self.records.get(uri)
    }

    pub(crate) fn record(&self, uri: &str) -> Result<&ModuleRecord> {
        self.records.get(uri).ok_or_else(|| StoreError::ModuleNotLoaded {
            uri: uri.to_owned(),
        })
    }

    pub(crate) fn record_mut(&mut self, uri: &str) -> Result<&mut ModuleRecord> {
        self.records
            .get_mut(uri)
            .ok_or_else(|| StoreError::ModuleNotLoaded {
                uri: uri.to_owned(),
            })
    }

    pub(crate) fn uri_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    pub(crate) fn uri_for_source(&self, source: &std::path::Path) -> Option<&str> {
        self.sources.get(source).map(String::as_str)
    }

    fn insert(&mut self, record: ModuleRecord) {
        if let Some(prefix) = &record.prefix {
            self.prefixes.insert(prefix.clone(), record.uri.clone());
        }
        if let Some(source) = &record.source {
            self.sources.insert(source.clone(), record.uri.clone());
        }
        self.records.insert(record.uri.clone(), record);
    }

    fn remove(&mut self, uri: &str) -> Option<ModuleRecord> {
        let record = self.records.remove(uri)?;
        if let Some(prefix) = &record.prefix {
            self.prefixes.remove(prefix);
        }
        if let Some(source) = &record.source {
            self.sources.remove(source);
        }
        Some(record)
    }

    fn uris(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

/// Summary of a completed unload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnloadReport {
    /// Module URI.
    pub uri: String,
    /// Entities removed.
    pub entities: usize,
    /// Statements removed, counting both sides of dual pairs.
    pub statements: usize,
}

impl Store {
    /// Registers a module.
    ///
    /// The builtin module never gets a source mapping.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ModuleAlreadyRegistered`] if the URI is taken.
    /// - [`StoreError::DuplicatePrefix`] if the prefix is bound elsewhere.
    pub fn register(&mut self, registration: ModuleRegistration) -> Result<()> {
        let ModuleRegistration {
            uri,
            prefix,
            source,
            reservoir,
        } = registration;
        if self.modules.get(&uri).is_some() {
            return Err(StoreError::ModuleAlreadyRegistered { uri });
        }
        if let Some(prefix) = &prefix {
            if let Some(owner) = self.modules.uri_for_prefix(prefix) {
                return Err(StoreError::DuplicatePrefix {
                    prefix: prefix.clone(),
                    uri: owner.to_owned(),
                });
            }
        }
        let source = source.filter(|_| uri != self.config.builtin_uri);
        let reservoir = reservoir.unwrap_or_else(|| KeyReservoir::from(&self.config.reservoir));

        info!(
            module = %uri,
            prefix = prefix.as_deref().unwrap_or("-"),
            keys = reservoir.remaining(),
            "registered module"
        );
        self.modules.insert(ModuleRecord {
            uri,
            prefix,
            source,
            reservoir,
            entities: Vec::new(),
            statements: Vec::new(),
        });
        Ok(())
    }

    /// Registers a module with an optional custom reservoir.
    ///
    /// # Errors
    ///
    /// As [`Store::register`].
    pub fn register_module(
        &mut self,
        uri: impl Into<String>,
        reservoir: Option<KeyReservoir>,
    ) -> Result<()> {
        let mut registration = ModuleRegistration::new(uri);
        registration.reservoir = reservoir;
        self.register(registration)
    }

    /// Bookkeeping of a registered module.
    #[must_use]
    pub fn module(&self, uri: &str) -> Option<&ModuleRecord> {
        self.modules.get(uri)
    }

    /// Returns true if `uri` is registered.
    #[must_use]
    pub fn is_registered(&self, uri: &str) -> bool {
        self.modules.get(uri).is_some()
    }

    /// URIs of all registered modules, sorted.
    #[must_use]
    pub fn module_uris(&self) -> Vec<&str> {
        let mut uris: Vec<&str> = self.modules.uris().collect();
        uris.sort_unstable();
        uris
    }

    /// URI of the module bound to `prefix`.
    #[must_use]
    pub fn module_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.modules.uri_for_prefix(prefix)
    }

    /// URI of the module loaded from `source`.
    #[must_use]
    pub fn module_for_source(&self, source: &std::path::Path) -> Option<&str> {
        self.modules.uri_for_source(source)
    }

    /// Unloads a module.
    ///
    /// Removes every entity created in the module together with every
    /// statement that references one of them (as subject, object, predicate
    /// or scope), then every remaining statement created in the module.
    /// Finally drops the module's prefix, source mapping and reservoir.
    /// Keys handed out by the reservoir are not reused.
    ///
    /// With `strict`, unloading a module that has no entities fails and
    /// changes nothing. Without it, unloading an unknown module is a no-op.
    ///
    /// # Errors
    ///
    /// - [`StoreError::PermanentModule`] for the builtin module.
    /// - [`StoreError::ModuleNotLoaded`] in strict mode (see above).
    /// - [`StoreError::InternalConsistency`] if anything of the module
    ///   survives. This is a defect in the store.
    pub fn unload(&mut self, uri: &str, strict: bool) -> Result<UnloadReport> {
        if uri == self.config.builtin_uri {
            warn!(module = %uri, "refusing to unload the builtin module");
            return Err(StoreError::PermanentModule { uri: uri.to_owned() });
        }
        let has_entities = self.modules.get(uri).is_some_and(|r| !r.entities.is_empty());
        if strict && !has_entities {
            return Err(StoreError::ModuleNotLoaded { uri: uri.to_owned() });
        }
        let Some(record) = self.modules.remove(uri) else {
            return Ok(UnloadReport {
                uri: uri.to_owned(),
                entities: 0,
                statements: 0,
            });
        };

        let statements_before = self.registry.len();
        for entity in &record.entities {
            self.unlink_entity(*entity)?;
        }
        for statement in &record.statements {
            self.unlink(*statement)?;
        }
        self.verify_unloaded(uri, &record)?;

        let report = UnloadReport {
            uri: uri.to_owned(),
            entities: record.entities.len(),
            statements: statements_before - self.registry.len(),
        };
        info!(
            module = %uri,
            entities = report.entities,
            statements = report.statements,
            "unloaded module"
        );
        Ok(report)
    }

    /// Unlinks every statement referencing `id` and removes the entity.
    pub(crate) fn unlink_entity(&mut self, id: EntityId) -> Result<()> {
        let entity = self.entity(id)?;
        let uri = entity.uri.clone();
        let is_relation = entity.is_relation();

        let mut doomed: Vec<StatementId> = Vec::new();
        if let Some(by_rel) = self.forward.get(&Subject::Entity(id)) {
            doomed.extend(by_rel.values().flatten());
        }
        if let Some(by_rel) = self.inverse.get(&id) {
            doomed.extend(by_rel.values().flatten());
        }
        if let Some(scoped) = self.by_scope.get(&id) {
            doomed.extend(scoped);
        }
        if is_relation {
            if let Some(used) = self.by_relation.get(&id) {
                doomed.extend(used);
            }
        }
        for statement in doomed {
            self.unlink(statement)?;
        }

        self.items.remove(&uri);
        self.relations.remove(&uri);
        if let Some(slot) = self.entities.get_mut(id.index()) {
            *slot = None;
        }
        Ok(())
    }

    fn verify_unloaded(&self, uri: &str, record: &ModuleRecord) -> Result<()> {
        let fail = |detail: String| {
            error!(module = %uri, %detail, "module unload left dangling references");
            Err(StoreError::InternalConsistency {
                context: format!("unload of `{uri}`"),
                detail,
            })
        };

        if let Some(alive) = record.entities.iter().find(|e| self.contains_entity(**e)) {
            return fail(format!("{alive} is still alive"));
        }
        if let Some(alive) = record
            .statements
            .iter()
            .find(|s| self.statements.get(s.index()).is_some_and(|stmt| !stmt.unlinked))
        {
            return fail(format!("{alive} is still linked"));
        }
        let namespace = format!("{uri}{}", self.config.uri_separator);
        let residue = self
            .items
            .keys()
            .chain(self.relations.keys())
            .chain(self.registry.keys())
            .find(|key| key.starts_with(&namespace));
        if let Some(residue) = residue {
            return fail(format!("`{residue}` is still indexed"));
        }
        if let Err(StoreError::InternalConsistency { detail, .. }) = self.check_integrity() {
            return fail(detail);
        }
        Ok(())
    }
}
