//! Error types for the knowledge graph store.
//!
//! Every fallible store operation returns [`StoreError`]. Validation errors
//! are raised before the store is touched, so a failed call never leaves a
//! partial insert behind. The one exception is
//! [`StoreError::InternalConsistency`], which signals a defect in the store
//! itself and is not meant to be handled by callers.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Errors raised by the store, the module lifecycle and key handling.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A key, URI or statement handle does not resolve to anything.
    #[error("nothing found for `{key}`")]
    NotFound {
        /// The key, URI or handle that was looked up.
        key: String,
    },

    /// A second value was written for a functional relation.
    #[error("`{subject}` already has a value for functional relation `{relation}`")]
    UniquenessViolation {
        /// URI of the subject.
        subject: String,
        /// URI of the functional relation.
        relation: String,
    },

    /// A value of an unsupported shape was passed (e.g. a raw sequence as a
    /// statement object, or an item where a relation was expected).
    #[error("type mismatch for `{context}`: expected {expected}, found {found}")]
    TypeMismatch {
        /// The relation or entity the value was passed for.
        context: String,
        /// What the operation accepts.
        expected: &'static str,
        /// What was actually passed.
        found: String,
    },

    /// An entity or statement was created outside of any module context.
    #[error("no active module: enter a module context before creating entities or statements")]
    NoActiveModule,

    /// The module was never registered or has already been unloaded.
    #[error("module `{uri}` is not loaded")]
    ModuleNotLoaded {
        /// Module URI.
        uri: String,
    },

    /// The module URI is already registered.
    #[error("module `{uri}` is already registered")]
    ModuleAlreadyRegistered {
        /// Module URI.
        uri: String,
    },

    /// A prefix is already bound to another module.
    #[error("prefix `{prefix}` is already bound to module `{uri}`")]
    DuplicatePrefix {
        /// The requested prefix.
        prefix: String,
        /// The module currently owning the prefix.
        uri: String,
    },

    /// The builtin module cannot be unloaded.
    #[error("module `{uri}` is permanent and cannot be unloaded")]
    PermanentModule {
        /// Module URI.
        uri: String,
    },

    /// A key reservoir has no keys left.
    #[error("key reservoir [{min}, {max}) is exhausted")]
    ReservoirExhausted {
        /// Lower bound of the reservoir range.
        min: u32,
        /// Exclusive upper bound of the reservoir range.
        max: u32,
    },

    /// A functional-per-language relation has several values in the
    /// requested language.
    #[error("`{subject}` has more than one `{relation}` value for language `{language}`")]
    AmbiguousLanguageResult {
        /// URI of the subject.
        subject: String,
        /// URI of the relation.
        relation: String,
        /// The language tag used for filtering.
        language: String,
    },

    /// The entity has no behavior attached under the requested name.
    #[error("entity `{key}` has no callable `{method}`")]
    NotCallable {
        /// URI of the entity.
        key: String,
        /// Name of the missing callable.
        method: String,
    },

    /// The store's indices disagree with each other. This indicates a defect
    /// in the store, not a usage error.
    #[error("internal consistency violated ({context}): {detail}")]
    InternalConsistency {
        /// The operation that detected the violation.
        context: String,
        /// Description of the dangling reference.
        detail: String,
    },

    /// A key string does not follow the `[prefix__]I1234[__label]` grammar.
    #[error("invalid key `{key}`: {reason}")]
    InvalidKey {
        /// The offending key string.
        key: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The label part of a key does not match the entity's label.
    #[error("label of key `{key}` does not match entity label `{expected}`")]
    LabelMismatch {
        /// The offending key string.
        key: String,
        /// The entity's actual label.
        expected: String,
    },

    /// A key used a prefix that is bound to no module.
    #[error("unknown module prefix `{prefix}`")]
    UnknownPrefix {
        /// The unknown prefix.
        prefix: String,
    },

    /// A literal carries a language tag outside the configured set.
    #[error("unsupported language tag `{tag}`")]
    UnsupportedLanguage {
        /// The rejected tag.
        tag: String,
    },

    /// An entity with the same URI already exists.
    #[error("URI `{uri}` is already in use")]
    DuplicateUri {
        /// The conflicting URI.
        uri: String,
    },

    /// Invalid store configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading or validating a [`StoreConfig`](crate::StoreConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but violates a constraint.
    #[error("invalid config: {0}")]
    Invalid(String),
}
