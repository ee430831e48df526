//! Key strings.
//!
//! Entities are addressed by short keys such as `I1234` or `R17`. Keys drawn
//! automatically from a reservoir carry an `a` marker (`Ia8391`). For
//! readability a key may be followed by its label (`I1234__dynamical_system`)
//! and preceded by a module prefix (`ct__I1234` or `ct__I1234__dynamical_system`).

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, StoreError};
use crate::model::EntityKind;

const DELIMITER: &str = "__";

/// A key string split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    /// Module prefix, if the key was namespaced.
    pub prefix: Option<String>,
    /// The short key (`I1234`, `Ra12`).
    pub short_key: String,
    /// Item or relation, from the leading character.
    pub kind: EntityKind,
    /// Label part, if present.
    pub label: Option<String>,
}

// The pattern is a literal, so compilation cannot fail at runtime.
#[allow(clippy::unwrap_used)]
fn short_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([IR])a?\d+$").unwrap())
}

/// Returns the entity kind if `candidate` is a bare short key.
#[must_use]
pub fn short_key_kind(candidate: &str) -> Option<EntityKind> {
    let caps = short_key_regex().captures(candidate)?;
    match caps.get(1)?.as_str() {
        "I" => Some(EntityKind::Item),
        _ => Some(EntityKind::Relation),
    }
}

/// Splits a key string into prefix, short key and label.
///
/// # Errors
///
/// Returns [`StoreError::InvalidKey`] if no short key can be found or a
/// prefix or label part is empty.
///
/// ```
/// use kgraph_store::keys::parse_key;
///
/// let key = parse_key("ct__I4466__systems_theory").unwrap();
/// assert_eq!(key.prefix.as_deref(), Some("ct"));
/// assert_eq!(key.short_key, "I4466");
/// assert_eq!(key.label.as_deref(), Some("systems_theory"));
/// ```
pub fn parse_key(key_str: &str) -> Result<ParsedKey> {
    let invalid = |reason| StoreError::InvalidKey {
        key: key_str.to_owned(),
        reason,
    };

    let parts: Vec<&str> = key_str.splitn(3, DELIMITER).collect();
    let (prefix, short_key, label) = if short_key_kind(parts[0]).is_some() {
        let label = key_str
            .strip_prefix(parts[0])
            .and_then(|rest| rest.strip_prefix(DELIMITER));
        (None, parts[0], label)
    } else if parts.len() >= 2 && short_key_kind(parts[1]).is_some() {
        (Some(parts[0]), parts[1], parts.get(2).copied())
    } else if key_str.contains(DELIMITER) || !key_str.contains('_') {
        return Err(invalid("expected a short key like `I1234` or `R12`"));
    } else {
        return Err(invalid("labels must be separated from the key by `__`"));
    };

    if prefix.is_some_and(str::is_empty) {
        return Err(invalid("empty module prefix"));
    }
    if label.is_some_and(str::is_empty) {
        return Err(invalid("empty label"));
    }
    let kind = short_key_kind(short_key).ok_or_else(|| invalid("malformed short key"))?;

    Ok(ParsedKey {
        prefix: prefix.map(str::to_owned),
        short_key: short_key.to_owned(),
        kind,
        label: label.map(str::to_owned),
    })
}

/// Compares the label part of a key with an entity label.
///
/// Spaces in the entity label count as underscores and the comparison is
/// case-insensitive.
#[must_use]
pub fn label_matches(key_label: &str, entity_label: &str) -> bool {
    entity_label.replace(' ', "_").to_lowercase() == key_label.to_lowercase()
}

/// Builds an automatically generated short key (`Ia1234`, `Ra1234`).
#[must_use]
pub fn auto_key(kind: EntityKind, number: u32) -> String {
    format!("{}a{number}", kind.key_prefix())
}
