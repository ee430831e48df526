//! Serializers for the exported triple set.
//!
//! - **N-Triples** ([`ntriples`]): one triple per line, for bulk loading and diffs.
//! - **JSON-LD** ([`jsonld`]): one node per subject, with module prefixes in
//!   the `@context` (requires the `serializers` feature).

#[cfg(feature = "serializers")]
pub mod jsonld;
pub mod ntriples;

pub(crate) const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub(crate) const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub(crate) const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub(crate) const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// Datatype IRI of complex number literals in `store`.
pub(crate) fn complex_datatype(store: &crate::Store) -> String {
    let config = store.config();
    config.make_uri(&config.builtin_uri, "complex")
}

/// Lexical form of a double as `xsd:double` spells it.
pub(crate) fn double_lexical(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        if value > 0.0 { "INF" } else { "-INF" }.to_owned()
    } else {
        format!("{value:?}")
    }
}
