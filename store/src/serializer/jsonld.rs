//! JSON-LD serializer.
//!
//! Produces a single document with an `@context` that maps every module
//! prefix to its namespace and an `@graph` holding one node per subject, in
//! order of first appearance in the statement log.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::export::TripleObject;
use crate::model::Literal;
use crate::store::Store;

use super::{complex_datatype, double_lexical, XSD_DOUBLE};

/// Serializes every statement of `store` to a JSON-LD `Value`.
///
/// The returned value can be pretty-printed with [`serde_json::to_string_pretty`].
///
/// # Errors
///
/// As [`Store::triples`].
pub fn to_json_ld(store: &Store) -> Result<Value> {
    let context = build_context(store);
    let graph = build_graph(store)?;
    Ok(json!({
        "@context": context,
        "@graph": graph
    }))
}

fn build_context(store: &Store) -> Value {
    let mut ctx = Map::new();
    ctx.insert("xsd".to_owned(), json!("http://www.w3.org/2001/XMLSchema#"));
    let separator = &store.config().uri_separator;
    for uri in store.module_uris() {
        if let Some(prefix) = store.module(uri).and_then(|record| record.prefix()) {
            ctx.insert(prefix.to_owned(), json!(format!("{uri}{separator}")));
        }
    }
    Value::Object(ctx)
}

fn build_graph(store: &Store) -> Result<Value> {
    let complex = complex_datatype(store);
    let mut nodes: Vec<Map<String, Value>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for t in store.triples()? {
        let position = *positions.entry(t.subject.clone()).or_insert_with(|| {
            let mut node = Map::new();
            node.insert("@id".to_owned(), json!(t.subject));
            nodes.push(node);
            nodes.len() - 1
        });
        let object = match &t.object {
            TripleObject::Iri(target) => json!({ "@id": target }),
            TripleObject::Literal(literal) => literal_value(literal, &complex),
        };
        let Some(node) = nodes.get_mut(position) else {
            continue;
        };
        match node.get_mut(&t.predicate) {
            None => {
                node.insert(t.predicate, object);
            }
            Some(Value::Array(values)) => values.push(object),
            Some(existing) => {
                let first = existing.take();
                *existing = json!([first, object]);
            }
        }
    }
    Ok(Value::Array(nodes.into_iter().map(Value::Object).collect()))
}

fn literal_value(literal: &Literal, complex: &str) -> Value {
    match literal {
        Literal::Str { value, lang: Some(tag) } => json!({ "@value": value, "@language": tag }),
        Literal::Str { value, lang: None } => json!(value),
        Literal::Bool { value } => json!(value),
        Literal::Int { value } => json!(value),
        Literal::Float { value } if value.is_finite() => json!(value),
        Literal::Float { value } => json!({ "@value": double_lexical(*value), "@type": XSD_DOUBLE }),
        Literal::Complex { .. } => json!({ "@value": literal.to_string(), "@type": complex }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::HAS_LABEL;
    use crate::module::ModuleRegistration;
    use crate::model::Value as StoreValue;

    #[test]
    fn produces_context_and_graph() {
        let store = Store::with_defaults().unwrap();
        let doc = to_json_ld(&store).unwrap();
        assert!(doc.get("@context").is_some());
        let graph = doc.get("@graph").and_then(Value::as_array).unwrap();
        assert!(!graph.is_empty());
        for node in graph {
            assert!(node.get("@id").is_some());
        }
    }

    #[test]
    fn nodes_group_values_by_predicate() {
        let mut store = Store::with_defaults().unwrap();
        store
            .register(ModuleRegistration::new("local/ld").prefix("ld"))
            .unwrap();
        {
            let mut scope = store.enter_module("local/ld");
            let rel = scope.create_relation("R1000", []).unwrap();
            scope
                .create_item(
                    "I1000",
                    [
                        (HAS_LABEL, StoreValue::from(Literal::lang("Satz", "de"))),
                        (rel, StoreValue::from(vec![1i64, 2, 3])),
                    ],
                )
                .unwrap();
        }
        let doc = to_json_ld(&store).unwrap();
        assert_eq!(doc["@context"]["ld"], json!("local/ld#"));

        let graph = doc["@graph"].as_array().unwrap();
        let node = graph
            .iter()
            .find(|node| node["@id"] == json!("local/ld#I1000"))
            .unwrap();
        assert_eq!(node["local/ld#R1000"], json!([1, 2, 3]));
        assert_eq!(
            node["kgraph:/builtins#R1"],
            json!({ "@value": "Satz", "@language": "de" })
        );
    }
}
