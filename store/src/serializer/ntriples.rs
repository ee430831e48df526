//! N-Triples serializer.
//!
//! Writes one line per exported triple, in statement-log order. String
//! literals keep their language tag; everything else is typed with an XSD
//! datatype, except complex numbers, which use the builtin `complex`
//! datatype.

use crate::error::Result;
use crate::export::TripleObject;
use crate::model::Literal;
use crate::store::Store;

use super::{complex_datatype, double_lexical, XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER, XSD_STRING};

/// Serializes every statement of `store` to an N-Triples string.
///
/// # Errors
///
/// As [`Store::triples`].
pub fn to_ntriples(store: &Store) -> Result<String> {
    let triples = store.triples()?;
    let complex = complex_datatype(store);
    let mut out = String::with_capacity(triples.len() * 96);
    for t in &triples {
        let object = match &t.object {
            TripleObject::Iri(target) => iri(target),
            TripleObject::Literal(literal) => literal_term(literal, &complex),
        };
        triple(&mut out, &t.subject, &t.predicate, &object);
    }
    Ok(out)
}

fn triple(out: &mut String, subj: &str, pred: &str, obj: &str) {
    out.push('<');
    out.push_str(subj);
    out.push_str("> <");
    out.push_str(pred);
    out.push_str("> ");
    out.push_str(obj);
    out.push_str(" .\n");
}

fn iri(s: &str) -> String {
    format!("<{s}>")
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

fn lit(s: &str, datatype: &str) -> String {
    format!("\"{}\"^^<{datatype}>", escape(s))
}

fn literal_term(literal: &Literal, complex: &str) -> String {
    match literal {
        Literal::Str { value, lang: Some(tag) } => format!("\"{}\"@{tag}", escape(value)),
        Literal::Str { value, lang: None } => lit(value, XSD_STRING),
        Literal::Bool { value } => lit(&value.to_string(), XSD_BOOLEAN),
        Literal::Int { value } => lit(&value.to_string(), XSD_INTEGER),
        Literal::Float { value } => lit(&double_lexical(*value), XSD_DOUBLE),
        Literal::Complex { .. } => lit(&literal.to_string(), complex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{HAS_DESCRIPTION, HAS_LABEL};
    use crate::model::Value;

    fn sample_store() -> Store {
        let mut store = Store::with_defaults().unwrap();
        store.register_module("local/nt", None).unwrap();
        {
            let mut scope = store.enter_module("local/nt");
            let rel = scope.create_relation("R1000", []).unwrap();
            scope
                .create_item(
                    "I1000",
                    [
                        (HAS_LABEL, Value::from(Literal::lang("Satz", "de"))),
                        (HAS_DESCRIPTION, Value::from("say \"hi\"\nthen leave")),
                        (rel, Value::from(vec![Value::from(3i64), Value::from(0.5)])),
                        (rel, Value::from(Literal::complex(1.0, -2.0))),
                    ],
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn every_line_ends_with_period() {
        let nt = to_ntriples(&sample_store()).unwrap();
        assert!(!nt.is_empty());
        for line in nt.lines() {
            assert!(line.ends_with(" ."), "Line does not end with ' .': {line}");
        }
    }

    #[test]
    fn literals_are_typed() {
        let nt = to_ntriples(&sample_store()).unwrap();
        assert!(nt.contains("\"Satz\"@de"));
        assert!(nt.contains("\"say \\\"hi\\\"\\nthen leave\"^^<http://www.w3.org/2001/XMLSchema#string>"));
        assert!(nt.contains("\"3\"^^<http://www.w3.org/2001/XMLSchema#integer>"));
        assert!(nt.contains("\"0.5\"^^<http://www.w3.org/2001/XMLSchema#double>"));
        assert!(nt.contains("\"1-2i\"^^<kgraph:/builtins#complex>"));
    }

    #[test]
    fn entity_objects_are_iris() {
        let nt = to_ntriples(&Store::with_defaults().unwrap()).unwrap();
        assert!(nt.contains(
            "<kgraph:/builtins#I16> <kgraph:/builtins#R4> <kgraph:/builtins#I2> .\n"
        ));
    }

    #[test]
    fn double_lexical_forms() {
        assert_eq!(double_lexical(1.0), "1.0");
        assert_eq!(double_lexical(f64::INFINITY), "INF");
        assert_eq!(double_lexical(f64::NAN), "NaN");
    }
}
