//! Builds a small module and prints the store as N-Triples or JSON-LD.
//!
//! ```text
//! cargo run -p kgraph-store --example dump_store [ntriples|jsonld]
//! ```
//!
//! Set `RUST_LOG=kgraph_store=debug` to watch entities and statements being
//! created.

use kgraph_store::builtins::{HAS_LABEL, IS_INSTANCE_OF, IS_SUBCLASS_OF, METACLASS};
use kgraph_store::serializer::{jsonld, ntriples};
use kgraph_store::{
    FnModule, Literal, ModuleRegistration, Object, StatementOptions, Store, Value, CALL,
};
use tracing_subscriber::{fmt, EnvFilter};

fn geometry(store: &mut Store) -> kgraph_store::Result<()> {
    let polygon = store.create_item(
        "I1000",
        [
            (HAS_LABEL, Value::from("polygon")),
            (IS_INSTANCE_OF, Value::from(METACLASS)),
        ],
    )?;
    store.attach_method(polygon, CALL, |store, id, _args| {
        let label = store.label(id).unwrap_or_default();
        Ok(Object::Literal(Literal::from(format!("a {label}"))))
    })?;
    let triangle = store.create_item(
        "I1001",
        [
            (HAS_LABEL, Value::from("triangle")),
            (IS_SUBCLASS_OF, Value::from(polygon)),
        ],
    )?;
    let corners = store.create_relation("R1000", [(HAS_LABEL, Value::from("has corner count"))])?;
    let premises = store.create_scope(triangle, "premises")?;
    store.create_statement(
        triangle,
        corners,
        3i64,
        StatementOptions::new().scope(premises),
    )?;
    store.instance_of(triangle, "unit triangle", Some("the triangle with unit sides"))?;
    Ok(())
}

fn main() -> kgraph_store::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut store = Store::with_defaults()?;
    let module = FnModule::new(
        ModuleRegistration::new("local/geometry").prefix("geo"),
        geometry,
    );
    let handle = store.load_module(&module)?;
    let polygon = handle.get(&store, "I1000__polygon")?;
    println!("# {:?}", store.call(polygon, &[])?);

    match std::env::args().nth(1).as_deref() {
        Some("jsonld") => {
            let doc = jsonld::to_json_ld(&store)?;
            println!("{doc:#}");
        }
        _ => print!("{}", ntriples::to_ntriples(&store)?),
    }
    Ok(())
}
