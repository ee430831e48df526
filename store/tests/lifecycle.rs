//! Module registration, loading and cascading unload.

use std::path::Path;

use kgraph_store::builtins::{HAS_DESCRIPTION, HAS_LABEL, IS_PART_OF};
use kgraph_store::{
    EntityId, FnModule, ModuleRegistration, Result, StatementOptions, Store, StoreError, Value,
};

fn populated_module(
    uri: &str,
    prefix: &str,
    items: usize,
    statements: usize,
) -> FnModule<impl Fn(&mut Store) -> Result<()>> {
    FnModule::new(ModuleRegistration::new(uri).prefix(prefix), move |store| {
        let rel = store.create_relation("R1000", [(HAS_LABEL, Value::from("links to"))])?;
        let mut created: Vec<EntityId> = Vec::with_capacity(items);
        for n in 0..items {
            let key = format!("I{}", 1000 + n);
            created.push(store.create_item(&key, [])?);
        }
        for n in 0..statements {
            let subject = created[n % items];
            if n % 3 == 0 {
                store.set_relation(subject, HAS_DESCRIPTION, format!("note {n}"))?;
            } else {
                let object = created[(n * 7 + 1) % items];
                store.set_relation(subject, rel, object)?;
            }
        }
        Ok(())
    })
}

#[test]
fn unload_leaves_no_residue() {
    let mut store = Store::with_defaults().unwrap();
    let before = store.index_snapshot();

    // 1 relation and 49 items; the relation's label plus 79 more statements
    let module = populated_module("local/bulk", "bulk", 49, 79);
    let handle = store.load_module(&module).unwrap();
    let record = store.module(handle.uri()).unwrap();
    assert_eq!(record.entities().len(), 50);
    assert_eq!(record.statements().len(), 80);

    // literal statements have no inverse side
    let literal = 1 + (0..79).filter(|n| n % 3 == 0).count();
    let expected_statements = 80 + (80 - literal);
    assert_eq!(
        store.statement_count(),
        before.statement_count() + expected_statements
    );

    let report = store.unload(handle.uri(), true).unwrap();
    assert_eq!(report.entities, 50);
    assert_eq!(report.statements, expected_statements);

    assert_eq!(store.index_snapshot(), before);
    assert!(!store.is_registered("local/bulk"));
    assert!(store.module_for_prefix("bulk").is_none());
    assert!(store
        .entities()
        .all(|entity| !entity.uri().starts_with("local/bulk#")));
    store.check_integrity().unwrap();
}

#[test]
fn unloading_a_module_removes_statements_others_made_about_it() {
    let mut store = Store::with_defaults().unwrap();
    let base = store
        .load_module(&FnModule::new(
            ModuleRegistration::new("local/base").prefix("base"),
            |store| {
                store.create_item("I1000", [(HAS_LABEL, Value::from("whole"))])?;
                Ok(())
            },
        ))
        .unwrap();
    let whole = base.get(&store, "I1000__whole").unwrap();

    let ext = store
        .load_module(&FnModule::new(
            ModuleRegistration::new("local/ext").prefix("ext"),
            move |store| {
                let part = store.create_item("I1000", [(HAS_LABEL, Value::from("part"))])?;
                store.set_relation(part, IS_PART_OF, whole)?;
                store.set_relation(whole, HAS_DESCRIPTION, "described elsewhere")?;
                Ok(())
            },
        ))
        .unwrap();
    let part = ext.get(&store, "I1000").unwrap();
    assert_eq!(store.inverse_subjects(whole, IS_PART_OF), vec![part]);
    assert_eq!(store.get_entity("ext__I1000__part", None).unwrap(), part);
    assert_eq!(store.get_entity("base__I1000", None).unwrap(), whole);

    store.unload(base.uri(), true).unwrap();
    assert!(!store.contains_entity(whole));
    assert!(store.contains_entity(part));
    assert!(store.get_statements(part, Some(IS_PART_OF)).is_empty());
    assert_eq!(store.label(part).as_deref(), Some("part"));
    store.check_integrity().unwrap();

    store.unload(ext.uri(), true).unwrap();
    assert!(!store.contains_entity(part));
    store.check_integrity().unwrap();
}

#[test]
fn unloading_a_module_removes_its_statements_about_others() {
    let mut store = Store::with_defaults().unwrap();
    store.register_module("local/base", None).unwrap();
    store.register_module("local/notes", None).unwrap();
    let whole = store
        .with_module("local/base", |store| store.create_item("I1000", []))
        .unwrap();
    let before = store.index_snapshot();

    store
        .with_module("local/notes", |store| {
            store.create_item("I1000", [])?;
            store.set_relation(whole, HAS_DESCRIPTION, "only a note")
        })
        .unwrap();
    assert_eq!(store.get_statements(whole, None).len(), 1);

    store.unload("local/notes", true).unwrap();
    assert!(store.contains_entity(whole));
    assert_eq!(store.index_snapshot(), before);
}

#[test]
fn unload_clears_scopes_and_proxies_used_across_modules() {
    let mut store = Store::with_defaults().unwrap();
    let theory = store
        .load_module(&FnModule::new(
            ModuleRegistration::new("local/theory").prefix("th"),
            |store| {
                let theorem = store.create_item("I1000", [(HAS_LABEL, Value::from("theorem"))])?;
                store.create_scope(theorem, "premises")?;
                store.create_item("I1001", [(HAS_LABEL, Value::from("stand-in"))])?;
                Ok(())
            },
        ))
        .unwrap();
    let theorem = theory.get(&store, "I1000__theorem").unwrap();
    let premises = store.scope_of(theorem, "premises").unwrap();
    let stand_in = theory.get(&store, "I1001").unwrap();
    let before = store.index_snapshot();

    let usage = FnModule::new(ModuleRegistration::new("local/usage"), move |store| {
        let x = store.create_item("I1000", [])?;
        store.create_statement(
            x,
            IS_PART_OF,
            theorem,
            StatementOptions::new().scope(premises).proxy(stand_in),
        )?;
        store.create_statement(
            theorem,
            HAS_DESCRIPTION,
            "used elsewhere",
            StatementOptions::new().scope(premises),
        )?;
        Ok(())
    });
    store.load_module(&usage).unwrap();
    assert_eq!(store.scope_statements(premises).len(), 2);
    assert!(!store.get_inverse_statements(stand_in, None).is_empty());

    store.unload("local/usage", true).unwrap();
    assert_eq!(store.index_snapshot(), before);
    assert!(store.get_inverse_statements(stand_in, None).is_empty());
    store.check_integrity().unwrap();

    // owner of the scope and the proxy goes first this time
    let handle = store.load_module(&usage).unwrap();
    let x = handle.get(&store, "I1000").unwrap();
    store.unload("local/theory", true).unwrap();
    assert!(store.get_statements(x, None).is_empty());
    assert!(store.scope_statements(premises).is_empty());
    store.check_integrity().unwrap();

    store.unload("local/usage", true).unwrap();
    store.check_integrity().unwrap();
}

#[test]
fn strict_unload_requires_entities() {
    let mut store = Store::with_defaults().unwrap();
    store.register_module("local/empty", None).unwrap();

    assert!(matches!(
        store.unload("local/empty", true),
        Err(StoreError::ModuleNotLoaded { .. })
    ));
    assert!(store.is_registered("local/empty"));

    let report = store.unload("local/empty", false).unwrap();
    assert_eq!(report.entities, 0);
    assert!(!store.is_registered("local/empty"));

    let report = store.unload("local/never-registered", false).unwrap();
    assert_eq!((report.entities, report.statements), (0, 0));
    assert!(matches!(
        store.unload("local/never-registered", true),
        Err(StoreError::ModuleNotLoaded { .. })
    ));
}

#[test]
fn builtin_module_is_permanent() {
    let mut store = Store::with_defaults().unwrap();
    let builtin = store.config().builtin_uri.clone();
    let before = store.index_snapshot();
    assert!(matches!(
        store.unload(&builtin, false),
        Err(StoreError::PermanentModule { .. })
    ));
    assert_eq!(store.index_snapshot(), before);
}

#[test]
fn registration_conflicts() {
    let mut store = Store::with_defaults().unwrap();
    store
        .register(ModuleRegistration::new("local/a").prefix("pa"))
        .unwrap();

    assert!(matches!(
        store.register(ModuleRegistration::new("local/a")),
        Err(StoreError::ModuleAlreadyRegistered { .. })
    ));
    assert!(matches!(
        store.register(ModuleRegistration::new("local/b").prefix("pa")),
        Err(StoreError::DuplicatePrefix { uri, .. }) if uri == "local/a"
    ));

    store.unload("local/a", false).unwrap();
    store
        .register(ModuleRegistration::new("local/b").prefix("pa"))
        .unwrap();
    assert_eq!(store.module_for_prefix("pa"), Some("local/b"));
}

#[test]
fn source_paths_map_to_modules() {
    let mut store = Store::with_defaults().unwrap();
    store
        .register(ModuleRegistration::new("local/src").source("modules/src.toml"))
        .unwrap();
    assert_eq!(
        store.module_for_source(Path::new("modules/src.toml")),
        Some("local/src")
    );
    store.unload("local/src", false).unwrap();
    assert_eq!(store.module_for_source(Path::new("modules/src.toml")), None);
}

#[test]
fn failed_load_is_rolled_back() {
    let mut store = Store::with_defaults().unwrap();
    let before = store.index_snapshot();
    let module = FnModule::new(ModuleRegistration::new("local/half").prefix("half"), |store| {
        let a = store.create_item("I1000", [(HAS_LABEL, Value::from("a"))])?;
        store.create_item("I1001", [(IS_PART_OF, Value::from(a))])?;
        store.create_item("I1000", [])?;
        Ok(())
    });

    let err = store.load_module(&module).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateUri { .. }));
    assert_eq!(store.index_snapshot(), before);
    assert!(store.module_for_prefix("half").is_none());
    assert_eq!(store.context_depth(), 0);
}
