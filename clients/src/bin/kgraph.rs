//! `kgraph`: command-line access to a knowledge graph store.
//!
//! **Commands:**
//! - `keys`: print fresh keys drawn from a module reservoir
//! - `export`: write the store as N-Triples or JSON-LD
//! - `show <key>`: print an entity's outgoing and incoming statements
//!
//! **Usage:**
//! ```
//! kgraph [--config <path>] [--verbose] keys [--module <uri>] [--prefix I|R] [--count N]
//! kgraph [--config <path>] [--verbose] export [--format nt|jsonld] [--out <path>]
//! kgraph [--config <path>] [--verbose] show <key>
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kgraph_store::serializer::{jsonld, ntriples};
use kgraph_store::{EntityKind, Object, Store, StoreConfig};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Inspect and export a knowledge graph store.
#[derive(Parser)]
#[command(name = "kgraph", about = "Inspect and export a knowledge graph store")]
struct Args {
    /// TOML store configuration (defaults apply to missing fields).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log store activity at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print fresh keys from a module reservoir.
    Keys {
        /// Module whose reservoir is used.
        #[arg(long, default_value = "local/scratch")]
        module: String,

        /// Kind of key to draw.
        #[arg(long, value_enum, default_value_t = KeyPrefix::I)]
        prefix: KeyPrefix,

        /// Number of keys.
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    /// Export every statement of the store.
    Export {
        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Nt)]
        format: Format,

        /// Output file (stdout if omitted).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print an entity's statements.
    Show {
        /// Entity key, e.g. `R4` or `I16__scope`.
        key: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KeyPrefix {
    /// Item keys.
    #[value(name = "I")]
    I,
    /// Relation keys.
    #[value(name = "R")]
    R,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// N-Triples.
    Nt,
    /// JSON-LD.
    Jsonld,
}

fn init_logging(verbose: bool) {
    let mut filter = EnvFilter::from_default_env();
    if verbose {
        if let Ok(d) = "kgraph_store=debug".parse() {
            filter = filter.add_directive(d);
        }
    }
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn open_store(config: Option<&PathBuf>) -> Result<Store> {
    let config = match config {
        Some(path) => StoreConfig::from_path(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display()))?,
        None => StoreConfig::default(),
    };
    Store::new(config).context("Failed to create store")
}

fn keys(store: &mut Store, module: &str, prefix: KeyPrefix, count: usize) -> Result<()> {
    store
        .register_module(module, None)
        .with_context(|| format!("Failed to register module {module}"))?;
    let kind = match prefix {
        KeyPrefix::I => EntityKind::Item,
        KeyPrefix::R => EntityKind::Relation,
    };
    let mut scope = store.enter_module(module);
    for _ in 0..count {
        let key = scope
            .new_key(kind)
            .with_context(|| format!("Failed to draw a key from {module}"))?;
        println!("{key}");
    }
    Ok(())
}

fn export(store: &Store, format: Format, out: Option<&PathBuf>) -> Result<()> {
    let text = match format {
        Format::Nt => ntriples::to_ntriples(store).context("Failed to serialize N-Triples")?,
        Format::Jsonld => {
            let doc = jsonld::to_json_ld(store).context("Failed to serialize JSON-LD")?;
            serde_json::to_string_pretty(&doc).context("Failed to render JSON-LD")?
        }
    };
    match out {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!(path = %path.display(), bytes = text.len(), "wrote export");
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn describe(store: &Store, object: &Object) -> Result<String> {
    Ok(match object {
        Object::Entity(id) => {
            let uri = store.entity(*id)?.uri().to_owned();
            match store.label(*id) {
                Some(label) => format!("{uri} ({label})"),
                None => uri,
            }
        }
        Object::Literal(literal) => literal.to_string(),
    })
}

fn show(store: &Store, key: &str) -> Result<()> {
    let id = store
        .get_entity(key, None)
        .with_context(|| format!("No entity for key {key}"))?;
    let entity = store.entity(id)?;
    println!("{} [{}]", entity.uri(), entity.kind().as_str());

    for stmt_id in store.get_statements(id, None) {
        let stmt = store.statement(stmt_id)?;
        let relation = describe(store, &Object::Entity(stmt.relation()))?;
        println!("  -> {relation}: {}", describe(store, stmt.object())?);
    }
    for stmt_id in store.get_inverse_statements(id, None) {
        let stmt = store.statement(stmt_id)?;
        let relation = describe(store, &Object::Entity(stmt.relation()))?;
        let subject = store.subject_uri(stmt.subject())?;
        println!("  <- {relation}: {subject}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut store = open_store(args.config.as_ref())?;
    match args.command {
        Command::Keys {
            module,
            prefix,
            count,
        } => keys(&mut store, &module, prefix, count),
        Command::Export { format, out } => export(&store, format, out.as_ref()),
        Command::Show { key } => show(&store, &key),
    }
}
