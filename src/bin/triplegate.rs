//! Triplegate CLI: inspect and edit an embedded triple store.
//!
//! Usage:
//!   triplegate add <subject> <predicate> <object> [--context iri] [--plain]
//!   triplegate query [--subject s] [--predicate p] [--object o]
//!   triplegate count | namespaces | set-namespace <prefix> <iri>
//!
//! Global options: --db, --config, --readonly <reason>, --no-enrichment,
//! --derived-from <iri>. Set TRIPLEGATE_LOG (e.g. `debug`) for log output.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use triplegate::{
    CitationProvider, Collaborators, ConnectionMode, ContextFilter, DerivedFromProvider,
    NoCitations, SailConnection, SailResult, Statement, StatementIndex, StatementPattern,
    StoreConfig, Term, TripleStore,
};

#[derive(Parser)]
#[command(
    name = "triplegate",
    version,
    about = "Embedded RDF triple store with write-time enrichment"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage folder of the store
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Open the store read-only, giving this reason to rejected writes
    #[arg(long, global = true, value_name = "REASON")]
    readonly: Option<String>,

    /// Hand out plain connections unless one is requested explicitly
    #[arg(long, global = true)]
    no_enrichment: bool,

    /// Record every added statement as derived from this source IRI
    #[arg(long, global = true, value_name = "IRI")]
    derived_from: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add one statement
    Add {
        /// Subject: IRI or _:blank
        subject: String,
        /// Predicate IRI
        predicate: String,
        /// Object: IRI, _:blank or "literal"
        object: String,
        /// Named graph to add the statement to
        #[arg(long)]
        context: Option<String>,
        /// Write through a plain connection, skipping enrichment
        #[arg(long)]
        plain: bool,
    },
    /// List statements matching a pattern
    Query {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        predicate: Option<String>,
        #[arg(long)]
        object: Option<String>,
    },
    /// Count all statements
    Count,
    /// List namespace prefixes
    Namespaces,
    /// Bind a namespace prefix
    SetNamespace {
        prefix: String,
        iri: String,
    },
}

/// Get the default storage folder (~/.local/share/triplegate)
fn default_storage_folder() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("triplegate")
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("TRIPLEGATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<StoreConfig, String> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::from_file(path)
            .map_err(|e| format!("Failed to load config '{}': {}", path.display(), e))?,
        None => StoreConfig::new(default_storage_folder()),
    };
    if let Some(db) = &cli.db {
        config.storage_folder = db.clone();
    }
    if cli.no_enrichment {
        config.enrichment_disabled = true;
    }
    Ok(config)
}

fn open_store(cli: &Cli) -> Result<(TripleStore, Arc<StatementIndex>), String> {
    let config = load_config(cli)?;

    let citations: Arc<dyn CitationProvider> = match &cli.derived_from {
        Some(source) => Arc::new(DerivedFromProvider::new(Term::iri(source.as_str()))),
        None => Arc::new(NoCitations),
    };
    let index = Arc::new(StatementIndex::new());
    let collaborators = Collaborators::with_citations(citations).with_index_listener(index.clone());

    let store = TripleStore::open(&config, collaborators)
        .map_err(|e| format!("Failed to open store: {}", e))?;
    if let Some(reason) = &cli.readonly {
        store.set_readonly(reason.as_str());
    }
    Ok((store, index))
}

/// Run `write` inside one transaction, rolling back if any step fails
fn in_transaction(
    conn: &mut dyn SailConnection,
    write: impl FnOnce(&mut dyn SailConnection) -> SailResult<()>,
) -> SailResult<()> {
    conn.begin()?;
    if let Err(e) = write(&mut *conn).and_then(|_| conn.commit()) {
        let _ = conn.rollback();
        return Err(e);
    }
    Ok(())
}

fn cmd_add(store: &TripleStore, statement: Statement, plain: bool) -> i32 {
    let mode = plain.then_some(ConnectionMode::Plain);
    let mut conn = match store.acquire_connection(mode) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match in_transaction(conn.as_mut(), |c| c.add_statement(&statement)) {
        Ok(()) => {
            println!("Added {}", statement);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_query(store: &TripleStore, pattern: &StatementPattern) -> i32 {
    let conn = match store.connection() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let statements = match conn.get_statements(pattern) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if statements.is_empty() {
        println!("No matching statements.");
        return 0;
    }
    for statement in statements {
        println!("{}", statement);
    }
    0
}

fn cmd_count(store: &TripleStore) -> i32 {
    let conn = match store.connection() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match conn.size(&ContextFilter::Any) {
        Ok(n) => {
            println!("{}", n);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_namespaces(store: &TripleStore) -> i32 {
    let conn = match store.connection() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let namespaces = match conn.namespaces() {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if namespaces.is_empty() {
        println!("No namespaces defined.");
        return 0;
    }
    println!("{:<16}  {}", "PREFIX", "NAMESPACE");
    println!("{}", "-".repeat(60));
    for (prefix, name) in namespaces {
        println!("{:<16}  {}", prefix, name);
    }
    0
}

fn cmd_set_namespace(store: &TripleStore, prefix: &str, iri: &str) -> i32 {
    let mut conn = match store.connection() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match in_transaction(conn.as_mut(), |c| c.set_namespace(prefix, iri)) {
        Ok(()) => {
            println!("Bound '{}' to <{}>", prefix, iri);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let (store, index) = match open_store(&cli) {
        Ok(opened) => opened,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Add {
            subject,
            predicate,
            object,
            context,
            plain,
        } => {
            let mut statement = Statement::new(
                Term::from(subject.as_str()),
                Term::from(predicate.as_str()),
                Term::from(object.as_str()),
            );
            if let Some(context) = context {
                statement = statement.in_context(Term::from(context.as_str()));
            }
            cmd_add(&store, statement, plain)
        }
        Commands::Query {
            subject,
            predicate,
            object,
        } => {
            let mut pattern = StatementPattern::any();
            if let Some(s) = subject {
                pattern = pattern.with_subject(Term::from(s.as_str()));
            }
            if let Some(p) = predicate {
                pattern = pattern.with_predicate(Term::from(p.as_str()));
            }
            if let Some(o) = object {
                pattern = pattern.with_object(Term::from(o.as_str()));
            }
            cmd_query(&store, &pattern)
        }
        Commands::Count => cmd_count(&store),
        Commands::Namespaces => cmd_namespaces(&store),
        Commands::SetNamespace { prefix, iri } => cmd_set_namespace(&store, &prefix, &iri),
    };

    debug!(
        updates = index.update_count(),
        indexed = index.len(),
        last_updated = ?index.last_updated(),
        "Statement index after command"
    );
    std::process::exit(code);
}
