//! Triplegate: connection coordination for an embedded RDF triple store
//!
//! Wraps a SQLite-backed triple store so that every connection it hands out
//! is decided once, at creation, from the store's current policy:
//!
//! - **Enriching** connections add the statements a [`CitationProvider`]
//!   derives from each write, in the same transaction, and report every
//!   committed change set to an [`IndexListener`].
//! - **Plain** connections are raw engine connections.
//! - While the store is read-only, every new connection is wrapped in a
//!   [`ReadonlyGuard`] that rejects writes with the configured reason.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use triplegate::{Collaborators, DerivedFromProvider, StoreConfig, Term, TripleStore};
//!
//! let config = StoreConfig::new("/tmp/triplegate-demo");
//! let citations = DerivedFromProvider::new(Term::iri("http://example.org/import"));
//! let store = TripleStore::open(&config, Collaborators::with_citations(Arc::new(citations)))?;
//!
//! let mut conn = store.connection()?;
//! conn.begin()?;
//! conn.add_statement(&triplegate::Statement::new(
//!     Term::iri("http://example.org/a"),
//!     Term::iri("http://example.org/knows"),
//!     Term::iri("http://example.org/b"),
//! ))?;
//! conn.commit()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod citation;
pub mod config;
pub mod index;
pub mod model;
pub mod sail;
pub mod store;

pub use citation::{CitationProvider, DerivedFromProvider, NoCitations};
pub use config::{ConfigError, StoreConfig};
pub use index::{IndexListener, IndexNotificationError, StatementIndex};
pub use model::{ContextFilter, Statement, StatementPattern, Term};
pub use sail::{NativeStore, SailConnection, SailError, SailResult};
pub use store::{
    Collaborators, ConnectionMode, EnrichingConnection, ModeState, ReadonlyGuard, StoreError,
    StoreResult, TripleStore,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
