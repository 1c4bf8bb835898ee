//! Connection trait, creation hook and error definitions for the engine

use super::native::NativeStore;
use crate::model::{ContextFilter, Statement, StatementPattern, Term};
use thiserror::Error;

/// Errors that can occur on engine connections
#[derive(Debug, Error)]
pub enum SailError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid index definition: {0}")]
    InvalidIndexDefinition(String),

    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    #[error("No active transaction")]
    NoActiveTransaction,

    #[error("A transaction is already active on this connection")]
    TransactionActive,

    #[error("Connection has been closed")]
    Closed,

    #[error("Store has been shut down")]
    ShutDown,

    /// A mutating call on a read-only connection; carries the reason given
    /// when the store was made read-only
    #[error("Store is read-only: {0}")]
    ReadonlyViolation(String),
}

/// Result type for engine operations
pub type SailResult<T> = Result<T, SailError>;

/// The read/write capability surface of an engine connection.
///
/// Reads run outside transactions. Every write needs an active transaction
/// opened with `begin()`; changes become visible to other connections on
/// `commit()`. Uncommitted changes are rolled back on `close()` or drop.
pub trait SailConnection: Send {
    // === Reads ===

    /// All statements matching the pattern
    fn get_statements(&self, pattern: &StatementPattern) -> SailResult<Vec<Statement>>;

    /// True if at least one statement matches the pattern
    fn has_statement(&self, pattern: &StatementPattern) -> SailResult<bool>;

    /// Number of statements in the selected graphs
    fn size(&self, context: &ContextFilter) -> SailResult<usize>;

    /// Named graphs holding at least one statement
    fn context_ids(&self) -> SailResult<Vec<Term>>;

    fn get_namespace(&self, prefix: &str) -> SailResult<Option<String>>;

    /// All (prefix, namespace) pairs, ordered by prefix
    fn namespaces(&self) -> SailResult<Vec<(String, String)>>;

    /// True while a transaction is open
    fn is_active(&self) -> bool;

    // === Writes ===

    fn begin(&mut self) -> SailResult<()>;

    fn add_statement(&mut self, statement: &Statement) -> SailResult<()>;

    /// Remove every statement matching the pattern, returning how many were removed
    fn remove_statements(&mut self, pattern: &StatementPattern) -> SailResult<usize>;

    /// Remove every statement in the selected graphs
    fn clear(&mut self, context: &ContextFilter) -> SailResult<usize>;

    fn set_namespace(&mut self, prefix: &str, name: &str) -> SailResult<()>;

    fn remove_namespace(&mut self, prefix: &str) -> SailResult<()>;

    fn commit(&mut self) -> SailResult<()>;

    /// Discard the open transaction; a no-op when none is open
    fn rollback(&mut self) -> SailResult<()>;

    // === Lifecycle ===

    fn close(&mut self) -> SailResult<()>;
}

/// The engine's internal connection-creation entry point.
///
/// `NativeStore::get_connection()` carries no per-call parameter; it performs
/// its own checks and then calls the installed hook. A hook that needs to vary
/// its output per call has to read shared state of its own.
pub trait ConnectionHook: Send + Sync {
    fn connection_internal(&self, store: &NativeStore) -> SailResult<Box<dyn SailConnection>>;
}

/// Hook installed when none is supplied: hands out raw engine connections
#[derive(Debug, Default)]
pub struct DefaultHook;

impl ConnectionHook for DefaultHook {
    fn connection_internal(&self, store: &NativeStore) -> SailResult<Box<dyn SailConnection>> {
        Ok(Box::new(store.open_native()?))
    }
}
