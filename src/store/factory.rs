//! TripleStore: the connection factory in front of the native engine

use super::collaborators::Collaborators;
use super::dispatch::{ConnectionMode, ConnectionPolicy, ModeState};
use crate::config::StoreConfig;
use crate::sail::{NativeStore, SailConnection, SailError};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Errors surfaced by the store to its callers
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open store: {0}")]
    Open(#[source] SailError),

    /// The engine could not create a connection
    #[error("Failed to create connection: {0}")]
    Connection(#[source] SailError),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Connection factory for one dataset.
///
/// Every connection handed out is decided at creation time from the store's
/// mode and read-only state, and keeps that behavior for its whole life:
///
/// - **Enrich** (the ambient default unless enrichment is disabled): writes
///   are augmented with derived statements and commits are forwarded to the
///   index listener.
/// - **Plain**: raw engine connection.
/// - While the store is read-only, either kind is wrapped in a guard that
///   rejects writes with the read-only reason.
pub struct TripleStore {
    engine: NativeStore,
    policy: Arc<ConnectionPolicy>,
}

impl TripleStore {
    /// Open the engine in `config.storage_folder` with this store's policy
    /// installed as its connection hook
    pub fn open(config: &StoreConfig, collaborators: Collaborators) -> StoreResult<Self> {
        let policy = Arc::new(ConnectionPolicy::new(
            config.enrichment_disabled,
            collaborators,
        ));
        let engine = NativeStore::open_with_hook(
            &config.storage_folder,
            &config.index_definition,
            policy.clone(),
        )
        .map_err(StoreError::Open)?;

        Ok(Self { engine, policy })
    }

    /// Acquire a connection, optionally overriding the ambient mode for
    /// this one call.
    ///
    /// The store lock is held for the whole engine call so that no other
    /// thread's override can be observed by it.
    pub fn acquire_connection(
        &self,
        explicit_mode: Option<ConnectionMode>,
    ) -> StoreResult<Box<dyn SailConnection>> {
        self.policy
            .with_mode(explicit_mode, || self.engine.get_connection())
            .map_err(|e| {
                warn!(error = %e, mode = ?explicit_mode, "Connection creation failed");
                StoreError::Connection(e)
            })
    }

    /// Acquire a connection using the ambient mode
    pub fn connection(&self) -> StoreResult<Box<dyn SailConnection>> {
        self.acquire_connection(None)
    }

    /// Make connections created from now on read-only.
    ///
    /// Calling it again replaces the reason. Connections that already exist
    /// are unaffected.
    pub fn set_readonly(&self, reason: impl Into<String>) {
        self.policy.set_readonly(reason.into());
    }

    /// Make connections created from now on writable again
    pub fn clear_readonly(&self) {
        self.policy.clear_readonly();
    }

    pub fn is_readonly(&self) -> bool {
        self.policy.readonly_reason().is_some()
    }

    pub fn readonly_reason(&self) -> Option<String> {
        self.policy.readonly_reason()
    }

    /// Current dispatch mode; `Ambient` whenever no acquisition is in flight
    pub fn mode(&self) -> ModeState {
        self.policy.mode()
    }

    pub fn enrichment_disabled(&self) -> bool {
        self.policy.enrichment_disabled()
    }

    /// The underlying engine. Its `get_connection()` goes through the same
    /// policy as the ambient path of this store.
    pub fn engine(&self) -> &NativeStore {
        &self.engine
    }

    /// Refuse further connections
    pub fn shut_down(&self) {
        self.engine.shut_down();
    }
}

impl std::fmt::Debug for TripleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripleStore")
            .field("engine", &self.engine)
            .field("enrichment_disabled", &self.enrichment_disabled())
            .field("readonly_reason", &self.readonly_reason())
            .finish()
    }
}
