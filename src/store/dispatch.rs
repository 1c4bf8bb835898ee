//! Mode dispatch: per-call connection policy through a context-free hook
//!
//! The engine's `get_connection()` carries no parameter, so the kind of
//! connection to build is published as shared state on the store right before
//! the call and withdrawn right after. Both happen under one re-entrant lock:
//! the thread requesting an override holds it across the whole engine call,
//! and the hook, running on that same thread, takes it again to read the
//! state. Other threads block until the override is withdrawn.

use super::collaborators::Collaborators;
use super::enriching::EnrichingConnection;
use super::readonly::ReadonlyGuard;
use crate::sail::{ConnectionHook, NativeStore, SailConnection, SailResult};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use tracing::{debug, info};

/// Kind of connection a caller can ask for explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Raw engine connection
    Plain,
    /// Enriching connection with index synchronization
    Enrich,
}

/// Connection-creation policy currently in force
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModeState {
    /// Enrich unless enrichment was disabled at construction
    #[default]
    Ambient,
    /// Explicit request for the one creation call in flight
    Override(ConnectionMode),
}

impl ModeState {
    pub fn resolve(self, enrichment_disabled: bool) -> ConnectionMode {
        match self {
            Self::Override(mode) => mode,
            Self::Ambient if enrichment_disabled => ConnectionMode::Plain,
            Self::Ambient => ConnectionMode::Enrich,
        }
    }
}

#[derive(Debug, Default)]
struct DispatchState {
    mode: ModeState,
    readonly_reason: Option<String>,
}

/// Puts an override in place and withdraws it on drop, on every exit path
struct ModeOverride<'a> {
    state: &'a RefCell<DispatchState>,
    previous: ModeState,
}

impl<'a> ModeOverride<'a> {
    fn set(state: &'a RefCell<DispatchState>, mode: ConnectionMode) -> Self {
        let previous = std::mem::replace(&mut state.borrow_mut().mode, ModeState::Override(mode));
        Self { state, previous }
    }
}

impl Drop for ModeOverride<'_> {
    fn drop(&mut self) {
        self.state.borrow_mut().mode = self.previous;
    }
}

/// Shared, lock-protected creation policy of one store.
///
/// Installed as the engine's [`ConnectionHook`].
pub(crate) struct ConnectionPolicy {
    state: ReentrantMutex<RefCell<DispatchState>>,
    enrichment_disabled: bool,
    collaborators: Collaborators,
}

impl ConnectionPolicy {
    pub(crate) fn new(enrichment_disabled: bool, collaborators: Collaborators) -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(DispatchState::default())),
            enrichment_disabled,
            collaborators,
        }
    }

    pub(crate) fn enrichment_disabled(&self) -> bool {
        self.enrichment_disabled
    }

    /// Run `create` under the store lock with `mode` in force, if given.
    ///
    /// The mode reverts before the lock is released, even if `create` fails
    /// or panics.
    pub(crate) fn with_mode<R>(&self, mode: Option<ConnectionMode>, create: impl FnOnce() -> R) -> R {
        let state = self.state.lock();
        let _override = mode.map(|mode| ModeOverride::set(&state, mode));
        create()
    }

    pub(crate) fn mode(&self) -> ModeState {
        self.state.lock().borrow().mode
    }

    pub(crate) fn set_readonly(&self, reason: String) {
        let state = self.state.lock();
        info!(reason = %reason, "Store made read-only");
        state.borrow_mut().readonly_reason = Some(reason);
    }

    pub(crate) fn clear_readonly(&self) {
        let state = self.state.lock();
        if state.borrow_mut().readonly_reason.take().is_some() {
            info!("Store writable again");
        }
    }

    pub(crate) fn readonly_reason(&self) -> Option<String> {
        self.state.lock().borrow().readonly_reason.clone()
    }
}

impl ConnectionHook for ConnectionPolicy {
    fn connection_internal(&self, store: &NativeStore) -> SailResult<Box<dyn SailConnection>> {
        let state = self.state.lock();
        let (mode, readonly_reason) = {
            let current = state.borrow();
            (
                current.mode.resolve(self.enrichment_disabled),
                current.readonly_reason.clone(),
            )
        };

        let base = store.open_native()?;
        let conn: Box<dyn SailConnection> = match mode {
            ConnectionMode::Plain => Box::new(base),
            ConnectionMode::Enrich => {
                let mut conn = EnrichingConnection::new(base, self.collaborators.citations());
                // Read-only connections never commit, so they get no listener
                if readonly_reason.is_none() {
                    if let Some(listener) = self.collaborators.index_listener() {
                        conn = conn.with_index_listener(listener);
                    }
                }
                Box::new(conn)
            }
        };

        debug!(?mode, readonly = readonly_reason.is_some(), "Created connection");
        Ok(match readonly_reason {
            Some(reason) => Box::new(ReadonlyGuard::new(conn, reason)),
            None => conn,
        })
    }
}
