//! Secondary index synchronization
//!
//! An `IndexListener` receives the net changes of every committed transaction
//! made through an enriching connection. `StatementIndex` is an in-memory
//! predicate index that can serve as one.

use crate::model::{Statement, StatementPattern, Term};
use crate::sail::{SailConnection, SailResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, info};

/// Failure to apply committed changes to a secondary index
#[derive(Debug, Error)]
pub enum IndexNotificationError {
    #[error("index rejected update: {0}")]
    Rejected(String),

    #[error("index unavailable: {0}")]
    Unavailable(String),
}

/// Receives committed statement changes.
///
/// Called synchronously after the engine commit and before the next commit
/// on the same store, so calls arrive in commit order. Errors are logged by
/// the caller; the commit has already happened.
///
/// The store's commit gate is held for the whole call. An implementation must
/// not commit to the same store, nor call `NativeStore::commit_count()`, from
/// inside the callback: either waits on the gate and deadlocks the committing
/// thread. Reading through a separate connection is fine.
pub trait IndexListener: Send + Sync {
    fn on_statements_committed(
        &self,
        added: &BTreeSet<Statement>,
        removed: &BTreeSet<Statement>,
    ) -> Result<(), IndexNotificationError>;
}

/// In-memory index of statements by predicate
#[derive(Debug, Default)]
pub struct StatementIndex {
    by_predicate: DashMap<Term, HashSet<Statement>>,
    updates: AtomicU64,
    last_updated: Mutex<Option<DateTime<Utc>>>,
}

impl StatementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the index contents with every statement visible to `conn`
    pub fn rebuild_from(&self, conn: &dyn SailConnection) -> SailResult<usize> {
        let statements = conn.get_statements(&StatementPattern::any())?;
        let count = statements.len();

        self.by_predicate.clear();
        for statement in statements {
            self.insert(statement);
        }
        *self.last_updated.lock() = Some(Utc::now());

        info!(statements = count, "Rebuilt statement index");
        Ok(count)
    }

    /// Indexed statements with the given predicate, in statement order
    pub fn statements_with_predicate(&self, predicate: &Term) -> Vec<Statement> {
        let mut found: Vec<Statement> = self
            .by_predicate
            .get(predicate)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        found.sort();
        found
    }

    pub fn contains(&self, statement: &Statement) -> bool {
        self.by_predicate
            .get(&statement.predicate)
            .map_or(false, |set| set.contains(statement))
    }

    /// Total number of indexed statements
    pub fn len(&self) -> usize {
        self.by_predicate.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of commit notifications applied
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }

    /// When the index last changed, if ever
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        *self.last_updated.lock()
    }

    fn insert(&self, statement: Statement) {
        self.by_predicate
            .entry(statement.predicate.clone())
            .or_default()
            .insert(statement);
    }

    fn remove(&self, statement: &Statement) {
        let now_empty = match self.by_predicate.get_mut(&statement.predicate) {
            Some(mut set) => {
                set.remove(statement);
                set.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.by_predicate
                .remove_if(&statement.predicate, |_, set| set.is_empty());
        }
    }
}

impl IndexListener for StatementIndex {
    fn on_statements_committed(
        &self,
        added: &BTreeSet<Statement>,
        removed: &BTreeSet<Statement>,
    ) -> Result<(), IndexNotificationError> {
        for statement in removed {
            self.remove(statement);
        }
        for statement in added {
            self.insert(statement.clone());
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        *self.last_updated.lock() = Some(Utc::now());

        debug!(
            added = added.len(),
            removed = removed.len(),
            "Applied committed changes to statement index"
        );
        Ok(())
    }
}
