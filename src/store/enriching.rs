//! Enriching connection: derived statements on write, index sync on commit

use crate::citation::CitationProvider;
use crate::index::IndexListener;
use crate::model::{ContextFilter, Statement, StatementPattern, Term};
use crate::sail::{ChangeSet, NativeConnection, SailConnection, SailResult};
use std::sync::Arc;
use tracing::{trace, warn};

/// Wraps a raw engine connection.
///
/// Every added statement is written together with the statements the
/// citation provider derives from it, inside the caller's transaction. After a
/// successful commit the net changes go to the index listener, if one is
/// attached. A failing listener is logged and otherwise ignored: the commit
/// has already happened and the index is merely stale.
pub struct EnrichingConnection {
    inner: NativeConnection,
    citations: Arc<dyn CitationProvider>,
    index_listener: Option<Arc<dyn IndexListener>>,
}

impl EnrichingConnection {
    pub fn new(inner: NativeConnection, citations: Arc<dyn CitationProvider>) -> Self {
        Self {
            inner,
            citations,
            index_listener: None,
        }
    }

    /// Forward committed changes to `listener`
    pub fn with_index_listener(mut self, listener: Arc<dyn IndexListener>) -> Self {
        self.index_listener = Some(listener);
        self
    }

    pub fn has_index_listener(&self) -> bool {
        self.index_listener.is_some()
    }
}

fn notify(listener: &dyn IndexListener, changes: &ChangeSet) {
    if changes.is_empty() {
        trace!("Empty commit, index not notified");
        return;
    }
    if let Err(e) = listener.on_statements_committed(changes.added(), changes.removed()) {
        warn!(
            error = %e,
            added = changes.added().len(),
            removed = changes.removed().len(),
            "Index notification failed after commit; index may be stale"
        );
    }
}

impl SailConnection for EnrichingConnection {
    fn get_statements(&self, pattern: &StatementPattern) -> SailResult<Vec<Statement>> {
        self.inner.get_statements(pattern)
    }

    fn has_statement(&self, pattern: &StatementPattern) -> SailResult<bool> {
        self.inner.has_statement(pattern)
    }

    fn size(&self, context: &ContextFilter) -> SailResult<usize> {
        self.inner.size(context)
    }

    fn context_ids(&self) -> SailResult<Vec<Term>> {
        self.inner.context_ids()
    }

    fn get_namespace(&self, prefix: &str) -> SailResult<Option<String>> {
        self.inner.get_namespace(prefix)
    }

    fn namespaces(&self) -> SailResult<Vec<(String, String)>> {
        self.inner.namespaces()
    }

    fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    fn begin(&mut self) -> SailResult<()> {
        self.inner.begin()
    }

    /// The statement and its derivations are written as one unit: if any of
    /// them fails, none of them stays in the transaction.
    fn add_statement(&mut self, statement: &Statement) -> SailResult<()> {
        let derived = self.citations.derive_statements(statement);
        if !derived.is_empty() {
            trace!(count = derived.len(), subject = %statement.subject, "Adding derived statements");
        }

        self.inner.atomically(|conn| {
            conn.add_statement(statement)?;
            for extra in &derived {
                conn.add_statement(extra)?;
            }
            Ok(())
        })
    }

    fn remove_statements(&mut self, pattern: &StatementPattern) -> SailResult<usize> {
        self.inner.remove_statements(pattern)
    }

    fn clear(&mut self, context: &ContextFilter) -> SailResult<usize> {
        self.inner.clear(context)
    }

    fn set_namespace(&mut self, prefix: &str, name: &str) -> SailResult<()> {
        self.inner.set_namespace(prefix, name)
    }

    fn remove_namespace(&mut self, prefix: &str) -> SailResult<()> {
        self.inner.remove_namespace(prefix)
    }

    fn commit(&mut self) -> SailResult<()> {
        let listener = self.index_listener.as_deref();
        self.inner
            .commit_with(|changes| {
                if let Some(listener) = listener {
                    notify(listener, changes);
                }
            })
            .map(|_| ())
    }

    fn rollback(&mut self) -> SailResult<()> {
        self.inner.rollback()
    }

    fn close(&mut self) -> SailResult<()> {
        self.inner.close()
    }
}
