//! Read-only connection guard

use crate::model::{ContextFilter, Statement, StatementPattern, Term};
use crate::sail::{SailConnection, SailError, SailResult};
use tracing::debug;

/// Wraps a connection and rejects every mutating call.
///
/// Reads, `rollback()` and `close()` pass straight through. Mutating calls
/// fail with [`SailError::ReadonlyViolation`] carrying the reason the store
/// was made read-only, before the inner connection is touched.
pub struct ReadonlyGuard {
    inner: Box<dyn SailConnection>,
    reason: String,
}

impl ReadonlyGuard {
    pub fn new(inner: Box<dyn SailConnection>, reason: impl Into<String>) -> Self {
        Self {
            inner,
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    fn reject<T>(&self, operation: &str) -> SailResult<T> {
        debug!(operation, reason = %self.reason, "Rejected write on read-only connection");
        Err(SailError::ReadonlyViolation(self.reason.clone()))
    }
}

impl SailConnection for ReadonlyGuard {
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
        self.reject("begin")
    }

    fn add_statement(&mut self, _statement: &Statement) -> SailResult<()> {
        self.reject("add_statement")
    }

    fn remove_statements(&mut self, _pattern: &StatementPattern) -> SailResult<usize> {
        self.reject("remove_statements")
    }

    fn clear(&mut self, _context: &ContextFilter) -> SailResult<usize> {
        self.reject("clear")
    }

    fn set_namespace(&mut self, _prefix: &str, _name: &str) -> SailResult<()> {
        self.reject("set_namespace")
    }

    fn remove_namespace(&mut self, _prefix: &str) -> SailResult<()> {
        self.reject("remove_namespace")
    }

    fn commit(&mut self) -> SailResult<()> {
        self.reject("commit")
    }

    fn rollback(&mut self) -> SailResult<()> {
        self.inner.rollback()
    }

    fn close(&mut self) -> SailResult<()> {
        self.inner.close()
    }
}
