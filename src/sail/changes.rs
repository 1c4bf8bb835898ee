//! Net statement changes of one transaction

use crate::model::Statement;
use std::collections::BTreeSet;

/// Statements added and removed by a transaction, netted against each other:
/// adding back a statement removed earlier in the same transaction (or the
/// reverse) cancels both records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    added: BTreeSet<Statement>,
    removed: BTreeSet<Statement>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_added(&mut self, statement: Statement) {
        if !self.removed.remove(&statement) {
            self.added.insert(statement);
        }
    }

    pub fn record_removed(&mut self, statement: Statement) {
        if !self.added.remove(&statement) {
            self.removed.insert(statement);
        }
    }

    pub fn added(&self) -> &BTreeSet<Statement> {
        &self.added
    }

    pub fn removed(&self) -> &BTreeSet<Statement> {
        &self.removed
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Term;

    fn st(o: &str) -> Statement {
        Statement::new(Term::iri("s"), Term::iri("p"), Term::literal(o))
    }

    #[test]
    fn add_then_remove_cancels() {
        let mut changes = ChangeSet::new();
        changes.record_added(st("a"));
        changes.record_removed(st("a"));
        assert!(changes.is_empty());
    }

    #[test]
    fn remove_then_add_cancels() {
        let mut changes = ChangeSet::new();
        changes.record_removed(st("a"));
        changes.record_added(st("a"));
        assert!(changes.is_empty());
    }

    #[test]
    fn keeps_independent_changes() {
        let mut changes = ChangeSet::new();
        changes.record_added(st("a"));
        changes.record_removed(st("b"));
        assert_eq!(changes.added().len(), 1);
        assert_eq!(changes.removed().len(), 1);
        assert!(changes.added().contains(&st("a")));
    }
}
