//! Common test utilities for triplegate integration tests
//!
//! Temp-dir backed stores, statement builders and a listener that records
//! what it is told.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use triplegate::sail::NativeConnection;
use triplegate::{
    Collaborators, ContextFilter, DerivedFromProvider, IndexListener, IndexNotificationError,
    NativeStore, SailConnection, Statement, StoreConfig, Term, TripleStore,
};

pub const SOURCE: &str = "http://example.org/source/import-1";
pub const PREDICATE: &str = "http://example.org/knows";

/// One committed transaction as seen by a listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub added: BTreeSet<Statement>,
    pub removed: BTreeSet<Statement>,
}

/// Records every notification; panics if two arrive at the same time
#[derive(Default)]
pub struct RecordingListener {
    calls: Mutex<Vec<Notification>>,
    in_flight: AtomicBool,
}

impl RecordingListener {
    pub fn notifications(&self) -> Vec<Notification> {
        self.calls.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl IndexListener for RecordingListener {
    fn on_statements_committed(
        &self,
        added: &BTreeSet<Statement>,
        removed: &BTreeSet<Statement>,
    ) -> Result<(), IndexNotificationError> {
        assert!(
            !self.in_flight.swap(true, Ordering::SeqCst),
            "overlapping index notifications"
        );
        self.calls.lock().push(Notification {
            added: added.clone(),
            removed: removed.clone(),
        });
        self.in_flight.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Records, per notification, how many statements the store holds at that
/// moment, read through a connection of its own.
///
/// Commits are serialized and each one is reported before the next can
/// happen, so in commit order these counts only grow.
pub struct StoreSizeListener {
    reader: Mutex<NativeConnection>,
    seen: Mutex<Vec<(usize, Notification)>>,
}

impl StoreSizeListener {
    pub fn new(storage_folder: &Path) -> Self {
        let engine = NativeStore::open(storage_folder, "spoc,posc").expect("open reader store");
        Self {
            reader: Mutex::new(engine.open_native().expect("open reader")),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<(usize, Notification)> {
        self.seen.lock().clone()
    }
}

impl IndexListener for StoreSizeListener {
    fn on_statements_committed(
        &self,
        added: &BTreeSet<Statement>,
        removed: &BTreeSet<Statement>,
    ) -> Result<(), IndexNotificationError> {
        let size = self
            .reader
            .lock()
            .size(&ContextFilter::Any)
            .map_err(|e| IndexNotificationError::Unavailable(e.to_string()))?;
        self.seen.lock().push((
            size,
            Notification {
                added: added.clone(),
                removed: removed.clone(),
            },
        ));
        Ok(())
    }
}

pub fn iri(local: &str) -> Term {
    Term::iri(format!("http://example.org/{}", local))
}

/// `<subject> knows "o"` in the default graph
pub fn statement(subject: &str) -> Statement {
    Statement::new(iri(subject), Term::iri(PREDICATE), Term::literal("o"))
}

pub fn citations() -> Collaborators {
    Collaborators::with_citations(Arc::new(DerivedFromProvider::new(Term::iri(SOURCE))))
}

/// Store citing `SOURCE` and reporting commits to a fresh `RecordingListener`
pub fn recording_store(enrichment_disabled: bool) -> (TempDir, TripleStore, Arc<RecordingListener>) {
    let dir = TempDir::new().expect("temp dir");
    let listener = Arc::new(RecordingListener::default());
    let config = StoreConfig::new(dir.path()).with_enrichment_disabled(enrichment_disabled);
    let store = TripleStore::open(&config, citations().with_index_listener(listener.clone()))
        .expect("open store");
    (dir, store, listener)
}
