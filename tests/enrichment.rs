//! Enrichment and index synchronization through the store
//!
//! Run with: `cargo test --test enrichment`

mod common;

use common::{citations, iri, recording_store, statement, SOURCE};
use std::sync::Arc;
use tempfile::TempDir;
use triplegate::model::vocab;
use triplegate::{
    ConnectionMode, ContextFilter, Statement, StatementIndex, StatementPattern,
    StoreConfig, Term, TripleStore,
};

fn derived_from(subject: &str) -> Statement {
    Statement::new(
        iri(subject),
        Term::iri(vocab::PROV_WAS_DERIVED_FROM),
        Term::iri(SOURCE),
    )
}

#[test]
fn test_enriching_write_cites_source() {
    let (_dir, store, listener) = recording_store(false);

    let mut conn = store.connection().unwrap();
    conn.begin().unwrap();
    conn.add_statement(&statement("alice")).unwrap();
    conn.add_statement(&statement("bob")).unwrap();
    conn.commit().unwrap();

    assert!(conn.has_statement(&StatementPattern::exact(&derived_from("alice"))).unwrap());
    assert!(conn.has_statement(&StatementPattern::exact(&derived_from("bob"))).unwrap());
    assert_eq!(conn.size(&ContextFilter::Any).unwrap(), 4);

    let notifications = listener.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].added.len(), 4);
    assert!(notifications[0].added.contains(&derived_from("alice")));
    assert!(notifications[0].removed.is_empty());
}

#[test]
fn test_derived_statement_stays_in_named_graph() {
    let (_dir, store, _listener) = recording_store(false);
    let graph = iri("graphs/people");

    let mut conn = store.connection().unwrap();
    conn.begin().unwrap();
    conn.add_statement(&statement("alice").in_context(graph.clone())).unwrap();
    conn.commit().unwrap();

    let in_graph = conn
        .get_statements(&StatementPattern::any().with_context(ContextFilter::Named(graph.clone())))
        .unwrap();
    assert_eq!(in_graph.len(), 2);
    assert!(in_graph.contains(&derived_from("alice").in_context(graph.clone())));
    assert_eq!(conn.size(&ContextFilter::Default).unwrap(), 0);
    assert_eq!(conn.context_ids().unwrap(), vec![graph]);
}

#[test]
fn test_plain_write_is_not_cited_or_indexed() {
    let (_dir, store, listener) = recording_store(false);

    let mut conn = store.acquire_connection(Some(ConnectionMode::Plain)).unwrap();
    conn.begin().unwrap();
    conn.add_statement(&statement("alice")).unwrap();
    conn.commit().unwrap();

    assert!(!conn.has_statement(&StatementPattern::exact(&derived_from("alice"))).unwrap());
    assert_eq!(listener.count(), 0);
}

#[test]
fn test_net_changes_reported() {
    let (_dir, store, listener) = recording_store(false);

    let mut conn = store.connection().unwrap();
    conn.begin().unwrap();
    conn.add_statement(&statement("alice")).unwrap();
    conn.commit().unwrap();

    // Added then removed within one transaction: nothing to report for carol
    conn.begin().unwrap();
    conn.add_statement(&statement("carol")).unwrap();
    conn.remove_statements(&StatementPattern::any().with_subject(iri("carol"))).unwrap();
    conn.remove_statements(&StatementPattern::exact(&statement("alice"))).unwrap();
    conn.commit().unwrap();

    let notifications = listener.notifications();
    assert_eq!(notifications.len(), 2);
    assert!(notifications[1].added.is_empty());
    assert_eq!(notifications[1].removed.len(), 1);
    assert!(notifications[1].removed.contains(&statement("alice")));
}

#[test]
fn test_empty_commit_not_reported() {
    let (_dir, store, listener) = recording_store(false);

    let mut conn = store.connection().unwrap();
    conn.begin().unwrap();
    conn.commit().unwrap();

    assert_eq!(listener.count(), 0);
}

#[test]
fn test_index_tracks_commits_and_matches_rebuild() {
    let dir = TempDir::new().unwrap();
    let index = Arc::new(StatementIndex::new());
    let config = StoreConfig::new(dir.path());
    let store = TripleStore::open(&config, citations().with_index_listener(index.clone())).unwrap();

    let mut conn = store.connection().unwrap();
    conn.begin().unwrap();
    for name in ["alice", "bob", "carol"] {
        conn.add_statement(&statement(name)).unwrap();
    }
    conn.commit().unwrap();

    conn.begin().unwrap();
    conn.remove_statements(&StatementPattern::exact(&statement("bob"))).unwrap();
    conn.commit().unwrap();

    assert_eq!(index.update_count(), 2);
    assert!(index.last_updated().is_some());
    assert!(!index.contains(&statement("bob")));
    assert!(index.contains(&derived_from("bob")));

    let rebuilt = StatementIndex::new();
    let count = rebuilt.rebuild_from(&*conn).unwrap();
    assert_eq!(count, index.len());

    let predicate = Term::iri(vocab::PROV_WAS_DERIVED_FROM);
    assert_eq!(
        rebuilt.statements_with_predicate(&predicate),
        index.statements_with_predicate(&predicate)
    );
}

#[test]
fn test_lazy_index_resolved_on_first_enriching_connection() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let dir = TempDir::new().unwrap();
    let resolved = Arc::new(AtomicUsize::new(0));
    let index = Arc::new(StatementIndex::new());

    let counter = resolved.clone();
    let shared = index.clone();
    let collaborators = citations().with_index_resolver(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        shared.clone() as Arc<dyn triplegate::IndexListener>
    });
    let store = TripleStore::open(&StoreConfig::new(dir.path()), collaborators).unwrap();
    assert_eq!(resolved.load(Ordering::SeqCst), 0);

    let _plain = store.acquire_connection(Some(ConnectionMode::Plain)).unwrap();
    assert_eq!(resolved.load(Ordering::SeqCst), 0);

    for _ in 0..3 {
        let mut conn = store.connection().unwrap();
        conn.begin().unwrap();
        conn.add_statement(&statement("alice")).unwrap();
        conn.commit().unwrap();
    }
    assert_eq!(resolved.load(Ordering::SeqCst), 1);
    assert_eq!(index.update_count(), 1);
}

#[test]
fn test_config_file_drives_store() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("store.yaml");
    std::fs::write(
        &config_path,
        format!(
            "storage_folder: {}\nindex_definition: \"spoc,opsc\"\nenrichment_disabled: true\n",
            dir.path().join("data").display()
        ),
    )
    .unwrap();

    let config = StoreConfig::from_file(&config_path).unwrap();
    let store = TripleStore::open(&config, citations()).unwrap();
    assert!(store.enrichment_disabled());
    assert_eq!(store.engine().index_definition().canonical(), "spoc,opsc");

    let mut conn = store.connection().unwrap();
    conn.begin().unwrap();
    conn.add_statement(&statement("alice")).unwrap();
    conn.commit().unwrap();
    assert_eq!(conn.size(&ContextFilter::Any).unwrap(), 1);
}
