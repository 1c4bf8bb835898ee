//! SQLite-backed native triple store

use super::changes::ChangeSet;
use super::index_def::{IndexDefinition, Position};
use super::traits::{ConnectionHook, DefaultHook, SailConnection, SailError, SailResult};
use crate::model::{ContextFilter, Statement, StatementPattern, Term};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// File name of the database inside the storage folder
const DB_FILE: &str = "triples.sqlite3";

/// How long a connection waits for another writer before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// State shared by the store and all its connections
#[derive(Debug)]
struct EngineShared {
    /// Serializes commits; holds the number of commits so far.
    /// Post-commit callbacks run while it is held, so they observe commit order.
    commit_gate: Mutex<u64>,
}

/// Embedded triple store
///
/// One SQLite database in the storage folder, with a `statements` table keyed
/// on (subject, predicate, object, context) plus one secondary index per entry
/// of the index definition. Every connection opens its own SQLite handle; WAL
/// mode lets readers proceed while a writer holds its transaction.
pub struct NativeStore {
    data_dir: PathBuf,
    db_path: PathBuf,
    indexes: IndexDefinition,
    shared: Arc<EngineShared>,
    hook: Arc<dyn ConnectionHook>,
    shut_down: AtomicBool,
}

impl NativeStore {
    /// Open or create a store handing out raw connections
    pub fn open(data_dir: impl AsRef<Path>, index_definition: &str) -> SailResult<Self> {
        Self::open_with_hook(data_dir, index_definition, Arc::new(DefaultHook))
    }

    /// Open or create a store whose `get_connection()` delegates to `hook`
    pub fn open_with_hook(
        data_dir: impl AsRef<Path>,
        index_definition: &str,
        hook: Arc<dyn ConnectionHook>,
    ) -> SailResult<Self> {
        let indexes: IndexDefinition = index_definition.parse()?;
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let db_path = data_dir.join(DB_FILE);
        let conn = Connection::open(&db_path)?;
        Self::init_schema(&conn, &indexes)?;

        info!(
            path = %db_path.display(),
            indexes = %indexes.canonical(),
            "Opened native store"
        );

        Ok(Self {
            data_dir,
            db_path,
            indexes,
            shared: Arc::new(EngineShared {
                commit_gate: Mutex::new(0),
            }),
            hook,
            shut_down: AtomicBool::new(false),
        })
    }

    fn init_schema(conn: &Connection, indexes: &IndexDefinition) -> SailResult<()> {
        conn.execute_batch(
            r#"
            -- Terms are stored as tagged JSON; ctx is '' for the default graph
            CREATE TABLE IF NOT EXISTS statements (
                subj TEXT NOT NULL,
                pred TEXT NOT NULL,
                obj TEXT NOT NULL,
                ctx TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (subj, pred, obj, ctx)
            ) WITHOUT ROWID;

            CREATE TABLE IF NOT EXISTS namespaces (
                prefix TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );

            PRAGMA journal_mode = WAL;
            "#,
        )?;

        for index in indexes.indexes() {
            // spoc is the primary key
            if index.name() == "spoc" {
                continue;
            }
            conn.execute(
                &format!(
                    "CREATE INDEX IF NOT EXISTS idx_statements_{} ON statements({})",
                    index.name(),
                    index.columns()
                ),
                [],
            )?;
        }
        Ok(())
    }

    /// Acquire a connection.
    ///
    /// Takes no per-call parameter: the kind of connection returned is
    /// decided entirely by the installed [`ConnectionHook`].
    pub fn get_connection(&self) -> SailResult<Box<dyn SailConnection>> {
        if self.is_shut_down() {
            return Err(SailError::ShutDown);
        }
        self.hook.connection_internal(self)
    }

    /// Open a raw engine connection, bypassing the hook
    pub fn open_native(&self) -> SailResult<NativeConnection> {
        if self.is_shut_down() {
            return Err(SailError::ShutDown);
        }
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        trace!(path = %self.db_path.display(), "Opened native connection");
        Ok(NativeConnection {
            conn,
            shared: Arc::clone(&self.shared),
            changes: None,
            closed: false,
        })
    }

    /// Refuse all further connections. Connections already handed out keep working.
    pub fn shut_down(&self) {
        if !self.shut_down.swap(true, Ordering::SeqCst) {
            info!(path = %self.db_path.display(), "Native store shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn index_definition(&self) -> &IndexDefinition {
        &self.indexes
    }

    /// Number of commits made through this store instance.
    /// Waits for a commit in progress, post-commit callback included.
    pub fn commit_count(&self) -> u64 {
        *self.shared.commit_gate.lock()
    }
}

impl std::fmt::Debug for NativeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeStore")
            .field("db_path", &self.db_path)
            .field("indexes", &self.indexes.canonical())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// A raw connection to the native store
pub struct NativeConnection {
    conn: Connection,
    shared: Arc<EngineShared>,
    /// Changes of the open transaction; `None` when no transaction is open
    changes: Option<ChangeSet>,
    closed: bool,
}

impl NativeConnection {
    /// Commit, then run `after_commit` with the committed changes before any
    /// other connection of the same store can commit.
    ///
    /// `after_commit` is not called when the commit itself fails.
    pub fn commit_with<F>(&mut self, after_commit: F) -> SailResult<ChangeSet>
    where
        F: FnOnce(&ChangeSet),
    {
        self.ensure_open()?;
        if self.changes.is_none() {
            return Err(SailError::NoActiveTransaction);
        }

        let mut commits = self.shared.commit_gate.lock();
        self.conn.execute_batch("COMMIT")?;
        let changes = self.changes.take().unwrap_or_default();
        *commits += 1;
        debug!(
            commit = *commits,
            added = changes.added().len(),
            removed = changes.removed().len(),
            "Committed transaction"
        );

        after_commit(&changes);
        Ok(changes)
    }

    /// Run `unit` inside a savepoint of the open transaction.
    ///
    /// If `unit` fails, everything it wrote is undone, its recorded changes
    /// included, and the transaction stays open as it was before the call.
    pub fn atomically<T, F>(&mut self, unit: F) -> SailResult<T>
    where
        F: FnOnce(&mut Self) -> SailResult<T>,
    {
        let before = self.changes_mut()?.clone();
        self.conn.execute_batch("SAVEPOINT unit")?;

        match unit(self) {
            Ok(value) => {
                self.conn.execute_batch("RELEASE unit")?;
                Ok(value)
            }
            Err(e) => {
                self.conn.execute_batch("ROLLBACK TO unit; RELEASE unit")?;
                self.changes = Some(before);
                trace!(error = %e, "Rolled back to savepoint");
                Err(e)
            }
        }
    }

    /// Changes recorded so far in the open transaction
    pub fn pending_changes(&self) -> Option<&ChangeSet> {
        self.changes.as_ref()
    }

    fn ensure_open(&self) -> SailResult<()> {
        if self.closed {
            Err(SailError::Closed)
        } else {
            Ok(())
        }
    }

    fn changes_mut(&mut self) -> SailResult<&mut ChangeSet> {
        self.ensure_open()?;
        self.changes.as_mut().ok_or(SailError::NoActiveTransaction)
    }

    fn encode_term(term: &Term) -> SailResult<String> {
        Ok(serde_json::to_string(term)?)
    }

    fn encode_context(context: Option<&Term>) -> SailResult<String> {
        match context {
            Some(term) => Self::encode_term(term),
            None => Ok(String::new()),
        }
    }

    fn row_to_statement(subj: String, pred: String, obj: String, ctx: String) -> SailResult<Statement> {
        Ok(Statement {
            subject: serde_json::from_str(&subj)?,
            predicate: serde_json::from_str(&pred)?,
            object: serde_json::from_str(&obj)?,
            context: if ctx.is_empty() {
                None
            } else {
                Some(serde_json::from_str(&ctx)?)
            },
        })
    }

    /// Build the WHERE clause and positional arguments for a pattern
    fn pattern_clause(pattern: &StatementPattern) -> SailResult<(String, Vec<String>)> {
        let mut conditions = Vec::new();
        let mut args = Vec::new();

        let positions = [
            (Position::Subject, &pattern.subject),
            (Position::Predicate, &pattern.predicate),
            (Position::Object, &pattern.object),
        ];
        for (position, term) in positions {
            if let Some(term) = term {
                args.push(Self::encode_term(term)?);
                conditions.push(format!("{} = ?{}", position.column(), args.len()));
            }
        }

        match &pattern.context {
            ContextFilter::Any => {}
            ContextFilter::Default => conditions.push("ctx = ''".to_string()),
            ContextFilter::Named(term) => {
                args.push(Self::encode_term(term)?);
                conditions.push(format!("ctx = ?{}", args.len()));
            }
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        Ok((clause, args))
    }

    fn validate(statement: &Statement) -> SailResult<()> {
        if !statement.subject.is_resource() {
            return Err(SailError::InvalidStatement(format!(
                "subject must be an IRI or blank node: {}",
                statement.subject
            )));
        }
        if !statement.predicate.is_iri() {
            return Err(SailError::InvalidStatement(format!(
                "predicate must be an IRI: {}",
                statement.predicate
            )));
        }
        if let Some(ctx) = &statement.context {
            if !ctx.is_resource() {
                return Err(SailError::InvalidStatement(format!(
                    "context must be an IRI or blank node: {}",
                    ctx
                )));
            }
        }
        Ok(())
    }
}

impl SailConnection for NativeConnection {
    fn get_statements(&self, pattern: &StatementPattern) -> SailResult<Vec<Statement>> {
        self.ensure_open()?;
        let (clause, args) = Self::pattern_clause(pattern)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT subj, pred, obj, ctx FROM statements{}", clause))?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut statements = Vec::new();
        for row in rows {
            let (subj, pred, obj, ctx) = row?;
            statements.push(Self::row_to_statement(subj, pred, obj, ctx)?);
        }
        Ok(statements)
    }

    fn has_statement(&self, pattern: &StatementPattern) -> SailResult<bool> {
        self.ensure_open()?;
        let (clause, args) = Self::pattern_clause(pattern)?;
        let found = self
            .conn
            .query_row(
                &format!("SELECT 1 FROM statements{} LIMIT 1", clause),
                params_from_iter(args.iter()),
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn size(&self, context: &ContextFilter) -> SailResult<usize> {
        self.ensure_open()?;
        let pattern = StatementPattern::any().with_context(context.clone());
        let (clause, args) = Self::pattern_clause(&pattern)?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM statements{}", clause),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn context_ids(&self) -> SailResult<Vec<Term>> {
        self.ensure_open()?;
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT ctx FROM statements WHERE ctx <> '' ORDER BY ctx")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut contexts = Vec::new();
        for row in rows {
            contexts.push(serde_json::from_str(&row?)?);
        }
        Ok(contexts)
    }

    fn get_namespace(&self, prefix: &str) -> SailResult<Option<String>> {
        self.ensure_open()?;
        Ok(self
            .conn
            .query_row(
                "SELECT name FROM namespaces WHERE prefix = ?1",
                params![prefix],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }

    fn namespaces(&self) -> SailResult<Vec<(String, String)>> {
        self.ensure_open()?;
        let mut stmt = self
            .conn
            .prepare("SELECT prefix, name FROM namespaces ORDER BY prefix")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut namespaces = Vec::new();
        for row in rows {
            namespaces.push(row?);
        }
        Ok(namespaces)
    }

    fn is_active(&self) -> bool {
        self.changes.is_some()
    }

    fn begin(&mut self) -> SailResult<()> {
        self.ensure_open()?;
        if self.changes.is_some() {
            return Err(SailError::TransactionActive);
        }
        // Write lock up front; no read-to-write upgrade
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.changes = Some(ChangeSet::new());
        Ok(())
    }

    fn add_statement(&mut self, statement: &Statement) -> SailResult<()> {
        Self::validate(statement)?;
        self.changes_mut()?;

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO statements (subj, pred, obj, ctx) VALUES (?1, ?2, ?3, ?4)",
            params![
                Self::encode_term(&statement.subject)?,
                Self::encode_term(&statement.predicate)?,
                Self::encode_term(&statement.object)?,
                Self::encode_context(statement.context.as_ref())?,
            ],
        )?;

        if inserted > 0 {
            self.changes_mut()?.record_added(statement.clone());
        }
        Ok(())
    }

    fn remove_statements(&mut self, pattern: &StatementPattern) -> SailResult<usize> {
        self.changes_mut()?;
        let matching = self.get_statements(pattern)?;
        if matching.is_empty() {
            return Ok(0);
        }

        let (clause, args) = Self::pattern_clause(pattern)?;
        let deleted = self.conn.execute(
            &format!("DELETE FROM statements{}", clause),
            params_from_iter(args.iter()),
        )?;

        let changes = self.changes_mut()?;
        for statement in matching {
            changes.record_removed(statement);
        }
        Ok(deleted)
    }

    fn clear(&mut self, context: &ContextFilter) -> SailResult<usize> {
        self.remove_statements(&StatementPattern::any().with_context(context.clone()))
    }

    fn set_namespace(&mut self, prefix: &str, name: &str) -> SailResult<()> {
        self.changes_mut()?;
        self.conn.execute(
            r#"
            INSERT INTO namespaces (prefix, name) VALUES (?1, ?2)
            ON CONFLICT(prefix) DO UPDATE SET name = excluded.name
            "#,
            params![prefix, name],
        )?;
        Ok(())
    }

    fn remove_namespace(&mut self, prefix: &str) -> SailResult<()> {
        self.changes_mut()?;
        self.conn
            .execute("DELETE FROM namespaces WHERE prefix = ?1", params![prefix])?;
        Ok(())
    }

    fn commit(&mut self) -> SailResult<()> {
        self.commit_with(|_| {}).map(|_| ())
    }

    fn rollback(&mut self) -> SailResult<()> {
        self.ensure_open()?;
        if let Some(changes) = self.changes.take() {
            self.conn.execute_batch("ROLLBACK")?;
            debug!(
                added = changes.added().len(),
                removed = changes.removed().len(),
                "Rolled back transaction"
            );
        }
        Ok(())
    }

    fn close(&mut self) -> SailResult<()> {
        if self.closed {
            return Ok(());
        }
        self.rollback()?;
        self.closed = true;
        Ok(())
    }
}

impl Drop for NativeConnection {
    fn drop(&mut self) {
        if self.changes.take().is_some() {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %e, "Failed to roll back transaction of dropped connection");
            }
        }
    }
}
