//! Relational store shared by the sequence and step registries.
//!
//! # Schema
//!
//! ```text
//! sequences        (id PK, name UNIQUE, open_tracking_enabled, click_tracking_enabled)
//! sequence_steps   (id PK, subject, content, sequence_id FK -> sequences.id,
//!                   UNIQUE (sequence_id, subject))
//! ```
//!
//! The unique indexes are the source of truth for both uniqueness rules.
//! Registries still pre-check so callers get a friendly rejection, but a
//! constraint violation on write is reported as the same conflict.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{Connection, ErrorCode};

use crate::error::{Result, SequenceError};

/// Bumped whenever `MIGRATIONS` gains an entry.
pub const SCHEMA_VERSION: i64 = 1;

const BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Applied in order; entry `n` moves the schema from version `n` to `n + 1`.
const MIGRATIONS: &[&str] = &[r#"
CREATE TABLE IF NOT EXISTS sequences (
    id                     INTEGER PRIMARY KEY AUTOINCREMENT,
    name                   TEXT    NOT NULL UNIQUE,
    open_tracking_enabled  INTEGER NOT NULL DEFAULT 0,
    click_tracking_enabled INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS sequence_steps (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    subject     TEXT    NOT NULL,
    content     TEXT    NOT NULL,
    sequence_id INTEGER NOT NULL REFERENCES sequences(id),
    UNIQUE (sequence_id, subject)
);
CREATE INDEX IF NOT EXISTS idx_sequence_steps_sequence_id
    ON sequence_steps (sequence_id);
"#];

// ---------------------------------------------------------------------------
// Db
// ---------------------------------------------------------------------------

/// Cloneable handle to the store. All clones share one connection, guarded
/// by a mutex, so the handle can be moved freely across worker threads.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Open or create the database file at `path` and bring the schema up to
    /// date. Parent directories are created as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened sequence store");
        Self::init(conn)
    }

    /// Private in-memory database. Each call returns an independent store.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock().map_err(|_| SequenceError::LockPoisoned)?;
        f(&guard)
    }

    /// Current value of the schema version stamp.
    pub fn schema_version(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(user_version(conn)?))
    }
}

fn user_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

fn migrate(conn: &Connection) -> Result<()> {
    apply_migrations(conn, MIGRATIONS)
}

/// Each migration and its version stamp commit together or not at all.
fn apply_migrations(conn: &Connection, migrations: &[&str]) -> Result<()> {
    let current = user_version(conn)?;
    for (idx, sql) in migrations.iter().enumerate() {
        let target = idx as i64 + 1;
        if current >= target {
            continue;
        }
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", target)?;
        tx.commit()?;
        tracing::info!(version = target, "applied schema migration");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Constraint classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    ForeignKey,
}

/// Classify a write failure caused by a table constraint.
pub(crate) fn violation(err: &rusqlite::Error) -> Option<Violation> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            match e.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Some(Violation::Unique),
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Violation::ForeignKey),
                _ => None,
            }
        }
        _ => None,
    }
}
