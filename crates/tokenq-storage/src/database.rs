// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{ErrorCode, Transaction, TransactionBehavior};
use tokenq_config::model::StorageConfig;
use tokenq_core::TokenqError;
use tokio_rusqlite::Connection;
use tracing::debug;

/// Open options applied when the connection is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseOptions {
    pub wal_mode: bool,
    pub busy_timeout: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            wal_mode: true,
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

impl From<&StorageConfig> for DatabaseOptions {
    fn from(config: &StorageConfig) -> Self {
        Self {
            wal_mode: config.wal_mode,
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        }
    }
}

/// Handle to the single SQLite writer connection.
///
/// Every operation runs as a closure on tokio-rusqlite's background thread,
/// so closures never interleave within one process.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `path` with default options and run migrations.
    pub async fn open(path: &str) -> Result<Self, TokenqError> {
        Self::open_with(path, DatabaseOptions::default()).await
    }

    /// Open the database at `path`, apply PRAGMAs and run pending migrations.
    pub async fn open_with(path: &str, options: DatabaseOptions) -> Result<Self, TokenqError> {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TokenqError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| TokenqError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| {
            let setup = apply_pragmas(conn, options)
                .map_err(classify_sqlite_err)
                .and_then(|()| crate::migrations::run_migrations(conn));
            Ok::<_, rusqlite::Error>(setup)
        })
        .await
        .map_err(map_tr_err)??;

        debug!(
            path,
            wal_mode = options.wal_mode,
            busy_timeout_ms = options.busy_timeout.as_millis() as u64,
            "database opened"
        );
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `op` inside one `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken before the first statement, so the closure's
    /// reads and writes see no interleaved writer. Commits when `op` returns
    /// `Ok`; any error rolls the transaction back on drop.
    pub async fn write<T, F>(&self, op: F) -> Result<T, TokenqError>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T> + Send + 'static,
    {
        self.conn
            .call(move |conn| {
                let outcome = run_in_transaction(conn, TransactionBehavior::Immediate, op);
                Ok::<_, rusqlite::Error>(outcome.map_err(classify_sqlite_err))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// Run `op` inside a deferred (read) transaction for a consistent snapshot.
    pub async fn read<T, F>(&self, op: F) -> Result<T, TokenqError>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T> + Send + 'static,
    {
        self.conn
            .call(move |conn| {
                let outcome = run_in_transaction(conn, TransactionBehavior::Deferred, op);
                Ok::<_, rusqlite::Error>(outcome.map_err(classify_sqlite_err))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// Checkpoint the WAL so the database file is self-contained.
    pub async fn close(&self) -> Result<(), TokenqError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

fn apply_pragmas(conn: &mut rusqlite::Connection, options: DatabaseOptions) -> rusqlite::Result<()> {
    if options.wal_mode {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    }
    conn.execute_batch("PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(options.busy_timeout)?;
    Ok(())
}

fn run_in_transaction<T, F>(
    conn: &mut rusqlite::Connection,
    behavior: TransactionBehavior,
    op: F,
) -> rusqlite::Result<T>
where
    F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
{
    let tx = conn.transaction_with_behavior(behavior)?;
    let value = op(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Convert a tokio-rusqlite error (closed connection, failed call) into a storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TokenqError {
    TokenqError::Storage {
        source: Box::new(e),
    }
}

/// Lock contention becomes `ResourceBusy`; everything else is a storage failure.
pub fn classify_sqlite_err(e: rusqlite::Error) -> TokenqError {
    match e.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => TokenqError::ResourceBusy {
            detail: e.to_string(),
        },
        _ => TokenqError::Storage {
            source: Box::new(e),
        },
    }
}

/// Current UTC time as a fixed-width RFC 3339 timestamp with microseconds.
///
/// Fixed width keeps lexical order equal to chronological order in SQL.
pub fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}
