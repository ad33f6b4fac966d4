// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the QueueStore trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::OnceCell;
use tracing::debug;

use tokenq_config::model::StorageConfig;
use tokenq_core::{
    AdvanceOutcome, CallRequest, FinishAction, HealthStatus, PluginAdapter, QueueOrder,
    QueueSnapshot, QueueStore, RecallOutcome, RecallState, TokenStarts, TokenqError, VisitType,
};

use crate::database::{Database, DatabaseOptions};
use crate::queries;

/// SQLite-backed queue store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`QueueStore::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`QueueStore::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, TokenqError> {
        self.db.get().ok_or_else(|| TokenqError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, TokenqError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TokenqError> {
        // Shutdown delegates to close if the DB was initialized.
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl QueueStore for SqliteStorage {
    async fn initialize(&self) -> Result<(), TokenqError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with(&path, DatabaseOptions::from(&self.config)).await?;
        self.db.set(db).map_err(|_| TokenqError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), TokenqError> {
        self.db()?.close().await
    }

    async fn ensure_fresh_session(
        &self,
        dept: &str,
        today: NaiveDate,
        starts: &TokenStarts,
    ) -> Result<bool, TokenqError> {
        queries::session::ensure_fresh_session(self.db()?, dept, today, *starts).await
    }

    async fn issue_token(
        &self,
        dept: &str,
        visit_type: VisitType,
        entry_stage: &str,
        starts: &TokenStarts,
    ) -> Result<i64, TokenqError> {
        queries::tokens::issue_token(self.db()?, dept, visit_type, entry_stage, *starts).await
    }

    async fn last_issued(&self, dept: &str) -> Result<Option<i64>, TokenqError> {
        queries::tokens::last_issued(self.db()?, dept).await
    }

    async fn call_next(&self, request: &CallRequest) -> Result<Option<i64>, TokenqError> {
        queries::dispatch::call_next(self.db()?, request).await
    }

    async fn finish_previous(
        &self,
        dept: &str,
        stage: &str,
        counter: &str,
        action: &FinishAction,
    ) -> Result<Option<i64>, TokenqError> {
        queries::pipeline::finish_previous(self.db()?, dept, stage, counter, action).await
    }

    async fn advance(
        &self,
        request: &CallRequest,
        action: &FinishAction,
    ) -> Result<AdvanceOutcome, TokenqError> {
        queries::pipeline::advance(self.db()?, request, action).await
    }

    async fn recall(
        &self,
        dept: &str,
        stage: &str,
        counter: Option<&str>,
    ) -> Result<Option<RecallOutcome>, TokenqError> {
        queries::recall::recall(self.db()?, dept, stage, counter).await
    }

    async fn recall_state(&self, dept: &str, stage: &str) -> Result<RecallState, TokenqError> {
        queries::recall::recall_state(self.db()?, dept, stage).await
    }

    async fn queue_snapshot(
        &self,
        dept: &str,
        stage: &str,
        order: QueueOrder,
    ) -> Result<QueueSnapshot, TokenqError> {
        queries::snapshot::queue_snapshot(self.db()?, dept, stage, order).await
    }

    async fn serving(
        &self,
        dept: &str,
        stage: &str,
        counters: &[String],
    ) -> Result<BTreeMap<String, Option<i64>>, TokenqError> {
        queries::snapshot::serving(self.db()?, dept, stage, counters).await
    }
}
