// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete queue stack: a temp SQLite database,
//! the storage adapter, and a [`QueueEngine`] whose calendar date is pinned
//! so daily rollover can be driven from tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{Days, NaiveDate};
use tokenq_config::model::TokenqConfig;
use tokenq_core::{QueueStore, TokenqError};
use tokenq_engine::{EngineSettings, QueueEngine};
use tokenq_storage::SqliteStorage;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: TokenqConfig,
    date: NaiveDate,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: TokenqConfig::default(),
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap_or_default(),
        }
    }

    /// Use a custom configuration. `storage.database_path` is replaced by the temp DB.
    pub fn with_config(mut self, config: TokenqConfig) -> Self {
        self.config = config;
        self
    }

    /// Pin the engine's starting calendar date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Build the test harness, creating and migrating the temp database.
    pub async fn build(self) -> Result<TestHarness, TokenqError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| TokenqError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("queue.db");

        let mut config = self.config;
        config.storage.database_path = db_path.to_string_lossy().to_string();

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let date = Arc::new(Mutex::new(self.date));
        let clock = Arc::clone(&date);
        let engine = QueueEngine::new(
            Arc::clone(&storage) as Arc<dyn QueueStore>,
            EngineSettings::from(&config),
        )
        .with_date_provider(Arc::new(move || match clock.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }));

        Ok(TestHarness {
            engine: Arc::new(engine),
            storage,
            config,
            db_path,
            date,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with temp storage and a pinned clock.
pub struct TestHarness {
    /// Engine over the temp store.
    pub engine: Arc<QueueEngine>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Effective configuration, including the temp database path.
    pub config: TokenqConfig,
    db_path: PathBuf,
    date: Arc<Mutex<NaiveDate>>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Path of the temp database file.
    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    /// The date the engine currently believes it is.
    pub fn today(&self) -> NaiveDate {
        self.engine.today()
    }

    /// Move the engine's clock to `date`.
    pub fn set_date(&self, date: NaiveDate) {
        let mut guard = match self.date.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = date;
    }

    /// Move the engine's clock forward one calendar day.
    pub fn advance_day(&self) {
        let next = self.today() + Days::new(1);
        self.set_date(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_builds_with_defaults() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert!(harness.db_path().exists());
        assert_eq!(harness.config.queue.default_dept, "welfare");
        assert_eq!(harness.today(), NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
    }

    #[tokio::test]
    async fn harness_issues_from_configured_start() {
        let mut config = TokenqConfig::default();
        config.tokens.walkin_start = 501;
        let harness = TestHarness::builder().with_config(config).build().await.unwrap();

        let issued = harness.engine.issue_token(None, Some("walkin")).await.unwrap();
        assert_eq!(issued.token_no, 501);
    }

    #[tokio::test]
    async fn advancing_the_day_resets_numbering() {
        let harness = TestHarness::builder()
            .with_date(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap())
            .build()
            .await
            .unwrap();
        harness.engine.issue_token(None, Some("lab")).await.unwrap();
        harness.engine.issue_token(None, Some("lab")).await.unwrap();

        harness.advance_day();
        assert_eq!(harness.today(), NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        let issued = harness.engine.issue_token(None, Some("lab")).await.unwrap();
        assert_eq!(issued.token_no, 3001);
    }
}
