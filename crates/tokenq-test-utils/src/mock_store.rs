// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A queue store that fails on purpose.
//!
//! `FailingStore` implements `QueueStore` with every operation returning the
//! configured fault, so error mapping can be tested without provoking real
//! lock contention or disk failures.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use tokenq_core::traits::adapter::PluginAdapter;
use tokenq_core::{
    AdvanceOutcome, CallRequest, FinishAction, HealthStatus, QueueOrder, QueueSnapshot,
    QueueStore, RecallOutcome, RecallState, TokenStarts, TokenqError, VisitType,
};

/// Which error a [`FailingStore`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    /// Write lock not acquired before the busy timeout.
    Busy,
    /// The database is gone.
    Unavailable,
}

impl StoreFault {
    fn to_error(self) -> TokenqError {
        match self {
            Self::Busy => TokenqError::ResourceBusy {
                detail: "database is locked".to_string(),
            },
            Self::Unavailable => TokenqError::Storage {
                source: Box::new(std::io::Error::other("storage unavailable")),
            },
        }
    }
}

/// Store whose every operation fails with one fault.
pub struct FailingStore {
    fault: StoreFault,
    calls: AtomicUsize,
}

impl FailingStore {
    pub fn new(fault: StoreFault) -> Self {
        Self {
            fault,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of store operations attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, TokenqError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.fault.to_error())
    }
}

#[async_trait]
impl PluginAdapter for FailingStore {
    fn name(&self) -> &str {
        "failing-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, TokenqError> {
        Ok(match self.fault {
            StoreFault::Busy => HealthStatus::Degraded("lock contention".to_string()),
            StoreFault::Unavailable => HealthStatus::Unhealthy("storage unavailable".to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), TokenqError> {
        Ok(())
    }
}

#[async_trait]
impl QueueStore for FailingStore {
    async fn initialize(&self) -> Result<(), TokenqError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), TokenqError> {
        Ok(())
    }

    async fn ensure_fresh_session(
        &self,
        _dept: &str,
        _today: NaiveDate,
        _starts: &TokenStarts,
    ) -> Result<bool, TokenqError> {
        self.fail()
    }

    async fn issue_token(
        &self,
        _dept: &str,
        _visit_type: VisitType,
        _entry_stage: &str,
        _starts: &TokenStarts,
    ) -> Result<i64, TokenqError> {
        self.fail()
    }

    async fn last_issued(&self, _dept: &str) -> Result<Option<i64>, TokenqError> {
        self.fail()
    }

    async fn call_next(&self, _request: &CallRequest) -> Result<Option<i64>, TokenqError> {
        self.fail()
    }

    async fn finish_previous(
        &self,
        _dept: &str,
        _stage: &str,
        _counter: &str,
        _action: &FinishAction,
    ) -> Result<Option<i64>, TokenqError> {
        self.fail()
    }

    async fn advance(
        &self,
        _request: &CallRequest,
        _action: &FinishAction,
    ) -> Result<AdvanceOutcome, TokenqError> {
        self.fail()
    }

    async fn recall(
        &self,
        _dept: &str,
        _stage: &str,
        _counter: Option<&str>,
    ) -> Result<Option<RecallOutcome>, TokenqError> {
        self.fail()
    }

    async fn recall_state(&self, _dept: &str, _stage: &str) -> Result<RecallState, TokenqError> {
        self.fail()
    }

    async fn queue_snapshot(
        &self,
        _dept: &str,
        _stage: &str,
        _order: QueueOrder,
    ) -> Result<QueueSnapshot, TokenqError> {
        self.fail()
    }

    async fn serving(
        &self,
        _dept: &str,
        _stage: &str,
        _counters: &[String],
    ) -> Result<BTreeMap<String, Option<i64>>, TokenqError> {
        self.fail()
    }
}
