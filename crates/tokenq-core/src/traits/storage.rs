// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage trait for transactional queue backends.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::TokenqError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AdvanceOutcome, CallRequest, FinishAction, QueueOrder, QueueSnapshot, RecallOutcome,
    RecallState, TokenStarts, VisitType,
};

/// Transactional persistence for tokens, department sessions and recall channels.
///
/// Every mutating method runs inside exactly one store transaction and either
/// commits all of its writes or none. Lock contention surfaces as
/// [`TokenqError::ResourceBusy`] and the caller retries.
#[async_trait]
pub trait QueueStore: PluginAdapter {
    /// Initializes the backend (schema migrations, connection setup).
    async fn initialize(&self) -> Result<(), TokenqError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), TokenqError>;

    // --- Session manager ---

    /// Resets `dept` for `today` if its session belongs to an earlier date.
    ///
    /// Returns `true` when a reset happened: every token of the department was
    /// deleted and every sequence restarted from `starts`.
    async fn ensure_fresh_session(
        &self,
        dept: &str,
        today: NaiveDate,
        starts: &TokenStarts,
    ) -> Result<bool, TokenqError>;

    // --- Token issuer ---

    /// Allocates the next number of `visit_type`'s sequence and inserts a
    /// WAITING token at `entry_stage`. Returns the assigned number.
    async fn issue_token(
        &self,
        dept: &str,
        visit_type: VisitType,
        entry_stage: &str,
        starts: &TokenStarts,
    ) -> Result<i64, TokenqError>;

    /// Most recently issued token number of `dept`.
    async fn last_issued(&self, dept: &str) -> Result<Option<i64>, TokenqError>;

    // --- Dispatcher and pipeline ---

    /// Selects the best WAITING candidate and marks it CALLED by the counter.
    async fn call_next(&self, request: &CallRequest) -> Result<Option<i64>, TokenqError>;

    /// Finishes the token most recently CALLED by `counter` at `stage`.
    ///
    /// Returns the finished token number, or `None` when the counter held nothing.
    async fn finish_previous(
        &self,
        dept: &str,
        stage: &str,
        counter: &str,
        action: &FinishAction,
    ) -> Result<Option<i64>, TokenqError>;

    /// Finishes the counter's previous token and calls the next one in a
    /// single transaction.
    async fn advance(
        &self,
        request: &CallRequest,
        action: &FinishAction,
    ) -> Result<AdvanceOutcome, TokenqError>;

    // --- Recall tracker ---

    /// Bumps the recall channel of (dept, stage) for its last CALLED token,
    /// optionally narrowed to one counter.
    async fn recall(
        &self,
        dept: &str,
        stage: &str,
        counter: Option<&str>,
    ) -> Result<Option<RecallOutcome>, TokenqError>;

    /// Current recall channel of (dept, stage).
    async fn recall_state(&self, dept: &str, stage: &str) -> Result<RecallState, TokenqError>;

    // --- Read views ---

    /// WAITING/CALLED/SERVED view of one stage queue.
    async fn queue_snapshot(
        &self,
        dept: &str,
        stage: &str,
        order: QueueOrder,
    ) -> Result<QueueSnapshot, TokenqError>;

    /// Latest CALLED token per counter at (dept, stage).
    ///
    /// Every counter in `counters` appears in the result (null when idle), as
    /// does any other counter currently holding a CALLED token there.
    async fn serving(
        &self,
        dept: &str,
        stage: &str,
        counters: &[String],
    ) -> Result<BTreeMap<String, Option<i64>>, TokenqError>;
}
