// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operation results and read views, shaped as the HTTP API returns them.

use std::collections::BTreeMap;

use serde::Serialize;
use tokenq_core::{QueueSnapshot, VisitType};

/// Result of a call-next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallOutcome {
    /// Token now called, or null when the queue is empty.
    pub token_no: Option<i64>,
    pub dept: String,
    pub stage: String,
    pub counter: String,
    /// Token the counter finished before calling, if it held one.
    pub finished_token_no: Option<i64>,
}

/// Result of moving a counter's token to another stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub transferred: bool,
    pub token_no: Option<i64>,
    pub dept: String,
    pub from_stage: String,
    pub to_stage: String,
    pub counter: String,
}

/// Result of completing a counter's token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompleteOutcome {
    pub completed: bool,
    pub token_no: Option<i64>,
    pub dept: String,
    pub stage: String,
    pub counter: String,
}

/// Result of a recall request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecallView {
    pub token_no: Option<i64>,
    pub dept: String,
    pub stage: String,
    pub counter: Option<String>,
    pub recall_seq: Option<i64>,
}

/// Most recently issued token of a department, for kiosk reprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastPrintedView {
    pub token_no: Option<i64>,
    pub dept: String,
}

/// Polled by announcement displays: recall channels and who is being served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub ok: bool,
    pub dept: String,
    pub stage: String,
    /// Entry-stage recall channel.
    pub recall_seq: i64,
    pub recall_counter: Option<String>,
    /// Downstream recall channel: the viewed stage, or the hand-off stage
    /// when the entry stage is viewed.
    pub nursing_recall_seq: i64,
    pub nursing_recall_counter: Option<String>,
    pub serving: BTreeMap<String, Option<i64>>,
}

/// Waiting list and counts of one stage queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueView {
    pub dept: String,
    pub stage: String,
    pub waiting_count: usize,
    pub waiting_list: Vec<i64>,
    pub last_called: Option<i64>,
    pub waiting_appt_count: usize,
    pub waiting_appt_list: Vec<i64>,
    pub waiting_walkin_count: usize,
    pub waiting_walkin_list: Vec<i64>,
    pub waiting_lab_count: usize,
    pub waiting_lab_list: Vec<i64>,
    pub called_count: usize,
    pub served_count: usize,
}

impl QueueView {
    pub fn from_snapshot(dept: String, stage: String, snapshot: &QueueSnapshot) -> Self {
        let waiting_list = snapshot.waiting_list();
        let appt = snapshot.waiting_list_for(VisitType::Appointment);
        let walkin = snapshot.waiting_list_for(VisitType::Walkin);
        let lab = snapshot.waiting_list_for(VisitType::Lab);
        Self {
            dept,
            stage,
            waiting_count: waiting_list.len(),
            waiting_list,
            last_called: snapshot.last_called,
            waiting_appt_count: appt.len(),
            waiting_appt_list: appt,
            waiting_walkin_count: walkin.len(),
            waiting_walkin_list: walkin,
            waiting_lab_count: lab.len(),
            waiting_lab_list: lab,
            called_count: snapshot.called_count,
            served_count: snapshot.served_count,
        }
    }
}
