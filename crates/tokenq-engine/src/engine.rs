// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The queue engine: request normalization and the token lifecycle.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokenq_core::{
    CallMode, CallRequest, FinishAction, IssuedToken, QueueStore, TokenqError, VisitType,
};
use tracing::{debug, info};

use crate::settings::EngineSettings;
use crate::views::{
    CallOutcome, CompleteOutcome, LastPrintedView, QueueView, RecallView, StatusView,
    TransferOutcome,
};

/// Supplies the current calendar date for daily session rollover.
pub type DateProvider = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Token lifecycle engine.
///
/// Every operation is one store transaction (plus the lazy daily reset that
/// precedes it), so concurrent requests from many counters coordinate
/// entirely through the store.
pub struct QueueEngine {
    store: Arc<dyn QueueStore>,
    settings: EngineSettings,
    today: DateProvider,
}

impl QueueEngine {
    /// Create an engine that rolls sessions over on the local calendar date.
    pub fn new(store: Arc<dyn QueueStore>, settings: EngineSettings) -> Self {
        Self {
            store,
            settings,
            today: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Replace the date source (tests pin it).
    pub fn with_date_provider(mut self, today: DateProvider) -> Self {
        self.today = today;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn QueueStore> {
        &self.store
    }

    /// Current session date according to the date provider.
    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    /// Reset `dept` if its session belongs to an earlier day.
    pub async fn ensure_fresh_session(&self, dept: &str) -> Result<bool, TokenqError> {
        let today = self.today();
        let reset = self
            .store
            .ensure_fresh_session(dept, today, &self.settings.starts)
            .await?;
        if reset {
            info!(dept, session_date = %today, "daily session reset");
        }
        Ok(reset)
    }

    /// Issue a token. Unknown or missing visit types become walk-ins.
    pub async fn issue_token(
        &self,
        dept: Option<&str>,
        visit_type: Option<&str>,
    ) -> Result<IssuedToken, TokenqError> {
        let dept = self.settings.resolve_dept(dept);
        let visit_type = VisitType::normalize(visit_type);
        self.ensure_fresh_session(&dept).await?;

        let token_no = self
            .store
            .issue_token(
                &dept,
                visit_type,
                &self.settings.entry_stage,
                &self.settings.starts,
            )
            .await?;
        info!(dept = %dept, visit_type = %visit_type, token_no, "token issued");
        Ok(IssuedToken {
            token_no,
            dept,
            visit_type,
        })
    }

    /// Call the next WAITING token to `counter` without finishing its previous one.
    pub async fn call_next(
        &self,
        dept: Option<&str>,
        stage: Option<&str>,
        counter: Option<&str>,
        mode: Option<&str>,
    ) -> Result<CallOutcome, TokenqError> {
        let request = self.call_request(dept, stage, counter, mode)?;
        self.ensure_fresh_session(&request.dept).await?;

        let token_no = self.store.call_next(&request).await?;
        self.log_call(&request, token_no, None);
        Ok(CallOutcome {
            token_no,
            dept: request.dept,
            stage: request.stage,
            counter: request.counter,
            finished_token_no: None,
        })
    }

    /// Finish the counter's current token and call the next one atomically.
    ///
    /// At the entry stage the finished token moves to the hand-off stage;
    /// anywhere else it is completed.
    pub async fn advance(
        &self,
        dept: Option<&str>,
        stage: Option<&str>,
        counter: Option<&str>,
        mode: Option<&str>,
    ) -> Result<CallOutcome, TokenqError> {
        let request = self.call_request(dept, stage, counter, mode)?;
        self.ensure_fresh_session(&request.dept).await?;

        let action = if self.settings.is_entry(&request.stage) {
            FinishAction::TransferTo(self.settings.handoff_stage.clone())
        } else {
            FinishAction::Complete
        };
        let outcome = self.store.advance(&request, &action).await?;
        self.log_call(&request, outcome.called, outcome.finished);
        Ok(CallOutcome {
            token_no: outcome.called,
            dept: request.dept,
            stage: request.stage,
            counter: request.counter,
            finished_token_no: outcome.finished,
        })
    }

    /// Move the token `counter` most recently called at `from_stage` to
    /// `to_stage`, WAITING again.
    pub async fn transfer_previous_to_stage(
        &self,
        dept: Option<&str>,
        counter: Option<&str>,
        from_stage: Option<&str>,
        to_stage: Option<&str>,
    ) -> Result<TransferOutcome, TokenqError> {
        let dept = self.settings.resolve_dept(dept);
        let counter = require_counter(counter)?;
        let from_stage = self.settings.resolve_stage(from_stage);
        let to_stage = self.settings.resolve_target_stage(to_stage);
        if from_stage == to_stage {
            return Err(TokenqError::Validation(format!(
                "cannot transfer from stage `{from_stage}` to itself"
            )));
        }
        self.ensure_fresh_session(&dept).await?;

        let token_no = self
            .store
            .finish_previous(
                &dept,
                &from_stage,
                &counter,
                &FinishAction::TransferTo(to_stage.clone()),
            )
            .await?;
        match token_no {
            Some(token_no) => info!(
                dept = %dept,
                counter = %counter,
                from = %from_stage,
                to = %to_stage,
                token_no,
                "token transferred"
            ),
            None => debug!(dept = %dept, counter = %counter, "no token to transfer"),
        }
        Ok(TransferOutcome {
            transferred: token_no.is_some(),
            token_no,
            dept,
            from_stage,
            to_stage,
            counter,
        })
    }

    /// Mark the token `counter` most recently called at `stage` as SERVED.
    pub async fn complete_previous(
        &self,
        dept: Option<&str>,
        stage: Option<&str>,
        counter: Option<&str>,
    ) -> Result<CompleteOutcome, TokenqError> {
        let dept = self.settings.resolve_dept(dept);
        let stage = self.settings.resolve_stage(stage);
        let counter = require_counter(counter)?;
        self.ensure_fresh_session(&dept).await?;

        let token_no = self
            .store
            .finish_previous(&dept, &stage, &counter, &FinishAction::Complete)
            .await?;
        if let Some(token_no) = token_no {
            info!(dept = %dept, stage = %stage, counter = %counter, token_no, "token completed");
        }
        Ok(CompleteOutcome {
            completed: token_no.is_some(),
            token_no,
            dept,
            stage,
            counter,
        })
    }

    /// Re-announce the last called token of a stage, bumping its recall channel.
    pub async fn recall(
        &self,
        dept: Option<&str>,
        stage: Option<&str>,
        counter: Option<&str>,
    ) -> Result<RecallView, TokenqError> {
        let dept = self.settings.resolve_dept(dept);
        let stage = self.settings.resolve_stage(stage);
        let counter = counter.map(str::trim).filter(|c| !c.is_empty());

        let outcome = self.store.recall(&dept, &stage, counter).await?;
        Ok(match outcome {
            Some(recalled) => {
                info!(
                    dept = %dept,
                    stage = %stage,
                    counter = ?recalled.counter,
                    token_no = recalled.token_no,
                    recall_seq = recalled.recall_seq,
                    "token recalled"
                );
                RecallView {
                    token_no: Some(recalled.token_no),
                    dept,
                    stage,
                    counter: recalled.counter,
                    recall_seq: Some(recalled.recall_seq),
                }
            }
            None => RecallView {
                token_no: None,
                dept,
                stage,
                counter: counter.map(str::to_string),
                recall_seq: None,
            },
        })
    }

    /// Recall channels and the token each counter of `stage` is serving.
    pub async fn status(
        &self,
        dept: Option<&str>,
        stage: Option<&str>,
    ) -> Result<StatusView, TokenqError> {
        let dept = self.settings.resolve_dept(dept);
        let stage = self.settings.resolve_stage(stage);

        let entry = self
            .store
            .recall_state(&dept, &self.settings.entry_stage)
            .await?;
        let downstream = self
            .store
            .recall_state(&dept, self.settings.downstream_recall_stage(&stage))
            .await?;
        let serving = self
            .store
            .serving(&dept, &stage, self.settings.counters_for(&stage))
            .await?;

        Ok(StatusView {
            ok: true,
            dept,
            stage,
            recall_seq: entry.recall_seq,
            recall_counter: entry.counter,
            nursing_recall_seq: downstream.recall_seq,
            nursing_recall_counter: downstream.counter,
            serving,
        })
    }

    /// Waiting list and counts of one stage queue, in call order.
    pub async fn queue(
        &self,
        dept: Option<&str>,
        stage: Option<&str>,
    ) -> Result<QueueView, TokenqError> {
        let dept = self.settings.resolve_dept(dept);
        let stage = self.settings.resolve_stage(stage);
        self.ensure_fresh_session(&dept).await?;

        let snapshot = self
            .store
            .queue_snapshot(&dept, &stage, self.settings.order_for(&stage))
            .await?;
        Ok(QueueView::from_snapshot(dept, stage, &snapshot))
    }

    /// Most recently issued token of the department's current session.
    pub async fn last_printed(&self, dept: Option<&str>) -> Result<LastPrintedView, TokenqError> {
        let dept = self.settings.resolve_dept(dept);
        self.ensure_fresh_session(&dept).await?;
        let token_no = self.store.last_issued(&dept).await?;
        Ok(LastPrintedView { token_no, dept })
    }

    fn call_request(
        &self,
        dept: Option<&str>,
        stage: Option<&str>,
        counter: Option<&str>,
        mode: Option<&str>,
    ) -> Result<CallRequest, TokenqError> {
        let dept = self.settings.resolve_dept(dept);
        let stage = self.settings.resolve_stage(stage);
        let counter = self.resolve_counter(&stage, counter)?;
        let mode = CallMode::normalize(mode);
        Ok(CallRequest {
            order: self.settings.order_for(&stage),
            priority_filter: mode.priority_filter(),
            dept,
            stage,
            counter,
        })
    }

    /// Named counter, else the first counter configured for `stage`.
    fn resolve_counter(&self, stage: &str, raw: Option<&str>) -> Result<String, TokenqError> {
        if let Some(counter) = raw.map(str::trim).filter(|c| !c.is_empty()) {
            return Ok(counter.to_string());
        }
        self.settings
            .counters_for(stage)
            .first()
            .cloned()
            .ok_or_else(|| {
                TokenqError::Validation(format!(
                    "counter is required: no counters configured for stage `{stage}`"
                ))
            })
    }

    fn log_call(&self, request: &CallRequest, called: Option<i64>, finished: Option<i64>) {
        match called {
            Some(token_no) => info!(
                dept = %request.dept,
                stage = %request.stage,
                counter = %request.counter,
                token_no,
                finished = ?finished,
                "token called"
            ),
            None => debug!(
                dept = %request.dept,
                stage = %request.stage,
                counter = %request.counter,
                finished = ?finished,
                "queue empty"
            ),
        }
    }
}

fn require_counter(raw: Option<&str>) -> Result<String, TokenqError> {
    raw.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .ok_or_else(|| TokenqError::Validation("counter is required".to_string()))
}
