// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stage pipeline: finishing a counter's token (transfer or complete) and
//! the combined finish-then-call step.

use rusqlite::{params, OptionalExtension, Transaction};
use tokenq_core::{AdvanceOutcome, CallRequest, FinishAction, TokenqError};

use crate::database::{now_timestamp, Database};
use crate::queries::{dispatch, tokens};

/// Finish the token most recently CALLED by `counter` at (`dept`, `stage`).
pub async fn finish_previous(
    db: &Database,
    dept: &str,
    stage: &str,
    counter: &str,
    action: &FinishAction,
) -> Result<Option<i64>, TokenqError> {
    let dept = dept.to_string();
    let stage = stage.to_string();
    let counter = counter.to_string();
    let action = action.clone();
    db.write(move |tx| finish_in(tx, &dept, &stage, &counter, &action, &now_timestamp()))
        .await
}

/// Finish the counter's previous token, then call the next one, atomically.
pub async fn advance(
    db: &Database,
    request: &CallRequest,
    action: &FinishAction,
) -> Result<AdvanceOutcome, TokenqError> {
    let request = request.clone();
    let action = action.clone();
    db.write(move |tx| {
        let now = now_timestamp();
        let finished = finish_in(
            tx,
            &request.dept,
            &request.stage,
            &request.counter,
            &action,
            &now,
        )?;
        let called = dispatch::select_and_call(tx, &request, &now)?;
        Ok(AdvanceOutcome { finished, called })
    })
    .await
}

/// Transaction body of [`finish_previous`].
pub(crate) fn finish_in(
    tx: &Transaction<'_>,
    dept: &str,
    stage: &str,
    counter: &str,
    action: &FinishAction,
    now: &str,
) -> rusqlite::Result<Option<i64>> {
    let held: Option<(i64, i64)> = tx
        .query_row(
            "SELECT id, token_no FROM tokens
             WHERE dept = ?1 AND stage = ?2 AND status = 'CALLED' AND called_by = ?3
             ORDER BY called_at DESC, id DESC
             LIMIT 1",
            params![dept, stage, counter],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((id, token_no)) = held else {
        return Ok(None);
    };

    match action {
        FinishAction::TransferTo(to_stage) => {
            let arrival_seq = tokens::next_arrival_seq(tx, dept)?;
            tx.execute(
                "UPDATE tokens
                 SET stage = ?2, status = 'WAITING', called_at = NULL, called_by = NULL,
                     transferred_at = ?3, arrival_seq = ?4
                 WHERE id = ?1",
                params![id, to_stage, now, arrival_seq],
            )?;
        }
        FinishAction::Complete => {
            tx.execute(
                "UPDATE tokens SET status = 'SERVED', served_at = ?2 WHERE id = ?1",
                params![id, now],
            )?;
        }
    }
    Ok(Some(token_no))
}
