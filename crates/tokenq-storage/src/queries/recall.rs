// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recall channels: one persisted sequence per (dept, stage).

use rusqlite::{params, OptionalExtension};
use tokenq_core::{RecallOutcome, RecallState, TokenqError};

use crate::database::{now_timestamp, Database};

/// Re-announce the last CALLED token of (`dept`, `stage`).
///
/// With `counter`, only that counter's tokens are considered. The recorded
/// counter is the requested one, else the token's `called_by`. Returns
/// `None` (and leaves the channel untouched) when nothing is CALLED.
pub async fn recall(
    db: &Database,
    dept: &str,
    stage: &str,
    counter: Option<&str>,
) -> Result<Option<RecallOutcome>, TokenqError> {
    let dept = dept.to_string();
    let stage = stage.to_string();
    let counter = counter.map(str::to_string);
    db.write(move |tx| {
        let last: Option<(i64, Option<String>)> = tx
            .query_row(
                "SELECT token_no, called_by FROM tokens
                 WHERE dept = ?1 AND stage = ?2 AND status = 'CALLED'
                   AND (?3 IS NULL OR called_by = ?3)
                 ORDER BY called_at DESC, id DESC
                 LIMIT 1",
                params![dept, stage, counter],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((token_no, called_by)) = last else {
            return Ok(None);
        };

        let counter = counter.or(called_by);
        let recall_seq: i64 = tx.query_row(
            "INSERT INTO recall_state (dept, stage, recall_seq, last_recall_counter, updated_at)
             VALUES (?1, ?2, 1, ?3, ?4)
             ON CONFLICT(dept, stage) DO UPDATE SET
                 recall_seq = recall_seq + 1,
                 last_recall_counter = excluded.last_recall_counter,
                 updated_at = excluded.updated_at
             RETURNING recall_seq",
            params![dept, stage, counter, now_timestamp()],
            |row| row.get(0),
        )?;

        Ok(Some(RecallOutcome {
            token_no,
            counter,
            recall_seq,
        }))
    })
    .await
}

/// Current recall channel of (`dept`, `stage`); zero when never recalled.
pub async fn recall_state(db: &Database, dept: &str, stage: &str) -> Result<RecallState, TokenqError> {
    let dept = dept.to_string();
    let stage = stage.to_string();
    db.read(move |tx| {
        let state = tx
            .query_row(
                "SELECT recall_seq, last_recall_counter FROM recall_state
                 WHERE dept = ?1 AND stage = ?2",
                params![dept, stage],
                |row| {
                    Ok(RecallState {
                        recall_seq: row.get(0)?,
                        counter: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(state.unwrap_or_default())
    })
    .await
}
