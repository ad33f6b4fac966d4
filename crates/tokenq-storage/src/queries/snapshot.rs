// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only views of a stage queue.

use std::collections::BTreeMap;

use rusqlite::{params, OptionalExtension};
use tokenq_core::{QueueOrder, QueueSnapshot, TokenqError};

use crate::database::Database;
use crate::queries::dispatch::order_clause;
use crate::queries::tokens::{token_from_row, TOKEN_COLUMNS};

/// Waiting list (in call order), last called token and status counts of
/// (`dept`, `stage`), read from one consistent snapshot.
pub async fn queue_snapshot(
    db: &Database,
    dept: &str,
    stage: &str,
    order: QueueOrder,
) -> Result<QueueSnapshot, TokenqError> {
    let dept = dept.to_string();
    let stage = stage.to_string();
    db.read(move |tx| {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens
             WHERE dept = ?1 AND stage = ?2 AND status = 'WAITING'
             ORDER BY {}",
            order_clause(order)
        );
        let mut stmt = tx.prepare(&sql)?;
        let waiting = stmt
            .query_map(params![dept, stage], token_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let last_called: Option<i64> = tx
            .query_row(
                "SELECT token_no FROM tokens
                 WHERE dept = ?1 AND stage = ?2 AND status = 'CALLED'
                 ORDER BY called_at DESC, id DESC
                 LIMIT 1",
                params![dept, stage],
                |row| row.get(0),
            )
            .optional()?;

        let (called_count, served_count): (i64, i64) = tx.query_row(
            "SELECT COALESCE(SUM(status = 'CALLED'), 0), COALESCE(SUM(status = 'SERVED'), 0)
             FROM tokens WHERE dept = ?1 AND stage = ?2",
            params![dept, stage],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(QueueSnapshot {
            waiting,
            last_called,
            called_count: usize::try_from(called_count).unwrap_or_default(),
            served_count: usize::try_from(served_count).unwrap_or_default(),
        })
    })
    .await
}

/// Latest CALLED token per counter at (`dept`, `stage`).
///
/// Every counter in `counters` is present (None when idle), plus any other
/// counter currently holding a CALLED token there.
pub async fn serving(
    db: &Database,
    dept: &str,
    stage: &str,
    counters: &[String],
) -> Result<BTreeMap<String, Option<i64>>, TokenqError> {
    let dept = dept.to_string();
    let stage = stage.to_string();
    let mut serving: BTreeMap<String, Option<i64>> =
        counters.iter().map(|c| (c.clone(), None)).collect();

    let held: Vec<(String, i64)> = db
        .read(move |tx| {
            let mut stmt = tx.prepare(
                "SELECT called_by, token_no FROM tokens
                 WHERE dept = ?1 AND stage = ?2 AND status = 'CALLED' AND called_by IS NOT NULL
                 ORDER BY called_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![dept, stage], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect()
        })
        .await?;

    // Ascending call order: the last write per counter is its latest token.
    for (counter, token_no) in held {
        serving.insert(counter, Some(token_no));
    }
    Ok(serving)
}
