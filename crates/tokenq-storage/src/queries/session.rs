// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-department daily session state and rollover.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Transaction};
use tokenq_core::{TokenStarts, TokenqError, VisitType};
use tracing::debug;

use crate::database::{now_timestamp, Database};

/// Calendar date format stored in `session_state.session_date`.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reset `dept` for `today` if its session belongs to another date.
///
/// Returns `true` when the department's tokens were purged and its sequences
/// restarted. A department seen for the first time is bootstrapped for
/// `today` and reports `false`.
pub async fn ensure_fresh_session(
    db: &Database,
    dept: &str,
    today: NaiveDate,
    starts: TokenStarts,
) -> Result<bool, TokenqError> {
    let dept = dept.to_string();
    let today = today.format(DATE_FORMAT).to_string();
    db.write(move |tx| refresh(tx, &dept, &today, &starts)).await
}

/// Transaction body of [`ensure_fresh_session`].
pub(crate) fn refresh(
    tx: &Transaction<'_>,
    dept: &str,
    today: &str,
    starts: &TokenStarts,
) -> rusqlite::Result<bool> {
    let current: Option<String> = tx
        .query_row(
            "SELECT session_date FROM session_state WHERE dept = ?1",
            params![dept],
            |row| row.get(0),
        )
        .optional()?;

    match current {
        None => {
            insert_session(tx, dept, today, starts)?;
            debug!(dept, session_date = today, "session bootstrapped");
            Ok(false)
        }
        Some(date) if date == today => Ok(false),
        Some(previous) => {
            let purged = tx.execute("DELETE FROM tokens WHERE dept = ?1", params![dept])?;
            tx.execute(
                "UPDATE session_state
                 SET session_date = ?2,
                     next_appointment_token = ?3,
                     next_walkin_token = ?4,
                     next_lab_token = ?5,
                     updated_at = ?6
                 WHERE dept = ?1",
                params![
                    dept,
                    today,
                    starts.appointment,
                    starts.walkin,
                    starts.lab,
                    now_timestamp()
                ],
            )?;
            debug!(dept, previous = %previous, session_date = today, purged, "session rolled over");
            Ok(true)
        }
    }
}

/// Create the session row of `dept` with every sequence at its start value.
pub(crate) fn insert_session(
    tx: &Transaction<'_>,
    dept: &str,
    session_date: &str,
    starts: &TokenStarts,
) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO session_state
            (dept, session_date, next_appointment_token, next_walkin_token, next_lab_token, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            dept,
            session_date,
            starts.appointment,
            starts.walkin,
            starts.lab,
            now_timestamp()
        ],
    )?;
    Ok(())
}

/// Claim the next number of `visit_type`'s sequence for `dept` and advance it.
///
/// The department's session row must already exist: it is created by
/// [`ensure_fresh_session`], which knows the caller's calendar date. A NULL
/// sequence value falls back to the configured start.
pub(crate) fn claim_next_number(
    tx: &Transaction<'_>,
    dept: &str,
    visit_type: VisitType,
    starts: &TokenStarts,
) -> rusqlite::Result<i64> {
    let column = visit_type.sequence_column();
    let select = format!("SELECT {column} FROM session_state WHERE dept = ?1");
    let stored: Option<i64> = tx.query_row(&select, params![dept], |row| row.get(0))?;
    let next = stored.unwrap_or_else(|| starts.start_for(visit_type));

    let update = format!("UPDATE session_state SET {column} = ?2, updated_at = ?3 WHERE dept = ?1");
    tx.execute(&update, params![dept, next + 1, now_timestamp()])?;
    Ok(next)
}

/// Date of the department's current session, if it has one.
pub async fn session_date(db: &Database, dept: &str) -> Result<Option<NaiveDate>, TokenqError> {
    let dept = dept.to_string();
    let raw: Option<String> = db
        .read(move |tx| {
            tx.query_row(
                "SELECT session_date FROM session_state WHERE dept = ?1",
                params![dept],
                |row| row.get(0),
            )
            .optional()
        })
        .await?;
    raw.map(|s| {
        NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| TokenqError::Storage {
            source: Box::new(e),
        })
    })
    .transpose()
}

/// Open `dept`'s session for a fixed test date.
#[cfg(test)]
pub(crate) async fn open_test_session(db: &Database, dept: &str, starts: TokenStarts) {
    let day = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
    ensure_fresh_session(db, dept, day, starts).await.unwrap();
}
