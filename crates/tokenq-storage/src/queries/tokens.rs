// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token issuance and row mapping.

use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{params, Row, Transaction};
use tokenq_core::{Token, TokenStarts, TokenStatus, TokenqError, VisitType};

use crate::database::{now_timestamp, Database};
use crate::queries::session;

/// Column list matching [`token_from_row`].
pub(crate) const TOKEN_COLUMNS: &str = "id, token_no, dept, visit_type, stage, priority, status,
     arrival_seq, created_at, called_at, called_by, served_at, transferred_at";

/// Map a row selected with [`TOKEN_COLUMNS`] into a [`Token`].
pub(crate) fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    let visit_type: String = row.get(3)?;
    let status: String = row.get(6)?;
    Ok(Token {
        id: row.get(0)?,
        token_no: row.get(1)?,
        dept: row.get(2)?,
        visit_type: VisitType::from_str(&visit_type).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
        })?,
        stage: row.get(4)?,
        priority: row.get(5)?,
        status: TokenStatus::from_str(&status).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e))
        })?,
        arrival_seq: row.get(7)?,
        created_at: row.get(8)?,
        called_at: row.get(9)?,
        called_by: row.get(10)?,
        served_at: row.get(11)?,
        transferred_at: row.get(12)?,
    })
}

/// Next arrival sequence number of `dept`.
pub(crate) fn next_arrival_seq(tx: &Transaction<'_>, dept: &str) -> rusqlite::Result<i64> {
    tx.query_row(
        "SELECT COALESCE(MAX(arrival_seq), 0) + 1 FROM tokens WHERE dept = ?1",
        params![dept],
        |row| row.get(0),
    )
}

/// Issue the next token of `visit_type` for `dept`, waiting at `entry_stage`.
///
/// Sequence read, insert and sequence write-back happen in one IMMEDIATE
/// transaction, so concurrent issuers receive distinct contiguous numbers.
pub async fn issue_token(
    db: &Database,
    dept: &str,
    visit_type: VisitType,
    entry_stage: &str,
    starts: TokenStarts,
) -> Result<i64, TokenqError> {
    let dept = dept.to_string();
    let entry_stage = entry_stage.to_string();
    db.write(move |tx| {
        let token_no = session::claim_next_number(tx, &dept, visit_type, &starts)?;
        let arrival_seq = next_arrival_seq(tx, &dept)?;
        tx.execute(
            "INSERT INTO tokens
                (token_no, dept, visit_type, stage, priority, status, arrival_seq, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'WAITING', ?6, ?7)",
            params![
                token_no,
                dept,
                visit_type.to_string(),
                entry_stage,
                visit_type.priority(),
                arrival_seq,
                now_timestamp()
            ],
        )?;
        Ok(token_no)
    })
    .await
}

/// Most recently issued token number of `dept` in the current session.
pub async fn last_issued(db: &Database, dept: &str) -> Result<Option<i64>, TokenqError> {
    let dept = dept.to_string();
    db.read(move |tx| {
        let result = tx.query_row(
            "SELECT token_no FROM tokens WHERE dept = ?1 ORDER BY id DESC LIMIT 1",
            params![dept],
            |row| row.get(0),
        );
        match result {
            Ok(token_no) => Ok(Some(token_no)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await
}

/// Every token of `dept`, oldest first.
pub async fn list_tokens(db: &Database, dept: &str) -> Result<Vec<Token>, TokenqError> {
    let dept = dept.to_string();
    db.read(move |tx| {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE dept = ?1 ORDER BY id ASC");
        let mut stmt = tx.prepare(&sql)?;
        let rows = stmt.query_map(params![dept], token_from_row)?;
        rows.collect()
    })
    .await
}
