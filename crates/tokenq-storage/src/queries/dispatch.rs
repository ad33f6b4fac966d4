// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate selection and the WAITING -> CALLED transition.

use rusqlite::{params, OptionalExtension, Transaction};
use tokenq_core::{CallRequest, QueueOrder, TokenqError};

use crate::database::{now_timestamp, Database};

/// ORDER BY clause ranking WAITING tokens under `order`.
pub(crate) fn order_clause(order: QueueOrder) -> &'static str {
    match order {
        QueueOrder::PriorityThenArrival => "priority ASC, arrival_seq ASC",
        QueueOrder::Arrival => "arrival_seq ASC",
    }
}

/// Select the best WAITING candidate for `request` and mark it CALLED.
pub async fn call_next(db: &Database, request: &CallRequest) -> Result<Option<i64>, TokenqError> {
    let request = request.clone();
    db.write(move |tx| select_and_call(tx, &request, &now_timestamp()))
        .await
}

/// Transaction body of [`call_next`].
///
/// The update is guarded by `status = 'WAITING'`; a row that is no longer
/// waiting is never handed to a second counter.
pub(crate) fn select_and_call(
    tx: &Transaction<'_>,
    request: &CallRequest,
    now: &str,
) -> rusqlite::Result<Option<i64>> {
    let select = format!(
        "SELECT id, token_no FROM tokens
         WHERE dept = ?1 AND stage = ?2 AND status = 'WAITING'
           AND (?3 IS NULL OR priority = ?3)
         ORDER BY {}
         LIMIT 1",
        order_clause(request.order)
    );
    let candidate: Option<(i64, i64)> = tx
        .query_row(
            &select,
            params![request.dept, request.stage, request.priority_filter],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((id, token_no)) = candidate else {
        return Ok(None);
    };

    let updated = tx.execute(
        "UPDATE tokens SET status = 'CALLED', called_at = ?2, called_by = ?3
         WHERE id = ?1 AND status = 'WAITING'",
        params![id, now, request.counter],
    )?;
    Ok((updated == 1).then_some(token_no))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::queries::tokens::{issue_token, list_tokens};
    use tempfile::tempdir;
    use tokenq_core::{TokenStarts, TokenStatus, VisitType};

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        crate::queries::session::open_test_session(&db, "welfare", TokenStarts::default()).await;
        (db, dir)
    }

    fn entry_call(counter: &str, priority_filter: Option<i64>) -> CallRequest {
        CallRequest {
            dept: "welfare".to_string(),
            stage: "reception".to_string(),
            counter: counter.to_string(),
            priority_filter,
            order: QueueOrder::PriorityThenArrival,
        }
    }

    async fn issue(db: &Database, visit_type: VisitType) -> i64 {
        issue_token(db, "welfare", visit_type, "reception", TokenStarts::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn appointment_beats_earlier_walkin() {
        let (db, _dir) = setup_db().await;
        issue(&db, VisitType::Walkin).await;
        issue(&db, VisitType::Appointment).await;

        let first = call_next(&db, &entry_call("Counter1", None)).await.unwrap();
        let second = call_next(&db, &entry_call("Counter1", None)).await.unwrap();
        assert_eq!(first, Some(1001));
        assert_eq!(second, Some(2001));
    }

    #[tokio::test]
    async fn fifo_within_a_priority_class() {
        let (db, _dir) = setup_db().await;
        for _ in 0..3 {
            issue(&db, VisitType::Walkin).await;
        }
        let mut called = Vec::new();
        while let Some(n) = call_next(&db, &entry_call("Counter2", None)).await.unwrap() {
            called.push(n);
        }
        assert_eq!(called, vec![2001, 2002, 2003]);
    }

    #[tokio::test]
    async fn filtered_mode_skips_other_classes() {
        let (db, _dir) = setup_db().await;
        issue(&db, VisitType::Appointment).await;
        issue(&db, VisitType::Walkin).await;

        let walkin = call_next(&db, &entry_call("Counter3", Some(2))).await.unwrap();
        assert_eq!(walkin, Some(2001));
        let none = call_next(&db, &entry_call("Counter3", Some(2))).await.unwrap();
        assert_eq!(none, None);
    }

    #[tokio::test]
    async fn empty_queue_is_none() {
        let (db, _dir) = setup_db().await;
        assert_eq!(call_next(&db, &entry_call("Counter1", None)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn called_token_records_counter() {
        let (db, _dir) = setup_db().await;
        issue(&db, VisitType::Walkin).await;
        call_next(&db, &entry_call("Counter4", None)).await.unwrap();

        let tokens = list_tokens(&db, "welfare").await.unwrap();
        assert_eq!(tokens[0].status, TokenStatus::Called);
        assert_eq!(tokens[0].called_by.as_deref(), Some("Counter4"));
        assert!(tokens[0].called_at.is_some());
    }

    #[tokio::test]
    async fn arrival_order_ignores_priority() {
        let (db, _dir) = setup_db().await;
        issue(&db, VisitType::Walkin).await;
        issue(&db, VisitType::Appointment).await;

        let mut request = entry_call("Counter1", None);
        request.order = QueueOrder::Arrival;
        assert_eq!(call_next(&db, &request).await.unwrap(), Some(2001));
    }

    #[tokio::test]
    async fn concurrent_calls_never_share_a_token() {
        let (db, _dir) = setup_db().await;
        for _ in 0..10 {
            issue(&db, VisitType::Walkin).await;
        }
        let db = Arc::new(db);

        let mut handles = Vec::new();
        for i in 0..16 {
            let db = Arc::clone(&db);
            handles.push(tokio::spawn(async move {
                call_next(&db, &entry_call(&format!("Counter{i}"), None)).await
            }));
        }

        let mut called = Vec::new();
        for handle in handles {
            if let Some(n) = handle.await.unwrap().unwrap() {
                called.push(n);
            }
        }
        let distinct: HashSet<i64> = called.iter().copied().collect();
        assert_eq!(called.len(), 10, "every waiting token is called exactly once");
        assert_eq!(distinct.len(), 10);
    }

    #[test]
    fn order_clauses() {
        assert!(order_clause(QueueOrder::PriorityThenArrival).starts_with("priority"));
        assert_eq!(order_clause(QueueOrder::Arrival), "arrival_seq ASC");
    }
}
