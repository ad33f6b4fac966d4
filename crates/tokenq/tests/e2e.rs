// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete queue pipeline and the CLI.
//!
//! Each pipeline test creates an isolated TestHarness with a temp SQLite
//! database and a pinned calendar date. Tests are independent and
//! order-insensitive.

use std::collections::HashSet;
use std::io::Write;
use std::process::Command;
use std::sync::Arc;

use tokenq_test_utils::TestHarness;

// ---- Full day at one department ----

#[tokio::test]
async fn test_patient_journey_reception_to_nursing() {
    let harness = TestHarness::builder().build().await.unwrap();
    let engine = &harness.engine;

    let walkin = engine.issue_token(Some("welfare"), Some("walkin")).await.unwrap();
    let appt = engine
        .issue_token(Some("welfare"), Some("appointment"))
        .await
        .unwrap();
    assert_eq!(walkin.token_no, 2001);
    assert_eq!(appt.token_no, 1001);

    // Reception calls the appointment first.
    let called = engine
        .advance(Some("welfare"), Some("reception"), Some("Counter1"), None)
        .await
        .unwrap();
    assert_eq!(called.token_no, Some(1001));

    // Next call at the same counter hands 1001 to nursing and calls 2001.
    let called = engine
        .advance(Some("welfare"), Some("reception"), Some("Counter1"), None)
        .await
        .unwrap();
    assert_eq!(called.finished_token_no, Some(1001));
    assert_eq!(called.token_no, Some(2001));

    // Nursing serves in hand-off order.
    let nursing = engine
        .advance(Some("welfare"), Some("nursing"), Some("Nurse1"), None)
        .await
        .unwrap();
    assert_eq!(nursing.token_no, Some(1001));

    let status = engine.status(Some("welfare"), Some("nursing")).await.unwrap();
    assert_eq!(status.serving.get("Nurse1"), Some(&Some(1001)));

    // Finishing at nursing completes the token.
    let done = engine
        .complete_previous(Some("welfare"), Some("nursing"), Some("Nurse1"))
        .await
        .unwrap();
    assert!(done.completed);
    let nursing_queue = engine.queue(Some("welfare"), Some("nursing")).await.unwrap();
    assert_eq!(nursing_queue.served_count, 1);
    assert_eq!(nursing_queue.waiting_count, 0);
}

#[tokio::test]
async fn test_departments_are_independent() {
    let harness = TestHarness::builder().build().await.unwrap();
    let engine = &harness.engine;

    let a = engine.issue_token(Some("welfare"), Some("lab")).await.unwrap();
    let b = engine.issue_token(Some("dental"), Some("lab")).await.unwrap();
    assert_eq!(a.token_no, 3001);
    assert_eq!(b.token_no, 3001);

    let called = engine
        .call_next(Some("dental"), None, Some("Counter1"), None)
        .await
        .unwrap();
    assert_eq!(called.token_no, Some(3001));

    let welfare = engine.queue(Some("welfare"), None).await.unwrap();
    assert_eq!(welfare.waiting_list, vec![3001]);
}

// ---- Concurrency ----

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_kiosks_and_counters() {
    let harness = TestHarness::builder().build().await.unwrap();
    let engine = Arc::clone(&harness.engine);

    let mut issuers = Vec::new();
    for _ in 0..12 {
        let engine = Arc::clone(&engine);
        issuers.push(tokio::spawn(async move {
            engine.issue_token(None, Some("walkin")).await.unwrap().token_no
        }));
    }
    let mut numbers = Vec::new();
    for handle in issuers {
        numbers.push(handle.await.unwrap());
    }
    numbers.sort_unstable();
    assert_eq!(numbers, (2001..2013).collect::<Vec<_>>());

    let mut callers = Vec::new();
    for i in 0..16 {
        let engine = Arc::clone(&engine);
        callers.push(tokio::spawn(async move {
            let counter = format!("Counter{}", i % 4 + 1);
            engine
                .call_next(None, None, Some(&counter), None)
                .await
                .unwrap()
                .token_no
        }));
    }
    let mut called = Vec::new();
    for handle in callers {
        if let Some(token) = handle.await.unwrap() {
            called.push(token);
        }
    }
    let unique: HashSet<_> = called.iter().copied().collect();
    assert_eq!(called.len(), 12, "every token called exactly once");
    assert_eq!(unique.len(), 12);
}

// ---- Daily rollover ----

#[tokio::test]
async fn test_new_day_clears_queue_but_keeps_recall_sequence() {
    let harness = TestHarness::builder().build().await.unwrap();
    let engine = &harness.engine;

    engine.issue_token(None, Some("walkin")).await.unwrap();
    engine.call_next(None, None, Some("Counter2"), None).await.unwrap();
    let recalled = engine.recall(None, None, None).await.unwrap();
    assert_eq!(recalled.recall_seq, Some(1));

    harness.advance_day();
    let queue = engine.queue(None, None).await.unwrap();
    assert_eq!(queue.waiting_count, 0);
    assert_eq!(queue.called_count, 0);

    let status = engine.status(None, None).await.unwrap();
    assert_eq!(status.recall_seq, 1, "recall channel survives rollover");

    let issued = engine.issue_token(None, Some("walkin")).await.unwrap();
    assert_eq!(issued.token_no, 2001);
}

// ---- CLI ----

fn tokenq() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tokenq"));
    // Keep the developer's own environment out of the run.
    for (key, _) in std::env::vars() {
        if key.starts_with("TOKENQ_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    write!(file, "{contents}").expect("write config");
    file
}

#[test]
fn test_cli_config_prints_effective_config() {
    let file = config_file("[queue]\ndefault_dept = \"dental\"\n");
    let output = tokenq()
        .arg("--config")
        .arg(file.path())
        .arg("config")
        .env("TOKENQ_SERVER_PORT", "9123")
        .output()
        .expect("run tokenq");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("default_dept = \"dental\""), "got: {stdout}");
    assert!(stdout.contains("port = 9123"), "env override applies: {stdout}");
}

#[test]
fn test_cli_rejects_invalid_config_with_suggestion() {
    let file = config_file("[server]\nprot = 8032\n");
    let output = tokenq()
        .arg("--config")
        .arg(file.path())
        .arg("config")
        .output()
        .expect("run tokenq");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("prot"), "got: {stderr}");
    assert!(stderr.contains("port"), "got: {stderr}");
}
