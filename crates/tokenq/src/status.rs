// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tokenq status` and `tokenq queue` command implementations.
//!
//! Both talk to a running server over HTTP. `status` falls back gracefully
//! when no server is listening.

use std::io::IsTerminal;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokenq_config::model::TokenqConfig;
use tokenq_core::TokenqError;

/// Health endpoint response from the gateway.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    uptime_secs: u64,
    #[serde(default)]
    storage: Option<String>,
}

/// Subset of the queue view printed by `tokenq queue`.
#[derive(Debug, Deserialize)]
struct QueueResponse {
    dept: String,
    stage: String,
    waiting_count: usize,
    waiting_list: Vec<i64>,
    last_called: Option<i64>,
    called_count: usize,
    served_count: usize,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub status: String,
    pub uptime_secs: Option<u64>,
    pub uptime_human: Option<String>,
    pub storage: Option<String>,
    pub host: String,
    pub port: u16,
}

/// Base URL of the local server, mapping wildcard binds to loopback.
fn base_url(config: &TokenqConfig) -> String {
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        other => other,
    };
    format!("http://{host}:{}", config.server.port)
}

fn http_client() -> Result<reqwest::Client, TokenqError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| TokenqError::Internal(format!("failed to create HTTP client: {e}")))
}

/// Format seconds into a human-readable duration string.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Run the `tokenq status` command.
///
/// If `--json` is passed, outputs structured JSON for scripting.
/// If `--plain` is passed or stdout is not a TTY, disables colors.
pub async fn run_status(config: &TokenqConfig, json: bool, plain: bool) -> Result<(), TokenqError> {
    let base = base_url(config);
    let client = http_client()?;

    let health = match client.get(format!("{base}/health")).send().await {
        Ok(resp) => resp.json::<HealthResponse>().await.ok(),
        Err(_) => None,
    };

    let use_color = !plain && std::io::stdout().is_terminal();
    let status_resp = match health {
        Some(health) => StatusResponse {
            running: true,
            uptime_human: Some(format_uptime(health.uptime_secs)),
            status: health.status,
            uptime_secs: Some(health.uptime_secs),
            storage: health.storage,
            host: config.server.host.clone(),
            port: config.server.port,
        },
        None => StatusResponse {
            running: false,
            status: "not running".to_string(),
            uptime_secs: None,
            uptime_human: None,
            storage: None,
            host: config.server.host.clone(),
            port: config.server.port,
        },
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status_resp).unwrap_or_else(|_| "{}".to_string())
        );
    } else if status_resp.running {
        print_status_running(&status_resp, use_color);
    } else {
        print_status_offline(&base, use_color);
    }
    Ok(())
}

/// Run the `tokenq queue` command.
pub async fn run_queue(
    config: &TokenqConfig,
    dept: Option<&str>,
    stage: Option<&str>,
    json: bool,
) -> Result<(), TokenqError> {
    let base = base_url(config);
    let client = http_client()?;

    let mut query = Vec::new();
    if let Some(dept) = dept {
        query.push(("dept", dept));
    }
    if let Some(stage) = stage {
        query.push(("stage", stage));
    }

    let url = reqwest::Url::parse_with_params(&format!("{base}/api/queue"), &query)
        .map_err(|e| TokenqError::Internal(format!("invalid queue URL: {e}")))?;
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| TokenqError::Internal(format!("cannot reach tokenq at {base}: {e}")))?;
    if !resp.status().is_success() {
        return Err(TokenqError::Internal(format!(
            "queue request failed with HTTP {}",
            resp.status()
        )));
    }

    if json {
        let raw: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TokenqError::Internal(format!("failed to parse queue response: {e}")))?;
        println!(
            "{}",
            serde_json::to_string_pretty(&raw).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    let queue: QueueResponse = resp
        .json()
        .await
        .map_err(|e| TokenqError::Internal(format!("failed to parse queue response: {e}")))?;
    print!("{}", render_queue(&queue));
    Ok(())
}

fn render_queue(queue: &QueueResponse) -> String {
    let waiting = if queue.waiting_list.is_empty() {
        "(empty)".to_string()
    } else {
        queue
            .waiting_list
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    };
    let last_called = queue
        .last_called
        .map_or_else(|| "-".to_string(), |t| t.to_string());

    format!(
        "\n  {} / {}\n  {}\n    Waiting:     {} ({})\n    Last called: {}\n    Called:      {}\n    Served:      {}\n\n",
        queue.dept,
        queue.stage,
        "-".repeat(35),
        queue.waiting_count,
        waiting,
        last_called,
        queue.called_count,
        queue.served_count,
    )
}

/// Print running status with optional colors.
fn print_status_running(status: &StatusResponse, use_color: bool) {
    let uptime = status.uptime_human.as_deref().unwrap_or("-");
    println!();
    println!("  tokenq status");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        println!(
            "    State:    {} {} (uptime: {})",
            "✓".green(),
            status.status.green(),
            uptime
        );
    } else {
        println!("    State:    [OK] {} (uptime: {uptime})", status.status);
    }
    if let Some(storage) = &status.storage {
        println!("    Storage:  {storage}");
    }

    println!();
}

/// Print offline status with optional colors.
fn print_status_offline(base: &str, use_color: bool) {
    println!();
    println!("  tokenq status");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        println!("    State:    {} {}", "✗".red(), "not running".red());
    } else {
        println!("    State:    [FAIL] not running");
    }

    println!("    Endpoint: {base}/health");
    println!();
    println!("  Start with: tokenq serve");
    println!();
}
