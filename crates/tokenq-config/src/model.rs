// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for tokenq.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Every section of `tokenq.toml` with the keys it accepts, in file order.
///
/// Env var mapping and "did you mean" diagnostics read this table; it must
/// follow the structs below.
pub const SCHEMA: &[(&str, &[&str])] = &[
    ("server", &["host", "port", "log_level"]),
    ("storage", &["database_path", "wal_mode", "busy_timeout_ms"]),
    (
        "queue",
        &["default_dept", "entry_stage", "handoff_stage", "stages", "counters"],
    ),
    ("tokens", &["appointment_start", "walkin_start", "lab_start"]),
];

/// Top-level tokenq configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenqConfig {
    /// HTTP listener and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Departments, stages and counters.
    #[serde(default)]
    pub queue: QueueConfig,

    /// First number of each visit-type token sequence.
    #[serde(default)]
    pub tokens: TokenConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP API binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8032
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long a transaction waits for the write lock before failing busy.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tokenq").join("tokenq.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "tokenq.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Queue topology: departments, stages and the counters serving them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Department used when a request omits `dept`.
    #[serde(default = "default_dept")]
    pub default_dept: String,

    /// Stage where issued tokens wait first.
    #[serde(default = "default_entry_stage")]
    pub entry_stage: String,

    /// Stage the entry stage hands tokens over to when a counter moves on.
    #[serde(default = "default_handoff_stage")]
    pub handoff_stage: String,

    /// Every stage requests may name. Unknown stages fall back to `entry_stage`.
    #[serde(default = "default_stages")]
    pub stages: Vec<String>,

    /// Counters reported by the status view, per stage.
    #[serde(default = "default_counters")]
    pub counters: BTreeMap<String, Vec<String>>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_dept: default_dept(),
            entry_stage: default_entry_stage(),
            handoff_stage: default_handoff_stage(),
            stages: default_stages(),
            counters: default_counters(),
        }
    }
}

fn default_dept() -> String {
    "welfare".to_string()
}

fn default_entry_stage() -> String {
    "reception".to_string()
}

fn default_handoff_stage() -> String {
    "nursing".to_string()
}

fn default_stages() -> Vec<String> {
    vec![
        "reception".to_string(),
        "nursing".to_string(),
        "lab".to_string(),
    ]
}

fn default_counters() -> BTreeMap<String, Vec<String>> {
    let mut counters = BTreeMap::new();
    counters.insert(
        "reception".to_string(),
        (1..=4).map(|n| format!("Counter{n}")).collect(),
    );
    counters.insert("nursing".to_string(), vec!["Nurse1".to_string()]);
    counters.insert("lab".to_string(), vec!["Lab1".to_string()]);
    counters
}

/// Token number sequence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    /// First appointment token number of each day.
    #[serde(default = "default_appointment_start")]
    pub appointment_start: i64,

    /// First walk-in token number of each day.
    #[serde(default = "default_walkin_start")]
    pub walkin_start: i64,

    /// First lab token number of each day.
    #[serde(default = "default_lab_start")]
    pub lab_start: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            appointment_start: default_appointment_start(),
            walkin_start: default_walkin_start(),
            lab_start: default_lab_start(),
        }
    }
}

fn default_appointment_start() -> i64 {
    1001
}

fn default_walkin_start() -> i64 {
    2001
}

fn default_lab_start() -> i64 {
    3001
}
