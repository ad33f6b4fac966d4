// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as stage topology, valid bind addresses, and positive token starts.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::TokenqConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TokenqConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate host is not empty
    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.busy_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.busy_timeout_ms must be greater than 0".to_string(),
        });
    }

    if config.queue.default_dept.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "queue.default_dept must not be empty".to_string(),
        });
    }

    validate_stages(config, &mut errors);

    let tokens = &config.tokens;
    for (key, value) in [
        ("appointment_start", tokens.appointment_start),
        ("walkin_start", tokens.walkin_start),
        ("lab_start", tokens.lab_start),
    ] {
        if value < 1 {
            errors.push(ConfigError::Validation {
                message: format!("tokens.{key} must be at least 1, got {value}"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_stages(config: &TokenqConfig, errors: &mut Vec<ConfigError>) {
    let queue = &config.queue;

    if queue.stages.is_empty() {
        errors.push(ConfigError::Validation {
            message: "queue.stages must list at least one stage".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for (i, stage) in queue.stages.iter().enumerate() {
        if stage.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("queue.stages[{i}] must not be empty"),
            });
        } else if !seen.insert(stage.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate stage `{stage}` in queue.stages"),
            });
        }
    }

    for (setting, stage) in [
        ("queue.entry_stage", &queue.entry_stage),
        ("queue.handoff_stage", &queue.handoff_stage),
    ] {
        if !seen.contains(stage.as_str()) {
            errors.push(ConfigError::unknown_stage(setting, stage, &queue.stages));
        }
    }

    if queue.entry_stage == queue.handoff_stage {
        errors.push(ConfigError::Validation {
            message: "queue.handoff_stage must differ from queue.entry_stage".to_string(),
        });
    }

    for (stage, counters) in &queue.counters {
        if !seen.contains(stage.as_str()) {
            errors.push(ConfigError::unknown_stage(
                format!("queue.counters.{stage}"),
                stage,
                &queue.stages,
            ));
        }
        if counters.iter().any(|c| c.trim().is_empty()) {
            errors.push(ConfigError::Validation {
                message: format!("queue.counters.{stage} contains an empty counter id"),
            });
        }
    }
}
