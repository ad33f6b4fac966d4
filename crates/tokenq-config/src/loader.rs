// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tokenq.toml` > `~/.config/tokenq/tokenq.toml` > `/etc/tokenq/tokenq.toml`
//! with environment variable overrides via `TOKENQ_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::{TokenqConfig, SCHEMA};

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tokenq/tokenq.toml` (system-wide)
/// 3. `~/.config/tokenq/tokenq.toml` (user XDG config)
/// 4. `./tokenq.toml` (local directory)
/// 5. `TOKENQ_*` environment variables
pub fn load_config() -> Result<TokenqConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TokenqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TokenqConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TokenqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TokenqConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TokenqConfig::default()))
        .merge(Toml::file("/etc/tokenq/tokenq.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tokenq/tokenq.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tokenq.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `TOKENQ_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("TOKENQ_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to its dotted config key.
pub(crate) fn map_env_key(key: &str) -> String {
    for (section, _) in SCHEMA {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
