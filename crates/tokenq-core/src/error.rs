// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the tokenq queue engine.

use thiserror::Error;

/// The primary error type used across the store trait, the engine and the gateway.
///
/// An empty queue is never an error: dispatch and recall report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum TokenqError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// A request value that cannot be normalized to a safe default.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The store could not acquire its write lock before the busy timeout.
    ///
    /// Nothing was written; the caller should retry the whole operation.
    #[error("resource busy: {detail}")]
    ResourceBusy { detail: String },

    /// Storage backend errors (connection, query failure, aborted transaction).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TokenqError {
    /// Returns true when retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ResourceBusy { .. })
    }
}
