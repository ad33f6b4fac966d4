// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the tokenq queue engine.
//!
//! This crate provides the error taxonomy, the domain types of the token
//! lifecycle, and the [`QueueStore`] trait that storage backends implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TokenqError;
pub use types::{
    AdvanceOutcome, CallMode, CallRequest, FinishAction, HealthStatus, IssuedToken, QueueOrder,
    QueueSnapshot, RecallOutcome, RecallState, Token, TokenStarts, TokenStatus, VisitType,
};

pub use traits::{PluginAdapter, QueueStore};
