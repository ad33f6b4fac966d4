// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token lifecycle engine for the tokenq queue service.
//!
//! [`QueueEngine`] normalizes raw request values, runs the lazy daily session
//! reset, and drives issuance, dispatch, stage transfer and recall through a
//! [`tokenq_core::QueueStore`]. It holds no mutable queue state of its own.

pub mod engine;
pub mod settings;
pub mod views;

pub use engine::{DateProvider, QueueEngine};
pub use settings::EngineSettings;
pub use views::{
    CallOutcome, CompleteOutcome, LastPrintedView, QueueView, RecallView, StatusView,
    TransferOutcome,
};
