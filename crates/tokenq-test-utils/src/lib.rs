// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for tokenq integration tests.
//!
//! Provides a harness and a failing store for fast, deterministic,
//! CI-runnable tests without a shared database.
//!
//! # Components
//!
//! - [`TestHarness`] - Temp SQLite store plus an engine on a pinned calendar date
//! - [`FailingStore`] - Store that fails every operation with a chosen fault

pub mod harness;
pub mod mock_store;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_store::{FailingStore, StoreFault};
