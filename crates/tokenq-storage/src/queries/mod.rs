// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the token lifecycle.
//!
//! Each module exposes async operations taking `&Database`, plus the
//! transaction-level functions they are built from so that compound
//! operations (such as `pipeline::advance`) can share one transaction.

pub mod dispatch;
pub mod pipeline;
pub mod recall;
pub mod session;
pub mod snapshot;
pub mod tokens;
