// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/JSON gateway for the tokenq queue engine.
//!
//! Kiosks, counter consoles and announcement displays all talk to the engine
//! through these routes. The gateway holds no queue state of its own: every
//! handler is a thin translation onto one [`tokenq_engine::QueueEngine`] call.

pub mod handlers;
pub mod server;

pub use handlers::ApiError;
pub use server::{GatewayState, ServerConfig, build_router, start_server};
