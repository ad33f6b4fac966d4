// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    routing::{get, post},
};
use tokenq_core::TokenqError;
use tokenq_engine::QueueEngine;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The queue engine every handler delegates to.
    pub engine: Arc<QueueEngine>,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(engine: Arc<QueueEngine>) -> Self {
        Self {
            engine,
            start_time: Instant::now(),
        }
    }
}

/// Gateway server bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the router with every route and layer, without binding a socket.
///
/// Kiosk, counter and display pages are served from other origins, so CORS
/// is permissive.
pub fn build_router(state: GatewayState) -> Router {
    let api_routes = Router::new()
        .route("/api/print-token", post(handlers::print_token))
        .route("/api/call-next", post(handlers::call_next))
        .route("/api/transfer-previous", post(handlers::transfer_previous))
        .route("/api/complete-previous", post(handlers::complete_previous))
        .route("/api/recall-last", post(handlers::recall_last))
        .route("/api/status", get(handlers::get_status))
        .route("/api/queue", get(handlers::get_queue))
        .route("/api/last-printed", get(handlers::get_last_printed));

    Router::new()
        .route("/health", get(handlers::get_health))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway HTTP server and run until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), TokenqError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TokenqError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| TokenqError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8032,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
        assert!(debug.contains("8032"));
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: occupied.local_addr().expect("addr").port(),
        };
        let harness = tokenq_test_utils::TestHarness::builder()
            .build()
            .await
            .expect("harness");
        let result = start_server(
            &config,
            GatewayState::new(harness.engine.clone()),
            CancellationToken::new(),
        )
        .await;
        assert!(matches!(result, Err(TokenqError::Internal(msg)) if msg.contains("failed to bind")));
    }

    #[tokio::test]
    async fn cancelled_server_shuts_down() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let harness = tokenq_test_utils::TestHarness::builder()
            .build()
            .await
            .expect("harness");
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        start_server(&config, GatewayState::new(harness.engine.clone()), shutdown)
            .await
            .expect("server should stop cleanly once cancelled");
    }
}
