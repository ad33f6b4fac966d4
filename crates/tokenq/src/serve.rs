// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tokenq serve` command implementation.
//!
//! Opens SQLite storage, builds the queue engine over it and serves the
//! HTTP gateway until SIGINT/SIGTERM, then checkpoints the database.

use std::sync::Arc;

use tokenq_config::model::TokenqConfig;
use tokenq_core::{PluginAdapter, QueueStore, TokenqError};
use tokenq_engine::{EngineSettings, QueueEngine};
use tokenq_gateway::{GatewayState, ServerConfig};
use tokenq_storage::SqliteStorage;
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `tokenq serve` command.
pub async fn run_serve(config: TokenqConfig) -> Result<(), TokenqError> {
    init_tracing(&config.server.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %config.storage.database_path,
        "starting tokenq serve"
    );

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let settings = EngineSettings::from(&config);
    info!(
        default_dept = %settings.default_dept,
        entry_stage = %settings.entry_stage,
        handoff_stage = %settings.handoff_stage,
        stages = ?settings.stages,
        "queue engine configured"
    );
    let engine = Arc::new(QueueEngine::new(
        Arc::clone(&storage) as Arc<dyn QueueStore>,
        settings,
    ));

    // Bring the default department's session up to date before the first request.
    if let Err(e) = engine.ensure_fresh_session(&config.queue.default_dept).await {
        warn!(error = %e, "startup session check failed, will retry on first request");
    }

    let cancel = shutdown::install_signal_handler();
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let served = tokenq_gateway::start_server(&server_config, GatewayState::new(engine), cancel).await;

    // Checkpoint even when the server failed, so the WAL is folded back.
    if let Err(e) = storage.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }
    served?;

    info!("tokenq serve shutdown complete");
    Ok(())
}

/// Default filter directive when `RUST_LOG` is not set.
fn default_filter(log_level: &str) -> String {
    format!("tokenq={log_level},warn")
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
