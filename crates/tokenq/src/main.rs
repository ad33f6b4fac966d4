// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! tokenq - walk-in service queue engine.
//!
//! This is the binary entry point: the HTTP server plus a few operator
//! commands that talk to a running server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokenq_config::TokenqConfig;

/// tokenq - walk-in service queue engine.
#[derive(Parser, Debug)]
#[command(name = "tokenq", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the queue server.
    Serve,
    /// Show whether a server is running and healthy.
    Status {
        /// Output JSON for scripting.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Show the waiting list of one stage queue.
    Queue {
        /// Department (defaults to queue.default_dept).
        #[arg(long)]
        dept: Option<String>,
        /// Stage (defaults to queue.entry_stage).
        #[arg(long)]
        stage: Option<String>,
        /// Output the raw queue view as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => tokenq_config::load_and_validate_path(path),
        None => tokenq_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            tokenq_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        Some(Commands::Queue { dept, stage, json }) => {
            status::run_queue(&config, dept.as_deref(), stage.as_deref(), json).await
        }
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("tokenq: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &TokenqConfig) -> Result<(), tokenq_core::TokenqError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| tokenq_core::TokenqError::Config(format!("cannot render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}
