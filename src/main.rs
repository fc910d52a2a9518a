//! Configuration aggregator.
//!
//! Runs every configured provider and merges their output into one stream.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                      CONFIG AGGREGATOR                        │
//!   │                                                              │
//!   │  ┌──────────┐  1st                                           │
//!   │  │ internal │──────┐                                         │
//!   │  └──────────┘      │                                         │
//!   │  ┌──────────┐  2nd │     ┌──────────┐     ┌──────────────┐   │
//!   │  │   file   │──────┼────▶│   sink   │────▶│   consumer   │───┼──▶ router builder
//!   │  └──────────┘      │     └──────────┘     └──────────────┘   │
//!   │  ┌──────────┐ any  │                                         │
//!   │  │ http ... │──────┘   (pool tasks, unordered)               │
//!   │  └──────────┘                                                │
//!   │                                                              │
//!   │  config · lifecycle/pool · observability · resilience        │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use config_aggregator::config::loader::load_config;
use config_aggregator::config::StaticConfig;
use config_aggregator::lifecycle::startup;
use config_aggregator::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "config-aggregator")]
#[command(about = "Merge dynamic routing configuration from every provider", long_about = None)]
struct Cli {
    /// Static configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => StaticConfig::default(),
    };

    init_logging(&config.observability);

    tracing::info!("config-aggregator v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config = ?cli.config,
        channel_capacity = config.aggregator.channel_capacity,
        http_providers = config.providers.http.len(),
        "Configuration loaded"
    );

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Aggregator failed");
        return Err(e.into());
    }
    Ok(())
}
