//! Carfinder MCP server binary.
//!
//! ```bash
//! # default catalog database (sqlite://carfinder.db?mode=rwc)
//! carfinder-mcp
//!
//! # explicit database
//! CARFINDER_DATABASE_URL=sqlite://cars.db carfinder-mcp
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use carfinder_core::config::{AppConfig, LoadOptions};
use carfinder_db::SqlVehicleRepository;
use carfinder_mcp::CarSearchMcp;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default()).context("failed to load configuration")?;

    // stdout carries the protocol; logs must go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.logging.level.clone()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!(event_name = "mcp.connecting", database_url = %config.database.url);
    let pool = carfinder_db::connect_with_config(&config.database)
        .await
        .context("failed to connect to catalog database")?;
    carfinder_db::migrations::run_pending(&pool).await.context("failed to run migrations")?;

    CarSearchMcp::new(Arc::new(SqlVehicleRepository::new(pool))).run_stdio().await
}
