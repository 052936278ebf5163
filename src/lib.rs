pub mod chat;
pub mod cli;
pub mod core;
pub mod providers;
pub mod scheduler;
pub mod server;
pub mod service;
pub mod snapshot;

use crate::core::cache::CACHE_TTL_SECS;
use crate::core::config::AppConfig;
use crate::core::{RateCache, RateProvider};
use crate::providers::ExchangeRateApiProvider;
use crate::service::RateService;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

pub enum AppCommand {
    Serve,
    Bot,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Serve => run_backend(&config).await,
        AppCommand::Bot => chat::bot::run(config.bot()?).await,
    }
}

/// Runs the rate backend: refresh loop plus HTTP server, until Ctrl-C
pub async fn run_backend(config: &AppConfig) -> Result<()> {
    info!("Rate backend starting...");

    let provider_config = config.provider()?;
    let provider: Arc<dyn RateProvider> = Arc::new(ExchangeRateApiProvider::new(
        &provider_config.base_url,
        &provider_config.api_key,
        Duration::from_secs(provider_config.timeout_secs),
    )?);
    let cache = RateCache::new();

    let refresher = tokio::spawn(scheduler::run(
        cache.clone(),
        Arc::clone(&provider),
        Duration::from_secs(CACHE_TTL_SECS),
    ));

    let listener = TcpListener::bind(&config.server.address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.address))?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Received shutdown signal");
    };
    let served = server::serve(listener, RateService::new(cache.clone(), provider), shutdown).await;
    refresher.abort();

    if let Some(path) = &config.server.snapshot_path {
        if let Err(e) = snapshot::write(&cache, Path::new(path)).await {
            error!(error = %e, "Failed to write cache snapshot");
        }
    }

    served
}
