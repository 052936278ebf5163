//! HTTP surface of the rate backend

pub mod routes;

use crate::service::RateService;
use anyhow::{Context, Result};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

pub use routes::create_router;

/// Serves the conversion and history endpoints until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, service: RateService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("Rate backend listening on http://{addr}");

    axum::serve(listener, create_router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    info!("Rate backend stopped");
    Ok(())
}
