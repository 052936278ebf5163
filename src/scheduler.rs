//! Background refresh of the rate cache
//!
//! One pass fetches the latest table for every tracked currency in turn. A
//! failed fetch is logged and skipped; the previous cache entry stays in place
//! until a later pass succeeds.

use crate::core::{Currency, RateCache, RateProvider};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: Vec<Currency>,
    pub failed: Vec<Currency>,
}

/// Runs a single refresh pass over all tracked currencies
pub async fn refresh_all(cache: &RateCache, provider: &dyn RateProvider) -> RefreshReport {
    let mut report = RefreshReport::default();

    for base in Currency::ALL {
        match provider.fetch_latest(base).await {
            Ok(rates) => {
                cache.put(base, rates, Utc::now()).await;
                report.refreshed.push(base);
            }
            Err(e) => {
                warn!(%base, error = %e, "Failed to refresh rates, keeping cached entry");
                report.failed.push(base);
            }
        }
    }

    report
}

/// Refreshes the cache, then sleeps for `interval`, forever
pub async fn run(cache: RateCache, provider: Arc<dyn RateProvider>, interval: Duration) {
    loop {
        let report = refresh_all(&cache, provider.as_ref()).await;
        info!(
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            "Rate refresh pass complete"
        );
        tokio::time::sleep(interval).await;
    }
}
