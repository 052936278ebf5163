//! Write-only JSON dump of the rate cache, taken on shutdown

use crate::core::{CacheEntry, Currency, RateCache, RateTable};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
struct SnapshotEntry<'a> {
    rates: &'a RateTable,
    /// Seconds since the Unix epoch
    timestamp: f64,
}

impl<'a> From<&'a CacheEntry> for SnapshotEntry<'a> {
    fn from(entry: &'a CacheEntry) -> Self {
        SnapshotEntry {
            rates: &entry.rates,
            timestamp: entry.fetched_at.timestamp_micros() as f64 / 1_000_000.0,
        }
    }
}

pub fn render(entries: &[CacheEntry]) -> Result<String> {
    let snapshot: BTreeMap<Currency, SnapshotEntry> =
        entries.iter().map(|e| (e.base, e.into())).collect();
    serde_json::to_string_pretty(&snapshot).context("Failed to serialize cache snapshot")
}

pub async fn write(cache: &RateCache, path: &Path) -> Result<()> {
    let entries = cache.entries().await;
    let json = render(&entries)?;

    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write cache snapshot to {}", path.display()))?;

    info!(entries = entries.len(), path = %path.display(), "Wrote cache snapshot");
    Ok(())
}
