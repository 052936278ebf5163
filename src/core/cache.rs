use crate::core::currency::{Currency, RateTable};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// How long, in seconds, a fetched rate table is served before it counts as stale
pub const CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub base: Currency,
    pub rates: RateTable,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.fetched_at < Duration::seconds(CACHE_TTL_SECS as i64)
    }
}

/// Latest rate tables keyed by base currency.
///
/// Cloning yields another handle onto the same entries. Entries are only ever
/// replaced whole; stale ones stay until the next `put` for that base.
#[derive(Clone, Default)]
pub struct RateCache {
    inner: Arc<RwLock<HashMap<Currency, CacheEntry>>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, base: Currency) -> Option<CacheEntry> {
        let cache = self.inner.read().await;
        let entry = cache.get(&base).cloned();
        if entry.is_some() {
            debug!(%base, "Cache HIT");
        } else {
            debug!(%base, "Cache MISS");
        }
        entry
    }

    /// Returns the entry for `base` only while it is still fresh at `now`
    pub async fn get_fresh(&self, base: Currency, now: DateTime<Utc>) -> Option<CacheEntry> {
        self.get(base).await.filter(|entry| {
            let fresh = entry.is_fresh(now);
            if !fresh {
                debug!(%base, fetched_at = %entry.fetched_at, "Cache entry stale");
            }
            fresh
        })
    }

    pub async fn put(&self, base: Currency, rates: RateTable, now: DateTime<Utc>) {
        let entry = CacheEntry {
            base,
            rates,
            fetched_at: now,
        };
        let mut cache = self.inner.write().await;
        debug!(%base, "Cache PUT");
        cache.insert(base, entry);
    }

    /// All entries in currency order
    pub async fn entries(&self) -> Vec<CacheEntry> {
        let cache = self.inner.read().await;
        let mut entries: Vec<CacheEntry> = cache.values().cloned().collect();
        entries.sort_by_key(|e| e.base);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates(pairs: &[(Currency, f64)]) -> RateTable {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_cache_get_put() {
        let cache = RateCache::new();
        let now = Utc::now();

        // Initially, cache is empty
        assert!(cache.get(Currency::USD).await.is_none());

        cache
            .put(Currency::USD, rates(&[(Currency::EUR, 0.9)]), now)
            .await;

        let entry = cache.get(Currency::USD).await.unwrap();
        assert_eq!(entry.base, Currency::USD);
        assert_eq!(entry.rates.get(&Currency::EUR), Some(&0.9));
        assert_eq!(entry.fetched_at, now);

        // Other bases are untouched
        assert!(cache.get(Currency::EUR).await.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_whole_entry() {
        let cache = RateCache::new();
        let now = Utc::now();

        cache
            .put(
                Currency::USD,
                rates(&[(Currency::EUR, 0.9), (Currency::UAH, 41.0)]),
                now - Duration::hours(2),
            )
            .await;
        cache
            .put(Currency::USD, rates(&[(Currency::GBP, 0.8)]), now)
            .await;

        let entry = cache.get(Currency::USD).await.unwrap();
        assert_eq!(entry.rates, rates(&[(Currency::GBP, 0.8)]));
        assert_eq!(entry.fetched_at, now);
    }

    #[test]
    fn test_freshness_boundary() {
        let now = Utc::now();
        let entry = |age: Duration| CacheEntry {
            base: Currency::USD,
            rates: RateTable::new(),
            fetched_at: now - age,
        };

        assert!(entry(Duration::zero()).is_fresh(now));
        assert!(entry(Duration::seconds(3599)).is_fresh(now));
        assert!(!entry(Duration::seconds(3600)).is_fresh(now));
        assert!(!entry(Duration::hours(5)).is_fresh(now));
    }

    #[tokio::test]
    async fn test_get_fresh_hides_stale_entry() {
        let cache = RateCache::new();
        let now = Utc::now();

        cache
            .put(Currency::EUR, RateTable::new(), now - Duration::hours(2))
            .await;

        assert!(cache.get_fresh(Currency::EUR, now).await.is_none());
        // Lazy expiry: the stale entry is still there
        assert!(cache.get(Currency::EUR).await.is_some());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = RateCache::new();
        let handle = cache.clone();

        handle
            .put(Currency::PLN, RateTable::new(), Utc::now())
            .await;
        cache.put(Currency::USD, RateTable::new(), Utc::now()).await;

        let bases: Vec<Currency> = cache.entries().await.into_iter().map(|e| e.base).collect();
        assert_eq!(bases, vec![Currency::USD, Currency::PLN]);
    }
}
