//! Conversion and history lookups on top of the rate cache

use crate::core::{Currency, RateCache, RateError, RateHistory, RateProvider, RateTable};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub amount: f64,
    pub from: Currency,
    pub converted: RateTable,
}

#[derive(Clone)]
pub struct RateService {
    cache: RateCache,
    provider: Arc<dyn RateProvider>,
}

impl RateService {
    pub fn new(cache: RateCache, provider: Arc<dyn RateProvider>) -> Self {
        Self { cache, provider }
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Converts `amount` of `from` into every currency of its rate table.
    ///
    /// A fresh cache entry is used as is. Otherwise the rates are fetched once
    /// and written back to the cache before converting.
    pub async fn convert(&self, amount: f64, from: &str) -> Result<Conversion, RateError> {
        let from: Currency = from.parse()?;
        let now = Utc::now();

        let rates = match self.cache.get_fresh(from, now).await {
            Some(entry) => entry.rates,
            None => {
                info!(base = %from, "No fresh rates cached, fetching");
                let rates = self.provider.fetch_latest(from).await?;
                self.cache.put(from, rates.clone(), now).await;
                rates
            }
        };

        let converted = rates
            .into_iter()
            .map(|(currency, rate)| (currency, amount * rate))
            .collect();
        Ok(Conversion {
            amount,
            from,
            converted,
        })
    }

    /// Rate series for `base` between `start` and `end`, inclusive. Never cached.
    pub async fn history(
        &self,
        base: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateHistory, RateError> {
        let base: Currency = base.parse()?;
        debug!(%base, %start, %end, "Fetching rate history");
        self.provider.fetch_history(base, start, end).await
    }
}
