//! Tracked currencies and the rate provider abstraction

use crate::core::error::RateError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// The closed set of currencies the service quotes.
///
/// Ordering follows declaration order, which is also the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    UAH,
    PLN,
    GBP,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::USD,
        Currency::EUR,
        Currency::UAH,
        Currency::PLN,
        Currency::GBP,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::UAH => "UAH",
            Currency::PLN => "PLN",
            Currency::GBP => "GBP",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::UAH => "₴",
            Currency::PLN => "zł",
            Currency::GBP => "£",
        }
    }

    /// Human readable name shown by the chat front end
    pub fn name(&self) -> &'static str {
        match self {
            Currency::USD => "Доллар США",
            Currency::EUR => "Евро",
            Currency::UAH => "Гривна",
            Currency::PLN => "Злотый",
            Currency::GBP => "Фунт стерлингов",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == s)
            .ok_or_else(|| RateError::UnknownCurrency(s.to_string()))
    }
}

/// Rates quoted against a single base currency
pub type RateTable = BTreeMap<Currency, f64>;

/// Rate tables keyed by calendar date
pub type RateHistory = BTreeMap<NaiveDate, RateTable>;

/// Keeps only tracked currencies from a provider supplied table
pub fn filter_tracked<'a, I>(rates: I) -> RateTable
where
    I: IntoIterator<Item = (&'a String, &'a f64)>,
{
    rates
        .into_iter()
        .filter_map(|(code, rate)| code.parse::<Currency>().ok().map(|c| (c, *rate)))
        .collect()
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_latest(&self, base: Currency) -> Result<RateTable, RateError>;

    async fn fetch_history(
        &self,
        base: Currency,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateHistory, RateError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_tracked_codes() {
        for currency in Currency::ALL {
            assert_eq!(currency.code().parse::<Currency>().unwrap(), currency);
        }
    }

    #[test]
    fn test_parse_unknown_code() {
        let err = "JPY".parse::<Currency>().unwrap_err();
        assert!(matches!(err, RateError::UnknownCurrency(ref code) if code == "JPY"));
        // Codes are case sensitive, like the provider's
        assert!("usd".parse::<Currency>().is_err());
    }

    #[test]
    fn test_filter_tracked_drops_other_codes() {
        let raw: HashMap<String, f64> = [
            ("USD".to_string(), 1.0),
            ("EUR".to_string(), 0.92),
            ("JPY".to_string(), 150.1),
            ("GBP".to_string(), 0.79),
        ]
        .into_iter()
        .collect();

        let rates = filter_tracked(&raw);
        assert_eq!(rates.len(), 3);
        assert_eq!(rates.get(&Currency::EUR), Some(&0.92));
        assert!(rates.keys().all(|c| Currency::ALL.contains(c)));
    }

    #[test]
    fn test_display_order_follows_declaration() {
        let mut sorted = vec![Currency::GBP, Currency::USD, Currency::PLN];
        sorted.sort();
        assert_eq!(sorted, vec![Currency::USD, Currency::PLN, Currency::GBP]);
    }
}
