//! Degraded mode: synthetic quotes used when the backend cannot answer
//!
//! The numbers produced here are random and have no relation to real rates.
//! Every result is wrapped in [`Sourced`] so callers can tell the two apart.

use crate::chat::backend::{BackendClient, BackendError};
use crate::core::{Currency, RateHistory, RateTable};
use chrono::{Days, NaiveDate};
use rand::Rng;
use tracing::warn;

#[derive(Debug)]
pub enum Sourced<T> {
    Live(T),
    Synthetic { value: T, cause: BackendError },
}

impl<T> Sourced<T> {
    pub fn value(&self) -> &T {
        match self {
            Sourced::Live(value) => value,
            Sourced::Synthetic { value, .. } => value,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Sourced::Synthetic { .. })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `amount` times a random factor in [0.5, 1.5) for every other currency
pub fn synthetic_conversion<R: Rng + ?Sized>(rng: &mut R, amount: f64, from: Currency) -> RateTable {
    Currency::ALL
        .into_iter()
        .filter(|c| *c != from)
        .map(|c| (c, amount * rng.gen_range(0.5..1.5)))
        .collect()
}

/// One entry per day for the last `days` days, ending today
pub fn synthetic_history<R: Rng + ?Sized>(
    rng: &mut R,
    base: Currency,
    days: u32,
    today: NaiveDate,
) -> RateHistory {
    (0..days)
        .filter_map(|i| today.checked_sub_days(Days::new(u64::from(i))))
        .map(|date| {
            let rates = Currency::ALL
                .into_iter()
                .filter(|c| *c != base)
                .map(|c| (c, round2(rng.gen_range(0.8..1.2))))
                .collect();
            (date, rates)
        })
        .collect()
}

pub async fn convert_or_synthetic(
    client: &BackendClient,
    amount: f64,
    from: Currency,
) -> Sourced<RateTable> {
    match client.convert(amount, from).await {
        Ok(converted) => Sourced::Live(converted),
        Err(cause) => {
            warn!(error = %cause, %from, "Backend conversion failed, using synthetic rates");
            let value = synthetic_conversion(&mut rand::thread_rng(), amount, from);
            Sourced::Synthetic { value, cause }
        }
    }
}

pub async fn history_or_synthetic(
    client: &BackendClient,
    base: Currency,
    days: u32,
    today: NaiveDate,
) -> Sourced<RateHistory> {
    let start = today.checked_sub_days(Days::new(u64::from(days))).unwrap_or(NaiveDate::MIN);
    match client.history(base, start, today).await {
        Ok(history) => Sourced::Live(history),
        Err(cause) => {
            warn!(error = %cause, %base, days, "Backend history failed, using synthetic rates");
            let value = synthetic_history(&mut rand::thread_rng(), base, days, today);
            Sourced::Synthetic { value, cause }
        }
    }
}
