//! HTTP client for the rate backend, as used by the chat front end

use crate::core::{Currency, RateHistory, RateTable};
use anyhow::Result;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, timeout and other transport failures
    #[error("Backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned {0}")]
    Status(StatusCode),

    #[error("Malformed backend response: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct ConvertBody {
    converted: RateTable,
}

#[derive(Debug, Deserialize)]
struct HistoryBody {
    history: RateHistory,
}

pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(BackendClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, BackendError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "Calling rate backend");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| BackendError::Malformed(e.to_string()))
    }

    pub async fn convert(&self, amount: f64, from: Currency) -> Result<RateTable, BackendError> {
        let body: ConvertBody = self
            .get(
                "/convert/",
                &[
                    ("amount", amount.to_string()),
                    ("from_currency", from.to_string()),
                ],
            )
            .await?;
        Ok(body.converted)
    }

    pub async fn history(
        &self,
        base: Currency,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateHistory, BackendError> {
        let body: HistoryBody = self
            .get(
                "/history/",
                &[
                    ("from_currency", base.to_string()),
                    ("start_date", start.format("%Y-%m-%d").to_string()),
                    ("end_date", end.format("%Y-%m-%d").to_string()),
                ],
            )
            .await?;
        Ok(body.history)
    }
}
