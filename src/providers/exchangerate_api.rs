use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::currency::{Currency, RateHistory, RateProvider, RateTable, filter_tracked};
use crate::core::error::RateError;

/// Client for the exchangerate-api.com v6 endpoints
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fxr/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/v6/{}/{}", self.base_url, self.api_key, endpoint)
    }

    async fn get_json<T>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T, RateError>
    where
        T: for<'de> Deserialize<'de>,
    {
        // The key is part of the path, keep it out of the logs
        debug!(%endpoint, ?query, "Requesting exchange rates");

        let response = self
            .client
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|e| RateError::Upstream(format!("Request error for {endpoint}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Upstream(format!(
                "HTTP error: {status} for {endpoint}"
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            RateError::Upstream(format!("Failed to parse JSON response for {endpoint}: {e}"))
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    rates: HashMap<NaiveDate, HashMap<String, f64>>,
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    #[instrument(name = "LatestRatesFetch", skip(self), fields(base = %base))]
    async fn fetch_latest(&self, base: Currency) -> Result<RateTable, RateError> {
        let endpoint = format!("latest/{base}");
        let data: LatestResponse = self.get_json(&endpoint, &[]).await?;

        if data.result.as_deref() == Some("error") {
            return Err(RateError::Upstream(format!(
                "Provider error for {endpoint}: {}",
                data.error_type.as_deref().unwrap_or("unknown")
            )));
        }

        let rates = filter_tracked(&data.conversion_rates);
        // An empty table would be cached for a full TTL
        if rates.is_empty() {
            return Err(RateError::Upstream(format!(
                "No tracked currencies in response for {endpoint}"
            )));
        }
        debug!(count = rates.len(), "Received latest rates");
        Ok(rates)
    }

    #[instrument(name = "HistoryRatesFetch", skip(self), fields(base = %base))]
    async fn fetch_history(
        &self,
        base: Currency,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateHistory, RateError> {
        let endpoint = format!("history/{base}");
        let query = [
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
        ];
        let data: HistoryResponse = self.get_json(&endpoint, &query).await?;

        if data.rates.is_empty() {
            return Err(RateError::NotFound(format!(
                "{base} between {start} and {end}"
            )));
        }

        let history: RateHistory = data
            .rates
            .iter()
            .map(|(date, rates)| (*date, filter_tracked(rates)))
            .collect();
        debug!(days = history.len(), "Received rate history");
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> ExchangeRateApiProvider {
        ExchangeRateApiProvider::new(&server.uri(), "test-key", Duration::from_secs(5)).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_successful_latest_fetch() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"{
            "result": "success",
            "base_code": "USD",
            "conversion_rates": {
                "USD": 1,
                "EUR": 0.9013,
                "UAH": 41.2,
                "JPY": 149.5,
                "PLN": 3.95,
                "GBP": 0.77
            }
        }"#;

        Mock::given(method("GET"))
            .and(path("/v6/test-key/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .expect(1)
            .mount(&mock_server)
            .await;

        let rates = provider(&mock_server)
            .fetch_latest(Currency::USD)
            .await
            .expect("Failed to fetch latest rates");

        assert_eq!(rates.len(), 5);
        assert_eq!(rates.get(&Currency::USD), Some(&1.0));
        assert_eq!(rates.get(&Currency::EUR), Some(&0.9013));
        assert_eq!(rates.get(&Currency::UAH), Some(&41.2));
    }

    #[tokio::test]
    async fn test_latest_api_error_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v6/test-key/latest/EUR"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server).fetch_latest(Currency::EUR).await;
        match result {
            Err(RateError::Upstream(message)) => assert_eq!(
                message,
                "HTTP error: 500 Internal Server Error for latest/EUR"
            ),
            other => panic!("Expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_latest_provider_error_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v6/test-key/latest/GBP"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"result": "error", "error-type": "invalid-key"}"#),
            )
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server)
            .fetch_latest(Currency::GBP)
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::Upstream(ref m) if m.contains("invalid-key")));
    }

    #[tokio::test]
    async fn test_latest_malformed_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v6/test-key/latest/PLN"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server)
            .fetch_latest(Currency::PLN)
            .await
            .unwrap_err();
        assert!(
            err.to_string()
                .contains("Failed to parse JSON response for latest/PLN")
        );
    }

    #[tokio::test]
    async fn test_latest_without_tracked_rates_is_upstream_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v6/test-key/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"result": "success", "conversion_rates": {"JPY": 149.5, "CHF": 0.88}}"#,
            ))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v6/test-key/latest/EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"result": "success"}"#))
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server);
        for base in [Currency::USD, Currency::EUR] {
            match provider.fetch_latest(base).await {
                Err(RateError::Upstream(message)) => {
                    assert!(message.contains("No tracked currencies"), "{message}")
                }
                other => panic!("Expected upstream error for {base}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_successful_history_fetch() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"{
            "rates": {
                "2024-03-01": {"EUR": 0.92, "UAH": 38.5, "CHF": 0.88},
                "2024-03-02": {"EUR": 0.93, "UAH": 38.7}
            }
        }"#;

        Mock::given(method("GET"))
            .and(path("/v6/test-key/history/USD"))
            .and(query_param("start_date", "2024-03-01"))
            .and(query_param("end_date", "2024-03-02"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .expect(1)
            .mount(&mock_server)
            .await;

        let history = provider(&mock_server)
            .fetch_history(Currency::USD, date("2024-03-01"), date("2024-03-02"))
            .await
            .unwrap();

        assert_eq!(history.len(), 2);
        let first = &history[&date("2024-03-01")];
        assert_eq!(first.len(), 2);
        assert_eq!(first.get(&Currency::EUR), Some(&0.92));
        assert_eq!(history[&date("2024-03-02")].get(&Currency::UAH), Some(&38.7));
    }

    #[tokio::test]
    async fn test_history_single_day_range() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v6/test-key/history/EUR"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"rates": {"2024-03-05": {"USD": 1.08}}}"#),
            )
            .mount(&mock_server)
            .await;

        let day = date("2024-03-05");
        let history = provider(&mock_server)
            .fetch_history(Currency::EUR, day, day)
            .await
            .unwrap();
        assert!(history.len() <= 1);
        assert!(history.contains_key(&day));
    }

    #[tokio::test]
    async fn test_history_without_entries_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v6/test-key/history/UAH"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"rates": {}}"#))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server)
            .fetch_history(Currency::UAH, date("2024-01-01"), date("2024-01-07"))
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::NotFound(_)));
        assert_eq!(
            err.to_string(),
            "No rate data found for UAH between 2024-01-01 and 2024-01-07"
        );
    }

    #[tokio::test]
    async fn test_history_api_error_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v6/test-key/history/USD"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server)
            .fetch_history(Currency::USD, date("2024-01-01"), date("2024-01-02"))
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::Upstream(_)));
    }
}
