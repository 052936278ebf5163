use thiserror::Error;

/// Failures surfaced by the rate backend
#[derive(Debug, Error)]
pub enum RateError {
    /// Transport failure or non-success answer from the rate provider
    #[error("Rate provider request failed: {0}")]
    Upstream(String),

    /// The provider answered but had no usable data
    #[error("No rate data found for {0}")]
    NotFound(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

impl From<reqwest::Error> for RateError {
    fn from(err: reqwest::Error) -> Self {
        RateError::Upstream(err.to_string())
    }
}
