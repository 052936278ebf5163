use crate::core::{Currency, RateError, RateHistory, RateTable};
use crate::service::RateService;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

// ==================== Request / Response Types ====================

#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    amount: f64,
    from_currency: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    from_currency: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    amount: f64,
    from: Currency,
    converted: RateTable,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    history: RateHistory,
}

// ==================== Errors ====================

#[derive(Debug)]
pub enum ApiError {
    Rate(RateError),
    InvalidQuery(String),
}

impl From<RateError> for ApiError {
    fn from(err: RateError) -> Self {
        ApiError::Rate(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidQuery(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Rate(err @ RateError::Upstream(_)) => {
                warn!(error = %err, "Rate provider failure");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Rate(err @ RateError::NotFound(_)) => (StatusCode::NOT_FOUND, err.to_string()),
            ApiError::Rate(err @ RateError::UnknownCurrency(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::InvalidQuery(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

// ==================== Handlers ====================

async fn convert(
    State(service): State<RateService>,
    params: Result<Query<ConvertParams>, QueryRejection>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let Query(params) = params?;
    debug!(amount = params.amount, from = %params.from_currency, "Convert request");

    let conversion = service
        .convert(params.amount, &params.from_currency)
        .await?;

    Ok(Json(ConvertResponse {
        amount: conversion.amount,
        from: conversion.from,
        converted: conversion.converted,
    }))
}

async fn history(
    State(service): State<RateService>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(params) = params?;
    debug!(
        from = %params.from_currency,
        start = %params.start_date,
        end = %params.end_date,
        "History request"
    );

    let history = service
        .history(&params.from_currency, params.start_date, params.end_date)
        .await?;

    Ok(Json(HistoryResponse { history }))
}

pub fn create_router(service: RateService) -> Router {
    Router::new()
        .route("/convert", get(convert))
        .route("/convert/", get(convert))
        .route("/history", get(history))
        .route("/history/", get(history))
        .with_state(service)
}
