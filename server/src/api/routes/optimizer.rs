//! Cost optimizer endpoints

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use super::ApiState;
use crate::api::types::{ApiError, resolve_time_range};
use crate::data::types::PeriodType;
use crate::domain::optimizer::{
    CostAlert, CostForecast, CostOptimizationRecommendation, ModelEfficiency,
};

/// Default analysis window in days
const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub days: Option<i64>,
    /// Recommendations below this savings floor are dropped
    #[serde(default)]
    pub min_savings: f64,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    /// Forecast window (day, week, month)
    pub period: Option<String>,
    pub history_days: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct EfficiencyQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub days: Option<i64>,
}

/// `GET /optimizer/recommendations`
pub async fn recommendations(
    State(state): State<ApiState>,
    Query(query): Query<RecommendationsQuery>,
) -> Result<Json<Vec<CostOptimizationRecommendation>>, ApiError> {
    let (start, end) =
        resolve_time_range(&query.start, &query.end, query.days, DEFAULT_WINDOW_DAYS)?;
    let recommendations = state
        .optimizer
        .generate_recommendations(start, end, query.min_savings)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(recommendations))
}

/// `GET /optimizer/forecast`
pub async fn forecast(
    State(state): State<ApiState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<CostForecast>, ApiError> {
    let period = match query.period.as_deref() {
        None => PeriodType::Day,
        Some(raw) => PeriodType::parse(raw).ok_or_else(|| {
            ApiError::bad_request("INVALID_PERIOD", format!("Unknown period: {}", raw))
        })?,
    };

    let forecast = state
        .optimizer
        .generate_cost_forecast(period, query.history_days)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(forecast))
}

/// `GET /optimizer/efficiency`
pub async fn efficiency(
    State(state): State<ApiState>,
    Query(query): Query<EfficiencyQuery>,
) -> Result<Json<Vec<ModelEfficiency>>, ApiError> {
    let (start, end) =
        resolve_time_range(&query.start, &query.end, query.days, DEFAULT_WINDOW_DAYS)?;
    let results = state
        .optimizer
        .analyze_model_efficiency(start, end)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(results))
}

/// `GET /optimizer/alerts`
pub async fn alerts(State(state): State<ApiState>) -> Result<Json<Vec<CostAlert>>, ApiError> {
    let alerts = state
        .optimizer
        .get_cost_alerts()
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(alerts))
}
