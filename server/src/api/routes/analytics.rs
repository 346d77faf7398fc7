//! Analytics endpoints

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use super::ApiState;
use crate::api::types::{ApiError, parse_timestamp_param, resolve_time_range};
use crate::data::types::{TraceFilters, TraceMetrics};
use crate::domain::analytics::{
    DashboardData, ModelPerformance, PerformanceInsights, PerformanceReport, UsageReport,
};

/// Default analysis window in days
const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Default usage-report window in days
const DEFAULT_REPORT_DAYS: i64 = 30;

#[derive(Debug, Deserialize, Default)]
pub struct TimeRangeQuery {
    /// Explicit ISO 8601 range
    pub start: Option<String>,
    pub end: Option<String>,
    /// Preset: last N days
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub user_id: Option<String>,
    pub model: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

fn metrics_filters(query: &MetricsQuery) -> Result<TraceFilters, ApiError> {
    Ok(TraceFilters {
        user_id: query.user_id.clone(),
        model_id: query.model.clone(),
        start_after: parse_timestamp_param(&query.start)?,
        start_before: parse_timestamp_param(&query.end)?,
        ..TraceFilters::default()
    })
}

/// `GET /analytics/metrics` - point-in-time metrics over a filtered set
pub async fn metrics(
    State(state): State<ApiState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<TraceMetrics>, ApiError> {
    let filters = metrics_filters(&query)?;
    let metrics = state
        .traces
        .get_trace_metrics(&filters)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(metrics))
}

/// `GET /analytics/performance` - metrics with grade and recommendations
pub async fn performance(
    State(state): State<ApiState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<PerformanceReport>, ApiError> {
    let filters = metrics_filters(&query)?;
    let report = state
        .analytics
        .get_performance_metrics(&filters)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(report))
}

/// `GET /analytics/models` - per-model comparison over a window
pub async fn models(
    State(state): State<ApiState>,
    Query(query): Query<TimeRangeQuery>,
) -> Result<Json<Vec<ModelPerformance>>, ApiError> {
    let (start, end) =
        resolve_time_range(&query.start, &query.end, query.days, DEFAULT_WINDOW_DAYS)?;
    let results = state
        .analytics
        .analyze_model_performance(start, end)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(results))
}

/// `GET /analytics/usage-report` - totals, shares, trend, errors
pub async fn usage_report(
    State(state): State<ApiState>,
    Query(query): Query<TimeRangeQuery>,
) -> Result<Json<UsageReport>, ApiError> {
    let (start, end) =
        resolve_time_range(&query.start, &query.end, query.days, DEFAULT_REPORT_DAYS)?;
    let report = state
        .analytics
        .generate_usage_report(start, end)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(report))
}

/// `GET /analytics/insights` - daily latency/throughput/quality series
pub async fn insights(
    State(state): State<ApiState>,
    Query(query): Query<TimeRangeQuery>,
) -> Result<Json<PerformanceInsights>, ApiError> {
    let (start, end) =
        resolve_time_range(&query.start, &query.end, query.days, DEFAULT_WINDOW_DAYS)?;
    let insights = state
        .analytics
        .get_performance_insights(start, end)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(insights))
}

/// `GET /analytics/dashboard` - live snapshot + today's aggregates + alerts
pub async fn dashboard(State(state): State<ApiState>) -> Result<Json<DashboardData>, ApiError> {
    let dashboard = state
        .analytics
        .get_dashboard_data()
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(dashboard))
}
