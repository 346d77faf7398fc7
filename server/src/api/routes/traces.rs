//! Trace query endpoints

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use validator::Validate;

use super::ApiState;
use crate::api::types::{ApiError, parse_timestamp_param, validate_limit};
use crate::data::types::{
    TraceFilters, TracePage, TraceQueryResult, TraceSortField, TraceSource, TraceStatus,
};

#[derive(Debug, Deserialize, Validate)]
pub struct TraceListQuery {
    pub user_id: Option<String>,
    pub model: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub session_id: Option<String>,
    pub prompt_id: Option<String>,
    /// ISO 8601 bounds on start_time
    pub start: Option<String>,
    pub end: Option<String>,
    pub min_duration_ms: Option<i64>,
    pub max_duration_ms: Option<i64>,
    pub min_cost: Option<f64>,
    pub max_cost: Option<f64>,
    pub has_error: Option<bool>,
    pub streaming: Option<bool>,
    #[validate(custom(function = "validate_limit"))]
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    pub sort: Option<TraceSortField>,
    /// "asc" flips the default descending order
    pub order: Option<String>,
}

fn default_limit() -> u32 {
    crate::core::constants::DEFAULT_TRACE_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct TraceSearchQuery {
    pub q: String,
    pub user_id: Option<String>,
    pub model: Option<String>,
    pub status: Option<String>,
}

fn build_filters(query: &TraceListQuery) -> Result<TraceFilters, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            TraceStatus::parse(s)
                .ok_or_else(|| ApiError::bad_request("INVALID_STATUS", format!("Unknown status: {}", s)))
        })
        .transpose()?;

    let source = query
        .source
        .as_deref()
        .map(|s| {
            TraceSource::parse(s)
                .ok_or_else(|| ApiError::bad_request("INVALID_SOURCE", format!("Unknown source: {}", s)))
        })
        .transpose()?;

    Ok(TraceFilters {
        user_id: query.user_id.clone(),
        model_id: query.model.clone(),
        status,
        source,
        session_id: query.session_id.clone(),
        prompt_id: query.prompt_id.clone(),
        start_after: parse_timestamp_param(&query.start)?,
        start_before: parse_timestamp_param(&query.end)?,
        min_duration_ms: query.min_duration_ms,
        max_duration_ms: query.max_duration_ms,
        min_cost: query.min_cost,
        max_cost: query.max_cost,
        has_error: query.has_error,
        streaming: query.streaming,
    })
}

/// `GET /traces` - filtered, paginated listing
pub async fn list_traces(
    State(state): State<ApiState>,
    Query(query): Query<TraceListQuery>,
) -> Result<Json<TraceQueryResult>, ApiError> {
    query.validate().map_err(ApiError::from_validation)?;
    let filters = build_filters(&query)?;
    let page = TracePage {
        limit: query.limit,
        offset: query.offset,
    };
    let descending = query.order.as_deref() != Some("asc");

    let result = state
        .traces
        .get_traces(&filters, &page, query.sort.unwrap_or_default(), descending)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(result))
}

/// `GET /traces/search` - substring search over prompt/response content.
/// Does not paginate.
pub async fn search_traces(
    State(state): State<ApiState>,
    Query(query): Query<TraceSearchQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if query.q.trim().is_empty() {
        return Err(ApiError::bad_request("EMPTY_QUERY", "q must not be empty"));
    }

    let status = query
        .status
        .as_deref()
        .map(|s| {
            TraceStatus::parse(s)
                .ok_or_else(|| ApiError::bad_request("INVALID_STATUS", format!("Unknown status: {}", s)))
        })
        .transpose()?;

    let filters = TraceFilters {
        user_id: query.user_id.clone(),
        model_id: query.model.clone(),
        status,
        ..TraceFilters::default()
    };

    let traces = state
        .traces
        .search_traces(&query.q, &filters)
        .await
        .map_err(ApiError::from_sqlite)?;

    Ok(Json(serde_json::json!({
        "traces": traces,
        "count": traces.len(),
    })))
}

/// `GET /traces/{id}` - single trace detail
pub async fn get_trace(
    State(state): State<ApiState>,
    Path(trace_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let trace = state
        .traces
        .get_trace(&trace_id)
        .await
        .map_err(ApiError::from_sqlite)?
        .ok_or_else(|| {
            ApiError::not_found("TRACE_NOT_FOUND", format!("No trace with id {}", trace_id))
        })?;
    Ok(Json(serde_json::json!({ "trace": trace })))
}

/// `GET /traces/{id}/events` - ordered event log
pub async fn get_trace_events(
    State(state): State<ApiState>,
    Path(trace_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let events = state
        .traces
        .get_trace_events(&trace_id)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(serde_json::json!({
        "trace_id": trace_id,
        "events": events,
    })))
}
