//! Manual aggregation triggers
//!
//! The scheduler runs these passes on an interval; this surface lets
//! operators (and tests) run a single pass on demand.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use super::ApiState;
use crate::api::types::ApiError;
use crate::data::types::PeriodType;

#[derive(Debug, Deserialize, Default)]
pub struct AggregationQuery {
    /// Period granularity for period-typed passes (default: day)
    pub period: Option<String>,
}

/// `POST /aggregation/{pass}` - run one named pass
pub async fn run_pass(
    State(state): State<ApiState>,
    Path(pass): Path<String>,
    Query(query): Query<AggregationQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let period = match query.period.as_deref() {
        None => PeriodType::Day,
        Some(raw) => PeriodType::parse(raw).ok_or_else(|| {
            ApiError::bad_request("INVALID_PERIOD", format!("Unknown period: {}", raw))
        })?,
    };

    let summary = match pass.as_str() {
        "daily-usage" => {
            let summary = state
                .aggregation
                .aggregate_daily_usage()
                .await
                .map_err(ApiError::from_sqlite)?;
            serde_json::to_value(summary)
        }
        "model-statistics" => {
            let summary = state
                .aggregation
                .aggregate_model_statistics(period)
                .await
                .map_err(ApiError::from_sqlite)?;
            serde_json::to_value(summary)
        }
        "cost-analysis" => {
            let summary = state
                .aggregation
                .aggregate_cost_analysis(period)
                .await
                .map_err(ApiError::from_sqlite)?;
            serde_json::to_value(summary)
        }
        "user-activity" => {
            let summary = state
                .aggregation
                .aggregate_user_activity()
                .await
                .map_err(ApiError::from_sqlite)?;
            serde_json::to_value(summary)
        }
        "prompt-performance" => {
            let summary = state
                .aggregation
                .aggregate_prompt_performance()
                .await
                .map_err(ApiError::from_sqlite)?;
            serde_json::to_value(summary)
        }
        other => {
            return Err(ApiError::bad_request(
                "UNKNOWN_PASS",
                format!(
                    "Unknown aggregation pass: {}. Valid: daily-usage, model-statistics, \
                     cost-analysis, user-activity, prompt-performance",
                    other
                ),
            ));
        }
    };

    let summary =
        summary.map_err(|e| ApiError::internal(format!("Failed to serialize summary: {}", e)))?;
    Ok(Json(serde_json::json!({ "pass": pass, "summary": summary })))
}

/// `POST /aggregation/run-all` - run every pass once
pub async fn run_all(State(state): State<ApiState>) -> Json<serde_json::Value> {
    state.aggregation.run_all().await;
    Json(serde_json::json!({ "status": "completed" }))
}
