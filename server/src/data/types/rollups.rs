//! Rollup record types
//!
//! One struct per rollup table. Each row is upserted on its natural key
//! (entity + period) so repeated aggregation runs for the same window
//! converge rather than duplicate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::PeriodType;

/// Daily usage row (per user x model x day)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyUsageRow {
    /// Day in `YYYY-MM-DD`
    pub day: String,
    pub user_id: String,
    pub model_id: String,
    pub request_count: i64,
    pub total_tokens: i64,
    pub total_cost: f64,
    pub error_count: i64,
}

/// Quality distribution buckets.
///
/// Bucketed on a 0-1 quality scale (excellent >= 0.9, good >= 0.7,
/// fair >= 0.5, poor below). The trace viewer grades on 0-5; both scales
/// are intentionally kept as-is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QualityDistribution {
    pub excellent: i64,
    pub good: i64,
    pub fair: i64,
    pub poor: i64,
}

/// Model usage statistics row (per model x period)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelUsageStatRow {
    pub model_id: String,
    pub period_type: PeriodType,
    /// Epoch ms period boundaries
    pub period_start: i64,
    pub period_end: i64,
    pub request_count: i64,
    pub success_count: i64,
    pub error_count: i64,
    /// 0-100
    pub error_rate: f64,
    pub avg_response_time_ms: f64,
    pub avg_tokens_per_second: f64,
    pub total_tokens: i64,
    pub total_cost: f64,
    pub cost_per_token: f64,
    pub cost_per_request: f64,
    pub quality: QualityDistribution,
    /// Most frequent error codes, ordered by count descending
    pub top_error_codes: Vec<String>,
}

/// Cost analysis summary row (per period)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostAnalysisRow {
    pub period_type: PeriodType,
    pub period_start: i64,
    pub period_end: i64,
    pub total_cost: f64,
    pub total_requests: i64,
    pub total_tokens: i64,
    /// Cost per model id
    pub model_costs: BTreeMap<String, f64>,
    /// Cost per user id
    pub user_costs: BTreeMap<String, f64>,
    /// Recommendation payloads generated at aggregation time
    pub optimization_recommendations: Vec<serde_json::Value>,
    /// Naive next-period forecast (current total x growth factor)
    pub forecast_next_period: f64,
}

/// User activity row (per user x day)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActivityRow {
    pub user_id: String,
    pub day: String,
    pub request_count: i64,
    pub total_cost: f64,
    pub distinct_models: i64,
    pub favorite_model: Option<String>,
    /// Hour of day (0-23) with the most requests, from real timestamps
    pub peak_usage_hour: Option<i64>,
}

/// Prompt performance row (per prompt x day)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptPerformanceRow {
    pub prompt_id: String,
    pub day: String,
    pub use_count: i64,
    pub unique_users: i64,
    pub total_cost: f64,
    pub avg_duration_ms: f64,
    /// 0-100
    pub success_rate: f64,
    pub avg_quality: Option<f64>,
    /// Request count per model id
    pub model_usage: BTreeMap<String, i64>,
}

/// Summary returned by each aggregation pass
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct AggregationSummary {
    /// Rows upserted by this pass
    pub processed: usize,
    /// Entities whose upsert failed (counted, not retried)
    pub failed: usize,
}
