//! Trace and trace-event record types

use serde::{Deserialize, Serialize};

use super::enums::{TraceEventType, TraceSource, TraceStatus};

/// Token counts for one interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TokenUsage {
    pub input: i64,
    pub output: i64,
    pub total: i64,
}

impl TokenUsage {
    pub fn new(input: i64, output: i64) -> Self {
        Self {
            input,
            output,
            total: input + output,
        }
    }
}

/// Cost breakdown in USD for one interaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CostBreakdown {
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

/// Durable trace record - one row per AI interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    pub trace_id: String,
    pub parent_trace_id: Option<String>,
    pub session_id: String,
    pub user_id: String,
    pub prompt_id: Option<String>,
    pub source: TraceSource,
    pub model_id: String,
    pub prompt_content: String,
    pub system_prompt: Option<String>,
    pub parameters: Option<serde_json::Value>,
    pub response_content: Option<String>,
    pub tokens_used: Option<TokenUsage>,
    pub cost: Option<CostBreakdown>,
    /// Epoch milliseconds
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub duration_ms: Option<i64>,
    pub first_token_latency_ms: Option<i64>,
    pub tokens_per_second: Option<f64>,
    pub status: TraceStatus,
    pub error_message: Option<String>,
    pub error_code: Option<String>,
    pub quality_score: Option<f64>,
    pub user_rating: Option<i64>,
    pub mirror_trace_id: Option<String>,
    pub mirror_observation_id: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub trace_version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields for creating a new trace row (status starts at pending)
#[derive(Debug, Clone)]
pub struct NewTrace {
    pub trace_id: String,
    pub parent_trace_id: Option<String>,
    pub session_id: String,
    pub user_id: String,
    pub prompt_id: Option<String>,
    pub source: TraceSource,
    pub model_id: String,
    pub prompt_content: String,
    pub system_prompt: Option<String>,
    pub parameters: Option<serde_json::Value>,
    pub start_time: i64,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Partial update applied to an in-flight trace row.
///
/// `None` fields are left untouched; status changes go through the
/// transition guard in the persistence service, not here.
#[derive(Debug, Clone, Default)]
pub struct TraceUpdate {
    pub status: Option<TraceStatus>,
    pub response_content: Option<String>,
    pub tokens_used: Option<TokenUsage>,
    pub cost: Option<CostBreakdown>,
    pub first_token_latency_ms: Option<i64>,
    pub error_message: Option<String>,
    pub error_code: Option<String>,
    pub quality_score: Option<f64>,
    pub user_rating: Option<i64>,
    pub mirror_trace_id: Option<String>,
    pub mirror_observation_id: Option<String>,
}

/// Terminal result written by the single finalization path
#[derive(Debug, Clone)]
pub struct TraceCompletion {
    pub status: TraceStatus,
    pub response_content: Option<String>,
    pub tokens_used: Option<TokenUsage>,
    pub cost: Option<CostBreakdown>,
    pub error_message: Option<String>,
    pub error_code: Option<String>,
    pub quality_score: Option<f64>,
    pub end_time: i64,
}

/// One row on the append-only per-trace event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEventRecord {
    pub event_id: String,
    pub trace_id: String,
    pub event_type: TraceEventType,
    pub event_data: Option<serde_json::Value>,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub sequence_number: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage::new(120, 45);
        assert_eq!(usage.total, 165);
    }

    #[test]
    fn test_trace_update_default_is_empty() {
        let update = TraceUpdate::default();
        assert!(update.status.is_none());
        assert!(update.response_content.is_none());
        assert!(update.tokens_used.is_none());
    }
}
