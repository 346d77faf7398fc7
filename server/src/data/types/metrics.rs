//! Aggregated metrics result types

use serde::Serialize;

use super::trace::TraceRecord;

/// Point-in-time metrics over a filtered trace set.
///
/// Every average/percentage field is 0 when the filtered set is empty;
/// the computation never divides by zero.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct TraceMetrics {
    pub total_traces: i64,
    pub successful_traces: i64,
    pub error_traces: i64,
    pub average_duration_ms: f64,
    pub average_latency_ms: f64,
    pub total_cost: f64,
    pub average_tokens_per_second: f64,
    /// Percentage of traces in error state (0-100)
    pub error_rate: f64,
    /// Percentage of traces that used the streaming path (0-100)
    pub streaming_rate: f64,
}

/// Live snapshot for real-time dashboards: traces still in flight in the
/// recent window, plus rolling quality indicators from completed ones.
#[derive(Debug, Serialize)]
pub struct LiveTraceSnapshot {
    pub active_traces: Vec<TraceRecord>,
    pub active_count: i64,
    /// Average first-token latency over completed traces in the window (ms)
    pub avg_latency_ms: f64,
    /// Error rate over completed traces in the window (0-100)
    pub error_rate: f64,
}
