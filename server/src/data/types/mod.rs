//! Shared data types
//!
//! Types used by the repositories and the domain layer:
//! - `enums` - classification enums (status, source, event type, period)
//! - `trace` - trace and event records
//! - `filters` - query predicates and pagination
//! - `metrics` - aggregated metrics results
//! - `rollups` - rollup table rows

mod enums;
mod filters;
mod metrics;
mod rollups;
mod trace;

pub use enums::{PeriodType, TraceEventType, TraceSource, TraceStatus, TrendDirection};
pub use filters::{TraceFilters, TracePage, TraceQueryResult, TraceSortField};
pub use metrics::{LiveTraceSnapshot, TraceMetrics};
pub use rollups::{
    AggregationSummary, CostAnalysisRow, DailyUsageRow, ModelUsageStatRow, PromptPerformanceRow,
    QualityDistribution, UserActivityRow,
};
pub use trace::{
    CostBreakdown, NewTrace, TokenUsage, TraceCompletion, TraceEventRecord, TraceRecord,
    TraceUpdate,
};
