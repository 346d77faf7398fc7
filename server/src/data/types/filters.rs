//! Trace query filters and result wrappers

use serde::{Deserialize, Serialize};

use super::enums::{TraceSource, TraceStatus};
use super::trace::TraceRecord;
use crate::core::constants::DEFAULT_TRACE_LIMIT;

/// Filter predicates for trace queries.
///
/// All fields are conjunctive; `None` means "no constraint".
#[derive(Debug, Clone, Default)]
pub struct TraceFilters {
    pub user_id: Option<String>,
    pub model_id: Option<String>,
    pub status: Option<TraceStatus>,
    pub source: Option<TraceSource>,
    pub session_id: Option<String>,
    pub prompt_id: Option<String>,
    /// Epoch ms range on start_time
    pub start_after: Option<i64>,
    pub start_before: Option<i64>,
    /// Duration bounds in milliseconds
    pub min_duration_ms: Option<i64>,
    pub max_duration_ms: Option<i64>,
    /// Cost bounds in USD
    pub min_cost: Option<f64>,
    pub max_cost: Option<f64>,
    /// Only traces that carry an error code
    pub has_error: Option<bool>,
    /// Only traces that went through the streaming path
    pub streaming: Option<bool>,
}

/// Pagination for trace listing
#[derive(Debug, Clone, Copy)]
pub struct TracePage {
    pub limit: u32,
    pub offset: u32,
}

impl Default for TracePage {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TRACE_LIMIT,
            offset: 0,
        }
    }
}

/// Paged trace listing result
#[derive(Debug, Serialize)]
pub struct TraceQueryResult {
    pub traces: Vec<TraceRecord>,
    pub total_count: i64,
    pub has_more: bool,
}

/// Sort field for trace listing
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSortField {
    #[default]
    StartTime,
    DurationMs,
    TotalCost,
    TotalTokens,
}

impl TraceSortField {
    /// Column name used in ORDER BY clauses
    pub fn column(&self) -> &'static str {
        match self {
            Self::StartTime => "start_time",
            Self::DurationMs => "duration_ms",
            Self::TotalCost => "total_cost",
            Self::TotalTokens => "total_tokens",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_limit() {
        let page = TracePage::default();
        assert_eq!(page.limit, DEFAULT_TRACE_LIMIT);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_sort_field_columns() {
        assert_eq!(TraceSortField::StartTime.column(), "start_time");
        assert_eq!(TraceSortField::TotalCost.column(), "total_cost");
    }
}
