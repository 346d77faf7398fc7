//! Classification enums for trace data
//!
//! These enums are shared by the persistence layer, the streaming
//! orchestrator, and the analytics/aggregation passes.

use serde::{Deserialize, Serialize};

// ============================================================================
// TRACE ENUMS
// ============================================================================

/// Lifecycle status of a trace.
///
/// Transitions: pending -> streaming -> {success, error, cancelled}, or
/// pending directly to a terminal state. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    #[default]
    Pending,
    Streaming,
    Success,
    Error,
    Cancelled,
}

impl TraceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Streaming => "streaming",
            Self::Success => "success",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "streaming" => Some(Self::Streaming),
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Terminal states admit no further status transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Cancelled)
    }

    /// Whether `next` is a legal transition from this status
    pub fn can_transition_to(&self, next: TraceStatus) -> bool {
        match self {
            Self::Pending => next != Self::Pending,
            Self::Streaming => next.is_terminal(),
            _ => false,
        }
    }
}

/// Origin of a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraceSource {
    Playground,
    #[default]
    Api,
    Test,
}

impl TraceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Playground => "playground",
            Self::Api => "api",
            Self::Test => "test",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "playground" => Some(Self::Playground),
            "api" => Some(Self::Api),
            "test" => Some(Self::Test),
            _ => None,
        }
    }
}

/// Event types on the per-trace event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventType {
    Start,
    Token,
    Structured,
    Error,
    Complete,
    UserAction,
}

impl TraceEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Token => "token",
            Self::Structured => "structured",
            Self::Error => "error",
            Self::Complete => "complete",
            Self::UserAction => "user_action",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(Self::Start),
            "token" => Some(Self::Token),
            "structured" => Some(Self::Structured),
            "error" => Some(Self::Error),
            "complete" => Some(Self::Complete),
            "user_action" => Some(Self::UserAction),
            _ => None,
        }
    }
}

// ============================================================================
// AGGREGATION ENUMS
// ============================================================================

/// Rollup period granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }
}

/// Trend direction label produced by the half-over-half classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}
