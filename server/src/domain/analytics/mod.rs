//! Trace analytics
//!
//! - `engine` - read-side analysis over persisted traces
//! - `trend` - the shared half-over-half trend classifier

mod engine;
mod trend;

pub use engine::{
    AlertLevel, AnalyticsEngine, CostOpportunity, DashboardAlert, DashboardData, DailyPoint,
    ErrorShare, LatencyPoint, ModelPerformance, ModelRating, ModelShare, PerformanceGrade,
    PerformanceInsights, PerformanceReport, PromptQuality, ThroughputPoint, TodaySummary,
    UsageReport,
};
pub use trend::{classify_trend, classify_trend_with_band};
