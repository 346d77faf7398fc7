//! Scheduled rollup passes
//!
//! - `service` - the five aggregation passes and the interval scheduler
//! - `period` - UTC period boundary computation (weeks start Sunday)

mod period;
mod service;

pub use period::period_bounds;
pub use service::{AggregationService, ModelStatsSummary};
