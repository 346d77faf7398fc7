//! Domain logic for AI interaction tracing and analytics
//!
//! - `registry` - in-memory store of in-flight traces and spans
//! - `traces` - trace persistence service and the live feed
//! - `streaming` - the generation orchestrator and token strategies
//! - `providers` - AI generation client adapters
//! - `pricing` - LLM cost calculation
//! - `analytics` - read-side performance and usage analysis
//! - `aggregation` - scheduled rollup passes
//! - `optimizer` - cost recommendations, forecasts, and alerts
//! - `evals` - pluggable response quality scorers
//! - `mirror` - best-effort third-party observability sync

pub mod aggregation;
pub mod analytics;
pub mod evals;
pub mod mirror;
pub mod optimizer;
pub mod pricing;
pub mod providers;
pub mod registry;
pub mod streaming;
pub mod traces;

pub use aggregation::AggregationService;
pub use analytics::AnalyticsEngine;
pub use optimizer::CostOptimizer;
pub use registry::TraceRegistry;
pub use streaming::{GenerateOptions, StreamingOrchestrator};
pub use traces::{LiveFeed, TraceService};
