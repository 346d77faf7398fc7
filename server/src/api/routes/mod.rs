//! API route handlers
//!
//! One module per surface:
//! - `generate` - SSE generation streaming (the orchestrator entry)
//! - `traces` - trace listing, search, detail, and event log
//! - `analytics` - metrics, reports, insights, dashboard
//! - `live` - active-trace snapshot and the live SSE feed
//! - `optimizer` - recommendations, forecasts, efficiency, alerts
//! - `aggregation` - manual rollup triggers
//! - `evals` - response quality scoring
//! - `health` - liveness probe

pub mod aggregation;
pub mod analytics;
pub mod evals;
pub mod generate;
pub mod health;
pub mod live;
pub mod optimizer;
pub mod traces;

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::aggregation::AggregationService;
use crate::domain::analytics::AnalyticsEngine;
use crate::domain::evals::EvaluatorRegistry;
use crate::domain::optimizer::CostOptimizer;
use crate::domain::streaming::StreamingOrchestrator;
use crate::domain::traces::TraceService;

/// Shared state injected into every route handler
#[derive(Clone)]
pub struct ApiState {
    pub traces: Arc<TraceService>,
    pub orchestrator: Arc<StreamingOrchestrator>,
    pub analytics: Arc<AnalyticsEngine>,
    pub aggregation: Arc<AggregationService>,
    pub optimizer: Arc<CostOptimizer>,
    pub evals: Arc<EvaluatorRegistry>,
    pub shutdown_rx: watch::Receiver<bool>,
}
