//! API server initialization

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use super::middleware::{self, AllowedOrigins};
use super::routes::{
    ApiState, aggregation, analytics, evals, generate, health, live, optimizer, traces,
};
use crate::core::CoreApp;
use crate::core::constants::DEFAULT_BODY_LIMIT;

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Serve until shutdown; returns the CoreApp for graceful teardown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();

        let host = app.config.server.host.clone();
        let port = app.config.server.port;
        let addr = SocketAddr::new(host.parse()?, port);

        let state = ApiState {
            traces: app.traces.clone(),
            orchestrator: app.orchestrator.clone(),
            analytics: app.analytics.clone(),
            aggregation: app.aggregation.clone(),
            optimizer: app.optimizer.clone(),
            evals: app.evals.clone(),
            shutdown_rx: shutdown.subscribe(),
        };

        let api_routes = Router::new()
            .route("/health", get(health::health))
            .route("/generate", post(generate::generate))
            .route("/traces", get(traces::list_traces))
            .route("/traces/search", get(traces::search_traces))
            .route("/traces/{trace_id}", get(traces::get_trace))
            .route("/traces/{trace_id}/events", get(traces::get_trace_events))
            .route("/analytics/metrics", get(analytics::metrics))
            .route("/analytics/performance", get(analytics::performance))
            .route("/analytics/models", get(analytics::models))
            .route("/analytics/usage-report", get(analytics::usage_report))
            .route("/analytics/insights", get(analytics::insights))
            .route("/analytics/dashboard", get(analytics::dashboard))
            .route("/live", get(live::snapshot))
            .route("/live/events", get(live::events))
            .route("/optimizer/recommendations", get(optimizer::recommendations))
            .route("/optimizer/forecast", get(optimizer::forecast))
            .route("/optimizer/efficiency", get(optimizer::efficiency))
            .route("/optimizer/alerts", get(optimizer::alerts))
            .route("/aggregation/run-all", post(aggregation::run_all))
            .route("/aggregation/{pass}", post(aggregation::run_pass))
            .route("/evals", get(evals::list_evaluators))
            .route("/evals/evaluate", post(evals::evaluate))
            .with_state(state);

        let router = Router::new()
            .nest("/api/v1", api_routes)
            .fallback(middleware::handle_404)
            .layer(CompressionLayer::new())
            .layer(middleware::cors(&allowed_origins))
            .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT));

        let listener = TcpListener::bind(addr).await?;
        tracing::debug!(%addr, "API server listening");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}
