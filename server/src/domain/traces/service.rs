//! Trace persistence service
//!
//! Single source of truth bridging the in-memory registry to durable
//! storage; every trace read/write in the system flows through here.
//!
//! Failure policy: trace creation and completion are fatal (cost and
//! usage accounting depend on the durable row); event appends are
//! best-effort telemetry, logged and swallowed.

use std::sync::Arc;

use serde_json::{Map, Value};
use sqlx::SqlitePool;

use super::feed::{FeedPhase, LiveFeed, TraceFeedEvent};
use crate::core::constants::LIVE_WINDOW_SECS;
use crate::data::SqliteError;
use crate::data::sqlite::repositories::{event, trace};
use crate::data::types::{
    LiveTraceSnapshot, NewTrace, TraceCompletion, TraceEventRecord, TraceEventType, TraceFilters,
    TraceMetrics, TracePage, TraceQueryResult, TraceRecord, TraceSortField, TraceSource,
    TraceStatus, TraceUpdate,
};
use crate::domain::registry::{NewTraceContext, TraceContext, TraceRegistry};
use crate::utils::time::now_millis;

/// Arguments for starting a trace
#[derive(Debug, Clone, Default)]
pub struct StartTraceArgs {
    /// Reuse a caller-supplied id (cross-request correlation)
    pub trace_id: Option<String>,
    pub parent_trace_id: Option<String>,
    pub session_id: Option<String>,
    pub user_id: String,
    pub prompt_id: Option<String>,
    pub source: TraceSource,
    pub model_id: String,
    pub prompt_content: String,
    pub system_prompt: Option<String>,
    pub parameters: Option<Value>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

pub struct TraceService {
    pool: SqlitePool,
    registry: Arc<TraceRegistry>,
    feed: Arc<LiveFeed>,
}

impl TraceService {
    pub fn new(pool: SqlitePool, registry: Arc<TraceRegistry>, feed: Arc<LiveFeed>) -> Self {
        Self {
            pool,
            registry,
            feed,
        }
    }

    pub fn registry(&self) -> &Arc<TraceRegistry> {
        &self.registry
    }

    pub fn feed(&self) -> &Arc<LiveFeed> {
        &self.feed
    }

    // ========================================================================
    // Write paths
    // ========================================================================

    /// Create the in-memory context, insert the durable row (status
    /// `pending`), and append a `start` event.
    ///
    /// The insert is fatal: on failure the context is evicted again and the
    /// error propagates - a generation must not proceed on an un-persisted
    /// trace.
    pub async fn start_trace(&self, args: StartTraceArgs) -> Result<TraceContext, SqliteError> {
        let mut metadata = Map::new();
        metadata.insert("source".to_string(), Value::from(args.source.as_str()));
        metadata.insert("model".to_string(), Value::from(args.model_id.clone()));
        if let Some(ref prompt_id) = args.prompt_id {
            metadata.insert("prompt_id".to_string(), Value::from(prompt_id.clone()));
        }
        if let Some(ref user_agent) = args.user_agent {
            metadata.insert("user_agent".to_string(), Value::from(user_agent.clone()));
        }
        if let Some(ref ip) = args.ip_address {
            metadata.insert("ip_address".to_string(), Value::from(ip.clone()));
        }

        let context = self.registry.create_trace(NewTraceContext {
            trace_id: args.trace_id,
            parent_trace_id: args.parent_trace_id.clone(),
            session_id: args.session_id,
            user_id: args.user_id.clone(),
            metadata,
        });

        let new_trace = NewTrace {
            trace_id: context.trace_id.clone(),
            parent_trace_id: args.parent_trace_id,
            session_id: context.session_id.clone(),
            user_id: args.user_id,
            prompt_id: args.prompt_id,
            source: args.source,
            model_id: args.model_id.clone(),
            prompt_content: args.prompt_content,
            system_prompt: args.system_prompt,
            parameters: args.parameters,
            start_time: context.start_time,
            user_agent: args.user_agent,
            ip_address: args.ip_address,
        };

        if let Err(e) = trace::insert_trace(&self.pool, &new_trace).await {
            // Do not leave an orphaned in-memory context behind
            self.registry
                .complete_trace(&context.trace_id, Value::from("insert_failed"));
            return Err(e);
        }

        self.record_event(
            &context.trace_id,
            TraceEventType::Start,
            Some(serde_json::json!({
                "model": args.model_id,
                "source": args.source.as_str(),
            })),
            None,
        )
        .await;

        self.feed.publish(TraceFeedEvent {
            trace_id: context.trace_id.clone(),
            session_id: context.session_id.clone(),
            user_id: context.user_id.clone(),
            model_id: args.model_id,
            status: TraceStatus::Pending,
            phase: FeedPhase::Started,
        });

        Ok(context)
    }

    /// Merge a partial update into the registry and the durable row.
    ///
    /// Status transitions are guarded: an illegal transition drops the
    /// status field (warned, not an error) while other fields still apply.
    pub async fn update_trace(
        &self,
        trace_id: &str,
        mut update: TraceUpdate,
    ) -> Result<(), SqliteError> {
        if let Some(next) = update.status {
            let current = trace::get_trace(&self.pool, trace_id)
                .await?
                .map(|t| t.status);
            if let Some(current) = current
                && !current.can_transition_to(next)
            {
                tracing::warn!(
                    trace_id,
                    from = current.as_str(),
                    to = next.as_str(),
                    "Illegal status transition dropped"
                );
                update.status = None;
            }
        }

        // Mirror the visible fields into the in-memory context
        let mut patch = Map::new();
        if let Some(status) = update.status {
            patch.insert("status".to_string(), Value::from(status.as_str()));
        }
        if let Some(latency) = update.first_token_latency_ms {
            patch.insert("first_token_latency_ms".to_string(), Value::from(latency));
        }
        if !patch.is_empty() {
            self.registry.update_trace(trace_id, &patch);
        }

        trace::update_trace(&self.pool, trace_id, &update).await?;
        Ok(())
    }

    /// The single finalization path: compute duration and throughput, write
    /// all terminal fields in one update, append a `complete` event, and
    /// mark the in-memory context complete.
    ///
    /// Idempotent: repeated completion (or a cancel/finalize race) leaves
    /// the first terminal state in place and returns `false`.
    pub async fn complete_trace(
        &self,
        trace_id: &str,
        completion: TraceCompletion,
    ) -> Result<bool, SqliteError> {
        // Prefer the in-memory start time; fall back to the durable row
        let start_time = match self.registry.get_active_trace(trace_id) {
            Some(ctx) => Some(ctx.start_time),
            None => trace::get_trace(&self.pool, trace_id)
                .await?
                .map(|t| t.start_time),
        };

        let duration_ms = start_time
            .map(|start| (completion.end_time - start).max(0))
            .unwrap_or(0);

        let tokens_per_second = completion.tokens_used.and_then(|usage| {
            (usage.total > 0 && duration_ms > 0)
                .then(|| usage.total as f64 / duration_ms as f64 * 1000.0)
        });

        let transitioned =
            trace::complete_trace(&self.pool, trace_id, &completion, duration_ms, tokens_per_second)
                .await?;

        if !transitioned {
            tracing::debug!(trace_id, "Trace already terminal, completion was a no-op");
            return Ok(false);
        }

        self.record_event(
            trace_id,
            TraceEventType::Complete,
            Some(serde_json::json!({
                "status": completion.status.as_str(),
                "duration_ms": duration_ms,
                "total_tokens": completion.tokens_used.map(|u| u.total),
                "total_cost": completion.cost.map(|c| c.total_cost),
            })),
            None,
        )
        .await;

        self.registry.complete_trace(
            trace_id,
            serde_json::json!({
                "status": completion.status.as_str(),
                "duration_ms": duration_ms,
            }),
        );

        if let Ok(Some(record)) = trace::get_trace(&self.pool, trace_id).await {
            self.feed.publish(TraceFeedEvent {
                trace_id: record.trace_id,
                session_id: record.session_id,
                user_id: record.user_id,
                model_id: record.model_id,
                status: completion.status,
                phase: FeedPhase::Completed,
            });
        }

        Ok(true)
    }

    /// Append an event to the trace log. Best-effort: persistence failures
    /// are logged and swallowed, since events are supplementary telemetry,
    /// not the source of truth for trace status.
    pub async fn record_event(
        &self,
        trace_id: &str,
        event_type: TraceEventType,
        data: Option<Value>,
        sequence_number: Option<i64>,
    ) {
        if let Err(e) =
            event::append_event(&self.pool, trace_id, event_type, data.as_ref(), sequence_number)
                .await
        {
            tracing::warn!(
                trace_id,
                event_type = event_type.as_str(),
                error = %e,
                "Failed to record trace event"
            );
        }
    }

    // ========================================================================
    // Read paths
    // ========================================================================

    pub async fn get_trace(&self, trace_id: &str) -> Result<Option<TraceRecord>, SqliteError> {
        trace::get_trace(&self.pool, trace_id).await
    }

    pub async fn get_traces(
        &self,
        filters: &TraceFilters,
        page: &TracePage,
        sort: TraceSortField,
        descending: bool,
    ) -> Result<TraceQueryResult, SqliteError> {
        trace::list_traces(&self.pool, filters, page, sort, descending).await
    }

    pub async fn get_trace_events(
        &self,
        trace_id: &str,
    ) -> Result<Vec<TraceEventRecord>, SqliteError> {
        event::list_events(&self.pool, trace_id).await
    }

    pub async fn get_trace_metrics(
        &self,
        filters: &TraceFilters,
    ) -> Result<TraceMetrics, SqliteError> {
        trace::compute_metrics(&self.pool, filters).await
    }

    /// Traces still in flight within the live window, plus rolling
    /// latency/error indicators over completed traces in the same window
    pub async fn get_live_traces(&self) -> Result<LiveTraceSnapshot, SqliteError> {
        let window_start = now_millis() - LIVE_WINDOW_SECS * 1000;
        trace::live_traces(&self.pool, window_start).await
    }

    /// Substring search over prompt/response content. Does not paginate.
    pub async fn search_traces(
        &self,
        query: &str,
        filters: &TraceFilters,
    ) -> Result<Vec<TraceRecord>, SqliteError> {
        trace::search_traces(&self.pool, query, filters).await
    }
}
