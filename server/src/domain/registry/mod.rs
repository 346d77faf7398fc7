//! In-memory trace registry
//!
//! Short-lived bookkeeping of traces and spans currently in flight,
//! independent of the database. Completed entries linger for a grace
//! period to tolerate late reads by concurrent requests, and a periodic
//! sweep evicts anything older than the absolute max age (leaked entries
//! from crashed requests).
//!
//! The registry is shared across request handlers running on a
//! multi-threaded runtime, so both maps are concurrent maps.

mod context;

pub use context::{SpanLog, SpanStatus, TraceContext, TraceSpan, deep_merge};

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::core::constants::{
    REGISTRY_MAX_AGE_SECS, REGISTRY_SWEEP_INTERVAL_SECS, SPAN_GRACE_PERIOD_SECS,
    TRACE_GRACE_PERIOD_SECS,
};
use crate::utils::time::now_millis;

/// Arguments for creating a trace context
#[derive(Debug, Clone, Default)]
pub struct NewTraceContext {
    pub trace_id: Option<String>,
    pub parent_trace_id: Option<String>,
    pub session_id: Option<String>,
    pub user_id: String,
    pub metadata: Map<String, Value>,
}

struct TraceEntry {
    context: TraceContext,
    /// Set when the trace completes; drives grace-period eviction
    completed_at: Option<i64>,
}

struct SpanEntry {
    span: TraceSpan,
    finished_at: Option<i64>,
}

/// Registry of in-flight traces and spans
pub struct TraceRegistry {
    traces: DashMap<String, TraceEntry>,
    spans: DashMap<String, SpanEntry>,
    trace_grace: Duration,
    span_grace: Duration,
    max_age: Duration,
}

impl Default for TraceRegistry {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(TRACE_GRACE_PERIOD_SECS),
            Duration::from_secs(SPAN_GRACE_PERIOD_SECS),
            Duration::from_secs(REGISTRY_MAX_AGE_SECS),
        )
    }
}

impl TraceRegistry {
    pub fn new(trace_grace: Duration, span_grace: Duration, max_age: Duration) -> Self {
        Self {
            traces: DashMap::new(),
            spans: DashMap::new(),
            trace_grace,
            span_grace,
            max_age,
        }
    }

    // ========================================================================
    // Trace lifecycle
    // ========================================================================

    /// Create and register a new trace context. Generates a trace id and,
    /// if absent, a session id.
    pub fn create_trace(&self, args: NewTraceContext) -> TraceContext {
        let context = TraceContext {
            trace_id: args.trace_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            parent_trace_id: args.parent_trace_id,
            session_id: args
                .session_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            user_id: args.user_id,
            start_time: now_millis(),
            metadata: args.metadata,
        };

        self.traces.insert(
            context.trace_id.clone(),
            TraceEntry {
                context: context.clone(),
                completed_at: None,
            },
        );

        context
    }

    /// Registry lookup only; never hits durable storage
    pub fn get_active_trace(&self, trace_id: &str) -> Option<TraceContext> {
        self.traces.get(trace_id).map(|e| e.context.clone())
    }

    /// Deep-merge a metadata patch into a registered trace.
    /// No-op if the trace is absent (the durable update happens separately).
    pub fn update_trace(&self, trace_id: &str, metadata_patch: &Map<String, Value>) {
        if let Some(mut entry) = self.traces.get_mut(trace_id) {
            deep_merge(&mut entry.context.metadata, metadata_patch);
        }
    }

    /// Attach a result and end timing to the trace metadata and schedule
    /// its removal after the grace period. Idempotent.
    pub fn complete_trace(self: &Arc<Self>, trace_id: &str, result: Value) {
        let now = now_millis();
        let Some(mut entry) = self.traces.get_mut(trace_id) else {
            return;
        };
        if entry.completed_at.is_some() {
            return;
        }

        let duration_ms = now - entry.context.start_time;
        let mut patch = Map::new();
        patch.insert("result".to_string(), result);
        patch.insert("end_time".to_string(), Value::from(now));
        patch.insert("duration_ms".to_string(), Value::from(duration_ms));
        deep_merge(&mut entry.context.metadata, &patch);
        entry.completed_at = Some(now);
        drop(entry);

        self.schedule_trace_removal(trace_id.to_string());
    }

    fn schedule_trace_removal(self: &Arc<Self>, trace_id: String) {
        let registry = Arc::clone(self);
        let grace = self.trace_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            registry
                .traces
                .remove_if(&trace_id, |_, e| e.completed_at.is_some());
        });
    }

    // ========================================================================
    // Span lifecycle
    // ========================================================================

    /// Create and register a span under a trace
    pub fn create_span(
        &self,
        trace_id: &str,
        operation_name: &str,
        parent_span_id: Option<String>,
    ) -> TraceSpan {
        let span = TraceSpan {
            span_id: Uuid::new_v4().to_string(),
            trace_id: trace_id.to_string(),
            parent_span_id,
            operation_name: operation_name.to_string(),
            start_time: now_millis(),
            end_time: None,
            tags: Map::new(),
            logs: Vec::new(),
            status: SpanStatus::Pending,
        };

        self.spans.insert(
            span.span_id.clone(),
            SpanEntry {
                span: span.clone(),
                finished_at: None,
            },
        );

        span
    }

    pub fn get_span(&self, span_id: &str) -> Option<TraceSpan> {
        self.spans.get(span_id).map(|e| e.span.clone())
    }

    /// Append a log line to a span. No-op if the span is absent.
    pub fn add_span_log(&self, span_id: &str, level: &str, message: &str, data: Option<Value>) {
        if let Some(mut entry) = self.spans.get_mut(span_id) {
            entry.span.logs.push(SpanLog {
                timestamp: now_millis(),
                level: level.to_string(),
                message: message.to_string(),
                data,
            });
        }
    }

    /// Merge tags into a span. No-op if the span is absent.
    pub fn set_span_tags(&self, span_id: &str, tags: &Map<String, Value>) {
        if let Some(mut entry) = self.spans.get_mut(span_id) {
            deep_merge(&mut entry.span.tags, tags);
        }
    }

    /// Mark a span finished and schedule its removal. Idempotent.
    pub fn finish_span(self: &Arc<Self>, span_id: &str, status: SpanStatus) {
        let now = now_millis();
        let Some(mut entry) = self.spans.get_mut(span_id) else {
            return;
        };
        if entry.finished_at.is_some() {
            return;
        }
        entry.span.end_time = Some(now);
        entry.span.status = status;
        entry.finished_at = Some(now);
        drop(entry);

        let registry = Arc::clone(self);
        let grace = self.span_grace;
        let span_id = span_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            registry
                .spans
                .remove_if(&span_id, |_, e| e.finished_at.is_some());
        });
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    /// Sweep both maps, evicting entries past their grace period and any
    /// entry older than the absolute max age
    pub fn cleanup(&self) {
        self.cleanup_at(now_millis());
    }

    fn cleanup_at(&self, now: i64) {
        let trace_grace_ms = self.trace_grace.as_millis() as i64;
        let span_grace_ms = self.span_grace.as_millis() as i64;
        let max_age_ms = self.max_age.as_millis() as i64;

        let before = self.traces.len() + self.spans.len();

        self.traces.retain(|_, entry| {
            if let Some(completed_at) = entry.completed_at
                && now - completed_at > trace_grace_ms
            {
                return false;
            }
            now - entry.context.start_time <= max_age_ms
        });

        self.spans.retain(|_, entry| {
            if let Some(finished_at) = entry.finished_at
                && now - finished_at > span_grace_ms
            {
                return false;
            }
            now - entry.span.start_time <= max_age_ms
        });

        let evicted = before - (self.traces.len() + self.spans.len());
        if evicted > 0 {
            tracing::debug!(evicted, "Registry sweep evicted stale entries");
        }
    }

    /// Number of registered (not yet evicted) traces
    pub fn active_trace_count(&self) -> usize {
        self.traces.len()
    }

    /// Start the periodic sweep task (safety net against leaked entries)
    pub fn start_sweep_task(
        self: &Arc<Self>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(REGISTRY_SWEEP_INTERVAL_SECS));
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("Registry sweep task shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        registry.cleanup();
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_registry() -> Arc<TraceRegistry> {
        Arc::new(TraceRegistry::new(
            Duration::from_millis(50),
            Duration::from_millis(20),
            Duration::from_secs(1800),
        ))
    }

    fn meta(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_create_trace_generates_ids() {
        let registry = make_registry();
        let ctx = registry.create_trace(NewTraceContext {
            user_id: "u1".to_string(),
            metadata: meta(json!({"model": "gpt-4o", "source": "api"})),
            ..NewTraceContext::default()
        });

        assert!(!ctx.trace_id.is_empty());
        assert!(!ctx.session_id.is_empty());
        assert_eq!(registry.active_trace_count(), 1);
        assert!(registry.get_active_trace(&ctx.trace_id).is_some());
    }

    #[tokio::test]
    async fn test_create_trace_honors_supplied_ids() {
        let registry = make_registry();
        let ctx = registry.create_trace(NewTraceContext {
            trace_id: Some("t-fixed".to_string()),
            session_id: Some("s-fixed".to_string()),
            user_id: "u1".to_string(),
            ..NewTraceContext::default()
        });
        assert_eq!(ctx.trace_id, "t-fixed");
        assert_eq!(ctx.session_id, "s-fixed");
    }

    #[tokio::test]
    async fn test_update_trace_deep_merges_metadata() {
        let registry = make_registry();
        let ctx = registry.create_trace(NewTraceContext {
            user_id: "u1".to_string(),
            metadata: meta(json!({"model": "gpt-4o", "extra": {"a": 1}})),
            ..NewTraceContext::default()
        });

        registry.update_trace(&ctx.trace_id, &meta(json!({"extra": {"b": 2}})));

        let updated = registry.get_active_trace(&ctx.trace_id).unwrap();
        assert_eq!(updated.metadata["extra"]["a"], json!(1));
        assert_eq!(updated.metadata["extra"]["b"], json!(2));
    }

    #[tokio::test]
    async fn test_update_missing_trace_is_noop() {
        let registry = make_registry();
        // Must not panic or create an entry
        registry.update_trace("missing", &meta(json!({"x": 1})));
        assert_eq!(registry.active_trace_count(), 0);
    }

    #[tokio::test]
    async fn test_complete_trace_keeps_entry_during_grace() {
        let registry = make_registry();
        let ctx = registry.create_trace(NewTraceContext {
            user_id: "u1".to_string(),
            ..NewTraceContext::default()
        });

        registry.complete_trace(&ctx.trace_id, json!({"tokens": 12}));

        // Still readable immediately after completion (late reads)
        let completed = registry.get_active_trace(&ctx.trace_id).unwrap();
        assert_eq!(completed.metadata["result"]["tokens"], json!(12));
        assert!(completed.metadata.contains_key("end_time"));
        assert!(completed.metadata.contains_key("duration_ms"));

        // Evicted after the grace period
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(registry.get_active_trace(&ctx.trace_id).is_none());
    }

    #[tokio::test]
    async fn test_complete_trace_twice_is_noop() {
        let registry = make_registry();
        let ctx = registry.create_trace(NewTraceContext {
            user_id: "u1".to_string(),
            ..NewTraceContext::default()
        });

        registry.complete_trace(&ctx.trace_id, json!({"first": true}));
        registry.complete_trace(&ctx.trace_id, json!({"second": true}));

        let completed = registry.get_active_trace(&ctx.trace_id).unwrap();
        assert_eq!(completed.metadata["result"], json!({"first": true}));
    }

    #[tokio::test]
    async fn test_span_lifecycle() {
        let registry = make_registry();
        let span = registry.create_span("t1", "provider_call", None);

        registry.add_span_log(&span.span_id, "info", "first token", Some(json!({"n": 1})));
        registry.set_span_tags(&span.span_id, &meta(json!({"model": "gpt-4o"})));
        registry.finish_span(&span.span_id, SpanStatus::Success);

        let finished = registry.get_span(&span.span_id).unwrap();
        assert_eq!(finished.status, SpanStatus::Success);
        assert!(finished.end_time.is_some());
        assert_eq!(finished.logs.len(), 1);
        assert_eq!(finished.tags["model"], json!("gpt-4o"));

        // Spans use the shorter grace period
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(registry.get_span(&span.span_id).is_none());
    }

    #[tokio::test]
    async fn test_cleanup_evicts_entries_past_max_age() {
        let registry = Arc::new(TraceRegistry::new(
            Duration::from_secs(60),
            Duration::from_secs(30),
            Duration::from_secs(1800),
        ));
        let ctx = registry.create_trace(NewTraceContext {
            user_id: "u1".to_string(),
            ..NewTraceContext::default()
        });

        // Nothing evicted at a normal sweep
        registry.cleanup();
        assert_eq!(registry.active_trace_count(), 1);

        // A sweep 31 minutes in the future evicts the leaked entry
        registry.cleanup_at(now_millis() + 31 * 60 * 1000);
        assert_eq!(registry.active_trace_count(), 0);
        assert!(registry.get_active_trace(&ctx.trace_id).is_none());
    }
}
