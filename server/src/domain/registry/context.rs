//! In-memory trace and span context types
//!
//! These are the ephemeral, process-local counterparts of durable trace
//! rows: fast bookkeeping for requests currently in flight. The durable
//! store remains the source of truth for anything that must survive a
//! restart.

use serde::Serialize;
use serde_json::{Map, Value};

/// Lifecycle status of an in-memory span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    #[default]
    Pending,
    Success,
    Error,
}

/// Ephemeral per-request context held in the registry
#[derive(Debug, Clone, Serialize)]
pub struct TraceContext {
    pub trace_id: String,
    pub parent_trace_id: Option<String>,
    pub session_id: String,
    pub user_id: String,
    /// Epoch milliseconds
    pub start_time: i64,
    /// Free-form request metadata (source, model, prompt id, user agent...),
    /// deep-merged as it accrues
    pub metadata: Map<String, Value>,
}

/// One structured log line attached to a span
#[derive(Debug, Clone, Serialize)]
pub struct SpanLog {
    /// Epoch milliseconds
    pub timestamp: i64,
    pub level: String,
    pub message: String,
    pub data: Option<Value>,
}

/// Ephemeral sub-operation inside a trace (e.g. one provider call)
#[derive(Debug, Clone, Serialize)]
pub struct TraceSpan {
    pub span_id: String,
    pub trace_id: String,
    pub parent_span_id: Option<String>,
    pub operation_name: String,
    /// Epoch milliseconds
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub tags: Map<String, Value>,
    pub logs: Vec<SpanLog>,
    pub status: SpanStatus,
}

/// Deep-merge `patch` into `target`: objects merge recursively, every
/// other value type replaces the existing entry.
pub fn deep_merge(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, patch_value) in patch {
        match (target.get_mut(key), patch_value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), patch_value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_deep_merge_replaces_scalars() {
        let mut target = map(json!({"model": "gpt-4o", "version": 1}));
        deep_merge(&mut target, &map(json!({"version": 2})));
        assert_eq!(target["model"], json!("gpt-4o"));
        assert_eq!(target["version"], json!(2));
    }

    #[test]
    fn test_deep_merge_nested_objects() {
        let mut target = map(json!({"result": {"tokens": 10, "cost": 0.1}}));
        deep_merge(&mut target, &map(json!({"result": {"tokens": 20}})));
        assert_eq!(target["result"]["tokens"], json!(20));
        // Sibling keys survive the merge
        assert_eq!(target["result"]["cost"], json!(0.1));
    }

    #[test]
    fn test_deep_merge_adds_new_keys() {
        let mut target = map(json!({}));
        deep_merge(&mut target, &map(json!({"source": "playground"})));
        assert_eq!(target["source"], json!("playground"));
    }

    #[test]
    fn test_deep_merge_object_replaces_scalar() {
        let mut target = map(json!({"x": 1}));
        deep_merge(&mut target, &map(json!({"x": {"nested": true}})));
        assert_eq!(target["x"], json!({"nested": true}));
    }
}
