//! Streaming orchestrator
//!
//! Drives a single generation end-to-end: resolves or creates the trace,
//! validates parameters, streams tokens to the client channel, computes
//! usage and cost, and finalizes the trace exactly once in every terminal
//! path (success, error, cancellation).
//!
//! The orchestrator is the boundary that converts internal failures into
//! typed stream messages. Validation errors surface their specific
//! message; internal exceptions surface a generic retry message with the
//! detail captured on the trace event log only.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::Stream;
use serde_json::json;

use super::messages::{GENERIC_ERROR_MESSAGE, StreamMessage, error_codes};
use super::token_source::{ProviderTokenSource, SimulatedTokenSource, TokenSource};
use crate::core::constants::{ESTIMATED_CHARS_PER_TOKEN, TOKEN_EVENT_SAMPLE_RATE};
use crate::data::SqliteError;
use crate::data::types::{
    TokenUsage, TraceCompletion, TraceEventType, TraceSource, TraceStatus, TraceUpdate,
};
use crate::domain::mirror::{MirrorInteraction, ObservabilityMirror};
use crate::domain::pricing::PricingService;
use crate::domain::providers::{
    GenerationClient, GenerationRequest, ProviderResponse, parse_structured_output,
};
use crate::domain::registry::TraceContext;
use crate::domain::traces::{StartTraceArgs, TraceService};
use crate::utils::time::now_millis;

/// Full request context for one generation
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub request: GenerationRequest,
    /// Attempt structured parsing of the assembled content
    pub structured_output: bool,
    /// Correlate with a caller-initiated trace when supplied
    pub trace_id: Option<String>,
    pub parent_trace_id: Option<String>,
    pub session_id: Option<String>,
    pub user_id: String,
    pub prompt_id: Option<String>,
    pub source: TraceSource,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

pub struct StreamingOrchestrator {
    traces: Arc<TraceService>,
    client: Arc<dyn GenerationClient>,
    pricing: Arc<PricingService>,
    mirror: Option<Arc<ObservabilityMirror>>,
}

impl StreamingOrchestrator {
    pub fn new(
        traces: Arc<TraceService>,
        client: Arc<dyn GenerationClient>,
        pricing: Arc<PricingService>,
        mirror: Option<Arc<ObservabilityMirror>>,
    ) -> Self {
        Self {
            traces,
            client,
            pricing,
            mirror,
        }
    }

    /// Resolve or create the trace, then return it together with the
    /// message stream. The trace id is available before the first poll so
    /// callers can emit it as a response header.
    ///
    /// Trace creation failure is fatal to the request and propagates.
    pub async fn run(
        self: Arc<Self>,
        options: GenerateOptions,
    ) -> Result<(TraceContext, impl Stream<Item = StreamMessage> + Send + 'static), SqliteError>
    {
        let context = match options
            .trace_id
            .as_deref()
            .and_then(|id| self.traces.registry().get_active_trace(id))
        {
            Some(existing) => {
                // Reuse the caller's active trace and mark it streaming
                let mut patch = serde_json::Map::new();
                patch.insert("streaming".to_string(), serde_json::Value::from(true));
                self.traces.registry().update_trace(&existing.trace_id, &patch);
                existing
            }
            None => {
                self.traces
                    .start_trace(StartTraceArgs {
                        trace_id: options.trace_id.clone(),
                        parent_trace_id: options.parent_trace_id.clone(),
                        session_id: options.session_id.clone(),
                        user_id: options.user_id.clone(),
                        prompt_id: options.prompt_id.clone(),
                        source: options.source,
                        model_id: options.request.model.clone(),
                        prompt_content: options.request.prompt.clone(),
                        system_prompt: options.request.system_prompt.clone(),
                        parameters: serde_json::to_value(&options.request.params).ok(),
                        user_agent: options.user_agent.clone(),
                        ip_address: options.ip_address.clone(),
                    })
                    .await?
            }
        };

        let stream = self.into_stream(context.clone(), options);
        Ok((context, stream))
    }

    fn into_stream(
        self: Arc<Self>,
        context: TraceContext,
        options: GenerateOptions,
    ) -> impl Stream<Item = StreamMessage> + Send + 'static {
        async_stream::stream! {
            let orchestrator = self;
            let trace_id = context.trace_id.clone();

            let tokens_emitted = Arc::new(AtomicUsize::new(0));
            let chars_emitted = Arc::new(AtomicUsize::new(0));
            let finished = Arc::new(AtomicBool::new(false));

            // Consumer-close is the only cancellation trigger: if the
            // stream is dropped before finalization, the guard runs the
            // cancellation path exactly once. Completion is idempotent, so
            // a race against normal finalization is a no-op, not a crash.
            let _cancel_guard = CancelGuard {
                traces: Arc::clone(&orchestrator.traces),
                trace_id: trace_id.clone(),
                tokens_emitted: Arc::clone(&tokens_emitted),
                chars_emitted: Arc::clone(&chars_emitted),
                finished: Arc::clone(&finished),
            };

            // Emit `connected` immediately so the client can correlate
            // even before any content arrives
            yield StreamMessage::Connected {
                trace_id: trace_id.clone(),
                session_id: context.session_id.clone(),
            };

            // Validation happens before any provider call; the specific
            // message is user-facing
            if let Err(failure) = orchestrator.client.validate_params(&options.request) {
                orchestrator
                    .fail_trace(&trace_id, error_codes::VALIDATION_ERROR, &failure.message, None)
                    .await;
                finished.store(true, Ordering::SeqCst);
                yield StreamMessage::Error {
                    trace_id: trace_id.clone(),
                    code: error_codes::VALIDATION_ERROR.to_string(),
                    message: failure.message,
                };
                return;
            }

            if let Err(e) = orchestrator
                .traces
                .update_trace(
                    &trace_id,
                    TraceUpdate {
                        status: Some(TraceStatus::Streaming),
                        ..TraceUpdate::default()
                    },
                )
                .await
            {
                orchestrator
                    .fail_trace(
                        &trace_id,
                        error_codes::GENERATION_EXCEPTION,
                        GENERIC_ERROR_MESSAGE,
                        Some(format!("status update failed: {}", e)),
                    )
                    .await;
                finished.store(true, Ordering::SeqCst);
                yield StreamMessage::Error {
                    trace_id: trace_id.clone(),
                    code: error_codes::GENERATION_EXCEPTION.to_string(),
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                };
                return;
            }

            // Provider call; an error response surfaces the provider's
            // own message
            let response = match orchestrator.client.generate(&options.request).await {
                Ok(response) => response,
                Err(e) => {
                    let message = e.to_string();
                    orchestrator
                        .fail_trace(&trace_id, error_codes::GENERATION_ERROR, &message, None)
                        .await;
                    finished.store(true, Ordering::SeqCst);
                    yield StreamMessage::Error {
                        trace_id: trace_id.clone(),
                        code: error_codes::GENERATION_ERROR.to_string(),
                        message,
                    };
                    return;
                }
            };

            // Strategy selection by what the provider actually returned
            let mut source: Box<dyn TokenSource> = match response {
                ProviderResponse::Stream(stream) => Box::new(ProviderTokenSource::new(stream)),
                ProviderResponse::Complete { content, usage } => {
                    Box::new(SimulatedTokenSource::new(content, usage))
                }
            };

            let mut assembled = String::new();
            let mut token_index: usize = 0;
            let mut provider_usage = None;
            let mut first_token_seen = false;

            loop {
                let chunk = match source.next_token().await {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(e)) => {
                        orchestrator
                            .fail_trace(
                                &trace_id,
                                error_codes::GENERATION_EXCEPTION,
                                GENERIC_ERROR_MESSAGE,
                                Some(e.to_string()),
                            )
                            .await;
                        finished.store(true, Ordering::SeqCst);
                        yield StreamMessage::Error {
                            trace_id: trace_id.clone(),
                            code: error_codes::GENERATION_EXCEPTION.to_string(),
                            message: GENERIC_ERROR_MESSAGE.to_string(),
                        };
                        return;
                    }
                    None => break,
                };

                if let Some(usage) = chunk.usage {
                    provider_usage = Some(usage);
                }
                if chunk.delta.is_empty() {
                    continue;
                }

                assembled.push_str(&chunk.delta);
                token_index += 1;
                tokens_emitted.store(token_index, Ordering::SeqCst);
                chars_emitted.store(assembled.len(), Ordering::SeqCst);

                if !first_token_seen {
                    first_token_seen = true;
                    let latency_ms = now_millis() - context.start_time;
                    if let Err(e) = orchestrator
                        .traces
                        .update_trace(
                            &trace_id,
                            TraceUpdate {
                                first_token_latency_ms: Some(latency_ms),
                                ..TraceUpdate::default()
                            },
                        )
                        .await
                    {
                        tracing::warn!(trace_id = %trace_id, error = %e, "Failed to persist first-token latency");
                    }
                    // Dedicated first-token event, exactly once per trace
                    orchestrator
                        .traces
                        .record_event(
                            &trace_id,
                            TraceEventType::Token,
                            Some(json!({"action": "first_token", "latency_ms": latency_ms})),
                            None,
                        )
                        .await;
                } else if token_index % TOKEN_EVENT_SAMPLE_RATE == 0 {
                    // Sampled progress event: one persistence write per
                    // batch instead of per token
                    orchestrator
                        .traces
                        .record_event(
                            &trace_id,
                            TraceEventType::Token,
                            Some(json!({"action": "token_batch", "tokens": token_index})),
                            None,
                        )
                        .await;
                }

                yield StreamMessage::Token {
                    trace_id: trace_id.clone(),
                    token: chunk.delta,
                    index: token_index - 1,
                };
            }

            // Prefer the source's own full content (simulated path keeps
            // original whitespace); otherwise use the assembled deltas
            let content = source
                .full_content()
                .map(str::to_string)
                .unwrap_or_else(|| assembled.clone());

            // Structured parsing never fails the trace; raw content stays
            // the successful result
            if options.structured_output {
                let parsed = parse_structured_output(&content);
                if parsed.is_structured {
                    orchestrator
                        .traces
                        .record_event(
                            &trace_id,
                            TraceEventType::Structured,
                            serde_json::to_value(&parsed).ok(),
                            None,
                        )
                        .await;
                    yield StreamMessage::Structured {
                        trace_id: trace_id.clone(),
                        output: serde_json::to_value(&parsed).unwrap_or_default(),
                    };
                } else {
                    let errors = if parsed.errors.is_empty() {
                        vec!["Content is not structured".to_string()]
                    } else {
                        parsed.errors.clone()
                    };
                    orchestrator
                        .traces
                        .record_event(
                            &trace_id,
                            TraceEventType::Structured,
                            Some(json!({"success": false, "errors": errors})),
                            None,
                        )
                        .await;
                    yield StreamMessage::ParseError {
                        trace_id: trace_id.clone(),
                        errors,
                    };
                }
            }

            // Real usage from the provider, or an estimate when it
            // reported none
            let usage = provider_usage
                .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
                .unwrap_or_else(|| {
                    let estimated_input = options
                        .request
                        .prompt
                        .chars()
                        .count()
                        .div_ceil(ESTIMATED_CHARS_PER_TOKEN) as i64;
                    TokenUsage::new(estimated_input, token_index as i64)
                });
            let (cost, _) = orchestrator.pricing.cost(&options.request.model, usage);

            let end_time = now_millis();
            let duration_ms = (end_time - context.start_time).max(0);
            let tokens_per_second = (usage.total > 0 && duration_ms > 0)
                .then(|| usage.total as f64 / duration_ms as f64 * 1000.0);

            let completion = TraceCompletion {
                status: TraceStatus::Success,
                response_content: Some(content.clone()),
                tokens_used: Some(usage),
                cost: Some(cost),
                error_message: None,
                error_code: None,
                quality_score: None,
                end_time,
            };

            // Finalization failure is fatal: usage accounting depends on
            // the durable row
            if let Err(e) = orchestrator.traces.complete_trace(&trace_id, completion).await {
                orchestrator
                    .fail_trace(
                        &trace_id,
                        error_codes::GENERATION_EXCEPTION,
                        GENERIC_ERROR_MESSAGE,
                        Some(format!("finalization failed: {}", e)),
                    )
                    .await;
                finished.store(true, Ordering::SeqCst);
                yield StreamMessage::Error {
                    trace_id: trace_id.clone(),
                    code: error_codes::GENERATION_EXCEPTION.to_string(),
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                };
                return;
            }
            finished.store(true, Ordering::SeqCst);

            yield StreamMessage::Complete {
                trace_id: trace_id.clone(),
                content,
                usage,
                cost,
                duration_ms,
                tokens_per_second,
            };

            // Best-effort mirror sync; failures never reach the client
            if let Some(ref mirror) = orchestrator.mirror {
                mirror.record(MirrorInteraction {
                    trace_id: trace_id.clone(),
                    session_id: context.session_id.clone(),
                    user_id: context.user_id.clone(),
                    model_id: options.request.model.clone(),
                    provider: orchestrator.client.provider_id().to_string(),
                    status: TraceStatus::Success,
                    usage: Some(usage),
                    cost: Some(cost),
                    duration_ms,
                });
            }
        }
    }

    /// Record an error event and finalize the trace with an error status.
    /// `detail` (stack-trace equivalent) goes to the event log only.
    async fn fail_trace(&self, trace_id: &str, code: &str, message: &str, detail: Option<String>) {
        self.traces
            .record_event(
                trace_id,
                TraceEventType::Error,
                Some(json!({
                    "code": code,
                    "message": message,
                    "detail": detail,
                })),
                None,
            )
            .await;

        let completion = TraceCompletion {
            status: TraceStatus::Error,
            response_content: None,
            tokens_used: None,
            cost: None,
            error_message: Some(message.to_string()),
            error_code: Some(code.to_string()),
            quality_score: None,
            end_time: now_millis(),
        };

        if let Err(e) = self.traces.complete_trace(trace_id, completion).await {
            tracing::error!(trace_id, error = %e, "Failed to finalize errored trace");
        }
    }
}

/// Drop guard implementing the cancellation path
struct CancelGuard {
    traces: Arc<TraceService>,
    trace_id: String,
    tokens_emitted: Arc<AtomicUsize>,
    chars_emitted: Arc<AtomicUsize>,
    finished: Arc<AtomicBool>,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let traces = Arc::clone(&self.traces);
        let trace_id = self.trace_id.clone();
        let tokens = self.tokens_emitted.load(Ordering::SeqCst);
        let chars = self.chars_emitted.load(Ordering::SeqCst);

        handle.spawn(async move {
            traces
                .record_event(
                    &trace_id,
                    TraceEventType::UserAction,
                    Some(json!({
                        "action": "stream_cancelled",
                        "tokens_emitted": tokens,
                        "content_chars": chars,
                    })),
                    None,
                )
                .await;

            let completion = TraceCompletion {
                status: TraceStatus::Cancelled,
                response_content: None,
                tokens_used: None,
                cost: None,
                error_message: None,
                error_code: None,
                quality_score: None,
                end_time: now_millis(),
            };
            // Idempotent: racing against a finalize-on-success in flight
            // leaves the first terminal state in place
            match traces.complete_trace(&trace_id, completion).await {
                Ok(true) => {
                    tracing::debug!(trace_id = %trace_id, tokens, "Trace cancelled by consumer")
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(trace_id = %trace_id, error = %e, "Failed to finalize cancelled trace")
                }
            }
        });
    }
}
