//! End-to-end orchestrator tests over the in-memory database

use std::sync::Arc;

use futures::StreamExt;

use super::{GenerateOptions, StreamMessage, StreamingOrchestrator, error_codes};
use crate::data::SqliteService;
use crate::data::types::{TraceEventType, TraceSource, TraceStatus};
use crate::domain::pricing::{PricingData, PricingService};
use crate::domain::providers::{
    GenerationClient, GenerationParams, GenerationRequest, ProviderError, ProviderResponse,
    ProviderUsage, StreamChunk,
};
use crate::domain::registry::TraceRegistry;
use crate::domain::traces::{LiveFeed, TraceService};
use crate::utils::time::now_millis;

const TEST_PRICING: &str =
    r#"{"test-model": {"input_cost_per_token": 0.000001, "output_cost_per_token": 0.000002}}"#;

/// Configurable mock provider for failure-path tests
struct MockClient {
    behavior: MockBehavior,
}

enum MockBehavior {
    Complete { content: String },
    Fail { message: String },
    StreamThenFail,
    StreamWithUsage,
}

#[async_trait::async_trait]
impl GenerationClient for MockClient {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        match &self.behavior {
            MockBehavior::Complete { content } => Ok(ProviderResponse::Complete {
                content: content.clone(),
                usage: None,
            }),
            MockBehavior::Fail { message } => Err(ProviderError::Api {
                status: 429,
                message: message.clone(),
            }),
            MockBehavior::StreamThenFail => {
                let chunks: Vec<Result<StreamChunk, ProviderError>> = vec![
                    Ok(StreamChunk {
                        delta: "partial ".to_string(),
                        usage: None,
                    }),
                    Err(ProviderError::Parse("connection reset".to_string())),
                ];
                Ok(ProviderResponse::Stream(Box::pin(futures::stream::iter(
                    chunks,
                ))))
            }
            MockBehavior::StreamWithUsage => {
                let chunks: Vec<Result<StreamChunk, ProviderError>> = vec![
                    Ok(StreamChunk {
                        delta: "Hello".to_string(),
                        usage: None,
                    }),
                    Ok(StreamChunk {
                        delta: " world".to_string(),
                        usage: Some(ProviderUsage {
                            input_tokens: 7,
                            output_tokens: 2,
                        }),
                    }),
                ];
                Ok(ProviderResponse::Stream(Box::pin(futures::stream::iter(
                    chunks,
                ))))
            }
        }
    }

    fn supports_streaming(&self) -> bool {
        !matches!(self.behavior, MockBehavior::Complete { .. })
    }

    fn provider_id(&self) -> &'static str {
        "mock"
    }
}

async fn make_orchestrator(client: Arc<dyn GenerationClient>) -> Arc<StreamingOrchestrator> {
    let pool = SqliteService::init_in_memory().await.unwrap().pool().clone();
    let traces = Arc::new(TraceService::new(
        pool,
        Arc::new(TraceRegistry::default()),
        Arc::new(LiveFeed::default()),
    ));
    let pricing = PricingService::from_data(PricingData::from_json_str(TEST_PRICING).unwrap());
    Arc::new(StreamingOrchestrator::new(traces, client, pricing, None))
}

fn options(f: impl FnOnce(&mut GenerateOptions)) -> GenerateOptions {
    let mut opts = GenerateOptions {
        request: GenerationRequest {
            prompt: "Say hello".to_string(),
            system_prompt: None,
            model: "test-model".to_string(),
            params: GenerationParams {
                max_tokens: Some(20),
                ..GenerationParams::default()
            },
        },
        user_id: "u1".to_string(),
        source: TraceSource::Test,
        ..GenerateOptions::default()
    };
    f(&mut opts);
    opts
}

#[tokio::test]
async fn test_happy_path_streams_connected_tokens_complete() {
    let pool = SqliteService::init_in_memory().await.unwrap().pool().clone();
    let traces = Arc::new(TraceService::new(
        pool,
        Arc::new(TraceRegistry::default()),
        Arc::new(LiveFeed::default()),
    ));
    let pricing = PricingService::from_data(PricingData::from_json_str(TEST_PRICING).unwrap());
    let orchestrator = Arc::new(StreamingOrchestrator::new(
        Arc::clone(&traces),
        Arc::new(MockClient {
            behavior: MockBehavior::Complete {
                content: "hello from the test model".to_string(),
            },
        }),
        pricing,
        None,
    ));

    let started_at = now_millis();
    let (context, stream) = orchestrator.run(options(|_| {})).await.unwrap();
    let messages: Vec<StreamMessage> = stream.collect().await;

    // Ordering: connected first, then tokens, exactly one complete last
    assert!(matches!(messages[0], StreamMessage::Connected { .. }));
    let token_count = messages
        .iter()
        .filter(|m| matches!(m, StreamMessage::Token { .. }))
        .count();
    assert!(token_count >= 1);
    let completes: Vec<_> = messages
        .iter()
        .filter_map(|m| match m {
            StreamMessage::Complete { usage, cost, duration_ms, .. } => {
                Some((usage, cost, duration_ms))
            }
            _ => None,
        })
        .collect();
    assert_eq!(completes.len(), 1);
    let (usage, cost, _) = completes[0];
    assert!(usage.total > 0);
    assert!(cost.total_cost >= 0.0);

    // Persisted trace is terminal with wall-clock-consistent duration
    let record = traces.get_trace(&context.trace_id).await.unwrap().unwrap();
    assert_eq!(record.status, TraceStatus::Success);
    let duration = record.duration_ms.unwrap();
    let elapsed_upper_bound = now_millis() - started_at + 50;
    assert!(duration >= 0 && duration <= elapsed_upper_bound);
    assert_eq!(
        record.duration_ms.unwrap(),
        record.end_time.unwrap() - record.start_time
    );
    assert_eq!(record.response_content.as_deref(), Some("hello from the test model"));

    // Usage estimation: ceil(9 chars / 4) = 3 input tokens, 5 output words
    let usage = record.tokens_used.unwrap();
    assert_eq!(usage.input, 3);
    assert_eq!(usage.output, 5);

    // tokens/sec consistency when both tokens and duration are positive
    if let (Some(tps), Some(d)) = (record.tokens_per_second, record.duration_ms)
        && d > 0
    {
        let expected = usage.total as f64 / d as f64 * 1000.0;
        assert!((tps - expected).abs() < 1e-6);
    }
}

#[tokio::test]
async fn test_validation_error_rejected_before_provider_call() {
    let pool = SqliteService::init_in_memory().await.unwrap().pool().clone();
    let traces = Arc::new(TraceService::new(
        pool,
        Arc::new(TraceRegistry::default()),
        Arc::new(LiveFeed::default()),
    ));
    let pricing = PricingService::from_data(PricingData::from_json_str(TEST_PRICING).unwrap());
    let orchestrator = Arc::new(StreamingOrchestrator::new(
        Arc::clone(&traces),
        Arc::new(MockClient {
            behavior: MockBehavior::Fail {
                message: "provider must never be reached".to_string(),
            },
        }),
        pricing,
        None,
    ));

    let (context, stream) = orchestrator
        .run(options(|o| o.request.params.max_tokens = Some(-1)))
        .await
        .unwrap();
    let messages: Vec<StreamMessage> = stream.collect().await;

    // Exactly one error message with the validation-specific reason
    let errors: Vec<_> = messages
        .iter()
        .filter_map(|m| match m {
            StreamMessage::Error { code, message, .. } => Some((code.clone(), message.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, error_codes::VALIDATION_ERROR);
    assert!(errors[0].1.contains("max_tokens"));
    // The provider's message never appears: it was not called
    assert!(!errors[0].1.contains("never be reached"));

    // No tokens, no complete
    assert!(!messages.iter().any(|m| matches!(m, StreamMessage::Token { .. })));
    assert!(!messages.iter().any(|m| matches!(m, StreamMessage::Complete { .. })));

    // Trace finalized as error, not left pending
    let record = traces.get_trace(&context.trace_id).await.unwrap().unwrap();
    assert_eq!(record.status, TraceStatus::Error);
    assert_eq!(record.error_code.as_deref(), Some(error_codes::VALIDATION_ERROR));
}

#[tokio::test]
async fn test_provider_error_surfaces_provider_message() {
    let orchestrator = make_orchestrator(Arc::new(MockClient {
        behavior: MockBehavior::Fail {
            message: "Rate limit exceeded".to_string(),
        },
    }))
    .await;

    let (_, stream) = orchestrator.run(options(|_| {})).await.unwrap();
    let messages: Vec<StreamMessage> = stream.collect().await;

    let error = messages
        .iter()
        .find_map(|m| match m {
            StreamMessage::Error { code, message, .. } => Some((code.clone(), message.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(error.0, error_codes::GENERATION_ERROR);
    assert!(error.1.contains("Rate limit exceeded"));
}

#[tokio::test]
async fn test_mid_stream_failure_uses_generic_message() {
    let pool = SqliteService::init_in_memory().await.unwrap().pool().clone();
    let traces = Arc::new(TraceService::new(
        pool,
        Arc::new(TraceRegistry::default()),
        Arc::new(LiveFeed::default()),
    ));
    let pricing = PricingService::from_data(PricingData::from_json_str(TEST_PRICING).unwrap());
    let orchestrator = Arc::new(StreamingOrchestrator::new(
        Arc::clone(&traces),
        Arc::new(MockClient {
            behavior: MockBehavior::StreamThenFail,
        }),
        pricing,
        None,
    ));

    let (context, stream) = orchestrator.run(options(|_| {})).await.unwrap();
    let messages: Vec<StreamMessage> = stream.collect().await;

    let error = messages
        .iter()
        .find_map(|m| match m {
            StreamMessage::Error { code, message, .. } => Some((code.clone(), message.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(error.0, error_codes::GENERATION_EXCEPTION);
    // The raw cause stays out of the client message...
    assert!(!error.1.contains("connection reset"));

    // ...but is captured on the trace event log
    let events = traces.get_trace_events(&context.trace_id).await.unwrap();
    let error_event = events
        .iter()
        .find(|e| e.event_type == TraceEventType::Error)
        .unwrap();
    assert!(
        error_event.event_data.as_ref().unwrap()["detail"]
            .as_str()
            .unwrap()
            .contains("connection reset")
    );
}

#[tokio::test]
async fn test_provider_usage_preferred_over_estimate() {
    let pool = SqliteService::init_in_memory().await.unwrap().pool().clone();
    let traces = Arc::new(TraceService::new(
        pool,
        Arc::new(TraceRegistry::default()),
        Arc::new(LiveFeed::default()),
    ));
    let pricing = PricingService::from_data(PricingData::from_json_str(TEST_PRICING).unwrap());
    let orchestrator = Arc::new(StreamingOrchestrator::new(
        Arc::clone(&traces),
        Arc::new(MockClient {
            behavior: MockBehavior::StreamWithUsage,
        }),
        pricing,
        None,
    ));

    let (context, stream) = orchestrator.run(options(|_| {})).await.unwrap();
    let _messages: Vec<StreamMessage> = stream.collect().await;

    let record = traces.get_trace(&context.trace_id).await.unwrap().unwrap();
    let usage = record.tokens_used.unwrap();
    assert_eq!(usage.input, 7);
    assert_eq!(usage.output, 2);
    assert_eq!(record.response_content.as_deref(), Some("Hello world"));

    // Cost follows the price table: 7 * 1e-6 + 2 * 2e-6
    let cost = record.cost.unwrap();
    assert!((cost.total_cost - (7.0 * 0.000001 + 2.0 * 0.000002)).abs() < 1e-12);
}

#[tokio::test]
async fn test_first_token_event_recorded_once() {
    let pool = SqliteService::init_in_memory().await.unwrap().pool().clone();
    let traces = Arc::new(TraceService::new(
        pool,
        Arc::new(TraceRegistry::default()),
        Arc::new(LiveFeed::default()),
    ));
    let pricing = PricingService::from_data(PricingData::from_json_str(TEST_PRICING).unwrap());
    let orchestrator = Arc::new(StreamingOrchestrator::new(
        Arc::clone(&traces),
        Arc::new(MockClient {
            behavior: MockBehavior::Complete {
                content: "one two three four five six seven eight nine ten eleven twelve".to_string(),
            },
        }),
        pricing,
        None,
    ));

    let (context, stream) = orchestrator.run(options(|_| {})).await.unwrap();
    let _: Vec<StreamMessage> = stream.collect().await;

    let record = traces.get_trace(&context.trace_id).await.unwrap().unwrap();
    assert!(record.first_token_latency_ms.is_some());

    let events = traces.get_trace_events(&context.trace_id).await.unwrap();
    let first_token_events = events
        .iter()
        .filter(|e| {
            e.event_type == TraceEventType::Token
                && e.event_data.as_ref().map(|d| d["action"] == "first_token") == Some(true)
        })
        .count();
    assert_eq!(first_token_events, 1);

    // 12 tokens -> one sampled batch event at the 10th
    let batch_events = events
        .iter()
        .filter(|e| {
            e.event_type == TraceEventType::Token
                && e.event_data.as_ref().map(|d| d["action"] == "token_batch") == Some(true)
        })
        .count();
    assert_eq!(batch_events, 1);
}

#[tokio::test]
async fn test_structured_output_parse_error_does_not_fail_trace() {
    let pool = SqliteService::init_in_memory().await.unwrap().pool().clone();
    let traces = Arc::new(TraceService::new(
        pool,
        Arc::new(TraceRegistry::default()),
        Arc::new(LiveFeed::default()),
    ));
    let pricing = PricingService::from_data(PricingData::from_json_str(TEST_PRICING).unwrap());
    let orchestrator = Arc::new(StreamingOrchestrator::new(
        Arc::clone(&traces),
        Arc::new(MockClient {
            behavior: MockBehavior::Complete {
                content: "plain prose, not json".to_string(),
            },
        }),
        pricing,
        None,
    ));

    let (context, stream) = orchestrator
        .run(options(|o| o.structured_output = true))
        .await
        .unwrap();
    let messages: Vec<StreamMessage> = stream.collect().await;

    assert!(messages.iter().any(|m| matches!(m, StreamMessage::ParseError { .. })));
    assert!(messages.iter().any(|m| matches!(m, StreamMessage::Complete { .. })));

    let record = traces.get_trace(&context.trace_id).await.unwrap().unwrap();
    assert_eq!(record.status, TraceStatus::Success);
}

#[tokio::test]
async fn test_structured_output_success_emits_structured_message() {
    let orchestrator = make_orchestrator(Arc::new(MockClient {
        behavior: MockBehavior::Complete {
            content: r#"{"answer": 42}"#.to_string(),
        },
    }))
    .await;

    let (_, stream) = orchestrator
        .run(options(|o| o.structured_output = true))
        .await
        .unwrap();
    let messages: Vec<StreamMessage> = stream.collect().await;

    let structured = messages
        .iter()
        .find_map(|m| match m {
            StreamMessage::Structured { output, .. } => Some(output.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(structured["data"]["answer"], 42);
}

#[tokio::test]
async fn test_consumer_disconnect_cancels_trace() {
    let pool = SqliteService::init_in_memory().await.unwrap().pool().clone();
    let traces = Arc::new(TraceService::new(
        pool,
        Arc::new(TraceRegistry::default()),
        Arc::new(LiveFeed::default()),
    ));
    let pricing = PricingService::from_data(PricingData::from_json_str(TEST_PRICING).unwrap());
    let orchestrator = Arc::new(StreamingOrchestrator::new(
        Arc::clone(&traces),
        Arc::new(MockClient {
            behavior: MockBehavior::Complete {
                content: "a long answer with plenty of words to stream".to_string(),
            },
        }),
        pricing,
        None,
    ));

    let (context, stream) = orchestrator.run(options(|_| {})).await.unwrap();

    // Consume only the first two messages, then drop the stream
    {
        let mut stream = Box::pin(stream);
        let _connected = stream.next().await;
        let _first_token = stream.next().await;
    }

    // Give the drop guard's spawned task time to run
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let record = traces.get_trace(&context.trace_id).await.unwrap().unwrap();
    assert_eq!(record.status, TraceStatus::Cancelled);
    assert!(record.end_time.is_some());

    let events = traces.get_trace_events(&context.trace_id).await.unwrap();
    let cancel_event = events
        .iter()
        .find(|e| e.event_type == TraceEventType::UserAction)
        .unwrap();
    assert_eq!(
        cancel_event.event_data.as_ref().unwrap()["action"],
        "stream_cancelled"
    );
}

#[tokio::test]
async fn test_supplied_trace_id_is_reused_for_correlation() {
    let orchestrator = make_orchestrator(Arc::new(MockClient {
        behavior: MockBehavior::Complete {
            content: "ok".to_string(),
        },
    }))
    .await;

    let (context, stream) = orchestrator
        .run(options(|o| o.trace_id = Some("caller-supplied-id".to_string())))
        .await
        .unwrap();
    assert_eq!(context.trace_id, "caller-supplied-id");

    let messages: Vec<StreamMessage> = stream.collect().await;
    match &messages[0] {
        StreamMessage::Connected { trace_id, .. } => assert_eq!(trace_id, "caller-supplied-id"),
        other => panic!("expected connected, got {:?}", other.event_name()),
    }
}
