//! Generation streaming endpoint
//!
//! `POST /generate` drives one AI generation end-to-end and responds
//! with a server-push event stream of typed messages. The trace id is
//! also emitted as a response header for non-stream consumers.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderValue;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::ApiState;
use crate::api::extractors::RequestContext;
use crate::api::types::ApiError;
use crate::core::constants::{HEADER_SESSION_ID, HEADER_TRACE_ID, SSE_KEEP_ALIVE_SECS};
use crate::data::types::TraceSource;
use crate::domain::providers::{GenerationParams, GenerationRequest};
use crate::domain::streaming::GenerateOptions;

#[derive(Debug, Deserialize)]
pub struct StructuredOutputBody {
    #[serde(default)]
    pub enabled: bool,
    pub format: Option<String>,
    pub schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub model: String,
    #[serde(default)]
    pub parameters: GenerationParams,
    pub structured_output: Option<StructuredOutputBody>,
    /// Correlate with an existing trace from a prior leg
    pub trace_id: Option<String>,
    pub prompt_id: Option<String>,
    pub source: Option<TraceSource>,
}

pub async fn generate(
    State(state): State<ApiState>,
    context: RequestContext,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    Json(body): Json<GenerateBody>,
) -> Result<Response, ApiError> {
    let options = GenerateOptions {
        request: GenerationRequest {
            prompt: body.prompt,
            system_prompt: body.system_prompt,
            model: body.model,
            params: body.parameters,
        },
        structured_output: body.structured_output.map(|s| s.enabled).unwrap_or(false),
        // Body takes precedence over the correlation header
        trace_id: body.trace_id.or(context.trace_id),
        parent_trace_id: context.parent_trace_id,
        session_id: context.session_id,
        user_id: context.user_id,
        prompt_id: body.prompt_id,
        source: body.source.unwrap_or(TraceSource::Api),
        user_agent: context.user_agent,
        ip_address: Some(addr.ip().to_string()),
    };

    // Trace creation failure is fatal to the request
    let (trace_context, stream) = state
        .orchestrator
        .clone()
        .run(options)
        .await
        .map_err(ApiError::from_sqlite)?;

    let sse_stream = async_stream::stream! {
        futures::pin_mut!(stream);
        while let Some(message) = futures::StreamExt::next(&mut stream).await {
            match serde_json::to_string(&message) {
                Ok(data) => {
                    yield Ok::<_, Infallible>(Event::default().event(message.event_name()).data(data));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize stream message");
                }
            }
        }
    };

    let mut response = Sse::new(sse_stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS))
                .text("keep-alive"),
        )
        .into_response();

    // Correlation headers for non-stream consumers
    if let Ok(value) = HeaderValue::from_str(&trace_context.trace_id) {
        response.headers_mut().insert(HEADER_TRACE_ID, value);
    }
    if let Ok(value) = HeaderValue::from_str(&trace_context.session_id) {
        response.headers_mut().insert(HEADER_SESSION_ID, value);
    }

    Ok(response)
}
