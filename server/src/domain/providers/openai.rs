//! OpenAI-compatible provider adapter
//!
//! Talks to any `/chat/completions` endpoint (OpenAI, Azure-compatible
//! gateways, local inference servers). Streaming responses are SSE: chunks
//! are buffered, split on `\n\n`, and each `data:` payload parsed into a
//! token delta. The final chunk carries usage when the endpoint supports
//! `stream_options.include_usage`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use super::{
    GenerationClient, GenerationRequest, ProviderError, ProviderResponse, ProviderUsage,
    StreamChunk,
};
use crate::core::config::ProviderConfig;
use crate::core::constants::PROVIDER_TIMEOUT_SECS;

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn build_body(request: &GenerationRequest, stream: bool) -> serde_json::Value {
        let mut messages = Vec::new();
        if let Some(ref system) = request.system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));

        let mut body = json!({
            "model": request.model,
            "messages": messages,
            "stream": stream,
        });
        if stream {
            body["stream_options"] = json!({"include_usage": true});
        }

        let params = &request.params;
        if let Some(t) = params.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(m) = params.max_tokens {
            body["max_tokens"] = json!(m);
        }
        if let Some(p) = params.top_p {
            body["top_p"] = json!(p);
        }
        if let Some(f) = params.frequency_penalty {
            body["frequency_penalty"] = json!(f);
        }
        if let Some(p) = params.presence_penalty {
            body["presence_penalty"] = json!(p);
        }

        body
    }

    async fn send(
        &self,
        request: &GenerationRequest,
        stream: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.http.post(&url).json(&Self::build_body(request, stream));
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: extract_api_error(&message),
            });
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl GenerationClient for OpenAiClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        let response = self.send(request, true).await?;
        Ok(ProviderResponse::Stream(Box::pin(sse_chunk_stream(
            response,
        ))))
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn provider_id(&self) -> &'static str {
        "openai"
    }
}

/// Pull an error message out of a provider error body, falling back to the
/// raw text
fn extract_api_error(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(500).collect())
}

// ============================================================================
// SSE stream parsing
// ============================================================================

/// Extract complete `data:` payloads from an SSE buffer.
///
/// Events are delimited by `\n\n`; consumed bytes are drained in place and
/// any trailing partial event remains for the next call.
fn drain_data_lines(buffer: &mut String) -> Vec<String> {
    let mut data_lines = Vec::new();

    while let Some(pos) = buffer.find("\n\n") {
        let block: String = buffer.drain(..pos).collect();
        buffer.drain(..2);

        for line in block.lines() {
            let line = line.trim();
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim();
                if !data.is_empty() {
                    data_lines.push(data.to_string());
                }
            }
        }
    }

    data_lines
}

/// Parse one `data:` payload into a stream chunk. Returns `None` for the
/// `[DONE]` sentinel and for empty keep-alive chunks.
fn parse_sse_data(data: &str) -> Option<Result<StreamChunk, ProviderError>> {
    if data == "[DONE]" {
        return None;
    }

    #[derive(Deserialize)]
    struct ChunkBody {
        #[serde(default)]
        choices: Vec<Choice>,
        usage: Option<UsageBody>,
    }
    #[derive(Deserialize)]
    struct Choice {
        delta: Delta,
    }
    #[derive(Deserialize, Default)]
    struct Delta {
        #[serde(default)]
        content: Option<String>,
    }
    #[derive(Deserialize)]
    struct UsageBody {
        prompt_tokens: i64,
        completion_tokens: i64,
    }

    match serde_json::from_str::<ChunkBody>(data) {
        Ok(body) => {
            let delta = body
                .choices
                .first()
                .and_then(|c| c.delta.content.clone())
                .unwrap_or_default();
            let usage = body.usage.map(|u| ProviderUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            });
            if delta.is_empty() && usage.is_none() {
                None
            } else {
                Some(Ok(StreamChunk { delta, usage }))
            }
        }
        Err(e) => Some(Err(ProviderError::Parse(format!(
            "Bad SSE chunk: {}",
            e
        )))),
    }
}

/// Build a chunk stream from an SSE response
fn sse_chunk_stream(
    response: reqwest::Response,
) -> impl futures::Stream<Item = Result<StreamChunk, ProviderError>> + Send + 'static {
    async_stream::stream! {
        let mut response = response;
        let mut buffer = String::new();

        loop {
            match response.chunk().await {
                Ok(Some(bytes)) => {
                    buffer.push_str(&String::from_utf8_lossy(&bytes));
                    for data in drain_data_lines(&mut buffer) {
                        if let Some(chunk) = parse_sse_data(&data) {
                            yield chunk;
                        }
                    }
                }
                Ok(None) => {
                    // Stream ended: flush any remaining partial event
                    if !buffer.trim().is_empty() {
                        buffer.push_str("\n\n");
                        for data in drain_data_lines(&mut buffer) {
                            if let Some(chunk) = parse_sse_data(&data) {
                                yield chunk;
                            }
                        }
                    }
                    break;
                }
                Err(e) => {
                    yield Err(ProviderError::Http(e));
                    break;
                }
            }
        }
    }
}
