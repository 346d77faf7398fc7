//! AI generation provider clients
//!
//! The `GenerationClient` trait is the seam between the streaming
//! orchestrator and concrete model providers:
//!
//! - `openai` - OpenAI-compatible HTTP adapter with true token streaming
//! - `simulated` - deterministic local provider for tests and offline use
//! - `parser` - structured-output detection over assembled content

mod openai;
mod parser;
mod simulated;

pub use openai::OpenAiClient;
pub use parser::{ParsedOutput, parse_structured_output};
pub use simulated::SimulatedClient;

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampling parameters for a generation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
}

/// A provider-agnostic generation request
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub model: String,
    pub params: GenerationParams,
}

/// Token usage as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
}

/// One increment from a provider token stream.
///
/// The final chunk of a stream may carry usage totals.
#[derive(Debug, Clone, Default)]
pub struct StreamChunk {
    pub delta: String,
    pub usage: Option<ProviderUsage>,
}

/// Boxed provider token stream
pub type TokenChunkStream = BoxStream<'static, Result<StreamChunk, ProviderError>>;

/// Provider response: either a complete string or a true token stream
pub enum ProviderResponse {
    Complete {
        content: String,
        usage: Option<ProviderUsage>,
    },
    Stream(TokenChunkStream),
}

/// Provider-side failures
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Failed to parse provider response: {0}")]
    Parse(String),
}

/// A parameter validation failure with a user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub message: String,
}

impl ValidationFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Maximum prompt length accepted by the validation gate
const MAX_PROMPT_CHARS: usize = 100_000;

/// Upper bound on requested output tokens
const MAX_OUTPUT_TOKENS: i64 = 32_768;

/// Validate a generation request before any provider call.
///
/// Returns the specific failure message that is shown to the caller
/// (validation errors are user-facing, unlike internal exceptions).
pub fn validate_request(request: &GenerationRequest) -> Result<(), ValidationFailure> {
    if request.prompt.trim().is_empty() {
        return Err(ValidationFailure::new("Prompt must not be empty"));
    }
    if request.prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(ValidationFailure::new(format!(
            "Prompt exceeds maximum length of {} characters",
            MAX_PROMPT_CHARS
        )));
    }
    if request.model.trim().is_empty() {
        return Err(ValidationFailure::new("Model must be specified"));
    }
    if let Some(max_tokens) = request.params.max_tokens
        && !(1..=MAX_OUTPUT_TOKENS).contains(&max_tokens)
    {
        return Err(ValidationFailure::new(format!(
            "max_tokens must be between 1 and {}, got {}",
            MAX_OUTPUT_TOKENS, max_tokens
        )));
    }
    if let Some(temperature) = request.params.temperature
        && !(0.0..=2.0).contains(&temperature)
    {
        return Err(ValidationFailure::new(format!(
            "temperature must be between 0 and 2, got {}",
            temperature
        )));
    }
    if let Some(top_p) = request.params.top_p
        && !(0.0..=1.0).contains(&top_p)
    {
        return Err(ValidationFailure::new(format!(
            "top_p must be between 0 and 1, got {}",
            top_p
        )));
    }
    for (name, value) in [
        ("frequency_penalty", request.params.frequency_penalty),
        ("presence_penalty", request.params.presence_penalty),
    ] {
        if let Some(value) = value
            && !(-2.0..=2.0).contains(&value)
        {
            return Err(ValidationFailure::new(format!(
                "{} must be between -2 and 2, got {}",
                name, value
            )));
        }
    }
    Ok(())
}

/// Trait that every generation provider adapter implements
#[async_trait::async_trait]
pub trait GenerationClient: Send + Sync {
    /// Validate model and parameters before any provider call
    fn validate_params(&self, request: &GenerationRequest) -> Result<(), ValidationFailure> {
        validate_request(request)
    }

    /// Run a generation request
    async fn generate(&self, request: &GenerationRequest) -> Result<ProviderResponse, ProviderError>;

    /// Whether this provider emits a true token stream
    fn supports_streaming(&self) -> bool;

    /// Identifier for logs and mirror payloads
    fn provider_id(&self) -> &'static str;
}
