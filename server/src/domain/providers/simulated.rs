//! Deterministic local provider
//!
//! Returns a complete string without streaming, which exercises the
//! orchestrator's simulated token-splitting fallback end-to-end. Used by
//! tests, demos, and offline runs; reports no usage so the estimation
//! path is exercised as well.

use super::{GenerationClient, GenerationRequest, ProviderError, ProviderResponse};

/// Words emitted when the request does not bound output length
const DEFAULT_RESPONSE_WORDS: usize = 24;

pub struct SimulatedClient;

impl SimulatedClient {
    pub fn new() -> Self {
        Self
    }

    fn render_response(request: &GenerationRequest) -> String {
        let word_budget = request
            .params
            .max_tokens
            .map(|m| (m as usize).min(DEFAULT_RESPONSE_WORDS))
            .unwrap_or(DEFAULT_RESPONSE_WORDS)
            .max(1);

        let preview: String = request.prompt.chars().take(48).collect();
        let base = format!(
            "Simulated {} response to \"{}\": the quick brown fox jumps over the lazy dog \
             while tokens stream one by one to the caller",
            request.model, preview
        );

        base.split_whitespace()
            .take(word_budget)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for SimulatedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl GenerationClient for SimulatedClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse::Complete {
            content: Self::render_response(request),
            usage: None,
        })
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    fn provider_id(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::providers::GenerationParams;

    fn request(max_tokens: Option<i64>) -> GenerationRequest {
        GenerationRequest {
            prompt: "Say hello".to_string(),
            system_prompt: None,
            model: "test-model".to_string(),
            params: GenerationParams {
                max_tokens,
                ..GenerationParams::default()
            },
        }
    }

    #[tokio::test]
    async fn test_returns_complete_response_without_usage() {
        let client = SimulatedClient::new();
        match client.generate(&request(None)).await.unwrap() {
            ProviderResponse::Complete { content, usage } => {
                assert!(!content.is_empty());
                assert!(usage.is_none());
            }
            ProviderResponse::Stream(_) => panic!("simulated provider must not stream"),
        }
    }

    #[tokio::test]
    async fn test_is_deterministic() {
        let client = SimulatedClient::new();
        let a = SimulatedClient::render_response(&request(Some(20)));
        let b = SimulatedClient::render_response(&request(Some(20)));
        assert_eq!(a, b);
        let _ = client;
    }

    #[test]
    fn test_respects_word_budget() {
        let content = SimulatedClient::render_response(&request(Some(5)));
        assert_eq!(content.split_whitespace().count(), 5);
    }

    #[test]
    fn test_does_not_stream() {
        assert!(!SimulatedClient::new().supports_streaming());
    }
}
