//! Token source strategies
//!
//! A `TokenSource` yields discrete tokens regardless of provider
//! capability:
//!
//! - `ProviderTokenSource` consumes a true provider token stream
//! - `SimulatedTokenSource` splits a complete string on whitespace and
//!   paces emission with a fixed delay, giving callers a uniform
//!   streaming UX when the provider only returns a full response
//!
//! Selection happens in the orchestrator based on what the provider
//! actually returned, not on configuration.

use std::time::Duration;

use futures::StreamExt;

use crate::core::constants::SIMULATED_TOKEN_DELAY_MS;
use crate::domain::providers::{ProviderError, ProviderUsage, StreamChunk, TokenChunkStream};

#[async_trait::async_trait]
pub trait TokenSource: Send {
    /// Next token chunk, or `None` when the source is exhausted
    async fn next_token(&mut self) -> Option<Result<StreamChunk, ProviderError>>;

    /// Full content when the source knows it up front (simulated path);
    /// the orchestrator then prefers it over re-joining emitted tokens
    fn full_content(&self) -> Option<&str> {
        None
    }
}

/// True provider token stream
pub struct ProviderTokenSource {
    inner: TokenChunkStream,
}

impl ProviderTokenSource {
    pub fn new(inner: TokenChunkStream) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl TokenSource for ProviderTokenSource {
    async fn next_token(&mut self) -> Option<Result<StreamChunk, ProviderError>> {
        self.inner.next().await
    }
}

/// Whitespace-split emission over a complete response string
pub struct SimulatedTokenSource {
    content: String,
    tokens: Vec<String>,
    next_index: usize,
    delay: Duration,
    usage: Option<ProviderUsage>,
}

impl SimulatedTokenSource {
    pub fn new(content: String, usage: Option<ProviderUsage>) -> Self {
        Self::with_delay(content, usage, Duration::from_millis(SIMULATED_TOKEN_DELAY_MS))
    }

    pub fn with_delay(content: String, usage: Option<ProviderUsage>, delay: Duration) -> Self {
        let tokens: Vec<String> = content.split_whitespace().map(str::to_string).collect();
        Self {
            content,
            tokens,
            next_index: 0,
            delay,
            usage,
        }
    }
}

#[async_trait::async_trait]
impl TokenSource for SimulatedTokenSource {
    async fn next_token(&mut self) -> Option<Result<StreamChunk, ProviderError>> {
        if self.next_index >= self.tokens.len() {
            return None;
        }

        // Fixed pacing delay: this is a UX simulation, not real streaming
        tokio::time::sleep(self.delay).await;

        let is_last = self.next_index + 1 == self.tokens.len();
        let mut delta = self.tokens[self.next_index].clone();
        if !is_last {
            delta.push(' ');
        }
        self.next_index += 1;

        Some(Ok(StreamChunk {
            delta,
            usage: if is_last { self.usage } else { None },
        }))
    }

    fn full_content(&self) -> Option<&str> {
        Some(&self.content)
    }
}
