//! Third-party observability mirror
//!
//! Fire-and-forget sync of finished interactions to an external
//! observability platform. Strictly best-effort: every failure is caught
//! and logged, nothing propagates to the primary response path.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::core::config::MirrorConfig;
use crate::core::constants::MIRROR_TIMEOUT_SECS;
use crate::data::types::{CostBreakdown, TokenUsage, TraceStatus};
use crate::utils::retry::{DEFAULT_BASE_DELAY_MS, retry_with_backoff_async};

/// Payload describing one finished interaction
#[derive(Debug, Clone, Serialize)]
pub struct MirrorInteraction {
    pub trace_id: String,
    pub session_id: String,
    pub user_id: String,
    pub model_id: String,
    pub provider: String,
    pub status: TraceStatus,
    pub usage: Option<TokenUsage>,
    pub cost: Option<CostBreakdown>,
    pub duration_ms: i64,
}

pub struct ObservabilityMirror {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl ObservabilityMirror {
    /// Build the mirror client when enabled and configured; `None` disables
    /// mirroring entirely.
    pub fn from_config(config: &MirrorConfig) -> Option<Arc<Self>> {
        if !config.enabled {
            return None;
        }
        let url = config.url.clone()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(MIRROR_TIMEOUT_SECS))
            .build()
            .ok()?;

        Some(Arc::new(Self {
            http,
            url,
            api_key: config.api_key.clone(),
        }))
    }

    /// Record an interaction in the background. Returns immediately.
    pub fn record(self: &Arc<Self>, interaction: MirrorInteraction) {
        let mirror = Arc::clone(self);
        tokio::spawn(async move {
            let result = retry_with_backoff_async(2, DEFAULT_BASE_DELAY_MS, || {
                let mirror = Arc::clone(&mirror);
                let interaction = interaction.clone();
                async move { mirror.send(&interaction).await }
            })
            .await;

            if let Err((e, attempts)) = result {
                tracing::warn!(
                    trace_id = %interaction.trace_id,
                    attempts,
                    error = %e,
                    "Observability mirror sync failed"
                );
            }
        });
    }

    async fn send(&self, interaction: &MirrorInteraction) -> Result<(), reqwest::Error> {
        let mut builder = self.http.post(&self.url).json(interaction);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder.send().await?.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_yields_none() {
        let config = MirrorConfig {
            enabled: false,
            url: Some("http://localhost:1/ingest".to_string()),
            api_key: None,
        };
        assert!(ObservabilityMirror::from_config(&config).is_none());
    }

    #[test]
    fn test_enabled_without_url_yields_none() {
        let config = MirrorConfig {
            enabled: true,
            url: None,
            api_key: None,
        };
        assert!(ObservabilityMirror::from_config(&config).is_none());
    }

    #[tokio::test]
    async fn test_record_failure_is_swallowed() {
        // Unroutable target: the spawned task must swallow the failure
        let config = MirrorConfig {
            enabled: true,
            url: Some("http://127.0.0.1:1/ingest".to_string()),
            api_key: None,
        };
        let mirror = ObservabilityMirror::from_config(&config).unwrap();
        mirror.record(MirrorInteraction {
            trace_id: "t1".to_string(),
            session_id: "s1".to_string(),
            user_id: "u1".to_string(),
            model_id: "test-model".to_string(),
            provider: "simulated".to_string(),
            status: TraceStatus::Success,
            usage: None,
            cost: None,
            duration_ms: 100,
        });
        // Give the background task a moment; the test passes if nothing panics
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
