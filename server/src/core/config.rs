//! Application configuration
//!
//! Layered configuration: CLI arguments (which also read env vars via clap)
//! override environment variables, which override built-in defaults. All
//! business heuristics (budgets, trend bands, savings assumptions) live in
//! `HeuristicsConfig` so they can be tuned without touching algorithm code.

use std::fmt;

use anyhow::Result;

use super::cli::CliConfig;
use super::constants::{
    DEFAULT_AGGREGATION_INTERVAL_MINUTES, DEFAULT_DAILY_BUDGET_USD, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_PROVIDER_BASE_URL, ENV_AGGREGATION_INTERVAL_MINUTES, ENV_DAILY_BUDGET_USD, ENV_HOST,
    ENV_MIRROR_API_KEY, ENV_MIRROR_ENABLED, ENV_MIRROR_URL, ENV_PORT, ENV_PROVIDER_API_KEY,
    ENV_PROVIDER_BACKEND, ENV_PROVIDER_BASE_URL, FORECAST_CONFIDENCE_MAX, FORECAST_CONFIDENCE_MIN,
    TREND_BAND,
};

// =============================================================================
// Provider Backend Enum
// =============================================================================

/// AI generation provider backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderBackend {
    /// OpenAI-compatible HTTP API
    OpenAi,
    /// Deterministic local provider (tests, demos, offline use)
    #[default]
    Simulated,
}

impl fmt::Display for ProviderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderBackend::OpenAi => write!(f, "openai"),
            ProviderBackend::Simulated => write!(f, "simulated"),
        }
    }
}

// =============================================================================
// Config Sections
// =============================================================================

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Provider client configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub backend: ProviderBackend,
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Third-party observability mirror configuration
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub api_key: Option<String>,
}

/// Background aggregation configuration
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Interval between scheduled aggregation passes (0 = disabled)
    pub interval_minutes: u64,
}

/// Business heuristics used by analytics and the cost optimizer.
///
/// These are assumptions, not derived values; they are kept here so
/// deployments can adjust them without code changes.
#[derive(Debug, Clone)]
pub struct HeuristicsConfig {
    /// Daily spend budget in USD
    pub daily_budget_usd: f64,
    /// Half-over-half change fraction that flips a trend label
    pub trend_band: f64,
    /// Forecast confidence clamp bounds
    pub forecast_confidence_min: f64,
    pub forecast_confidence_max: f64,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            daily_budget_usd: DEFAULT_DAILY_BUDGET_USD,
            trend_band: TREND_BAND,
            forecast_confidence_min: FORECAST_CONFIDENCE_MIN,
            forecast_confidence_max: FORECAST_CONFIDENCE_MAX,
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub mirror: MirrorConfig,
    pub aggregation: AggregationConfig,
    pub heuristics: HeuristicsConfig,
}

impl AppConfig {
    /// Load configuration from CLI args, environment, and defaults
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let host = cli
            .host
            .clone()
            .or_else(|| env_string(ENV_HOST))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = cli
            .port
            .or_else(|| env_parsed(ENV_PORT))
            .unwrap_or(DEFAULT_PORT);

        let provider_backend = cli
            .provider
            .or_else(|| match env_string(ENV_PROVIDER_BACKEND).as_deref() {
                Some("openai") => Some(ProviderBackend::OpenAi),
                Some("simulated") => Some(ProviderBackend::Simulated),
                Some(other) => {
                    tracing::warn!(backend = other, "Unknown provider backend, using default");
                    None
                }
                None => None,
            })
            .unwrap_or_default();

        let provider = ProviderConfig {
            backend: provider_backend,
            base_url: cli
                .provider_base_url
                .clone()
                .or_else(|| env_string(ENV_PROVIDER_BASE_URL))
                .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string()),
            api_key: cli
                .provider_api_key
                .clone()
                .or_else(|| env_string(ENV_PROVIDER_API_KEY)),
        };

        let mirror = MirrorConfig {
            enabled: cli
                .mirror
                .or_else(|| env_parsed(ENV_MIRROR_ENABLED))
                .unwrap_or(false),
            url: cli.mirror_url.clone().or_else(|| env_string(ENV_MIRROR_URL)),
            api_key: cli
                .mirror_api_key
                .clone()
                .or_else(|| env_string(ENV_MIRROR_API_KEY)),
        };

        if mirror.enabled && mirror.url.is_none() {
            anyhow::bail!("Observability mirror enabled but {} is not set", ENV_MIRROR_URL);
        }

        let aggregation = AggregationConfig {
            interval_minutes: cli
                .aggregation_interval_minutes
                .or_else(|| env_parsed(ENV_AGGREGATION_INTERVAL_MINUTES))
                .unwrap_or(DEFAULT_AGGREGATION_INTERVAL_MINUTES),
        };

        let heuristics = HeuristicsConfig {
            daily_budget_usd: cli
                .daily_budget_usd
                .or_else(|| env_parsed(ENV_DAILY_BUDGET_USD))
                .unwrap_or(DEFAULT_DAILY_BUDGET_USD),
            ..HeuristicsConfig::default()
        };

        Ok(Self {
            server: ServerConfig { host, port },
            provider,
            mirror,
            aggregation,
            heuristics,
        })
    }
}

/// Read a non-empty env var as a string
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read and parse an env var, warning on parse failure
fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = raw, "Failed to parse env var, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_cli_or_env() {
        let config = AppConfig::load(&CliConfig::default()).unwrap();
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert!(!config.mirror.enabled);
        assert_eq!(
            config.aggregation.interval_minutes,
            DEFAULT_AGGREGATION_INTERVAL_MINUTES
        );
        assert_eq!(config.heuristics.daily_budget_usd, DEFAULT_DAILY_BUDGET_USD);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = CliConfig {
            host: Some("0.0.0.0".to_string()),
            port: Some(9000),
            daily_budget_usd: Some(250.0),
            ..CliConfig::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.heuristics.daily_budget_usd, 250.0);
    }

    #[test]
    fn test_mirror_enabled_requires_url() {
        let cli = CliConfig {
            mirror: Some(true),
            ..CliConfig::default()
        };
        assert!(AppConfig::load(&cli).is_err());

        let cli = CliConfig {
            mirror: Some(true),
            mirror_url: Some("http://localhost:3000/api/ingest".to_string()),
            ..CliConfig::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert!(config.mirror.enabled);
    }

    #[test]
    fn test_provider_backend_display() {
        assert_eq!(ProviderBackend::OpenAi.to_string(), "openai");
        assert_eq!(ProviderBackend::Simulated.to_string(), "simulated");
    }
}
