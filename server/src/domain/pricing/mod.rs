//! Pricing service for LLM cost calculations
//!
//! Computes per-interaction cost from token usage using a per-model price
//! table. Features:
//! - Multi-strategy model lookup (exact -> provider-prefix stripped -> family)
//! - Embedded pricing data with an optional file override in the data dir
//! - Thread-safe with read-heavy optimized locking

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

use crate::core::storage::AppStorage;
use crate::data::types::{CostBreakdown, TokenUsage};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Embedded pricing data (compile-time)
const EMBEDDED_PRICING_JSON: &str = include_str!("../../../data/model_prices.json");

/// Pricing override file name in the data directory
const PRICING_FILE_NAME: &str = "model_prices.json";

// ============================================================================
// ERROR TYPE
// ============================================================================

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Failed to parse pricing data: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// PRICING DATA STRUCTURES
// ============================================================================

/// Parsed model pricing entry
#[derive(Debug, Clone, Default)]
pub struct ModelPricing {
    /// Cost per input token (USD)
    pub input_cost_per_token: f64,
    /// Cost per output token (USD)
    pub output_cost_per_token: f64,
    /// Provider name
    pub provider: String,
}

/// Match type for cost confidence scoring.
///
/// Indicates how the model id was matched against the price table;
/// looser matches produce less accurate costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Exact key match
    Exact,
    /// Matched after stripping a "provider/" prefix
    PrefixStripped,
    /// Matched the base model family (version/date suffix stripped)
    Family,
    /// No match found; cost is zero
    #[default]
    NotFound,
}

/// Parsed and indexed pricing data
#[derive(Debug, Default)]
pub struct PricingData {
    /// Exact model key -> pricing. Keys are lowercase for
    /// case-insensitive matching.
    models: HashMap<String, ModelPricing>,
}

impl PricingData {
    /// Parse pricing data from JSON string
    pub fn from_json_str(json: &str) -> Result<Self, PricingError> {
        let raw: serde_json::Value =
            serde_json::from_str(json).map_err(|e| PricingError::ParseError(e.to_string()))?;

        let obj = raw
            .as_object()
            .ok_or_else(|| PricingError::ParseError("Expected JSON object".into()))?;

        let mut models = HashMap::new();

        for (key, value) in obj {
            let Some(entry) = value.as_object() else {
                continue;
            };

            let input_cost = entry
                .get("input_cost_per_token")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            let output_cost = entry
                .get("output_cost_per_token")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);

            // Skip entries with no pricing at all
            if input_cost == 0.0 && output_cost == 0.0 {
                continue;
            }

            // Negative values indicate corrupt data
            if input_cost < 0.0 || output_cost < 0.0 {
                tracing::warn!(model = key, "Skipping model with negative pricing");
                continue;
            }

            models.insert(
                key.to_lowercase(),
                ModelPricing {
                    input_cost_per_token: input_cost,
                    output_cost_per_token: output_cost,
                    provider: entry
                        .get("provider")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                },
            );
        }

        Ok(Self { models })
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Look up pricing for a model id.
    ///
    /// Strategy order: exact (lowercased) -> "provider/" prefix stripped ->
    /// family (trailing date or "-latest" suffix stripped).
    pub fn lookup(&self, model_id: &str) -> (Option<&ModelPricing>, MatchType) {
        let key = model_id.to_lowercase();

        if let Some(pricing) = self.models.get(&key) {
            return (Some(pricing), MatchType::Exact);
        }

        // "openai/gpt-4o" -> "gpt-4o"
        if let Some((_, stripped)) = key.split_once('/')
            && let Some(pricing) = self.models.get(stripped)
        {
            return (Some(pricing), MatchType::PrefixStripped);
        }

        // "gpt-4o-2024-08-06" -> "gpt-4o", "mistral-large-latest" -> "mistral-large"
        if let Some(family) = strip_version_suffix(&key) {
            if let Some(pricing) = self.models.get(&family) {
                return (Some(pricing), MatchType::Family);
            }
        }

        (None, MatchType::NotFound)
    }
}

/// Strip a trailing date (`-YYYYMMDD` / `-YYYY-MM-DD`) or `-latest` suffix
fn strip_version_suffix(key: &str) -> Option<String> {
    if let Some(base) = key.strip_suffix("-latest") {
        return Some(base.to_string());
    }

    let parts: Vec<&str> = key.rsplitn(2, '-').collect();
    if parts.len() == 2 {
        let suffix = parts[0];
        let is_date = suffix.len() >= 8 && suffix.chars().all(|c| c.is_ascii_digit());
        if is_date {
            return Some(parts[1].to_string());
        }
    }

    // "-YYYY-MM-DD" style suffix
    if key.len() > 11 && key.is_char_boundary(key.len() - 11) {
        let (base, suffix) = key.split_at(key.len() - 11);
        if suffix.starts_with('-')
            && suffix[1..]
                .chars()
                .all(|c| c.is_ascii_digit() || c == '-')
        {
            return Some(base.to_string());
        }
    }

    None
}

// ============================================================================
// PRICING SERVICE
// ============================================================================

/// Shared pricing service
pub struct PricingService {
    data: RwLock<Arc<PricingData>>,
}

impl PricingService {
    /// Initialize from the embedded table, preferring a file override in
    /// the data directory when present
    pub fn init(storage: &AppStorage) -> Result<Arc<Self>, PricingError> {
        let override_path = storage.data_dir().join(PRICING_FILE_NAME);

        let data = if override_path.exists() {
            let raw = std::fs::read_to_string(&override_path)?;
            match PricingData::from_json_str(&raw) {
                Ok(data) => {
                    tracing::debug!(
                        path = %override_path.display(),
                        models = data.model_count(),
                        "Loaded pricing override"
                    );
                    data
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Pricing override unreadable, using embedded data");
                    PricingData::from_json_str(EMBEDDED_PRICING_JSON)?
                }
            }
        } else {
            PricingData::from_json_str(EMBEDDED_PRICING_JSON)?
        };

        tracing::debug!(models = data.model_count(), "PricingService initialized");

        Ok(Arc::new(Self {
            data: RwLock::new(Arc::new(data)),
        }))
    }

    /// Build a service directly from pricing data (tests)
    pub fn from_data(data: PricingData) -> Arc<Self> {
        Arc::new(Self {
            data: RwLock::new(Arc::new(data)),
        })
    }

    /// Replace the pricing table atomically
    pub fn replace(&self, data: PricingData) {
        *self.data.write() = Arc::new(data);
    }

    /// Compute the cost breakdown for one interaction.
    ///
    /// Unknown models cost zero; the miss is logged, never an error, since
    /// cost is supplementary to the trace itself.
    pub fn cost(&self, model_id: &str, usage: TokenUsage) -> (CostBreakdown, MatchType) {
        let data = self.data.read().clone();
        let (pricing, match_type) = data.lookup(model_id);

        let Some(pricing) = pricing else {
            tracing::debug!(model = model_id, "No pricing entry, cost recorded as zero");
            return (CostBreakdown::default(), MatchType::NotFound);
        };

        let input_cost = usage.input as f64 * pricing.input_cost_per_token;
        let output_cost = usage.output as f64 * pricing.output_cost_per_token;

        (
            CostBreakdown {
                input_cost,
                output_cost,
                total_cost: input_cost + output_cost,
            },
            match_type,
        )
    }

    pub fn model_count(&self) -> usize {
        self.data.read().model_count()
    }
}
