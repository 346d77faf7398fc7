//! Cost optimizer
//!
//! Recommendation and forecasting engine over persisted traces and daily
//! usage rollups: model-switch suggestions, usage-pattern and
//! batch/cache opportunities, linear-trend cost forecasts, and budget
//! alerts. The savings figures are heuristics, not measurements; every
//! assumption is a named constant.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::core::config::HeuristicsConfig;
use crate::core::constants::{
    BATCH_MIN_OCCURRENCES, BATCH_SAVINGS, FORECAST_HISTORY_DAYS, HEAVY_USER_SAVINGS,
    HEAVY_USER_SPEND_SHARE, IMPACT_HIGH_USD, IMPACT_MEDIUM_USD, MODEL_CONCENTRATION_SHARE,
    MODEL_SWITCH_CANDIDATES, MODEL_SWITCH_PERFORMANCE_FLOOR, MODEL_SWITCH_QUALITY_FLOOR,
    SPIKE_MULTIPLE,
};
use crate::data::SqliteError;
use crate::data::sqlite::repositories::{rollup, trace};
use crate::data::types::{PeriodType, TraceRecord};
use crate::utils::string::{PREVIEW_MAX_LENGTH, prompt_signature, truncate_preview};
use crate::utils::time::{millis_to_day, now_millis};

// ============================================================================
// Heuristic confidence per analysis type
// ============================================================================

/// Model-switch savings are computed from observed per-token costs
const CONFIDENCE_MODEL_SWITCH: f64 = 0.7;
/// Usage-pattern savings assume unspecified workflow changes
const CONFIDENCE_USAGE_PATTERN: f64 = 0.5;
/// Batch savings assume provider batch-endpoint discounts
const CONFIDENCE_BATCH: f64 = 0.6;
/// Cache savings count exact repeats, not a heuristic
const CONFIDENCE_CACHE: f64 = 0.9;

// Efficiency rating thresholds (USD per token / 0-1 quality)
const EFFICIENT_COST_PER_TOKEN: f64 = 0.00005;
const EFFICIENT_QUALITY: f64 = 0.8;
const GOOD_COST_PER_TOKEN: f64 = 0.0002;
const GOOD_QUALITY: f64 = 0.6;
const AVERAGE_COST_PER_TOKEN: f64 = 0.001;

/// Error-rate threshold (%) for an efficiency recommendation
const EFFICIENCY_ERROR_RATE_PCT: f64 = 5.0;
/// Latency threshold (ms) for an efficiency recommendation
const EFFICIENCY_LATENCY_MS: f64 = 2000.0;

// ============================================================================
// Result types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ModelSwitch,
    UsagePattern,
    BatchOpportunity,
    CacheOpportunity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffortLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Serialize)]
pub struct CostOptimizationRecommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    pub impact: ImpactLevel,
    pub potential_savings: f64,
    pub implementation_effort: EffortLevel,
    /// 0-1 heuristic constant per analysis type
    pub confidence: f64,
    pub details: serde_json::Value,
    pub action_items: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CostForecast {
    pub period: PeriodType,
    pub forecast_cost: f64,
    pub daily_average: f64,
    pub trend_multiplier: f64,
    /// Inversely related to daily-cost variance, clamped
    pub confidence: f64,
    pub historical_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyRating {
    Excellent,
    Good,
    Average,
    Poor,
}

#[derive(Debug, Serialize)]
pub struct ModelEfficiency {
    pub model_id: String,
    pub request_count: i64,
    pub cost_per_token: f64,
    pub cost_per_request: f64,
    pub avg_quality: Option<f64>,
    /// 0-100
    pub error_rate: f64,
    pub avg_latency_ms: f64,
    pub rating: EfficiencyRating,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostAlertKind {
    BudgetExceeded,
    SpendSpike,
    ModelConcentration,
}

#[derive(Debug, Serialize)]
pub struct CostAlert {
    pub kind: CostAlertKind,
    pub message: String,
    pub amount: f64,
    pub threshold: f64,
}

/// Per-model aggregate used by the switch and efficiency analyses
#[derive(Debug, Clone)]
struct ModelAggregate {
    model_id: String,
    request_count: i64,
    total_cost: f64,
    total_tokens: i64,
    cost_per_token: f64,
    avg_quality: Option<f64>,
    avg_tokens_per_second: f64,
    error_count: i64,
    avg_latency_ms: f64,
}

// ============================================================================
// Optimizer
// ============================================================================

pub struct CostOptimizer {
    pool: SqlitePool,
    heuristics: HeuristicsConfig,
}

impl CostOptimizer {
    pub fn new(pool: SqlitePool, heuristics: HeuristicsConfig) -> Self {
        Self { pool, heuristics }
    }

    /// Run the four analyses over a trace window, drop anything below
    /// `min_savings`, and sort by savings descending
    pub async fn generate_recommendations(
        &self,
        window_start: i64,
        window_end: i64,
        min_savings: f64,
    ) -> Result<Vec<CostOptimizationRecommendation>, SqliteError> {
        let traces = trace::traces_in_window(&self.pool, window_start, window_end).await?;

        let mut recommendations = Vec::new();
        recommendations.extend(analyze_model_switch(&traces));
        recommendations.extend(analyze_usage_patterns(&traces));
        recommendations.extend(analyze_batch_opportunities(&traces));
        recommendations.extend(analyze_cache_opportunities(&traces));

        recommendations.retain(|r| r.potential_savings >= min_savings);
        recommendations.sort_by(|a, b| {
            b.potential_savings
                .partial_cmp(&a.potential_savings)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(recommendations)
    }

    /// Daily-average x window x trend-multiplier forecast over the daily
    /// usage rollups
    pub async fn generate_cost_forecast(
        &self,
        period: PeriodType,
        historical_days: Option<i64>,
    ) -> Result<CostForecast, SqliteError> {
        let historical_days = historical_days.unwrap_or(FORECAST_HISTORY_DAYS).max(1);
        let now = now_millis();
        let from_day = millis_to_day(now - historical_days * 86_400_000);
        let to_day = millis_to_day(now - 86_400_000);

        let rows = rollup::daily_usage_in_range(&self.pool, &from_day, &to_day).await?;

        // Daily series with zero-filled gaps across the full range
        let mut per_day: BTreeMap<String, f64> = BTreeMap::new();
        for offset in 1..=historical_days {
            per_day.insert(millis_to_day(now - offset * 86_400_000), 0.0);
        }
        for row in &rows {
            if let Some(value) = per_day.get_mut(&row.day) {
                *value += row.total_cost;
            }
        }
        let series: Vec<f64> = per_day.values().copied().collect();

        let daily_average = if series.is_empty() {
            0.0
        } else {
            series.iter().sum::<f64>() / series.len() as f64
        };

        // Trend multiplier: most-recent 7 days over oldest 7 days
        let window = 7.min(series.len());
        let oldest_avg = avg(&series[..window]);
        let recent_avg = avg(&series[series.len() - window..]);
        let trend_multiplier = if oldest_avg > 0.0 {
            recent_avg / oldest_avg
        } else {
            1.0
        };

        let forecast_days = match period {
            PeriodType::Hour => 1.0 / 24.0,
            PeriodType::Day => 1.0,
            PeriodType::Week => 7.0,
            PeriodType::Month => 30.0,
        };

        // Confidence shrinks with the coefficient of variation
        let confidence = if daily_average > 0.0 {
            let variance = series
                .iter()
                .map(|v| (v - daily_average).powi(2))
                .sum::<f64>()
                / series.len() as f64;
            let cv = variance.sqrt() / daily_average;
            (1.0 / (1.0 + cv)).clamp(
                self.heuristics.forecast_confidence_min,
                self.heuristics.forecast_confidence_max,
            )
        } else {
            self.heuristics.forecast_confidence_min
        };

        Ok(CostForecast {
            period,
            forecast_cost: daily_average * forecast_days * trend_multiplier,
            daily_average,
            trend_multiplier,
            confidence,
            historical_days,
        })
    }

    /// Per-model efficiency ratings with actionable text
    pub async fn analyze_model_efficiency(
        &self,
        window_start: i64,
        window_end: i64,
    ) -> Result<Vec<ModelEfficiency>, SqliteError> {
        let traces = trace::traces_in_window(&self.pool, window_start, window_end).await?;
        let aggregates = aggregate_models(&traces);

        let mut results: Vec<ModelEfficiency> = aggregates
            .into_values()
            .map(|agg| {
                let error_rate = agg.error_count as f64 / agg.request_count.max(1) as f64 * 100.0;
                let rating = efficiency_rating(agg.cost_per_token, agg.avg_quality);

                let mut recommendations = Vec::new();
                if error_rate > EFFICIENCY_ERROR_RATE_PCT {
                    recommendations.push(format!(
                        "Error rate of {:.1}% is elevated; inspect recent error codes for this model",
                        error_rate
                    ));
                }
                if agg.avg_latency_ms > EFFICIENCY_LATENCY_MS {
                    recommendations.push(format!(
                        "First-token latency averages {:.0}ms; consider a smaller context or a faster model",
                        agg.avg_latency_ms
                    ));
                }
                if rating == EfficiencyRating::Poor {
                    recommendations.push(
                        "Overall efficiency is poor; route routine prompts to a cheaper model".to_string(),
                    );
                }

                ModelEfficiency {
                    model_id: agg.model_id,
                    request_count: agg.request_count,
                    cost_per_token: agg.cost_per_token,
                    cost_per_request: agg.total_cost / agg.request_count.max(1) as f64,
                    avg_quality: agg.avg_quality,
                    error_rate,
                    avg_latency_ms: agg.avg_latency_ms,
                    rating,
                    recommendations,
                }
            })
            .collect();

        results.sort_by(|a, b| b.request_count.cmp(&a.request_count));
        Ok(results)
    }

    /// Budget, spike, and concentration alerts over yesterday's spend
    pub async fn get_cost_alerts(&self) -> Result<Vec<CostAlert>, SqliteError> {
        let now = now_millis();
        let yesterday = millis_to_day(now - 86_400_000);

        let yesterday_rows =
            rollup::daily_usage_in_range(&self.pool, &yesterday, &yesterday).await?;
        let yesterday_spend: f64 = yesterday_rows.iter().map(|r| r.total_cost).sum();

        let mut alerts = Vec::new();

        if yesterday_spend > self.heuristics.daily_budget_usd {
            alerts.push(CostAlert {
                kind: CostAlertKind::BudgetExceeded,
                message: format!(
                    "Yesterday's spend of ${:.2} exceeded the daily budget of ${:.2}",
                    yesterday_spend, self.heuristics.daily_budget_usd
                ),
                amount: yesterday_spend,
                threshold: self.heuristics.daily_budget_usd,
            });
        }

        // Trailing 7-day average before yesterday
        let trailing_from = millis_to_day(now - 8 * 86_400_000);
        let trailing_to = millis_to_day(now - 2 * 86_400_000);
        let trailing_rows =
            rollup::daily_usage_in_range(&self.pool, &trailing_from, &trailing_to).await?;
        let mut per_day: HashMap<&str, f64> = HashMap::new();
        for row in &trailing_rows {
            *per_day.entry(row.day.as_str()).or_default() += row.total_cost;
        }
        if !per_day.is_empty() {
            let trailing_avg = per_day.values().sum::<f64>() / 7.0;
            if trailing_avg > 0.0 && yesterday_spend > trailing_avg * SPIKE_MULTIPLE {
                alerts.push(CostAlert {
                    kind: CostAlertKind::SpendSpike,
                    message: format!(
                        "Yesterday's spend of ${:.2} is more than {}x the trailing 7-day average of ${:.2}",
                        yesterday_spend, SPIKE_MULTIPLE, trailing_avg
                    ),
                    amount: yesterday_spend,
                    threshold: trailing_avg * SPIKE_MULTIPLE,
                });
            }
        }

        // Single-model concentration of yesterday's spend
        if yesterday_spend > 0.0 {
            let mut per_model: HashMap<&str, f64> = HashMap::new();
            for row in &yesterday_rows {
                *per_model.entry(row.model_id.as_str()).or_default() += row.total_cost;
            }
            for (model, cost) in per_model {
                let share = cost / yesterday_spend;
                if share > MODEL_CONCENTRATION_SHARE {
                    alerts.push(CostAlert {
                        kind: CostAlertKind::ModelConcentration,
                        message: format!(
                            "{} accounted for {:.0}% of yesterday's spend",
                            model,
                            share * 100.0
                        ),
                        amount: cost,
                        threshold: yesterday_spend * MODEL_CONCENTRATION_SHARE,
                    });
                }
            }
        }

        Ok(alerts)
    }
}

// ============================================================================
// Analyses (pure over a trace window)
// ============================================================================

fn aggregate_models(traces: &[TraceRecord]) -> BTreeMap<String, ModelAggregate> {
    let mut aggregates: BTreeMap<String, ModelAggregate> = BTreeMap::new();
    let mut quality_sums: HashMap<String, (f64, i64)> = HashMap::new();
    let mut speed_sums: HashMap<String, (f64, i64)> = HashMap::new();
    let mut latency_sums: HashMap<String, (f64, i64)> = HashMap::new();

    for t in traces {
        let entry = aggregates
            .entry(t.model_id.clone())
            .or_insert_with(|| ModelAggregate {
                model_id: t.model_id.clone(),
                request_count: 0,
                total_cost: 0.0,
                total_tokens: 0,
                cost_per_token: 0.0,
                avg_quality: None,
                avg_tokens_per_second: 0.0,
                error_count: 0,
                avg_latency_ms: 0.0,
            });
        entry.request_count += 1;
        if let Some(cost) = t.cost {
            entry.total_cost += cost.total_cost;
        }
        if let Some(usage) = t.tokens_used {
            entry.total_tokens += usage.total;
        }
        if t.status == crate::data::types::TraceStatus::Error {
            entry.error_count += 1;
        }
        if let Some(q) = t.quality_score {
            let s = quality_sums.entry(t.model_id.clone()).or_insert((0.0, 0));
            s.0 += q;
            s.1 += 1;
        }
        if let Some(tps) = t.tokens_per_second {
            let s = speed_sums.entry(t.model_id.clone()).or_insert((0.0, 0));
            s.0 += tps;
            s.1 += 1;
        }
        if let Some(lat) = t.first_token_latency_ms {
            let s = latency_sums.entry(t.model_id.clone()).or_insert((0.0, 0));
            s.0 += lat as f64;
            s.1 += 1;
        }
    }

    for (model, agg) in aggregates.iter_mut() {
        if agg.total_tokens > 0 {
            agg.cost_per_token = agg.total_cost / agg.total_tokens as f64;
        }
        if let Some((sum, count)) = quality_sums.get(model) {
            agg.avg_quality = Some(sum / *count as f64);
        }
        if let Some((sum, count)) = speed_sums.get(model) {
            agg.avg_tokens_per_second = sum / *count as f64;
        }
        if let Some((sum, count)) = latency_sums.get(model) {
            agg.avg_latency_ms = sum / *count as f64;
        }
    }

    aggregates
}

/// For each of the most expensive models (by cost per token), look for a
/// cheap model holding >= 90% of its quality and >= 80% of its throughput
fn analyze_model_switch(traces: &[TraceRecord]) -> Vec<CostOptimizationRecommendation> {
    let aggregates = aggregate_models(traces);
    let mut priced: Vec<&ModelAggregate> = aggregates
        .values()
        .filter(|a| a.total_tokens > 0 && a.cost_per_token > 0.0)
        .collect();
    if priced.len() < 2 {
        return Vec::new();
    }
    priced.sort_by(|a, b| {
        b.cost_per_token
            .partial_cmp(&a.cost_per_token)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let expensive = &priced[..MODEL_SWITCH_CANDIDATES.min(priced.len())];
    let cheap_start = priced.len().saturating_sub(MODEL_SWITCH_CANDIDATES);
    let cheap = &priced[cheap_start..];

    let mut recommendations = Vec::new();
    for exp in expensive {
        let candidate = cheap.iter().find(|c| {
            if c.model_id == exp.model_id || c.cost_per_token >= exp.cost_per_token {
                return false;
            }
            let quality_ok = match (c.avg_quality, exp.avg_quality) {
                (Some(cq), Some(eq)) => cq >= eq * MODEL_SWITCH_QUALITY_FLOOR,
                // Without quality data on both sides parity cannot be verified
                _ => false,
            };
            let performance_ok = exp.avg_tokens_per_second <= 0.0
                || c.avg_tokens_per_second
                    >= exp.avg_tokens_per_second * MODEL_SWITCH_PERFORMANCE_FLOOR;
            quality_ok && performance_ok
        });

        if let Some(alt) = candidate {
            let savings = (exp.cost_per_token - alt.cost_per_token) * exp.total_tokens as f64;
            recommendations.push(CostOptimizationRecommendation {
                kind: RecommendationKind::ModelSwitch,
                title: format!("Switch {} traffic to {}", exp.model_id, alt.model_id),
                description: format!(
                    "{} holds at least {:.0}% of {}'s quality and {:.0}% of its throughput at a lower per-token cost",
                    alt.model_id,
                    MODEL_SWITCH_QUALITY_FLOOR * 100.0,
                    exp.model_id,
                    MODEL_SWITCH_PERFORMANCE_FLOOR * 100.0,
                ),
                impact: impact_for(savings),
                potential_savings: savings,
                implementation_effort: EffortLevel::Medium,
                confidence: CONFIDENCE_MODEL_SWITCH,
                details: json!({
                    "expensive_model": exp.model_id,
                    "alternative_model": alt.model_id,
                    "expensive_cost_per_token": exp.cost_per_token,
                    "alternative_cost_per_token": alt.cost_per_token,
                    "expensive_total_tokens": exp.total_tokens,
                }),
                action_items: vec![
                    format!("A/B test {} on a sample of {} traffic", alt.model_id, exp.model_id),
                    "Compare quality scores before a full switch".to_string(),
                ],
            });
        }
    }

    recommendations
}

/// Flag users responsible for more than 10% of total spend; assumes a
/// flat savings fraction from workflow optimization (heuristic, not
/// measured)
fn analyze_usage_patterns(traces: &[TraceRecord]) -> Vec<CostOptimizationRecommendation> {
    let mut user_costs: BTreeMap<&str, f64> = BTreeMap::new();
    let mut total = 0.0;
    for t in traces {
        if let Some(cost) = t.cost {
            *user_costs.entry(t.user_id.as_str()).or_default() += cost.total_cost;
            total += cost.total_cost;
        }
    }
    if total <= 0.0 {
        return Vec::new();
    }

    user_costs
        .into_iter()
        .filter(|(_, cost)| cost / total > HEAVY_USER_SPEND_SHARE)
        .map(|(user_id, cost)| {
            let savings = cost * HEAVY_USER_SAVINGS;
            CostOptimizationRecommendation {
                kind: RecommendationKind::UsagePattern,
                title: format!("Review usage patterns of {}", user_id),
                description: format!(
                    "{} is responsible for {:.0}% of total spend; workflow review assumes {:.0}% savings potential",
                    user_id,
                    cost / total * 100.0,
                    HEAVY_USER_SAVINGS * 100.0,
                ),
                impact: impact_for(savings),
                potential_savings: savings,
                implementation_effort: EffortLevel::Medium,
                confidence: CONFIDENCE_USAGE_PATTERN,
                details: json!({"user_id": user_id, "user_cost": cost, "spend_share": cost / total}),
                action_items: vec![
                    "Audit the user's highest-cost prompt templates".to_string(),
                    "Check for redundant retries or polling loops".to_string(),
                ],
            }
        })
        .collect()
}

/// Bucket traces by prompt-pattern signature; buckets of 10+ suggest a
/// batch pipeline
fn analyze_batch_opportunities(traces: &[TraceRecord]) -> Vec<CostOptimizationRecommendation> {
    let mut buckets: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    for t in traces {
        let signature = prompt_signature(&t.prompt_content);
        if signature.is_empty() {
            continue;
        }
        let entry = buckets.entry(signature).or_insert((0, 0.0));
        entry.0 += 1;
        if let Some(cost) = t.cost {
            entry.1 += cost.total_cost;
        }
    }

    buckets
        .into_iter()
        .filter(|(_, (count, _))| *count >= BATCH_MIN_OCCURRENCES)
        .map(|(signature, (count, cost))| {
            let savings = cost * BATCH_SAVINGS;
            CostOptimizationRecommendation {
                kind: RecommendationKind::BatchOpportunity,
                title: format!("Batch {} similar requests", count),
                description: format!(
                    "{} requests share the prompt pattern \"{}\"; batching assumes {:.0}% savings",
                    count,
                    signature,
                    BATCH_SAVINGS * 100.0,
                ),
                impact: impact_for(savings),
                potential_savings: savings,
                implementation_effort: EffortLevel::High,
                confidence: CONFIDENCE_BATCH,
                details: json!({"signature": signature, "occurrences": count, "bucket_cost": cost}),
                action_items: vec![
                    "Collect these requests into a scheduled batch job".to_string(),
                    "Use the provider's batch endpoint where available".to_string(),
                ],
            }
        })
        .collect()
}

/// Exact-match cache estimate: every repeat of a (model, prompt) pair
/// beyond its first occurrence is cacheable cost
fn analyze_cache_opportunities(traces: &[TraceRecord]) -> Vec<CostOptimizationRecommendation> {
    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
    let mut cacheable_cost = 0.0;
    let mut repeat_count = 0usize;
    let mut example_prompt = None;

    for t in traces {
        let key = (t.model_id.as_str(), t.prompt_content.as_str());
        let occurrences = seen.entry(key).or_insert(0);
        *occurrences += 1;
        if *occurrences > 1 {
            repeat_count += 1;
            if let Some(cost) = t.cost {
                cacheable_cost += cost.total_cost;
            }
            if example_prompt.is_none() {
                example_prompt = Some(truncate_preview(&t.prompt_content, PREVIEW_MAX_LENGTH));
            }
        }
    }

    if repeat_count == 0 || cacheable_cost <= 0.0 {
        return Vec::new();
    }

    vec![CostOptimizationRecommendation {
        kind: RecommendationKind::CacheOpportunity,
        title: format!("Cache {} repeated prompts", repeat_count),
        description: format!(
            "{} requests exactly repeated an earlier (model, prompt) pair; a response cache would have saved ${:.2}",
            repeat_count, cacheable_cost
        ),
        impact: impact_for(cacheable_cost),
        potential_savings: cacheable_cost,
        implementation_effort: EffortLevel::Low,
        confidence: CONFIDENCE_CACHE,
        details: json!({
            "repeat_count": repeat_count,
            "cacheable_cost": cacheable_cost,
            "example_prompt": example_prompt,
        }),
        action_items: vec![
            "Add a response cache keyed on (model, prompt, parameters)".to_string(),
            "Set a TTL matching how often the underlying data changes".to_string(),
        ],
    }]
}

fn impact_for(savings: f64) -> ImpactLevel {
    if savings >= IMPACT_HIGH_USD {
        ImpactLevel::High
    } else if savings >= IMPACT_MEDIUM_USD {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    }
}

fn efficiency_rating(cost_per_token: f64, avg_quality: Option<f64>) -> EfficiencyRating {
    let quality = avg_quality.unwrap_or(0.0);
    if cost_per_token <= EFFICIENT_COST_PER_TOKEN && quality >= EFFICIENT_QUALITY {
        EfficiencyRating::Excellent
    } else if cost_per_token <= GOOD_COST_PER_TOKEN && quality >= GOOD_QUALITY {
        EfficiencyRating::Good
    } else if cost_per_token <= AVERAGE_COST_PER_TOKEN {
        EfficiencyRating::Average
    } else {
        EfficiencyRating::Poor
    }
}

fn avg(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
