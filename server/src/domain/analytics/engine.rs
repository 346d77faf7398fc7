//! Trace analytics engine
//!
//! Read-side analysis over persisted traces: performance grading, model
//! comparison, usage reports, daily insights, and the dashboard
//! composition. Everything here is a read-only consumer of what the
//! persistence service and aggregation passes produce.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use sqlx::SqlitePool;

use super::trend::classify_trend;
use crate::core::constants::{
    ALERT_AVG_LATENCY_MS, ALERT_ERROR_RATE_PCT, GRADE_A, GRADE_B, GRADE_C, GRADE_D,
    INSIGHTS_TOP_PROMPTS, RECOMMEND_DURATION_MS, RECOMMEND_ERROR_RATE_PCT, RECOMMEND_LATENCY_MS,
    RECOMMEND_STREAMING_PCT,
};
use crate::data::SqliteError;
use crate::data::sqlite::repositories::trace;
use crate::data::types::{
    LiveTraceSnapshot, TraceFilters, TraceMetrics, TraceRecord, TraceStatus, TrendDirection,
};
use crate::utils::time::{millis_to_day, now_millis};

// ============================================================================
// Model recommendation thresholds
// ============================================================================

/// Minimum success rate (%) and maximum duration for an `excellent` model
const MODEL_EXCELLENT: (f64, f64) = (98.0, 2000.0);
/// Cost-efficiency ceiling (USD per token) for an `excellent` model
const MODEL_EXCELLENT_COST_PER_TOKEN: f64 = 0.00005;
/// Bounds for a `good` model
const MODEL_GOOD: (f64, f64) = (95.0, 5000.0);
/// Bounds for a `fair` model
const MODEL_FAIR: (f64, f64) = (90.0, 10_000.0);

// ============================================================================
// Result types
// ============================================================================

/// Letter grade over {error rate, avg duration, avg latency}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceGrade {
    A,
    B,
    C,
    D,
    F,
}

#[derive(Debug, Serialize)]
pub struct PerformanceReport {
    pub metrics: TraceMetrics,
    pub grade: PerformanceGrade,
    pub recommendations: Vec<String>,
}

/// Qualitative per-model rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Serialize)]
pub struct ModelPerformance {
    pub model_id: String,
    pub request_count: i64,
    /// 0-100
    pub success_rate: f64,
    pub avg_duration_ms: f64,
    pub avg_cost: f64,
    pub avg_tokens_per_second: f64,
    pub avg_quality: Option<f64>,
    /// Total cost / total tokens (USD per token)
    pub cost_efficiency: f64,
    pub recommendation: ModelRating,
}

#[derive(Debug, Serialize)]
pub struct ModelShare {
    pub model_id: String,
    pub requests: i64,
    /// 0-100
    pub share_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct DailyPoint {
    pub day: String,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorShare {
    pub error_code: String,
    pub count: i64,
    /// 0-100, share of errored traces
    pub share_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct UsageReport {
    pub total_requests: i64,
    pub unique_users: i64,
    pub total_cost: f64,
    pub total_tokens: i64,
    pub model_usage: Vec<ModelShare>,
    pub daily_cost: Vec<DailyPoint>,
    pub cost_trend: TrendDirection,
    pub error_breakdown: Vec<ErrorShare>,
}

#[derive(Debug, Serialize)]
pub struct LatencyPoint {
    pub day: String,
    pub mean_ms: f64,
    pub p95_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct ThroughputPoint {
    pub day: String,
    pub requests: i64,
    /// Hourly approximation: requests / 24
    pub requests_per_hour: f64,
}

#[derive(Debug, Serialize)]
pub struct PromptQuality {
    pub prompt_id: String,
    pub uses: i64,
    pub avg_quality: f64,
}

#[derive(Debug, Serialize)]
pub struct CostOpportunity {
    pub model_id: String,
    pub avg_cost_per_request: f64,
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct PerformanceInsights {
    pub daily_latency: Vec<LatencyPoint>,
    pub daily_throughput: Vec<ThroughputPoint>,
    pub daily_quality: Vec<DailyPoint>,
    pub quality_trend: TrendDirection,
    pub top_prompts: Vec<PromptQuality>,
    pub cost_opportunity: Option<CostOpportunity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Error,
    Warning,
}

#[derive(Debug, Serialize)]
pub struct DashboardAlert {
    pub level: AlertLevel,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TodaySummary {
    pub requests: i64,
    pub cost: f64,
    pub avg_quality: Option<f64>,
    pub top_model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub live: LiveTraceSnapshot,
    pub today: TodaySummary,
    pub alerts: Vec<DashboardAlert>,
}

// ============================================================================
// Engine
// ============================================================================

pub struct AnalyticsEngine {
    pool: SqlitePool,
}

impl AnalyticsEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Metrics wrapped with a letter grade and threshold-breach
    /// recommendations
    pub async fn get_performance_metrics(
        &self,
        filters: &TraceFilters,
    ) -> Result<PerformanceReport, SqliteError> {
        let metrics = trace::compute_metrics(&self.pool, filters).await?;
        let grade = grade_for(
            metrics.error_rate,
            metrics.average_duration_ms,
            metrics.average_latency_ms,
        );
        let recommendations = recommendations_for(&metrics);
        Ok(PerformanceReport {
            metrics,
            grade,
            recommendations,
        })
    }

    /// Group raw traces by model over a window and rate each model.
    /// Sorted by popularity (request count) descending.
    pub async fn analyze_model_performance(
        &self,
        window_start: i64,
        window_end: i64,
    ) -> Result<Vec<ModelPerformance>, SqliteError> {
        let traces = trace::traces_in_window(&self.pool, window_start, window_end).await?;

        let mut by_model: BTreeMap<String, Vec<&TraceRecord>> = BTreeMap::new();
        for t in &traces {
            by_model.entry(t.model_id.clone()).or_default().push(t);
        }

        let mut results: Vec<ModelPerformance> = by_model
            .into_iter()
            .map(|(model_id, group)| {
                let request_count = group.len() as i64;
                let successes = count_status(&group, TraceStatus::Success);
                let success_rate = pct(successes, request_count);

                let avg_duration_ms = mean(group.iter().filter_map(|t| t.duration_ms.map(|d| d as f64)));
                let total_cost: f64 = group
                    .iter()
                    .filter_map(|t| t.cost.map(|c| c.total_cost))
                    .sum();
                let total_tokens: i64 = group
                    .iter()
                    .filter_map(|t| t.tokens_used.map(|u| u.total))
                    .sum();
                let avg_cost = total_cost / request_count.max(1) as f64;
                let avg_tokens_per_second = mean(group.iter().filter_map(|t| t.tokens_per_second));
                let avg_quality = mean_opt(group.iter().filter_map(|t| t.quality_score));
                let cost_efficiency = if total_tokens > 0 {
                    total_cost / total_tokens as f64
                } else {
                    0.0
                };

                let recommendation =
                    rate_model(success_rate, avg_duration_ms, cost_efficiency);

                ModelPerformance {
                    model_id,
                    request_count,
                    success_rate,
                    avg_duration_ms,
                    avg_cost,
                    avg_tokens_per_second,
                    avg_quality,
                    cost_efficiency,
                    recommendation,
                }
            })
            .collect();

        results.sort_by(|a, b| b.request_count.cmp(&a.request_count));
        Ok(results)
    }

    /// Totals, per-model usage share, daily cost series with a trend
    /// label, and an error-type breakdown for a date window
    pub async fn generate_usage_report(
        &self,
        window_start: i64,
        window_end: i64,
    ) -> Result<UsageReport, SqliteError> {
        let traces = trace::traces_in_window(&self.pool, window_start, window_end).await?;

        let total_requests = traces.len() as i64;
        let unique_users = traces
            .iter()
            .map(|t| t.user_id.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len() as i64;
        let total_cost: f64 = traces.iter().filter_map(|t| t.cost.map(|c| c.total_cost)).sum();
        let total_tokens: i64 = traces
            .iter()
            .filter_map(|t| t.tokens_used.map(|u| u.total))
            .sum();

        // Per-model usage share
        let mut model_counts: BTreeMap<&str, i64> = BTreeMap::new();
        for t in &traces {
            *model_counts.entry(t.model_id.as_str()).or_default() += 1;
        }
        let mut model_usage: Vec<ModelShare> = model_counts
            .into_iter()
            .map(|(model_id, requests)| ModelShare {
                model_id: model_id.to_string(),
                requests,
                share_pct: pct(requests, total_requests),
            })
            .collect();
        model_usage.sort_by(|a, b| b.requests.cmp(&a.requests));

        // Daily cost series
        let mut daily: BTreeMap<String, f64> = BTreeMap::new();
        for t in &traces {
            if let Some(cost) = t.cost {
                *daily.entry(millis_to_day(t.start_time)).or_default() += cost.total_cost;
            }
        }
        let daily_cost: Vec<DailyPoint> = daily
            .into_iter()
            .map(|(day, value)| DailyPoint { day, value })
            .collect();
        let series: Vec<f64> = daily_cost.iter().map(|p| p.value).collect();
        let cost_trend = classify_trend(&series);

        // Error-type breakdown with percentages of errored traces
        let mut error_counts: BTreeMap<String, i64> = BTreeMap::new();
        for t in traces.iter().filter(|t| t.status == TraceStatus::Error) {
            let code = t.error_code.clone().unwrap_or_else(|| "UNKNOWN".to_string());
            *error_counts.entry(code).or_default() += 1;
        }
        let total_errors: i64 = error_counts.values().sum();
        let mut error_breakdown: Vec<ErrorShare> = error_counts
            .into_iter()
            .map(|(error_code, count)| ErrorShare {
                error_code,
                count,
                share_pct: pct(count, total_errors),
            })
            .collect();
        error_breakdown.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(UsageReport {
            total_requests,
            unique_users,
            total_cost,
            total_tokens,
            model_usage,
            daily_cost,
            cost_trend,
            error_breakdown,
        })
    }

    /// Day-bucketed latency (mean + p95), throughput, quality trend, and
    /// top prompts by average quality
    pub async fn get_performance_insights(
        &self,
        window_start: i64,
        window_end: i64,
    ) -> Result<PerformanceInsights, SqliteError> {
        let traces = trace::traces_in_window(&self.pool, window_start, window_end).await?;

        let mut by_day: BTreeMap<String, Vec<&TraceRecord>> = BTreeMap::new();
        for t in &traces {
            by_day.entry(millis_to_day(t.start_time)).or_default().push(t);
        }

        let mut daily_latency = Vec::new();
        let mut daily_throughput = Vec::new();
        let mut daily_quality = Vec::new();

        for (day, group) in &by_day {
            let mut latencies: Vec<f64> = group
                .iter()
                .filter_map(|t| t.first_token_latency_ms.map(|l| l as f64))
                .collect();
            if !latencies.is_empty() {
                latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                daily_latency.push(LatencyPoint {
                    day: day.clone(),
                    mean_ms: latencies.iter().sum::<f64>() / latencies.len() as f64,
                    p95_ms: percentile_95(&latencies),
                });
            }

            let requests = group.len() as i64;
            daily_throughput.push(ThroughputPoint {
                day: day.clone(),
                requests,
                requests_per_hour: requests as f64 / 24.0,
            });

            if let Some(avg_quality) = mean_opt(group.iter().filter_map(|t| t.quality_score)) {
                daily_quality.push(DailyPoint {
                    day: day.clone(),
                    value: avg_quality,
                });
            }
        }

        let quality_series: Vec<f64> = daily_quality.iter().map(|p| p.value).collect();
        let quality_trend = classify_trend(&quality_series);

        // Top prompts by average quality
        let mut by_prompt: HashMap<&str, (i64, f64)> = HashMap::new();
        for t in &traces {
            if let (Some(prompt_id), Some(quality)) = (t.prompt_id.as_deref(), t.quality_score) {
                let entry = by_prompt.entry(prompt_id).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += quality;
            }
        }
        let mut top_prompts: Vec<PromptQuality> = by_prompt
            .into_iter()
            .map(|(prompt_id, (uses, quality_sum))| PromptQuality {
                prompt_id: prompt_id.to_string(),
                uses,
                avg_quality: quality_sum / uses as f64,
            })
            .collect();
        top_prompts.sort_by(|a, b| {
            b.avg_quality
                .partial_cmp(&a.avg_quality)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        top_prompts.truncate(INSIGHTS_TOP_PROMPTS);

        // Lightweight cost opportunity: the most expensive model by
        // average cost per request
        let mut model_costs: HashMap<&str, (i64, f64)> = HashMap::new();
        for t in &traces {
            if let Some(cost) = t.cost {
                let entry = model_costs.entry(t.model_id.as_str()).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += cost.total_cost;
            }
        }
        let cost_opportunity = model_costs
            .into_iter()
            .map(|(model_id, (requests, cost_sum))| (model_id, cost_sum / requests as f64))
            .filter(|(_, avg)| *avg > 0.0)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(model_id, avg_cost_per_request)| CostOpportunity {
                model_id: model_id.to_string(),
                avg_cost_per_request,
                note: format!(
                    "{} has the highest average cost per request; consider a cheaper model for routine prompts",
                    model_id
                ),
            });

        Ok(PerformanceInsights {
            daily_latency,
            daily_throughput,
            daily_quality,
            quality_trend,
            top_prompts,
            cost_opportunity,
        })
    }

    /// Live snapshot composed with same-day aggregates and threshold
    /// alerts
    pub async fn get_dashboard_data(&self) -> Result<DashboardData, SqliteError> {
        let now = now_millis();
        let today_start = day_start_millis(now);

        let live = trace::live_traces(&self.pool, now - crate::core::constants::LIVE_WINDOW_SECS * 1000).await?;
        let today_traces = trace::traces_in_window(&self.pool, today_start, now + 1).await?;

        let requests = today_traces.len() as i64;
        let cost: f64 = today_traces
            .iter()
            .filter_map(|t| t.cost.map(|c| c.total_cost))
            .sum();
        let avg_quality = mean_opt(today_traces.iter().filter_map(|t| t.quality_score));

        let mut model_counts: HashMap<&str, i64> = HashMap::new();
        for t in &today_traces {
            *model_counts.entry(t.model_id.as_str()).or_default() += 1;
        }
        let top_model = model_counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(model, _)| model.to_string());

        let metrics = trace::compute_metrics(
            &self.pool,
            &TraceFilters {
                start_after: Some(today_start),
                ..TraceFilters::default()
            },
        )
        .await?;

        let mut alerts = Vec::new();
        if metrics.total_traces > 0 && metrics.error_rate > ALERT_ERROR_RATE_PCT {
            alerts.push(DashboardAlert {
                level: AlertLevel::Error,
                message: format!(
                    "Error rate is {:.1}% today (threshold {:.0}%)",
                    metrics.error_rate, ALERT_ERROR_RATE_PCT
                ),
            });
        }
        if metrics.average_latency_ms > ALERT_AVG_LATENCY_MS {
            alerts.push(DashboardAlert {
                level: AlertLevel::Warning,
                message: format!(
                    "Average first-token latency is {:.0}ms today (threshold {:.0}ms)",
                    metrics.average_latency_ms, ALERT_AVG_LATENCY_MS
                ),
            });
        }

        Ok(DashboardData {
            live,
            today: TodaySummary {
                requests,
                cost,
                avg_quality,
                top_model,
            },
            alerts,
        })
    }
}

// ============================================================================
// Pure helpers
// ============================================================================

/// Letter grade from fixed thresholds; all three bounds must hold
pub fn grade_for(error_rate: f64, avg_duration_ms: f64, avg_latency_ms: f64) -> PerformanceGrade {
    let fits = |bounds: (f64, f64, f64)| {
        error_rate < bounds.0 && avg_duration_ms < bounds.1 && avg_latency_ms < bounds.2
    };
    if fits(GRADE_A) {
        PerformanceGrade::A
    } else if fits(GRADE_B) {
        PerformanceGrade::B
    } else if fits(GRADE_C) {
        PerformanceGrade::C
    } else if fits(GRADE_D) {
        PerformanceGrade::D
    } else {
        PerformanceGrade::F
    }
}

/// Free-text recommendations when thresholds are breached
fn recommendations_for(metrics: &TraceMetrics) -> Vec<String> {
    let mut recommendations = Vec::new();
    if metrics.total_traces == 0 {
        return recommendations;
    }
    if metrics.error_rate > RECOMMEND_ERROR_RATE_PCT {
        recommendations.push(format!(
            "Error rate of {:.1}% is above {:.0}%; review recent error events and provider health",
            metrics.error_rate, RECOMMEND_ERROR_RATE_PCT
        ));
    }
    if metrics.average_duration_ms > RECOMMEND_DURATION_MS {
        recommendations.push(format!(
            "Average duration of {:.0}ms exceeds {:.0}ms; consider smaller max_tokens or a faster model",
            metrics.average_duration_ms, RECOMMEND_DURATION_MS
        ));
    }
    if metrics.average_latency_ms > RECOMMEND_LATENCY_MS {
        recommendations.push(format!(
            "First-token latency of {:.0}ms exceeds {:.0}ms; check provider region and prompt size",
            metrics.average_latency_ms, RECOMMEND_LATENCY_MS
        ));
    }
    if metrics.streaming_rate < RECOMMEND_STREAMING_PCT {
        recommendations.push(format!(
            "Only {:.0}% of requests stream; enabling streaming improves perceived latency",
            metrics.streaming_rate
        ));
    }
    recommendations
}

fn rate_model(success_rate: f64, avg_duration_ms: f64, cost_efficiency: f64) -> ModelRating {
    if success_rate >= MODEL_EXCELLENT.0
        && avg_duration_ms <= MODEL_EXCELLENT.1
        && cost_efficiency <= MODEL_EXCELLENT_COST_PER_TOKEN
    {
        ModelRating::Excellent
    } else if success_rate >= MODEL_GOOD.0 && avg_duration_ms <= MODEL_GOOD.1 {
        ModelRating::Good
    } else if success_rate >= MODEL_FAIR.0 && avg_duration_ms <= MODEL_FAIR.1 {
        ModelRating::Fair
    } else {
        ModelRating::Poor
    }
}

/// p95 via sorted-array index `ceil(n * 0.95) - 1`
fn percentile_95(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() as f64 * 0.95).ceil() as usize).saturating_sub(1);
    sorted[index.min(sorted.len() - 1)]
}

fn count_status(group: &[&TraceRecord], status: TraceStatus) -> i64 {
    group.iter().filter(|t| t.status == status).count() as i64
}

fn pct(count: i64, total: i64) -> f64 {
    if total > 0 {
        count as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        0.0
    } else {
        collected.iter().sum::<f64>() / collected.len() as f64
    }
}

fn mean_opt(values: impl Iterator<Item = f64>) -> Option<f64> {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        None
    } else {
        Some(collected.iter().sum::<f64>() / collected.len() as f64)
    }
}

/// Midnight UTC of the day containing `millis`
fn day_start_millis(millis: i64) -> i64 {
    millis - millis.rem_euclid(86_400_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SqliteService;
    use crate::data::sqlite::repositories::trace::{complete_trace, insert_trace, update_trace};
    use crate::data::types::{
        CostBreakdown, NewTrace, TokenUsage, TraceCompletion, TraceSource, TraceUpdate,
    };

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(grade_for(0.5, 1500.0, 400.0), PerformanceGrade::A);
        assert_eq!(grade_for(3.0, 4000.0, 900.0), PerformanceGrade::B);
        assert_eq!(grade_for(8.0, 9000.0, 1500.0), PerformanceGrade::C);
        assert_eq!(grade_for(15.0, 15_000.0, 4000.0), PerformanceGrade::D);
        assert_eq!(grade_for(25.0, 30_000.0, 8000.0), PerformanceGrade::F);
        // One breached dimension drops the grade
        assert_eq!(grade_for(0.5, 1500.0, 800.0), PerformanceGrade::B);
    }

    #[test]
    fn test_percentile_95_index_convention() {
        let sorted: Vec<f64> = (1..=100).map(|i| i as f64).collect();
        // ceil(100 * 0.95) - 1 = 94 -> value 95
        assert_eq!(percentile_95(&sorted), 95.0);

        let small = [10.0, 20.0, 30.0];
        // ceil(3 * 0.95) - 1 = 2 -> value 30
        assert_eq!(percentile_95(&small), 30.0);

        assert_eq!(percentile_95(&[]), 0.0);
    }

    #[test]
    fn test_rate_model_thresholds() {
        assert_eq!(rate_model(99.0, 1000.0, 0.00001), ModelRating::Excellent);
        // Too expensive per token for excellent, still good
        assert_eq!(rate_model(99.0, 1000.0, 0.001), ModelRating::Good);
        assert_eq!(rate_model(96.0, 4000.0, 0.001), ModelRating::Good);
        assert_eq!(rate_model(92.0, 8000.0, 0.001), ModelRating::Fair);
        assert_eq!(rate_model(80.0, 8000.0, 0.001), ModelRating::Poor);
    }

    #[test]
    fn test_recommendations_for_empty_metrics() {
        assert!(recommendations_for(&TraceMetrics::default()).is_empty());
    }

    #[test]
    fn test_recommendations_trigger_on_breach() {
        let metrics = TraceMetrics {
            total_traces: 100,
            error_rate: 7.5,
            average_duration_ms: 12_000.0,
            average_latency_ms: 2500.0,
            streaming_rate: 20.0,
            ..TraceMetrics::default()
        };
        let recs = recommendations_for(&metrics);
        assert_eq!(recs.len(), 4);
        assert!(recs[0].contains("Error rate"));
    }

    async fn seed_trace(
        pool: &sqlx::SqlitePool,
        id: &str,
        model: &str,
        start: i64,
        status: crate::data::types::TraceStatus,
        cost: f64,
        quality: Option<f64>,
    ) {
        let trace = NewTrace {
            trace_id: id.to_string(),
            parent_trace_id: None,
            session_id: "s".to_string(),
            user_id: "u1".to_string(),
            prompt_id: Some("p1".to_string()),
            source: TraceSource::Api,
            model_id: model.to_string(),
            prompt_content: "prompt".to_string(),
            system_prompt: None,
            parameters: None,
            start_time: start,
            user_agent: None,
            ip_address: None,
        };
        insert_trace(pool, &trace).await.unwrap();
        update_trace(
            pool,
            id,
            &TraceUpdate {
                first_token_latency_ms: Some(300),
                ..TraceUpdate::default()
            },
        )
        .await
        .unwrap();
        complete_trace(
            pool,
            id,
            &TraceCompletion {
                status,
                response_content: None,
                tokens_used: Some(TokenUsage::new(100, 100)),
                cost: Some(CostBreakdown {
                    input_cost: cost / 2.0,
                    output_cost: cost / 2.0,
                    total_cost: cost,
                }),
                error_message: None,
                error_code: (status == crate::data::types::TraceStatus::Error)
                    .then(|| "GENERATION_ERROR".to_string()),
                quality_score: quality,
                end_time: start + 800,
            },
            800,
            Some(250.0),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_model_performance_sorted_by_popularity() {
        let service = SqliteService::init_in_memory().await.unwrap();
        let pool = service.pool().clone();
        let base = now_millis() - 1000;

        for i in 0..3 {
            seed_trace(
                &pool,
                &format!("a{}", i),
                "gpt-4o",
                base + i,
                TraceStatus::Success,
                0.01,
                Some(0.9),
            )
            .await;
        }
        seed_trace(&pool, "b0", "gpt-4o-mini", base, TraceStatus::Success, 0.001, Some(0.8)).await;

        let engine = AnalyticsEngine::new(pool);
        let results = engine
            .analyze_model_performance(base - 10, now_millis() + 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].model_id, "gpt-4o");
        assert_eq!(results[0].request_count, 3);
        assert_eq!(results[0].success_rate, 100.0);
        assert!(results[0].cost_efficiency > 0.0);
    }

    #[tokio::test]
    async fn test_usage_report_totals_and_error_breakdown() {
        let service = SqliteService::init_in_memory().await.unwrap();
        let pool = service.pool().clone();
        let base = now_millis() - 1000;

        seed_trace(&pool, "ok1", "gpt-4o", base, TraceStatus::Success, 0.02, None).await;
        seed_trace(&pool, "ok2", "gpt-4o", base + 1, TraceStatus::Success, 0.02, None).await;
        seed_trace(&pool, "err1", "gpt-4o", base + 2, TraceStatus::Error, 0.0, None).await;

        let engine = AnalyticsEngine::new(pool);
        let report = engine
            .generate_usage_report(base - 10, now_millis() + 10)
            .await
            .unwrap();

        assert_eq!(report.total_requests, 3);
        assert_eq!(report.unique_users, 1);
        assert!((report.total_cost - 0.04).abs() < 1e-9);
        assert_eq!(report.model_usage[0].requests, 3);
        assert_eq!(report.error_breakdown.len(), 1);
        assert_eq!(report.error_breakdown[0].error_code, "GENERATION_ERROR");
        assert_eq!(report.error_breakdown[0].share_pct, 100.0);
    }

    #[tokio::test]
    async fn test_insights_top_prompts_and_latency() {
        let service = SqliteService::init_in_memory().await.unwrap();
        let pool = service.pool().clone();
        let base = now_millis() - 1000;

        for i in 0..4 {
            seed_trace(
                &pool,
                &format!("t{}", i),
                "gpt-4o",
                base + i,
                TraceStatus::Success,
                0.01,
                Some(0.7 + 0.05 * i as f64),
            )
            .await;
        }

        let engine = AnalyticsEngine::new(pool);
        let insights = engine
            .get_performance_insights(base - 10, now_millis() + 10)
            .await
            .unwrap();

        assert_eq!(insights.daily_latency.len(), 1);
        assert_eq!(insights.daily_latency[0].mean_ms, 300.0);
        assert_eq!(insights.top_prompts.len(), 1);
        assert_eq!(insights.top_prompts[0].prompt_id, "p1");
        assert_eq!(insights.top_prompts[0].uses, 4);
        assert!(insights.cost_opportunity.is_some());
    }

    #[tokio::test]
    async fn test_dashboard_alerts_on_high_error_rate() {
        let service = SqliteService::init_in_memory().await.unwrap();
        let pool = service.pool().clone();
        let base = now_millis() - 1000;

        seed_trace(&pool, "ok", "gpt-4o", base, TraceStatus::Success, 0.01, None).await;
        for i in 0..2 {
            seed_trace(
                &pool,
                &format!("err{}", i),
                "gpt-4o",
                base + 1 + i,
                TraceStatus::Error,
                0.0,
                None,
            )
            .await;
        }

        let engine = AnalyticsEngine::new(pool);
        let dashboard = engine.get_dashboard_data().await.unwrap();

        assert_eq!(dashboard.today.requests, 3);
        assert_eq!(dashboard.today.top_model.as_deref(), Some("gpt-4o"));
        assert!(
            dashboard
                .alerts
                .iter()
                .any(|a| a.level == AlertLevel::Error && a.message.contains("Error rate"))
        );
    }
}
