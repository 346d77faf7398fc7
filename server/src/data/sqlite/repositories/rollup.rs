//! Rollup repositories
//!
//! Upsert-on-natural-key writes for the aggregation tables. Every upsert
//! targets the table's UNIQUE constraint so repeated passes over the same
//! window converge instead of duplicating rows.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::data::sqlite::SqliteError;
use crate::data::types::{
    CostAnalysisRow, DailyUsageRow, ModelUsageStatRow, PeriodType, PromptPerformanceRow,
    QualityDistribution, UserActivityRow,
};

// ============================================================================
// Daily usage
// ============================================================================

/// Database-side daily rollup: group the day's traces by user and model
/// and upsert one row per pair. Returns the number of rows written.
pub async fn rollup_daily_usage(
    pool: &SqlitePool,
    day: &str,
    day_start: i64,
    day_end: i64,
) -> Result<u64, SqliteError> {
    let now = chrono::Utc::now().timestamp_millis();

    let result = sqlx::query(
        r#"
        INSERT INTO usage_analytics_daily
            (day, user_id, model_id, request_count, total_tokens, total_cost, error_count, created_at, updated_at)
        SELECT
            ?, user_id, model_id,
            COUNT(*),
            COALESCE(SUM(total_tokens), 0),
            COALESCE(SUM(total_cost), 0),
            COALESCE(SUM(CASE WHEN status = 'error' THEN 1 ELSE 0 END), 0),
            ?, ?
        FROM traces
        WHERE start_time >= ? AND start_time < ?
        GROUP BY user_id, model_id
        ON CONFLICT(day, user_id, model_id) DO UPDATE SET
            request_count = excluded.request_count,
            total_tokens = excluded.total_tokens,
            total_cost = excluded.total_cost,
            error_count = excluded.error_count,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(day)
    .bind(now)
    .bind(now)
    .bind(day_start)
    .bind(day_end)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Daily usage rows in an inclusive day range (`YYYY-MM-DD` strings sort
/// lexicographically in date order)
pub async fn daily_usage_in_range(
    pool: &SqlitePool,
    from_day: &str,
    to_day: &str,
) -> Result<Vec<DailyUsageRow>, SqliteError> {
    let rows = sqlx::query(
        r#"
        SELECT day, user_id, model_id, request_count, total_tokens, total_cost, error_count
        FROM usage_analytics_daily
        WHERE day >= ? AND day <= ?
        ORDER BY day ASC
        "#,
    )
    .bind(from_day)
    .bind(to_day)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(DailyUsageRow {
                day: row.try_get("day")?,
                user_id: row.try_get("user_id")?,
                model_id: row.try_get("model_id")?,
                request_count: row.try_get("request_count")?,
                total_tokens: row.try_get("total_tokens")?,
                total_cost: row.try_get("total_cost")?,
                error_count: row.try_get("error_count")?,
            })
        })
        .collect()
}

/// Insert or replace a daily usage row directly (test fixtures)
#[cfg(test)]
pub async fn upsert_daily_usage_row_for_test(
    pool: &SqlitePool,
    day: &str,
    user_id: &str,
    model_id: &str,
    request_count: i64,
    total_tokens: i64,
    total_cost: f64,
) {
    let now = chrono::Utc::now().timestamp_millis();
    sqlx::query(
        r#"
        INSERT INTO usage_analytics_daily
            (day, user_id, model_id, request_count, total_tokens, total_cost, error_count, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
        ON CONFLICT(day, user_id, model_id) DO UPDATE SET
            request_count = excluded.request_count,
            total_tokens = excluded.total_tokens,
            total_cost = excluded.total_cost,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(day)
    .bind(user_id)
    .bind(model_id)
    .bind(request_count)
    .bind(total_tokens)
    .bind(total_cost)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
}

// ============================================================================
// Model usage statistics
// ============================================================================

pub async fn upsert_model_stat(
    pool: &SqlitePool,
    stat: &ModelUsageStatRow,
) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp_millis();
    let top_error_codes = serde_json::to_string(&stat.top_error_codes).unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO model_usage_statistics (
            model_id, period_type, period_start, period_end,
            request_count, success_count, error_count, error_rate,
            avg_response_time_ms, avg_tokens_per_second,
            total_tokens, total_cost, cost_per_token, cost_per_request,
            quality_excellent, quality_good, quality_fair, quality_poor,
            top_error_codes, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(model_id, period_type, period_start) DO UPDATE SET
            period_end = excluded.period_end,
            request_count = excluded.request_count,
            success_count = excluded.success_count,
            error_count = excluded.error_count,
            error_rate = excluded.error_rate,
            avg_response_time_ms = excluded.avg_response_time_ms,
            avg_tokens_per_second = excluded.avg_tokens_per_second,
            total_tokens = excluded.total_tokens,
            total_cost = excluded.total_cost,
            cost_per_token = excluded.cost_per_token,
            cost_per_request = excluded.cost_per_request,
            quality_excellent = excluded.quality_excellent,
            quality_good = excluded.quality_good,
            quality_fair = excluded.quality_fair,
            quality_poor = excluded.quality_poor,
            top_error_codes = excluded.top_error_codes,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&stat.model_id)
    .bind(stat.period_type.as_str())
    .bind(stat.period_start)
    .bind(stat.period_end)
    .bind(stat.request_count)
    .bind(stat.success_count)
    .bind(stat.error_count)
    .bind(stat.error_rate)
    .bind(stat.avg_response_time_ms)
    .bind(stat.avg_tokens_per_second)
    .bind(stat.total_tokens)
    .bind(stat.total_cost)
    .bind(stat.cost_per_token)
    .bind(stat.cost_per_request)
    .bind(stat.quality.excellent)
    .bind(stat.quality.good)
    .bind(stat.quality.fair)
    .bind(stat.quality.poor)
    .bind(top_error_codes)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Model statistics rows for one period (test/report surface)
pub async fn model_stats_for_period(
    pool: &SqlitePool,
    period_type: PeriodType,
    period_start: i64,
) -> Result<Vec<ModelUsageStatRow>, SqliteError> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM model_usage_statistics
        WHERE period_type = ? AND period_start = ?
        ORDER BY request_count DESC
        "#,
    )
    .bind(period_type.as_str())
    .bind(period_start)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_model_stat).collect()
}

fn row_to_model_stat(row: &SqliteRow) -> Result<ModelUsageStatRow, SqliteError> {
    let period_raw: String = row.try_get("period_type")?;
    let period_type = PeriodType::parse(&period_raw).ok_or_else(|| SqliteError::InvalidValue {
        column: "period_type",
        value: period_raw.clone(),
    })?;

    let top_error_codes: Option<String> = row.try_get("top_error_codes")?;
    let top_error_codes = top_error_codes
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default();

    Ok(ModelUsageStatRow {
        model_id: row.try_get("model_id")?,
        period_type,
        period_start: row.try_get("period_start")?,
        period_end: row.try_get("period_end")?,
        request_count: row.try_get("request_count")?,
        success_count: row.try_get("success_count")?,
        error_count: row.try_get("error_count")?,
        error_rate: row.try_get("error_rate")?,
        avg_response_time_ms: row.try_get("avg_response_time_ms")?,
        avg_tokens_per_second: row.try_get("avg_tokens_per_second")?,
        total_tokens: row.try_get("total_tokens")?,
        total_cost: row.try_get("total_cost")?,
        cost_per_token: row.try_get("cost_per_token")?,
        cost_per_request: row.try_get("cost_per_request")?,
        quality: QualityDistribution {
            excellent: row.try_get("quality_excellent")?,
            good: row.try_get("quality_good")?,
            fair: row.try_get("quality_fair")?,
            poor: row.try_get("quality_poor")?,
        },
        top_error_codes,
    })
}

// ============================================================================
// Cost analysis summary
// ============================================================================

pub async fn upsert_cost_analysis(
    pool: &SqlitePool,
    summary: &CostAnalysisRow,
) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp_millis();
    let model_costs = serde_json::to_string(&summary.model_costs).unwrap_or_default();
    let user_costs = serde_json::to_string(&summary.user_costs).unwrap_or_default();
    let recommendations =
        serde_json::to_string(&summary.optimization_recommendations).unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO cost_analysis_summary (
            period_type, period_start, period_end,
            total_cost, total_requests, total_tokens,
            model_costs, user_costs, optimization_recommendations,
            forecast_next_period, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(period_type, period_start) DO UPDATE SET
            period_end = excluded.period_end,
            total_cost = excluded.total_cost,
            total_requests = excluded.total_requests,
            total_tokens = excluded.total_tokens,
            model_costs = excluded.model_costs,
            user_costs = excluded.user_costs,
            optimization_recommendations = excluded.optimization_recommendations,
            forecast_next_period = excluded.forecast_next_period,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(summary.period_type.as_str())
    .bind(summary.period_start)
    .bind(summary.period_end)
    .bind(summary.total_cost)
    .bind(summary.total_requests)
    .bind(summary.total_tokens)
    .bind(model_costs)
    .bind(user_costs)
    .bind(recommendations)
    .bind(summary.forecast_next_period)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_cost_analysis(
    pool: &SqlitePool,
    period_type: PeriodType,
    period_start: i64,
) -> Result<Option<CostAnalysisRow>, SqliteError> {
    let row = sqlx::query(
        "SELECT * FROM cost_analysis_summary WHERE period_type = ? AND period_start = ?",
    )
    .bind(period_type.as_str())
    .bind(period_start)
    .fetch_optional(pool)
    .await?;

    row.map(|r| {
        let period_raw: String = r.try_get("period_type")?;
        let period_type =
            PeriodType::parse(&period_raw).ok_or_else(|| SqliteError::InvalidValue {
                column: "period_type",
                value: period_raw.clone(),
            })?;

        let model_costs: Option<String> = r.try_get("model_costs")?;
        let user_costs: Option<String> = r.try_get("user_costs")?;
        let recommendations: Option<String> = r.try_get("optimization_recommendations")?;

        Ok(CostAnalysisRow {
            period_type,
            period_start: r.try_get("period_start")?,
            period_end: r.try_get("period_end")?,
            total_cost: r.try_get("total_cost")?,
            total_requests: r.try_get("total_requests")?,
            total_tokens: r.try_get("total_tokens")?,
            model_costs: model_costs
                .and_then(|raw| serde_json::from_str(&raw).ok())
                .unwrap_or_default(),
            user_costs: user_costs
                .and_then(|raw| serde_json::from_str(&raw).ok())
                .unwrap_or_default(),
            optimization_recommendations: recommendations
                .and_then(|raw| serde_json::from_str(&raw).ok())
                .unwrap_or_default(),
            forecast_next_period: r
                .try_get::<Option<f64>, _>("forecast_next_period")?
                .unwrap_or(0.0),
        })
    })
    .transpose()
}

// ============================================================================
// User activity
// ============================================================================

pub async fn upsert_user_activity(
    pool: &SqlitePool,
    activity: &UserActivityRow,
) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp_millis();

    sqlx::query(
        r#"
        INSERT INTO user_activity_metrics (
            user_id, day, request_count, total_cost, distinct_models,
            favorite_model, peak_usage_hour, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, day) DO UPDATE SET
            request_count = excluded.request_count,
            total_cost = excluded.total_cost,
            distinct_models = excluded.distinct_models,
            favorite_model = excluded.favorite_model,
            peak_usage_hour = excluded.peak_usage_hour,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&activity.user_id)
    .bind(&activity.day)
    .bind(activity.request_count)
    .bind(activity.total_cost)
    .bind(activity.distinct_models)
    .bind(&activity.favorite_model)
    .bind(activity.peak_usage_hour)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// User activity row for one user and day (test/report surface)
pub async fn get_user_activity(
    pool: &SqlitePool,
    user_id: &str,
    day: &str,
) -> Result<Option<UserActivityRow>, SqliteError> {
    let row = sqlx::query("SELECT * FROM user_activity_metrics WHERE user_id = ? AND day = ?")
        .bind(user_id)
        .bind(day)
        .fetch_optional(pool)
        .await?;

    row.map(|r| {
        Ok(UserActivityRow {
            user_id: r.try_get("user_id")?,
            day: r.try_get("day")?,
            request_count: r.try_get("request_count")?,
            total_cost: r.try_get("total_cost")?,
            distinct_models: r.try_get("distinct_models")?,
            favorite_model: r.try_get("favorite_model")?,
            peak_usage_hour: r.try_get("peak_usage_hour")?,
        })
    })
    .transpose()
}

// ============================================================================
// Prompt performance
// ============================================================================

pub async fn upsert_prompt_performance(
    pool: &SqlitePool,
    perf: &PromptPerformanceRow,
) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp_millis();
    let model_usage = serde_json::to_string(&perf.model_usage).unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO prompt_performance_trends (
            prompt_id, day, use_count, unique_users, total_cost,
            avg_duration_ms, success_rate, avg_quality, model_usage,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(prompt_id, day) DO UPDATE SET
            use_count = excluded.use_count,
            unique_users = excluded.unique_users,
            total_cost = excluded.total_cost,
            avg_duration_ms = excluded.avg_duration_ms,
            success_rate = excluded.success_rate,
            avg_quality = excluded.avg_quality,
            model_usage = excluded.model_usage,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&perf.prompt_id)
    .bind(&perf.day)
    .bind(perf.use_count)
    .bind(perf.unique_users)
    .bind(perf.total_cost)
    .bind(perf.avg_duration_ms)
    .bind(perf.success_rate)
    .bind(perf.avg_quality)
    .bind(model_usage)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}
