//! Trace repository for SQLite operations
//!
//! All reads and writes to the `traces` table flow through here. Filtered
//! queries are assembled with `QueryBuilder` so every predicate stays a
//! bound parameter.

use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::data::sqlite::SqliteError;
use crate::data::types::{
    CostBreakdown, LiveTraceSnapshot, NewTrace, TokenUsage, TraceCompletion, TraceFilters,
    TraceMetrics, TracePage, TraceQueryResult, TraceRecord, TraceSortField, TraceSource,
    TraceStatus, TraceUpdate,
};

/// Insert a new trace row with status `pending`
pub async fn insert_trace(pool: &SqlitePool, trace: &NewTrace) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp_millis();
    let parameters = trace.parameters.as_ref().map(|v| v.to_string());

    sqlx::query(
        r#"
        INSERT INTO traces (
            trace_id, parent_trace_id, session_id, user_id, prompt_id,
            source, model_id, prompt_content, system_prompt, parameters,
            start_time, status, user_agent, ip_address, trace_version,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&trace.trace_id)
    .bind(&trace.parent_trace_id)
    .bind(&trace.session_id)
    .bind(&trace.user_id)
    .bind(&trace.prompt_id)
    .bind(trace.source.as_str())
    .bind(&trace.model_id)
    .bind(&trace.prompt_content)
    .bind(&trace.system_prompt)
    .bind(parameters)
    .bind(trace.start_time)
    .bind(&trace.user_agent)
    .bind(&trace.ip_address)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a single trace by id
pub async fn get_trace(
    pool: &SqlitePool,
    trace_id: &str,
) -> Result<Option<TraceRecord>, SqliteError> {
    let row = sqlx::query("SELECT * FROM traces WHERE trace_id = ?")
        .bind(trace_id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_trace(&r)).transpose()
}

/// Apply a partial update to a trace row.
///
/// Status changes are validated by the caller (persistence service);
/// this function only refuses to touch rows that do not exist.
/// Returns true if a row was updated.
pub async fn update_trace(
    pool: &SqlitePool,
    trace_id: &str,
    update: &TraceUpdate,
) -> Result<bool, SqliteError> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE traces SET updated_at = ");
    qb.push_bind(chrono::Utc::now().timestamp_millis());

    if let Some(status) = update.status {
        qb.push(", status = ").push_bind(status.as_str());
    }
    if let Some(ref content) = update.response_content {
        qb.push(", response_content = ").push_bind(content);
    }
    if let Some(usage) = update.tokens_used {
        qb.push(", input_tokens = ").push_bind(usage.input);
        qb.push(", output_tokens = ").push_bind(usage.output);
        qb.push(", total_tokens = ").push_bind(usage.total);
    }
    if let Some(cost) = update.cost {
        qb.push(", input_cost = ").push_bind(cost.input_cost);
        qb.push(", output_cost = ").push_bind(cost.output_cost);
        qb.push(", total_cost = ").push_bind(cost.total_cost);
    }
    if let Some(latency) = update.first_token_latency_ms {
        qb.push(", first_token_latency_ms = ").push_bind(latency);
    }
    if let Some(ref message) = update.error_message {
        qb.push(", error_message = ").push_bind(message);
    }
    if let Some(ref code) = update.error_code {
        qb.push(", error_code = ").push_bind(code);
    }
    if let Some(score) = update.quality_score {
        qb.push(", quality_score = ").push_bind(score);
    }
    if let Some(rating) = update.user_rating {
        qb.push(", user_rating = ").push_bind(rating);
    }
    if let Some(ref id) = update.mirror_trace_id {
        qb.push(", mirror_trace_id = ").push_bind(id);
    }
    if let Some(ref id) = update.mirror_observation_id {
        qb.push(", mirror_observation_id = ").push_bind(id);
    }

    qb.push(" WHERE trace_id = ").push_bind(trace_id);

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Write all terminal fields in one update.
///
/// The status guard makes repeated completion a no-op: only rows still in
/// `pending` or `streaming` are touched, so a finalize/cancel race cannot
/// overwrite a terminal state. Returns true if the row transitioned.
pub async fn complete_trace(
    pool: &SqlitePool,
    trace_id: &str,
    completion: &TraceCompletion,
    duration_ms: i64,
    tokens_per_second: Option<f64>,
) -> Result<bool, SqliteError> {
    let now = chrono::Utc::now().timestamp_millis();
    let usage = completion.tokens_used;
    let cost = completion.cost;

    let result = sqlx::query(
        r#"
        UPDATE traces SET
            status = ?,
            response_content = COALESCE(?, response_content),
            input_tokens = COALESCE(?, input_tokens),
            output_tokens = COALESCE(?, output_tokens),
            total_tokens = COALESCE(?, total_tokens),
            input_cost = COALESCE(?, input_cost),
            output_cost = COALESCE(?, output_cost),
            total_cost = COALESCE(?, total_cost),
            error_message = COALESCE(?, error_message),
            error_code = COALESCE(?, error_code),
            quality_score = COALESCE(?, quality_score),
            end_time = ?,
            duration_ms = ?,
            tokens_per_second = COALESCE(?, tokens_per_second),
            updated_at = ?
        WHERE trace_id = ? AND status IN ('pending', 'streaming')
        "#,
    )
    .bind(completion.status.as_str())
    .bind(&completion.response_content)
    .bind(usage.map(|u| u.input))
    .bind(usage.map(|u| u.output))
    .bind(usage.map(|u| u.total))
    .bind(cost.map(|c| c.input_cost))
    .bind(cost.map(|c| c.output_cost))
    .bind(cost.map(|c| c.total_cost))
    .bind(&completion.error_message)
    .bind(&completion.error_code)
    .bind(completion.quality_score)
    .bind(completion.end_time)
    .bind(duration_ms)
    .bind(tokens_per_second)
    .bind(now)
    .bind(trace_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List traces matching the filters, newest first by default
pub async fn list_traces(
    pool: &SqlitePool,
    filters: &TraceFilters,
    page: &TracePage,
    sort: TraceSortField,
    descending: bool,
) -> Result<TraceQueryResult, SqliteError> {
    let mut count_qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM traces WHERE 1=1");
    apply_filters(&mut count_qb, filters);
    let total_count: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM traces WHERE 1=1");
    apply_filters(&mut qb, filters);
    qb.push(format!(
        " ORDER BY {} {}",
        sort.column(),
        if descending { "DESC" } else { "ASC" }
    ));
    qb.push(" LIMIT ").push_bind(page.limit as i64);
    qb.push(" OFFSET ").push_bind(page.offset as i64);

    let rows = qb.build().fetch_all(pool).await?;
    let traces: Vec<TraceRecord> = rows
        .iter()
        .map(row_to_trace)
        .collect::<Result<_, _>>()?;

    let has_more = (page.offset as i64 + traces.len() as i64) < total_count;

    Ok(TraceQueryResult {
        traces,
        total_count,
        has_more,
    })
}

/// Case-insensitive substring match over prompt or response content,
/// combined with the standard filters. Does not paginate.
pub async fn search_traces(
    pool: &SqlitePool,
    query: &str,
    filters: &TraceFilters,
) -> Result<Vec<TraceRecord>, SqliteError> {
    let pattern = format!("%{}%", query.to_lowercase());

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM traces WHERE 1=1");
    apply_filters(&mut qb, filters);
    qb.push(" AND (LOWER(prompt_content) LIKE ");
    qb.push_bind(pattern.clone());
    qb.push(" OR LOWER(COALESCE(response_content, '')) LIKE ");
    qb.push_bind(pattern);
    qb.push(") ORDER BY start_time DESC");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(row_to_trace).collect()
}

/// Aggregate metrics over a filtered trace set.
///
/// Division by zero is avoided by computing rates in Rust; an empty set
/// yields all-zero metrics.
pub async fn compute_metrics(
    pool: &SqlitePool,
    filters: &TraceFilters,
) -> Result<TraceMetrics, SqliteError> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END), 0) AS successful,
            COALESCE(SUM(CASE WHEN status = 'error' THEN 1 ELSE 0 END), 0) AS errors,
            COALESCE(AVG(duration_ms), 0.0) AS avg_duration,
            COALESCE(AVG(first_token_latency_ms), 0.0) AS avg_latency,
            COALESCE(SUM(total_cost), 0.0) AS total_cost,
            COALESCE(AVG(tokens_per_second), 0.0) AS avg_tps,
            COALESCE(SUM(CASE WHEN first_token_latency_ms IS NOT NULL THEN 1 ELSE 0 END), 0) AS streamed
        FROM traces WHERE 1=1
        "#,
    );
    apply_filters(&mut qb, filters);

    let row = qb.build().fetch_one(pool).await?;

    let total: i64 = row.try_get("total")?;
    let successful: i64 = row.try_get("successful")?;
    let errors: i64 = row.try_get("errors")?;
    let streamed: i64 = row.try_get("streamed")?;

    let rate = |count: i64| {
        if total > 0 {
            count as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    };

    Ok(TraceMetrics {
        total_traces: total,
        successful_traces: successful,
        error_traces: errors,
        average_duration_ms: row.try_get("avg_duration")?,
        average_latency_ms: row.try_get("avg_latency")?,
        total_cost: row.try_get("total_cost")?,
        average_tokens_per_second: row.try_get("avg_tps")?,
        error_rate: rate(errors),
        streaming_rate: rate(streamed),
    })
}

/// Snapshot of in-flight traces plus rolling indicators over completed
/// traces in the same window (feed for real-time dashboards)
pub async fn live_traces(
    pool: &SqlitePool,
    window_start: i64,
) -> Result<LiveTraceSnapshot, SqliteError> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM traces
        WHERE status IN ('pending', 'streaming') AND start_time >= ?
        ORDER BY start_time DESC
        "#,
    )
    .bind(window_start)
    .fetch_all(pool)
    .await?;

    let active_traces: Vec<TraceRecord> = rows
        .iter()
        .map(row_to_trace)
        .collect::<Result<_, _>>()?;

    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS completed,
            COALESCE(SUM(CASE WHEN status = 'error' THEN 1 ELSE 0 END), 0) AS errors,
            COALESCE(AVG(first_token_latency_ms), 0.0) AS avg_latency
        FROM traces
        WHERE status IN ('success', 'error', 'cancelled') AND start_time >= ?
        "#,
    )
    .bind(window_start)
    .fetch_one(pool)
    .await?;

    let completed: i64 = row.try_get("completed")?;
    let errors: i64 = row.try_get("errors")?;
    let error_rate = if completed > 0 {
        errors as f64 / completed as f64 * 100.0
    } else {
        0.0
    };

    Ok(LiveTraceSnapshot {
        active_count: active_traces.len() as i64,
        active_traces,
        avg_latency_ms: row.try_get("avg_latency")?,
        error_rate,
    })
}

/// Fetch raw traces in a start_time window (aggregation and analytics input)
pub async fn traces_in_window(
    pool: &SqlitePool,
    window_start: i64,
    window_end: i64,
) -> Result<Vec<TraceRecord>, SqliteError> {
    let rows = sqlx::query(
        "SELECT * FROM traces WHERE start_time >= ? AND start_time < ? ORDER BY start_time ASC",
    )
    .bind(window_start)
    .bind(window_end)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_trace).collect()
}

// ============================================================================
// Internal helpers
// ============================================================================

/// Push filter predicates as bound parameters
fn apply_filters(qb: &mut QueryBuilder<Sqlite>, filters: &TraceFilters) {
    if let Some(ref user_id) = filters.user_id {
        qb.push(" AND user_id = ").push_bind(user_id.clone());
    }
    if let Some(ref model_id) = filters.model_id {
        qb.push(" AND model_id = ").push_bind(model_id.clone());
    }
    if let Some(status) = filters.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(source) = filters.source {
        qb.push(" AND source = ").push_bind(source.as_str());
    }
    if let Some(ref session_id) = filters.session_id {
        qb.push(" AND session_id = ").push_bind(session_id.clone());
    }
    if let Some(ref prompt_id) = filters.prompt_id {
        qb.push(" AND prompt_id = ").push_bind(prompt_id.clone());
    }
    if let Some(after) = filters.start_after {
        qb.push(" AND start_time >= ").push_bind(after);
    }
    if let Some(before) = filters.start_before {
        qb.push(" AND start_time < ").push_bind(before);
    }
    if let Some(min) = filters.min_duration_ms {
        qb.push(" AND duration_ms >= ").push_bind(min);
    }
    if let Some(max) = filters.max_duration_ms {
        qb.push(" AND duration_ms <= ").push_bind(max);
    }
    if let Some(min) = filters.min_cost {
        qb.push(" AND total_cost >= ").push_bind(min);
    }
    if let Some(max) = filters.max_cost {
        qb.push(" AND total_cost <= ").push_bind(max);
    }
    if let Some(has_error) = filters.has_error {
        if has_error {
            qb.push(" AND (status = 'error' OR error_code IS NOT NULL)");
        } else {
            qb.push(" AND status != 'error' AND error_code IS NULL");
        }
    }
    if let Some(streaming) = filters.streaming {
        if streaming {
            qb.push(" AND first_token_latency_ms IS NOT NULL");
        } else {
            qb.push(" AND first_token_latency_ms IS NULL");
        }
    }
}

/// Map a row to a TraceRecord
fn row_to_trace(row: &SqliteRow) -> Result<TraceRecord, SqliteError> {
    let status_raw: String = row.try_get("status")?;
    let status = TraceStatus::parse(&status_raw).ok_or_else(|| SqliteError::InvalidValue {
        column: "status",
        value: status_raw.clone(),
    })?;

    let source_raw: String = row.try_get("source")?;
    let source = TraceSource::parse(&source_raw).ok_or_else(|| SqliteError::InvalidValue {
        column: "source",
        value: source_raw.clone(),
    })?;

    let parameters: Option<String> = row.try_get("parameters")?;
    let parameters = parameters.and_then(|raw| match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse stored trace parameters");
            None
        }
    });

    let total_tokens: Option<i64> = row.try_get("total_tokens")?;
    let tokens_used = total_tokens.map(|total| TokenUsage {
        input: row.try_get::<Option<i64>, _>("input_tokens").ok().flatten().unwrap_or(0),
        output: row.try_get::<Option<i64>, _>("output_tokens").ok().flatten().unwrap_or(0),
        total,
    });

    let total_cost: Option<f64> = row.try_get("total_cost")?;
    let cost = total_cost.map(|total| CostBreakdown {
        input_cost: row.try_get::<Option<f64>, _>("input_cost").ok().flatten().unwrap_or(0.0),
        output_cost: row.try_get::<Option<f64>, _>("output_cost").ok().flatten().unwrap_or(0.0),
        total_cost: total,
    });

    Ok(TraceRecord {
        trace_id: row.try_get("trace_id")?,
        parent_trace_id: row.try_get("parent_trace_id")?,
        session_id: row.try_get("session_id")?,
        user_id: row.try_get("user_id")?,
        prompt_id: row.try_get("prompt_id")?,
        source,
        model_id: row.try_get("model_id")?,
        prompt_content: row.try_get("prompt_content")?,
        system_prompt: row.try_get("system_prompt")?,
        parameters,
        response_content: row.try_get("response_content")?,
        tokens_used,
        cost,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        duration_ms: row.try_get("duration_ms")?,
        first_token_latency_ms: row.try_get("first_token_latency_ms")?,
        tokens_per_second: row.try_get("tokens_per_second")?,
        status,
        error_message: row.try_get("error_message")?,
        error_code: row.try_get("error_code")?,
        quality_score: row.try_get("quality_score")?,
        user_rating: row.try_get("user_rating")?,
        mirror_trace_id: row.try_get("mirror_trace_id")?,
        mirror_observation_id: row.try_get("mirror_observation_id")?,
        user_agent: row.try_get("user_agent")?,
        ip_address: row.try_get("ip_address")?,
        trace_version: row.try_get("trace_version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SqliteService;
    use crate::data::types::TraceStatus;

    async fn make_pool() -> SqlitePool {
        SqliteService::init_in_memory().await.unwrap().pool().clone()
    }

    fn make_trace(id: &str, model: &str) -> NewTrace {
        NewTrace {
            trace_id: id.to_string(),
            parent_trace_id: None,
            session_id: "session-1".to_string(),
            user_id: "user-1".to_string(),
            prompt_id: None,
            source: TraceSource::Api,
            model_id: model.to_string(),
            prompt_content: "Say hello".to_string(),
            system_prompt: None,
            parameters: Some(serde_json::json!({"temperature": 0.7})),
            start_time: chrono::Utc::now().timestamp_millis(),
            user_agent: None,
            ip_address: None,
        }
    }

    fn completion(status: TraceStatus) -> TraceCompletion {
        TraceCompletion {
            status,
            response_content: Some("hello".to_string()),
            tokens_used: Some(TokenUsage::new(10, 5)),
            cost: Some(CostBreakdown {
                input_cost: 0.001,
                output_cost: 0.002,
                total_cost: 0.003,
            }),
            error_message: None,
            error_code: None,
            quality_score: None,
            end_time: chrono::Utc::now().timestamp_millis(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_trace() {
        let pool = make_pool().await;
        insert_trace(&pool, &make_trace("t1", "gpt-4o")).await.unwrap();

        let trace = get_trace(&pool, "t1").await.unwrap().unwrap();
        assert_eq!(trace.trace_id, "t1");
        assert_eq!(trace.status, TraceStatus::Pending);
        assert_eq!(trace.model_id, "gpt-4o");
        assert!(trace.tokens_used.is_none());
        assert_eq!(
            trace.parameters.unwrap()["temperature"],
            serde_json::json!(0.7)
        );
    }

    #[tokio::test]
    async fn test_get_missing_trace_returns_none() {
        let pool = make_pool().await;
        assert!(get_trace(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_complete_trace_sets_terminal_fields() {
        let pool = make_pool().await;
        insert_trace(&pool, &make_trace("t1", "gpt-4o")).await.unwrap();

        let changed = complete_trace(&pool, "t1", &completion(TraceStatus::Success), 1200, Some(12.5))
            .await
            .unwrap();
        assert!(changed);

        let trace = get_trace(&pool, "t1").await.unwrap().unwrap();
        assert_eq!(trace.status, TraceStatus::Success);
        assert_eq!(trace.duration_ms, Some(1200));
        assert_eq!(trace.tokens_used.unwrap().total, 15);
        assert_eq!(trace.tokens_per_second, Some(12.5));
        assert!(trace.end_time.is_some());
    }

    #[tokio::test]
    async fn test_complete_trace_is_idempotent() {
        let pool = make_pool().await;
        insert_trace(&pool, &make_trace("t1", "gpt-4o")).await.unwrap();

        assert!(
            complete_trace(&pool, "t1", &completion(TraceStatus::Success), 1000, None)
                .await
                .unwrap()
        );
        // Second completion is a no-op, not an error, and cannot flip status
        assert!(
            !complete_trace(&pool, "t1", &completion(TraceStatus::Cancelled), 2000, None)
                .await
                .unwrap()
        );

        let trace = get_trace(&pool, "t1").await.unwrap().unwrap();
        assert_eq!(trace.status, TraceStatus::Success);
        assert_eq!(trace.duration_ms, Some(1000));
    }

    #[tokio::test]
    async fn test_update_trace_merges_fields() {
        let pool = make_pool().await;
        insert_trace(&pool, &make_trace("t1", "gpt-4o")).await.unwrap();

        let update = TraceUpdate {
            status: Some(TraceStatus::Streaming),
            first_token_latency_ms: Some(230),
            ..TraceUpdate::default()
        };
        assert!(update_trace(&pool, "t1", &update).await.unwrap());

        let trace = get_trace(&pool, "t1").await.unwrap().unwrap();
        assert_eq!(trace.status, TraceStatus::Streaming);
        assert_eq!(trace.first_token_latency_ms, Some(230));
        // Untouched fields survive
        assert_eq!(trace.prompt_content, "Say hello");
    }

    #[tokio::test]
    async fn test_update_missing_trace_returns_false() {
        let pool = make_pool().await;
        let update = TraceUpdate {
            first_token_latency_ms: Some(1),
            ..TraceUpdate::default()
        };
        assert!(!update_trace(&pool, "missing", &update).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_traces_filters_and_paginates() {
        let pool = make_pool().await;
        for i in 0..5 {
            let mut t = make_trace(&format!("t{}", i), "gpt-4o");
            t.start_time += i;
            insert_trace(&pool, &t).await.unwrap();
        }
        insert_trace(&pool, &make_trace("other", "claude-sonnet-4")).await.unwrap();

        let filters = TraceFilters {
            model_id: Some("gpt-4o".to_string()),
            ..TraceFilters::default()
        };
        let page = TracePage { limit: 3, offset: 0 };
        let result = list_traces(&pool, &filters, &page, TraceSortField::StartTime, true)
            .await
            .unwrap();

        assert_eq!(result.total_count, 5);
        assert_eq!(result.traces.len(), 3);
        assert!(result.has_more);

        let page2 = TracePage { limit: 3, offset: 3 };
        let result2 = list_traces(&pool, &filters, &page2, TraceSortField::StartTime, true)
            .await
            .unwrap();
        assert_eq!(result2.traces.len(), 2);
        assert!(!result2.has_more);
    }

    #[tokio::test]
    async fn test_search_traces_case_insensitive() {
        let pool = make_pool().await;
        let mut t = make_trace("t1", "gpt-4o");
        t.prompt_content = "Explain Quantum Computing".to_string();
        insert_trace(&pool, &t).await.unwrap();
        insert_trace(&pool, &make_trace("t2", "gpt-4o")).await.unwrap();

        let found = search_traces(&pool, "quantum", &TraceFilters::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].trace_id, "t1");
    }

    #[tokio::test]
    async fn test_metrics_empty_set_all_zero() {
        let pool = make_pool().await;
        let metrics = compute_metrics(&pool, &TraceFilters::default()).await.unwrap();
        assert_eq!(metrics, TraceMetrics::default());
    }

    #[tokio::test]
    async fn test_metrics_rates_sum_to_hundred() {
        let pool = make_pool().await;
        for i in 0..4 {
            insert_trace(&pool, &make_trace(&format!("s{}", i), "gpt-4o")).await.unwrap();
            complete_trace(&pool, &format!("s{}", i), &completion(TraceStatus::Success), 100, None)
                .await
                .unwrap();
        }
        insert_trace(&pool, &make_trace("e1", "gpt-4o")).await.unwrap();
        let mut err = completion(TraceStatus::Error);
        err.error_code = Some("GENERATION_ERROR".to_string());
        complete_trace(&pool, "e1", &err, 100, None).await.unwrap();

        let metrics = compute_metrics(&pool, &TraceFilters::default()).await.unwrap();
        assert_eq!(metrics.total_traces, 5);
        assert_eq!(metrics.successful_traces, 4);
        assert_eq!(metrics.error_traces, 1);
        let success_rate = metrics.successful_traces as f64 / metrics.total_traces as f64 * 100.0;
        assert!((metrics.error_rate + success_rate - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_live_traces_window() {
        let pool = make_pool().await;
        let now = chrono::Utc::now().timestamp_millis();

        // Active inside window
        insert_trace(&pool, &make_trace("active", "gpt-4o")).await.unwrap();
        // Completed inside window
        insert_trace(&pool, &make_trace("done", "gpt-4o")).await.unwrap();
        complete_trace(&pool, "done", &completion(TraceStatus::Success), 500, None)
            .await
            .unwrap();
        // Old pending trace outside window
        let mut old = make_trace("old", "gpt-4o");
        old.start_time = now - 10 * 60 * 1000;
        insert_trace(&pool, &old).await.unwrap();

        let snapshot = live_traces(&pool, now - 5 * 60 * 1000).await.unwrap();
        assert_eq!(snapshot.active_count, 1);
        assert_eq!(snapshot.active_traces[0].trace_id, "active");
        assert_eq!(snapshot.error_rate, 0.0);
    }
}
