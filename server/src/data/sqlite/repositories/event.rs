//! Trace event repository
//!
//! Append-only event log per trace. Sequence numbers are assigned by
//! reading the current maximum and incrementing - not atomic under
//! concurrent writers to the same trace. Reads order by
//! `(sequence_number, timestamp)` so a duplicate number still renders
//! deterministically.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::data::sqlite::SqliteError;
use crate::data::types::{TraceEventRecord, TraceEventType};

/// Append an event to a trace's log.
///
/// When `sequence_number` is `None`, the next number is derived from the
/// stored maximum for the trace.
pub async fn append_event(
    pool: &SqlitePool,
    trace_id: &str,
    event_type: TraceEventType,
    event_data: Option<&serde_json::Value>,
    sequence_number: Option<i64>,
) -> Result<TraceEventRecord, SqliteError> {
    let sequence_number = match sequence_number {
        Some(n) => n,
        None => next_sequence_number(pool, trace_id).await?,
    };

    let record = TraceEventRecord {
        event_id: Uuid::new_v4().to_string(),
        trace_id: trace_id.to_string(),
        event_type,
        event_data: event_data.cloned(),
        timestamp: chrono::Utc::now().timestamp_millis(),
        sequence_number,
    };

    sqlx::query(
        r#"
        INSERT INTO trace_events (event_id, trace_id, event_type, event_data, timestamp, sequence_number)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.event_id)
    .bind(&record.trace_id)
    .bind(record.event_type.as_str())
    .bind(record.event_data.as_ref().map(|v| v.to_string()))
    .bind(record.timestamp)
    .bind(record.sequence_number)
    .execute(pool)
    .await?;

    Ok(record)
}

/// All events for a trace in display order
pub async fn list_events(
    pool: &SqlitePool,
    trace_id: &str,
) -> Result<Vec<TraceEventRecord>, SqliteError> {
    let rows = sqlx::query(
        r#"
        SELECT event_id, trace_id, event_type, event_data, timestamp, sequence_number
        FROM trace_events
        WHERE trace_id = ?
        ORDER BY sequence_number ASC, timestamp ASC
        "#,
    )
    .bind(trace_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_event).collect()
}

async fn next_sequence_number(pool: &SqlitePool, trace_id: &str) -> Result<i64, SqliteError> {
    let max: Option<i64> =
        sqlx::query_scalar("SELECT MAX(sequence_number) FROM trace_events WHERE trace_id = ?")
            .bind(trace_id)
            .fetch_one(pool)
            .await?;
    Ok(max.unwrap_or(0) + 1)
}

fn row_to_event(row: &SqliteRow) -> Result<TraceEventRecord, SqliteError> {
    let type_raw: String = row.try_get("event_type")?;
    let event_type = TraceEventType::parse(&type_raw).ok_or_else(|| SqliteError::InvalidValue {
        column: "event_type",
        value: type_raw.clone(),
    })?;

    let event_data: Option<String> = row.try_get("event_data")?;
    let event_data = event_data.and_then(|raw| serde_json::from_str(&raw).ok());

    Ok(TraceEventRecord {
        event_id: row.try_get("event_id")?,
        trace_id: row.try_get("trace_id")?,
        event_type,
        event_data,
        timestamp: row.try_get("timestamp")?,
        sequence_number: row.try_get("sequence_number")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SqliteService;
    use crate::data::sqlite::repositories::trace::insert_trace;
    use crate::data::types::{NewTrace, TraceSource};

    async fn make_pool_with_trace(trace_id: &str) -> SqlitePool {
        let pool = SqliteService::init_in_memory().await.unwrap().pool().clone();
        let trace = NewTrace {
            trace_id: trace_id.to_string(),
            parent_trace_id: None,
            session_id: "s".to_string(),
            user_id: "u".to_string(),
            prompt_id: None,
            source: TraceSource::Test,
            model_id: "test-model".to_string(),
            prompt_content: "p".to_string(),
            system_prompt: None,
            parameters: None,
            start_time: chrono::Utc::now().timestamp_millis(),
            user_agent: None,
            ip_address: None,
        };
        insert_trace(&pool, &trace).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_sequence_numbers_are_monotonic() {
        let pool = make_pool_with_trace("t1").await;

        let e1 = append_event(&pool, "t1", TraceEventType::Start, None, None)
            .await
            .unwrap();
        let e2 = append_event(&pool, "t1", TraceEventType::Token, None, None)
            .await
            .unwrap();
        let e3 = append_event(&pool, "t1", TraceEventType::Complete, None, None)
            .await
            .unwrap();

        assert_eq!(e1.sequence_number, 1);
        assert_eq!(e2.sequence_number, 2);
        assert_eq!(e3.sequence_number, 3);
    }

    #[tokio::test]
    async fn test_explicit_sequence_number_is_honored() {
        let pool = make_pool_with_trace("t1").await;

        let e = append_event(&pool, "t1", TraceEventType::Start, None, Some(42))
            .await
            .unwrap();
        assert_eq!(e.sequence_number, 42);

        // Next implicit number continues from the stored max
        let next = append_event(&pool, "t1", TraceEventType::Token, None, None)
            .await
            .unwrap();
        assert_eq!(next.sequence_number, 43);
    }

    #[tokio::test]
    async fn test_list_events_ordered_with_payload() {
        let pool = make_pool_with_trace("t1").await;

        append_event(
            &pool,
            "t1",
            TraceEventType::Start,
            Some(&serde_json::json!({"model": "test-model"})),
            None,
        )
        .await
        .unwrap();
        append_event(
            &pool,
            "t1",
            TraceEventType::UserAction,
            Some(&serde_json::json!({"action": "cancel", "tokens": 7})),
            None,
        )
        .await
        .unwrap();

        let events = list_events(&pool, "t1").await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, TraceEventType::Start);
        assert_eq!(events[1].event_type, TraceEventType::UserAction);
        assert_eq!(
            events[1].event_data.as_ref().unwrap()["action"],
            serde_json::json!("cancel")
        );
    }

    #[tokio::test]
    async fn test_events_isolated_per_trace() {
        let pool = make_pool_with_trace("t1").await;
        let trace2 = NewTrace {
            trace_id: "t2".to_string(),
            parent_trace_id: None,
            session_id: "s".to_string(),
            user_id: "u".to_string(),
            prompt_id: None,
            source: TraceSource::Test,
            model_id: "test-model".to_string(),
            prompt_content: "p".to_string(),
            system_prompt: None,
            parameters: None,
            start_time: chrono::Utc::now().timestamp_millis(),
            user_agent: None,
            ip_address: None,
        };
        insert_trace(&pool, &trace2).await.unwrap();

        append_event(&pool, "t1", TraceEventType::Start, None, None)
            .await
            .unwrap();
        let e = append_event(&pool, "t2", TraceEventType::Start, None, None)
            .await
            .unwrap();

        // Each trace gets its own counter
        assert_eq!(e.sequence_number, 1);
        assert_eq!(list_events(&pool, "t2").await.unwrap().len(), 1);
    }
}
