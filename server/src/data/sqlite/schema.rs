//! SQLite schema definitions
//!
//! Initial schema with all tables. Timestamps are stored as epoch
//! milliseconds; JSON columns hold serialized maps/arrays.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Traces (one row per AI interaction)
-- =============================================================================
CREATE TABLE IF NOT EXISTS traces (
    trace_id TEXT PRIMARY KEY,
    parent_trace_id TEXT,
    session_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    prompt_id TEXT,
    source TEXT NOT NULL CHECK(source IN ('playground', 'api', 'test')),
    model_id TEXT NOT NULL,
    prompt_content TEXT NOT NULL,
    system_prompt TEXT,
    parameters TEXT,
    response_content TEXT,
    input_tokens INTEGER,
    output_tokens INTEGER,
    total_tokens INTEGER,
    input_cost REAL,
    output_cost REAL,
    total_cost REAL,
    start_time INTEGER NOT NULL,
    end_time INTEGER,
    duration_ms INTEGER,
    first_token_latency_ms INTEGER,
    tokens_per_second REAL,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK(status IN ('pending', 'streaming', 'success', 'error', 'cancelled')),
    error_message TEXT,
    error_code TEXT,
    quality_score REAL,
    user_rating INTEGER,
    mirror_trace_id TEXT,
    mirror_observation_id TEXT,
    user_agent TEXT,
    ip_address TEXT,
    trace_version INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_traces_status_start ON traces(status, start_time);
CREATE INDEX IF NOT EXISTS idx_traces_start ON traces(start_time);
CREATE INDEX IF NOT EXISTS idx_traces_user ON traces(user_id, start_time);
CREATE INDEX IF NOT EXISTS idx_traces_model ON traces(model_id, start_time);
CREATE INDEX IF NOT EXISTS idx_traces_session ON traces(session_id);
CREATE INDEX IF NOT EXISTS idx_traces_prompt ON traces(prompt_id) WHERE prompt_id IS NOT NULL;

-- =============================================================================
-- 2. Trace Events (append-only, ordered by sequence_number per trace)
-- =============================================================================
CREATE TABLE IF NOT EXISTS trace_events (
    event_id TEXT PRIMARY KEY,
    trace_id TEXT NOT NULL REFERENCES traces(trace_id) ON DELETE CASCADE,
    event_type TEXT NOT NULL
        CHECK(event_type IN ('start', 'token', 'structured', 'error', 'complete', 'user_action')),
    event_data TEXT,
    timestamp INTEGER NOT NULL,
    sequence_number INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_trace_events_trace ON trace_events(trace_id, sequence_number);

-- =============================================================================
-- 3. Daily usage rollup (per user x model x day)
-- =============================================================================
CREATE TABLE IF NOT EXISTS usage_analytics_daily (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    day TEXT NOT NULL,
    user_id TEXT NOT NULL,
    model_id TEXT NOT NULL,
    request_count INTEGER NOT NULL DEFAULT 0,
    total_tokens INTEGER NOT NULL DEFAULT 0,
    total_cost REAL NOT NULL DEFAULT 0,
    error_count INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE(day, user_id, model_id)
);

CREATE INDEX IF NOT EXISTS idx_usage_daily_day ON usage_analytics_daily(day);

-- =============================================================================
-- 4. Model usage statistics (per model x period)
-- =============================================================================
CREATE TABLE IF NOT EXISTS model_usage_statistics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model_id TEXT NOT NULL,
    period_type TEXT NOT NULL CHECK(period_type IN ('hour', 'day', 'week', 'month')),
    period_start INTEGER NOT NULL,
    period_end INTEGER NOT NULL,
    request_count INTEGER NOT NULL DEFAULT 0,
    success_count INTEGER NOT NULL DEFAULT 0,
    error_count INTEGER NOT NULL DEFAULT 0,
    error_rate REAL NOT NULL DEFAULT 0,
    avg_response_time_ms REAL NOT NULL DEFAULT 0,
    avg_tokens_per_second REAL NOT NULL DEFAULT 0,
    total_tokens INTEGER NOT NULL DEFAULT 0,
    total_cost REAL NOT NULL DEFAULT 0,
    cost_per_token REAL NOT NULL DEFAULT 0,
    cost_per_request REAL NOT NULL DEFAULT 0,
    quality_excellent INTEGER NOT NULL DEFAULT 0,
    quality_good INTEGER NOT NULL DEFAULT 0,
    quality_fair INTEGER NOT NULL DEFAULT 0,
    quality_poor INTEGER NOT NULL DEFAULT 0,
    top_error_codes TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE(model_id, period_type, period_start)
);

-- =============================================================================
-- 5. Cost analysis summary (per period)
-- =============================================================================
CREATE TABLE IF NOT EXISTS cost_analysis_summary (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    period_type TEXT NOT NULL CHECK(period_type IN ('hour', 'day', 'week', 'month')),
    period_start INTEGER NOT NULL,
    period_end INTEGER NOT NULL,
    total_cost REAL NOT NULL DEFAULT 0,
    total_requests INTEGER NOT NULL DEFAULT 0,
    total_tokens INTEGER NOT NULL DEFAULT 0,
    model_costs TEXT,
    user_costs TEXT,
    optimization_recommendations TEXT,
    forecast_next_period REAL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE(period_type, period_start)
);

-- =============================================================================
-- 6. User activity metrics (per user x day)
-- =============================================================================
CREATE TABLE IF NOT EXISTS user_activity_metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    day TEXT NOT NULL,
    request_count INTEGER NOT NULL DEFAULT 0,
    total_cost REAL NOT NULL DEFAULT 0,
    distinct_models INTEGER NOT NULL DEFAULT 0,
    favorite_model TEXT,
    peak_usage_hour INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE(user_id, day)
);

-- =============================================================================
-- 7. Prompt performance trends (per prompt x day)
-- =============================================================================
CREATE TABLE IF NOT EXISTS prompt_performance_trends (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    prompt_id TEXT NOT NULL,
    day TEXT NOT NULL,
    use_count INTEGER NOT NULL DEFAULT 0,
    unique_users INTEGER NOT NULL DEFAULT 0,
    total_cost REAL NOT NULL DEFAULT 0,
    avg_duration_ms REAL NOT NULL DEFAULT 0,
    success_rate REAL NOT NULL DEFAULT 0,
    avg_quality REAL,
    model_usage TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE(prompt_id, day)
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::assertions_on_constants)]
    fn test_schema_version_is_positive() {
        assert!(SCHEMA_VERSION > 0);
    }

    #[test]
    fn test_schema_contains_required_tables() {
        let required_tables = [
            "schema_version",
            "schema_migrations",
            "traces",
            "trace_events",
            "usage_analytics_daily",
            "model_usage_statistics",
            "cost_analysis_summary",
            "user_activity_metrics",
            "prompt_performance_trends",
        ];

        for table in required_tables {
            assert!(
                SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table)),
                "Schema missing table: {}",
                table
            );
        }
    }

    #[test]
    fn test_rollup_tables_have_natural_keys() {
        // Upsert idempotence depends on these unique constraints
        assert!(SCHEMA.contains("UNIQUE(day, user_id, model_id)"));
        assert!(SCHEMA.contains("UNIQUE(model_id, period_type, period_start)"));
        assert!(SCHEMA.contains("UNIQUE(period_type, period_start)"));
        assert!(SCHEMA.contains("UNIQUE(user_id, day)"));
        assert!(SCHEMA.contains("UNIQUE(prompt_id, day)"));
    }

    #[test]
    fn test_trace_status_constraint_covers_lifecycle() {
        assert!(
            SCHEMA
                .contains("CHECK(status IN ('pending', 'streaming', 'success', 'error', 'cancelled'))")
        );
    }
}
