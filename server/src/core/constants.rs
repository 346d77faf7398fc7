// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "Tracedeck";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "tracedeck";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".tracedeck";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "TRACEDECK_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "TRACEDECK_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "TRACEDECK_LOG";

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "TRACEDECK_DATA_DIR";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5931;

// =============================================================================
// Environment Variables - Provider
// =============================================================================

/// Environment variable for the provider backend (`openai` or `simulated`)
pub const ENV_PROVIDER_BACKEND: &str = "TRACEDECK_PROVIDER_BACKEND";

/// Environment variable for the provider base URL (OpenAI-compatible)
pub const ENV_PROVIDER_BASE_URL: &str = "TRACEDECK_PROVIDER_BASE_URL";

/// Environment variable for the provider API key
pub const ENV_PROVIDER_API_KEY: &str = "TRACEDECK_PROVIDER_API_KEY";

/// Default OpenAI-compatible base URL
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.openai.com/v1";

/// Provider request timeout in seconds
pub const PROVIDER_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// Environment Variables - Observability Mirror
// =============================================================================

/// Environment variable to enable the third-party observability mirror
pub const ENV_MIRROR_ENABLED: &str = "TRACEDECK_MIRROR_ENABLED";

/// Environment variable for the mirror ingestion endpoint
pub const ENV_MIRROR_URL: &str = "TRACEDECK_MIRROR_URL";

/// Environment variable for the mirror API key
pub const ENV_MIRROR_API_KEY: &str = "TRACEDECK_MIRROR_API_KEY";

/// Mirror request timeout in seconds (fire-and-forget, keep short)
pub const MIRROR_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// SQLite Database
// =============================================================================

/// SQLite database filename
pub const SQLITE_DB_FILENAME: &str = "tracedeck.db";

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// SQLite cache size (negative = KB, so -64000 = 64MB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

/// SQLite WAL auto-checkpoint threshold (pages, ~4MB at 1000)
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// WAL checkpoint interval in seconds (5 minutes)
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Trace Registry (in-memory context store)
// =============================================================================

/// Grace period before a completed trace context is evicted (late reads)
pub const TRACE_GRACE_PERIOD_SECS: u64 = 60;

/// Grace period before a finished span is evicted
pub const SPAN_GRACE_PERIOD_SECS: u64 = 30;

/// Absolute max age for any registry entry (leaked-entry safety net)
pub const REGISTRY_MAX_AGE_SECS: u64 = 30 * 60;

/// Registry sweep interval in seconds (5 minutes)
pub const REGISTRY_SWEEP_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Streaming
// =============================================================================

/// Pacing delay between simulated tokens when the provider cannot stream
pub const SIMULATED_TOKEN_DELAY_MS: u64 = 30;

/// A persisted `token` progress event is written every Nth token
pub const TOKEN_EVENT_SAMPLE_RATE: usize = 10;

/// Estimated characters per token when the provider reports no usage
pub const ESTIMATED_CHARS_PER_TOKEN: usize = 4;

/// SSE keep-alive interval in seconds
pub const SSE_KEEP_ALIVE_SECS: u64 = 30;

/// Live feed broadcast channel capacity
pub const LIVE_FEED_CHANNEL_CAPACITY: usize = 1024;

// =============================================================================
// Query Defaults
// =============================================================================

/// Default page size for trace listing
pub const DEFAULT_TRACE_LIMIT: u32 = 50;

/// Maximum page size for trace listing
pub const MAX_TRACE_LIMIT: u32 = 500;

/// Window for live/active trace snapshots (5 minutes)
pub const LIVE_WINDOW_SECS: i64 = 300;

// =============================================================================
// Analytics Thresholds
// =============================================================================

/// Letter-grade boundaries: (max error rate %, max avg duration ms, max avg latency ms)
pub const GRADE_A: (f64, f64, f64) = (1.0, 2000.0, 500.0);
pub const GRADE_B: (f64, f64, f64) = (5.0, 5000.0, 1000.0);
pub const GRADE_C: (f64, f64, f64) = (10.0, 10_000.0, 2000.0);
pub const GRADE_D: (f64, f64, f64) = (20.0, 20_000.0, 5000.0);

/// Error-rate threshold for a reliability recommendation (%)
pub const RECOMMEND_ERROR_RATE_PCT: f64 = 5.0;

/// Average-duration threshold for a performance recommendation (ms)
pub const RECOMMEND_DURATION_MS: f64 = 10_000.0;

/// First-token latency threshold for a latency recommendation (ms)
pub const RECOMMEND_LATENCY_MS: f64 = 2000.0;

/// Streaming-adoption threshold for a streaming recommendation (%)
pub const RECOMMEND_STREAMING_PCT: f64 = 50.0;

/// Dashboard alert threshold: error rate (%)
pub const ALERT_ERROR_RATE_PCT: f64 = 10.0;

/// Dashboard alert threshold: average latency (ms)
pub const ALERT_AVG_LATENCY_MS: f64 = 5000.0;

/// Trend classification band: a half-over-half change beyond this
/// fraction is labeled increasing/decreasing (the system-wide ±10% convention)
pub const TREND_BAND: f64 = 0.10;

/// Top-N prompts surfaced by average quality in insights
pub const INSIGHTS_TOP_PROMPTS: usize = 10;

// =============================================================================
// Aggregation
// =============================================================================

/// Environment variable for the aggregation interval (minutes, 0 = disabled)
pub const ENV_AGGREGATION_INTERVAL_MINUTES: &str = "TRACEDECK_AGGREGATION_INTERVAL_MINUTES";

/// Default aggregation interval in minutes
pub const DEFAULT_AGGREGATION_INTERVAL_MINUTES: u64 = 60;

/// Quality distribution bucket boundaries on the 0-1 scale.
/// Note: the trace viewer grades quality on a 0-5 scale; these buckets
/// intentionally keep the aggregator's original 0-1 boundaries.
pub const QUALITY_EXCELLENT: f64 = 0.9;
pub const QUALITY_GOOD: f64 = 0.7;
pub const QUALITY_FAIR: f64 = 0.5;

/// Number of most-frequent error codes kept per model statistics row
pub const TOP_ERROR_CODES: usize = 5;

/// Naive growth factor applied to the cost-summary forecast field
pub const COST_FORECAST_GROWTH: f64 = 1.10;

// =============================================================================
// Cost Optimizer Heuristics
// =============================================================================

/// Environment variable for the daily budget (USD)
pub const ENV_DAILY_BUDGET_USD: &str = "TRACEDECK_DAILY_BUDGET_USD";

/// Default daily budget in USD (placeholder business constant)
pub const DEFAULT_DAILY_BUDGET_USD: f64 = 100.0;

/// Savings above this are high impact (USD)
pub const IMPACT_HIGH_USD: f64 = 500.0;

/// Savings above this are medium impact (USD)
pub const IMPACT_MEDIUM_USD: f64 = 200.0;

/// Number of most/least expensive models compared for switch suggestions
pub const MODEL_SWITCH_CANDIDATES: usize = 3;

/// A cheaper model must retain this fraction of the expensive model's quality
pub const MODEL_SWITCH_QUALITY_FLOOR: f64 = 0.90;

/// A cheaper model must retain this fraction of the expensive model's throughput
pub const MODEL_SWITCH_PERFORMANCE_FLOOR: f64 = 0.80;

/// Assumed savings fraction when swapping off the most expensive model
pub const MODEL_SWAP_SAVINGS: f64 = 0.30;

/// A user responsible for more than this share of spend gets flagged
pub const HEAVY_USER_SPEND_SHARE: f64 = 0.10;

/// Assumed savings fraction from workflow optimization for heavy users
pub const HEAVY_USER_SAVINGS: f64 = 0.20;

/// Prompt-signature buckets of at least this size suggest batching
pub const BATCH_MIN_OCCURRENCES: usize = 10;

/// Assumed savings fraction from batch processing
pub const BATCH_SAVINGS: f64 = 0.15;

/// Batch-processing suggestion threshold on period spend (USD)
pub const BATCH_SUGGEST_TOTAL_USD: f64 = 1000.0;

/// Forecast confidence clamp bounds
pub const FORECAST_CONFIDENCE_MIN: f64 = 0.3;
pub const FORECAST_CONFIDENCE_MAX: f64 = 0.95;

/// Days of history consumed by the cost forecast by default
pub const FORECAST_HISTORY_DAYS: i64 = 30;

/// Spend-spike multiple over the trailing 7-day average
pub const SPIKE_MULTIPLE: f64 = 2.0;

/// A single model above this share of a day's spend gets flagged
pub const MODEL_CONCENTRATION_SHARE: f64 = 0.50;

// =============================================================================
// Evaluation
// =============================================================================

/// Fallback score when an LLM judge returns unparseable output
pub const EVAL_FALLBACK_SCORE: f64 = 0.5;

/// Penalty per harmful-content pattern match
pub const SAFETY_HARMFUL_PENALTY: f64 = 0.3;

/// Penalty per sensitive-topic match without a disclaimer
pub const SAFETY_SENSITIVE_PENALTY: f64 = 0.15;

/// Penalty for responses under the minimum length
pub const SAFETY_SHORT_PENALTY: f64 = 0.1;

/// Responses shorter than this many characters are penalized
pub const SAFETY_MIN_RESPONSE_LEN: usize = 10;

// =============================================================================
// Correlation Headers
// =============================================================================

/// Trace id request/response header
pub const HEADER_TRACE_ID: &str = "x-trace-id";

/// Session id request/response header
pub const HEADER_SESSION_ID: &str = "x-session-id";

/// Parent trace id request header
pub const HEADER_PARENT_TRACE_ID: &str = "x-parent-trace-id";

/// User id request header (auth is an external concern)
pub const HEADER_USER_ID: &str = "x-user-id";

/// Default user id when no header is supplied
pub const DEFAULT_USER_ID: &str = "local";

// =============================================================================
// Request Body Limits
// =============================================================================

/// Default body limit for API requests (1 MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

// =============================================================================
// Shutdown
// =============================================================================

/// Graceful shutdown timeout in seconds (5 minutes)
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 300;
