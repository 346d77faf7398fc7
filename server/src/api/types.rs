//! Shared API types
//!
//! Common types used across all API endpoints including error handling,
//! pagination, and time-range parsing.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use validator::ValidationError;

use crate::core::constants::MAX_TRACE_LIMIT;

/// Parse an optional timestamp string parameter (RFC 3339 / ISO 8601 format)
pub fn parse_timestamp_param(s: &Option<String>) -> Result<Option<i64>, ApiError> {
    match s {
        Some(ts) => DateTime::parse_from_rfc3339(ts)
            .map(|dt| Some(dt.with_timezone(&Utc).timestamp_millis()))
            .map_err(|_| {
                ApiError::bad_request(
                    "INVALID_TIMESTAMP",
                    format!("Invalid timestamp format: {}. Use ISO 8601 format.", ts),
                )
            }),
        None => Ok(None),
    }
}

/// Validator function for limit parameter
pub fn validate_limit(limit: u32) -> Result<(), ValidationError> {
    if limit == 0 || limit > MAX_TRACE_LIMIT {
        return Err(ValidationError::new("limit_range")
            .with_message(format!("Limit must be between 1 and {}", MAX_TRACE_LIMIT).into()));
    }
    Ok(())
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn from_sqlite(e: crate::data::SqliteError) -> Self {
        tracing::error!(error = %e, "Database error");
        Self::Internal {
            message: "Database operation failed".to_string(),
        }
    }

    pub fn from_validation(e: validator::ValidationErrors) -> Self {
        Self::BadRequest {
            code: "VALIDATION".to_string(),
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

/// Resolve an optional explicit range or a `days` preset into epoch-ms
/// window bounds, defaulting to the last `default_days` days
pub fn resolve_time_range(
    start: &Option<String>,
    end: &Option<String>,
    days: Option<i64>,
    default_days: i64,
) -> Result<(i64, i64), ApiError> {
    let now = Utc::now().timestamp_millis();
    let end_ms = parse_timestamp_param(end)?.unwrap_or(now);
    let start_ms = match parse_timestamp_param(start)? {
        Some(start_ms) => start_ms,
        None => end_ms - days.unwrap_or(default_days).max(1) * 86_400_000,
    };

    if start_ms >= end_ms {
        return Err(ApiError::bad_request(
            "INVALID_RANGE",
            "start must be before end",
        ));
    }
    Ok((start_ms, end_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_param_valid() {
        let parsed = parse_timestamp_param(&Some("2024-01-01T00:00:00Z".to_string())).unwrap();
        assert_eq!(parsed, Some(1_704_067_200_000));
    }

    #[test]
    fn test_parse_timestamp_param_invalid() {
        assert!(parse_timestamp_param(&Some("nope".to_string())).is_err());
        assert_eq!(parse_timestamp_param(&None).unwrap(), None);
    }

    #[test]
    fn test_validate_limit_bounds() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(MAX_TRACE_LIMIT).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(MAX_TRACE_LIMIT + 1).is_err());
    }

    #[test]
    fn test_resolve_time_range_defaults() {
        let (start, end) = resolve_time_range(&None, &None, None, 7).unwrap();
        assert_eq!(end - start, 7 * 86_400_000);
    }

    #[test]
    fn test_resolve_time_range_days_preset() {
        let (start, end) = resolve_time_range(&None, &None, Some(30), 7).unwrap();
        assert_eq!(end - start, 30 * 86_400_000);
    }

    #[test]
    fn test_resolve_time_range_rejects_inverted() {
        let result = resolve_time_range(
            &Some("2024-02-01T00:00:00Z".to_string()),
            &Some("2024-01-01T00:00:00Z".to_string()),
            None,
            7,
        );
        assert!(result.is_err());
    }
}
