//! Request context extraction
//!
//! Correlation and identity travel as headers (`x-trace-id`,
//! `x-session-id`, `x-parent-trace-id`, `x-user-id`) so multi-hop
//! callers can tie traces together. Authentication itself is an external
//! concern; an absent user header falls back to the local user.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::core::constants::{
    DEFAULT_USER_ID, HEADER_PARENT_TRACE_ID, HEADER_SESSION_ID, HEADER_TRACE_ID, HEADER_USER_ID,
};

/// Correlation and identity context for one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: String,
    pub session_id: Option<String>,
    pub trace_id: Option<String>,
    pub parent_trace_id: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    fn header(parts: &Parts, name: &str) -> Option<String> {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            user_id: Self::header(parts, HEADER_USER_ID)
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            session_id: Self::header(parts, HEADER_SESSION_ID),
            trace_id: Self::header(parts, HEADER_TRACE_ID),
            parent_trace_id: Self::header(parts, HEADER_PARENT_TRACE_ID),
            user_agent: Self::header(parts, "user-agent"),
        })
    }
}
