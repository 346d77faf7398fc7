//! Typed stream messages
//!
//! The orchestrator converts every internal outcome into one of these
//! messages; nothing below it leaks raw errors across the channel. Each
//! message carries the trace id for client-side correlation.

use serde::Serialize;

use crate::data::types::{CostBreakdown, TokenUsage};

/// Error codes attached to trace rows and error messages
pub mod error_codes {
    /// Invalid model/parameters/prompt, rejected before any provider call
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    /// The provider returned an error response
    pub const GENERATION_ERROR: &str = "GENERATION_ERROR";
    /// Unexpected failure during streaming
    pub const GENERATION_EXCEPTION: &str = "GENERATION_EXCEPTION";
}

/// Generic client-facing message for internal exceptions. The specific
/// cause is captured on the trace event, never sent to the client.
pub const GENERIC_ERROR_MESSAGE: &str =
    "An unexpected error occurred while generating. Please try again.";

/// One typed message on the generation stream
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Emitted immediately after the channel opens, before any content
    Connected {
        trace_id: String,
        session_id: String,
    },
    Token {
        trace_id: String,
        token: String,
        index: usize,
    },
    /// Structured parse succeeded on the assembled content
    Structured {
        trace_id: String,
        output: serde_json::Value,
    },
    /// Structured parse failed; the raw content is still the result
    ParseError {
        trace_id: String,
        errors: Vec<String>,
    },
    Complete {
        trace_id: String,
        content: String,
        usage: TokenUsage,
        cost: CostBreakdown,
        duration_ms: i64,
        tokens_per_second: Option<f64>,
    },
    Error {
        trace_id: String,
        code: String,
        message: String,
    },
}

impl StreamMessage {
    /// SSE event name for this message
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Token { .. } => "token",
            Self::Structured { .. } => "structured",
            Self::ParseError { .. } => "parse_error",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_serialize_with_type_tag() {
        let msg = StreamMessage::Connected {
            trace_id: "t1".to_string(),
            session_id: "s1".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "connected");
        assert_eq!(json["data"]["trace_id"], "t1");
    }

    #[test]
    fn test_error_message_carries_trace_id() {
        let msg = StreamMessage::Error {
            trace_id: "t1".to_string(),
            code: error_codes::VALIDATION_ERROR.to_string(),
            message: "max_tokens must be between 1 and 32768, got -1".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["data"]["trace_id"], "t1");
        assert_eq!(json["data"]["code"], "VALIDATION_ERROR");
    }

    #[test]
    fn test_event_names_match_wire_contract() {
        let msg = StreamMessage::ParseError {
            trace_id: "t".to_string(),
            errors: vec![],
        };
        assert_eq!(msg.event_name(), "parse_error");
    }
}
