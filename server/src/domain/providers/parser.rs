//! Structured-output detection
//!
//! After full content is assembled, the orchestrator may attempt to parse
//! it as structured data. Failure here never fails the trace: the raw
//! content remains the successful result.

use serde::Serialize;

/// Parse result for structured-output requests
#[derive(Debug, Clone, Serialize)]
pub struct ParsedOutput {
    pub is_structured: bool,
    /// "json" when structured, "text" otherwise
    pub kind: &'static str,
    pub data: Option<serde_json::Value>,
    /// Pretty-printed form for display
    pub formatted: Option<String>,
    pub errors: Vec<String>,
}

impl ParsedOutput {
    fn text() -> Self {
        Self {
            is_structured: false,
            kind: "text",
            data: None,
            formatted: None,
            errors: Vec::new(),
        }
    }

    fn json(data: serde_json::Value) -> Self {
        let formatted = serde_json::to_string_pretty(&data).ok();
        Self {
            is_structured: true,
            kind: "json",
            data: Some(data),
            formatted,
            errors: Vec::new(),
        }
    }

    fn failed(error: String) -> Self {
        Self {
            is_structured: false,
            kind: "text",
            data: None,
            formatted: None,
            errors: vec![error],
        }
    }
}

/// Try to interpret generated content as structured output.
///
/// Accepts a bare JSON document or a fenced ```json block; anything else
/// is plain text. A fenced block that fails to parse reports the error.
pub fn parse_structured_output(content: &str) -> ParsedOutput {
    let trimmed = content.trim();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str(trimmed) {
            Ok(data) => ParsedOutput::json(data),
            Err(e) => ParsedOutput::failed(format!("Invalid JSON: {}", e)),
        };
    }

    if let Some(block) = extract_fenced_block(trimmed) {
        return match serde_json::from_str(block.trim()) {
            Ok(data) => ParsedOutput::json(data),
            Err(e) => ParsedOutput::failed(format!("Invalid JSON in fenced block: {}", e)),
        };
    }

    ParsedOutput::text()
}

/// Extract the body of the first ```json (or bare ```) fenced block
fn extract_fenced_block(content: &str) -> Option<&str> {
    let after_fence = content
        .split_once("```json")
        .or_else(|| content.split_once("```"))?
        .1;
    let block = after_fence.split_once("```")?.0;
    Some(block)
}
