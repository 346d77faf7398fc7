//! String utility functions

/// Default maximum length for preview text (in characters)
pub const PREVIEW_MAX_LENGTH: usize = 200;

/// Words shorter than this are not "significant" for prompt signatures
const SIGNIFICANT_WORD_MIN_LEN: usize = 4;

/// Number of words kept in a prompt signature
const SIGNATURE_WORD_COUNT: usize = 3;

/// Truncate text to max length with ellipsis
pub fn truncate_preview(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.chars().count() > max_len {
        format!("{}...", text.chars().take(max_len).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Crude prompt-pattern signature: the 3 longest significant words,
/// lowercased, kept in original order, joined with spaces.
///
/// Prompts that share a signature are candidates for batch processing;
/// the signature is a grouping key, not a semantic hash.
pub fn prompt_signature(prompt: &str) -> String {
    let words: Vec<&str> = prompt
        .split_whitespace()
        .filter(|w| w.chars().count() >= SIGNIFICANT_WORD_MIN_LEN)
        .collect();

    // Pick the longest words, then restore original order
    let mut indexed: Vec<(usize, &str)> = words.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.chars().count().cmp(&a.1.chars().count()));
    let mut top: Vec<(usize, &str)> = indexed.into_iter().take(SIGNATURE_WORD_COUNT).collect();
    top.sort_by_key(|(i, _)| *i);

    top.iter()
        .map(|(_, w)| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
