//! Sentinel markers carried inline in the logical text stream.
//!
//! Stream decoders emit these; the tag state machine consumes them.

use crate::usage::TokenUsage;

/// Prefix for a chunk of thinking text.
pub const THINKING_PREFIX: &str = "__THINKING__";
/// Marks the end of the thinking phase.
pub const END_THINKING: &str = "__END_THINKING__";
/// Legacy literal that opens the thinking phase.
pub const LEGACY_THINKING_OPEN: &str = "<thinking>";
/// Legacy literal that closes the thinking phase.
pub const LEGACY_THINKING_CLOSE: &str = "</thinking>";
/// Prefix for a JSON token-usage record.
pub const TOKEN_USAGE_PREFIX: &str = "__TOKEN_USAGE__";
/// Opens an inline thinking summary.
pub const SUMMARY_OPEN: &str = "<thinking_summary>";
/// Closes an inline thinking summary.
pub const SUMMARY_CLOSE: &str = "</thinking_summary>";

/// Wrap text as a thinking chunk.
#[must_use]
pub fn thinking(text: &str) -> String {
    format!("{THINKING_PREFIX}{text}")
}

/// Encode usage as a sentinel chunk.
#[must_use]
pub fn token_usage(usage: &TokenUsage) -> String {
    let json = serde_json::to_string(usage).unwrap_or_else(|_| "{}".to_string());
    format!("{TOKEN_USAGE_PREFIX}{json}")
}
