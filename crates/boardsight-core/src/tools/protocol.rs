//! Tool-call protocol parser
//!
//! The system prompt instructs the model to reply with either a bare
//! JSON object `{"tool": "...", "params": {...}}` or plain prose,
//! never both. Models routinely wrap the JSON in explanatory text
//! anyway, so extraction first tries the whole response and then
//! scans for an embedded call object. Anything else is prose and is
//! treated as the final answer by the caller.

use std::sync::LazyLock;

use regex::Regex;

use super::RawToolCall;

/// Matches one call object with a single flat params object, anywhere
/// in surrounding prose.
static EMBEDDED_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\{\s*"tool"\s*:\s*"[^"]+"\s*,\s*"params"\s*:\s*\{[^{}]*\}\s*\}"#)
        .expect("embedded call pattern is valid")
});

/// Extract a tool invocation from raw model output.
///
/// Returns `None` when the text contains no parsable call, in which
/// case the text is the model's final answer.
pub fn extract_tool_call(text: &str) -> Option<RawToolCall> {
    let trimmed = text.trim();

    // Whole response is the call object
    if let Ok(call) = serde_json::from_str::<RawToolCall>(trimmed) {
        return Some(call);
    }

    // Call object embedded in prose
    EMBEDDED_CALL
        .find(text)
        .and_then(|m| serde_json::from_str(m.as_str()).ok())
}
