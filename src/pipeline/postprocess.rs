//! Validation and extraction applied to backend responses

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const CODE_BLOCK_PATTERN: &str = r"```([a-zA-Z0-9_+-]*)\n((?s:.*?))```";

// `None` only if the constant pattern fails to compile
static CODE_BLOCK: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(CODE_BLOCK_PATTERN).ok());

/// First fenced block in `text`: `(language tag, body)`
pub fn extract_first_code_block(text: &str) -> Option<(&str, &str)> {
    let pattern = CODE_BLOCK.as_ref()?;
    pattern.captures(text).and_then(|caps| {
        let lang = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        caps.get(2).map(|body| (lang, body.as_str()))
    })
}

/// Text stored as the summary.
///
/// The trimmed response is kept verbatim when it is a JSON object. Failing
/// that, the body of the first fenced block is tried. Anything else is
/// wrapped as `{"raw": <response>}`.
pub fn normalize_summary(text: &str) -> String {
    let trimmed = text.trim();
    if is_json_object(trimmed) {
        return trimmed.to_string();
    }

    if let Some((_, body)) = extract_first_code_block(text) {
        let body = body.trim();
        if is_json_object(body) {
            return body.to_string();
        }
    }

    serde_json::json!({ "raw": text }).to_string()
}

/// Rewritten file content: the first fenced block, or the whole response
pub fn extract_rewrite(text: &str) -> &str {
    extract_first_code_block(text)
        .map(|(_, body)| body)
        .unwrap_or(text)
}

fn is_json_object(text: &str) -> bool {
    matches!(serde_json::from_str::<Value>(text), Ok(Value::Object(_)))
}
