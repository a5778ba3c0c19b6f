//! Sanitizing values before they reach the tool-activity log.
//!
//! Masks anything that looks like a credential and keeps long strings short.
//! Lengths are measured in characters, so multi-byte text is never split
//! mid-codepoint.

use serde_json::{Map, Value};

/// Replacement for anything that looks like a secret.
pub const REDACTED: &str = "[redacted]";

/// Appended to strings that were cut short.
pub const TRUNCATED: &str = "… [truncated]";

/// Strings longer than this are truncated.
pub const MAX_PASSTHROUGH_CHARS: usize = 300;

/// Characters kept from a truncated string.
pub const TRUNCATE_TO_CHARS: usize = 120;

/// Substrings that mark a string value as secret.
const SENSITIVE_VALUE_MARKERS: &[&str] = &["api_key", "token", "secret", "password"];

/// Substrings that mark an object key as holding a secret.
const SENSITIVE_KEY_MARKERS: &[&str] = &["key", "token", "secret", "password"];

/// Recursively sanitize a structured value for logging.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::String(s) => redact_str(s),
        Value::Object(map) => {
            let redacted: Map<String, Value> = map
                .iter()
                .map(|(k, v)| {
                    let v = if is_sensitive_key(k) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact(v)
                    };
                    (k.clone(), v)
                })
                .collect();
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Sanitize a single string scalar.
pub fn redact_str(s: &str) -> Value {
    let lower = s.to_lowercase();
    if SENSITIVE_VALUE_MARKERS.iter().any(|m| lower.contains(m)) {
        return Value::String(REDACTED.to_string());
    }

    if s.chars().count() <= MAX_PASSTHROUGH_CHARS {
        Value::String(s.to_string())
    } else {
        let head: String = s.chars().take(TRUNCATE_TO_CHARS).collect();
        Value::String(format!("{}{}", head, TRUNCATED))
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEY_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_short_string_passes_through() {
        assert_eq!(redact_str("Louvre opening hours"), json!("Louvre opening hours"));
    }

    #[test]
    fn test_sensitive_string_is_masked() {
        assert_eq!(redact_str("my API_KEY is abc"), json!(REDACTED));
        assert_eq!(redact_str("Bearer token xyz"), json!(REDACTED));
        assert_eq!(redact_str("PassWord=hunter2"), json!(REDACTED));
    }

    #[test]
    fn test_long_string_is_truncated() {
        let long = "a".repeat(301);
        let out = redact_str(&long);
        let out = out.as_str().unwrap();
        assert_eq!(out, format!("{}{}", "a".repeat(120), TRUNCATED));
        assert!(out.starts_with(&long[..120]));
    }

    #[test]
    fn test_boundary_length_is_kept() {
        let exact = "b".repeat(300);
        assert_eq!(redact_str(&exact), json!(exact));
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let long = "é".repeat(400);
        let out = redact_str(&long);
        let out = out.as_str().unwrap();
        let head: String = out.chars().take(120).collect();
        assert_eq!(head, "é".repeat(120));
        assert_eq!(out.chars().count(), 120 + TRUNCATED.chars().count());
    }

    #[test]
    fn test_sensitive_keys_mask_any_value() {
        let value = json!({
            "query": "museums in Paris",
            "X-Api-Key": "visible-looking",
            "refresh_Token": {"nested": "whatever"},
            "SECRET_sauce": 42,
            "user_password": null,
        });
        let out = redact(&value);
        assert_eq!(out["query"], json!("museums in Paris"));
        assert_eq!(out["X-Api-Key"], json!(REDACTED));
        assert_eq!(out["refresh_Token"], json!(REDACTED));
        assert_eq!(out["SECRET_sauce"], json!(REDACTED));
        assert_eq!(out["user_password"], json!(REDACTED));
    }

    #[test]
    fn test_arrays_and_nesting_recurse_in_order() {
        let long = "z".repeat(500);
        let value = json!([
            "plain",
            {"inner": ["secret stuff", long]},
            7,
            true
        ]);
        let out = redact(&value);
        assert_eq!(out[0], json!("plain"));
        assert_eq!(out[1]["inner"][0], json!(REDACTED));
        assert_eq!(
            out[1]["inner"][1],
            json!(format!("{}{}", "z".repeat(120), TRUNCATED))
        );
        assert_eq!(out[2], json!(7));
        assert_eq!(out[3], json!(true));
    }
}
