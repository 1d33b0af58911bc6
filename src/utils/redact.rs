use crate::utils::text::truncate_utf8_prefix;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

static SENSITIVE_KEYS: &[&str] = &["token", "jwt", "authorization", "last_active_token"];

static INLINE_REDACTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b")
                .expect("inline redaction regex"),
            INLINE_REDACTION,
        ),
        (
            Regex::new(r"(?i)\b(Bearer)\s+([^\s'\x22]+)").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r#""(jwt|token|session_token)"\s*:\s*"[^"]*""#)
                .expect("inline redaction regex"),
            "\"$1\":\"***REDACTED***\"",
        ),
    ]
});

fn redact_inline_secrets(value: &str, extra: Option<&[String]>) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_REDACTION_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }

    if let Some(values) = extra {
        for raw in values {
            let needle = raw.trim();
            if needle.len() < 6 {
                continue;
            }
            out = out.replace(needle, INLINE_REDACTION);
        }
    }

    out
}

fn truncate_string(value: &str, max_length: usize) -> String {
    if max_length == usize::MAX || value.len() <= max_length {
        return value.to_string();
    }
    format!("{}...", truncate_utf8_prefix(value, max_length))
}

/// Scrubs bearer credentials and JWT-shaped strings before text reaches the diagnostic log.
pub fn redact_text(value: &str, max_string: usize, extra_secrets: Option<&[String]>) -> String {
    let redacted = redact_inline_secrets(value, extra_secrets);
    truncate_string(&redacted, max_string)
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_lowercase();
    SENSITIVE_KEYS.contains(&normalized.as_str())
}

pub fn redact_object(value: &Value, max_string: usize, extra_secrets: Option<&[String]>) -> Value {
    match value {
        Value::String(text) => Value::String(redact_text(text, max_string, extra_secrets)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| redact_object(item, max_string, extra_secrets))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, entry) in map.iter() {
                if is_sensitive_key(key) && !entry.is_null() {
                    out.insert(key.clone(), Value::String(DEFAULT_REDACTION.to_string()));
                    continue;
                }
                out.insert(key.clone(), redact_object(entry, max_string, extra_secrets));
            }
            Value::Object(out)
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{redact_object, redact_text};

    #[test]
    fn redact_text_hides_bearer_credential_inside_header() {
        let out = redact_text("curl -H 'authorization: Bearer abc.def' https://x", usize::MAX, None);
        assert_eq!(out, "curl -H 'authorization: Bearer ***REDACTED***' https://x");
    }

    #[test]
    fn redact_text_hides_jwt_fields() {
        let out = redact_text(r#"{"jwt": "secret-value"}"#, usize::MAX, None);
        assert_eq!(out, r#"{"jwt":"***REDACTED***"}"#);
    }

    #[test]
    fn redact_text_hides_extra_secrets_and_truncates() {
        let extra = vec!["abcdef123".to_string()];
        let out = redact_text("token abcdef123 trailing", 12, Some(extra.as_slice()));
        assert_eq!(out, "token ***RED...");
    }

    #[test]
    fn redact_object_masks_token_keys() {
        let input = serde_json::json!({"token": "abc", "nested": {"jwt": "x"}, "other": 1});
        let out = redact_object(&input, usize::MAX, None);
        assert_eq!(out["token"], "[REDACTED]");
        assert_eq!(out["nested"]["jwt"], "[REDACTED]");
        assert_eq!(out["other"], 1);
    }
}
