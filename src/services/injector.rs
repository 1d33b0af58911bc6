use crate::errors::RelayError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SINGLE_QUOTED_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)-H\s+'\s*authorization:\s*Bearer\s+([^\s']+)[^']*'")
        .expect("single-quoted auth header regex")
});
static DOUBLE_QUOTED_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)-H\s+"\s*authorization:\s*Bearer\s+([^\s"]+)[^"]*""#)
        .expect("double-quoted auth header regex")
});
static BARE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)authorization:\s*Bearer\s+([^\s'"]+)"#).expect("bare auth header regex")
});

fn splice_credential(text: &str, caps: &Captures<'_>, token: &str) -> Option<String> {
    let credential = caps.get(1)?;
    let mut out = String::with_capacity(text.len() + token.len());
    out.push_str(&text[..credential.start()]);
    out.push_str(token);
    out.push_str(&text[credential.end()..]);
    Some(out)
}

fn earliest_quoted_header<'t>(text: &'t str) -> Option<Captures<'t>> {
    let single = SINGLE_QUOTED_HEADER.captures(text);
    let double = DOUBLE_QUOTED_HEADER.captures(text);
    match (single, double) {
        (Some(s), Some(d)) => {
            if s.get(0)?.start() <= d.get(0)?.start() {
                Some(s)
            } else {
                Some(d)
            }
        }
        (s, d) => s.or(d),
    }
}

pub fn inject(template: &str, token: &str) -> Result<String, RelayError> {
    inject_labeled(template, token, "the template")
}

/// Swaps the bearer credential of the first authorization header for `token`.
///
/// Only the credential itself changes; the flag, quote style, header casing and
/// anything after the credential are kept as written.
pub fn inject_labeled(template: &str, token: &str, label: &str) -> Result<String, RelayError> {
    let caps = earliest_quoted_header(template).or_else(|| BARE_HEADER.captures(template));
    caps.and_then(|caps| splice_credential(template, &caps, token))
        .ok_or_else(|| {
            RelayError::injection(format!("Authorization header not found inside {}.", label))
                .with_hint("Add a header such as -H 'authorization: Bearer <token>' to the template.")
        })
}
