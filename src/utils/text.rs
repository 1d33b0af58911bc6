pub fn truncate_utf8_prefix(value: &str, max_bytes: usize) -> String {
    if max_bytes == 0 {
        return String::new();
    }
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

const MASK_VISIBLE_CHARS: usize = 6;

/// Short tokens are returned untouched; longer ones keep six chars on each side.
pub fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= MASK_VISIBLE_CHARS * 2 {
        return token.to_string();
    }
    let head: String = token.chars().take(MASK_VISIBLE_CHARS).collect();
    let tail: String = token.chars().skip(count - MASK_VISIBLE_CHARS).collect();
    format!("{}...{}", head, tail)
}

pub fn or_empty_marker(value: &str) -> &str {
    if value.is_empty() {
        "<empty>"
    } else {
        value
    }
}
