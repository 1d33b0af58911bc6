use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

const TOKEN_CONTAINER_KEY: &str = "last_active_token";
const TOKEN_KEY: &str = "jwt";

static TARGETED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)"last_active_token"\s*:\s*\{[^}]*"jwt"\s*:\s*"([^"]+)""#)
        .expect("targeted token regex")
});
static LOOSE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""jwt"\s*:\s*"([^"]+)""#).expect("loose token regex"));

/// Which strategy produced a token, strictest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    Structured,
    Targeted,
    Loose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedToken {
    pub value: String,
    pub tier: ExtractionTier,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(String),
    Text(String),
}

/// Parsed document shape, detached from any one JSON library.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Map(Vec<(String, Node)>),
    List(Vec<Node>),
    Scalar(Scalar),
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(flag) => Node::Scalar(Scalar::Bool(flag)),
            Value::Number(num) => Node::Scalar(Scalar::Number(num.to_string())),
            Value::String(text) => Node::Scalar(Scalar::Text(text)),
            Value::Array(items) => Node::List(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => Node::Map(
                map.into_iter()
                    .map(|(key, entry)| (key, Node::from(entry)))
                    .collect(),
            ),
        }
    }
}

impl Node {
    pub fn parse(text: &str) -> Option<Node> {
        serde_json::from_str::<Value>(text).ok().map(Node::from)
    }

    fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Depth-first search for `key`. A map's own keys are checked before its
    /// values are descended into; a `null` value counts as absent.
    pub fn find_key(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map(entries) => {
                if let Some((_, found)) = entries.iter().find(|(k, _)| k == key) {
                    return if found.is_null() { None } else { Some(found) };
                }
                entries.iter().find_map(|(_, entry)| entry.find_key(key))
            }
            Node::List(items) => items.iter().find_map(|item| item.find_key(key)),
            Node::Scalar(_) => None,
        }
    }
}

fn extract_structured(text: &str) -> Option<String> {
    let root = Node::parse(text)?;
    let container = root.find_key(TOKEN_CONTAINER_KEY)?;
    container.get(TOKEN_KEY)?.as_text().map(str::to_string)
}

fn capture_first(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn extract(text: &str) -> Option<ExtractedToken> {
    if let Some(value) = extract_structured(text) {
        return Some(ExtractedToken {
            value,
            tier: ExtractionTier::Structured,
        });
    }
    if let Some(value) = capture_first(&TARGETED_PATTERN, text) {
        return Some(ExtractedToken {
            value,
            tier: ExtractionTier::Targeted,
        });
    }
    capture_first(&LOOSE_PATTERN, text).map(|value| ExtractedToken {
        value,
        tier: ExtractionTier::Loose,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier_and_value(text: &str) -> Option<(ExtractionTier, String)> {
        extract(text).map(|t| (t.tier, t.value))
    }

    #[test]
    fn structured_tier_finds_nested_token() {
        assert_eq!(
            tier_and_value(r#"{"a":{"last_active_token":{"jwt":"X"}}}"#),
            Some((ExtractionTier::Structured, "X".to_string()))
        );
    }

    #[test]
    fn structured_tier_descends_into_lists() {
        let text = r#"{"response":{"sessions":[{"id":1},{"last_active_token":{"object":"token","jwt":"L"}}]}}"#;
        assert_eq!(
            tier_and_value(text),
            Some((ExtractionTier::Structured, "L".to_string()))
        );
    }

    #[test]
    fn structured_tier_prefers_own_keys_then_document_order() {
        let text = r#"{"first":{"last_active_token":{"jwt":"deep"}},"last_active_token":{"jwt":"top"}}"#;
        assert_eq!(extract(text).unwrap().value, "top");

        let text = r#"[{"x":{"last_active_token":{"jwt":"one"}}},{"last_active_token":{"jwt":"two"}}]"#;
        assert_eq!(extract(text).unwrap().value, "one");
    }

    #[test]
    fn null_container_is_skipped() {
        let text = r#"{"a":{"last_active_token":null},"b":{"last_active_token":{"jwt":"B"}}}"#;
        assert_eq!(extract(text).unwrap().value, "B");
    }

    #[test]
    fn targeted_tier_handles_non_json_text() {
        let text = "HTTP/1.1 200 OK\n\n\"last_active_token\": {\"foo\":1,\"jwt\":\"Y\"} trailing";
        assert_eq!(
            tier_and_value(text),
            Some((ExtractionTier::Targeted, "Y".to_string()))
        );
    }

    #[test]
    fn targeted_tier_spans_lines_and_ignores_key_case() {
        let text = "garbage {\"Last_Active_Token\": {\n  \"object\": \"token\",\n  \"JWT\": \"M\"\n}";
        assert_eq!(
            tier_and_value(text),
            Some((ExtractionTier::Targeted, "M".to_string()))
        );
    }

    #[test]
    fn targeted_tier_beats_earlier_loose_match() {
        let text = r#"junk "jwt":"loose" "last_active_token": {"jwt":"T"}"#;
        assert_eq!(
            tier_and_value(text),
            Some((ExtractionTier::Targeted, "T".to_string()))
        );
    }

    #[test]
    fn empty_structured_jwt_stops_at_first_tier() {
        let text = r#"{"last_active_token":{"jwt":""},"other":{"jwt":"L"}}"#;
        assert_eq!(
            tier_and_value(text),
            Some((ExtractionTier::Structured, String::new()))
        );
    }

    #[test]
    fn loose_tier_is_last_resort() {
        assert_eq!(
            tier_and_value(r#"prefix "jwt":"Z" suffix"#),
            Some((ExtractionTier::Loose, "Z".to_string()))
        );
    }

    #[test]
    fn loose_tier_runs_when_structured_container_lacks_jwt() {
        let text = r#"{"last_active_token":{"id":"t"},"other":{"jwt":"W"}}"#;
        assert_eq!(
            tier_and_value(text),
            Some((ExtractionTier::Loose, "W".to_string()))
        );
    }

    #[test]
    fn nothing_found_yields_none() {
        assert_eq!(extract(r#"{"session":{"id":"s"}}"#), None);
        assert_eq!(extract("<html>502 Bad Gateway</html>"), None);
        assert_eq!(extract(""), None);
    }

    #[test]
    fn node_preserves_document_key_order() {
        let node = Node::parse(r#"{"b":1,"a":2}"#).unwrap();
        match node {
            Node::Map(entries) => {
                let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["b", "a"]);
            }
            other => panic!("expected map, got {:?}", other),
        }
    }
}
