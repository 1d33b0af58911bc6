use crate::errors::RelayError;
use crate::utils::shell_words::split_shell_words;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const CURL_EXECUTABLE: &str = "curl";

static LINE_CONTINUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\\s*\r?\n").expect("line continuation regex"));
static CURL_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bcurl\b").expect("curl word regex"));

/// A recipe reduced to something that can be launched without a shell.
///
/// `argv[0]` is always `curl`; the only way to obtain one is through [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutableCommand {
    line: String,
    argv: Vec<String>,
}

impl ExecutableCommand {
    /// Single-line command text, continuations collapsed and narration stripped.
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

pub fn normalize(text: &str) -> Result<ExecutableCommand, RelayError> {
    normalize_labeled(text, "the provided text")
}

pub fn normalize_labeled(text: &str, label: &str) -> Result<ExecutableCommand, RelayError> {
    let collapsed = LINE_CONTINUATION.replace_all(text, " ");
    let start = CURL_WORD
        .find(&collapsed)
        .ok_or_else(|| {
            RelayError::extraction(format!("No curl command found in {}.", label))
                .with_hint("The recipe must contain a command starting with the word curl.")
        })?
        .start();
    let line = collapsed[start..].trim().to_string();

    let mut argv = split_shell_words(&line).map_err(|err| {
        RelayError::parse(format!("Unable to parse curl command from {}: {}", label, err))
    })?;
    if argv.is_empty() {
        return Err(RelayError::command(format!(
            "The curl command from {} is empty.",
            label
        )));
    }
    if argv[0] != CURL_EXECUTABLE {
        let idx = argv
            .iter()
            .position(|arg| arg == CURL_EXECUTABLE)
            .ok_or_else(|| {
                RelayError::command(format!(
                    "Command from {} is missing the 'curl' executable.",
                    label
                ))
            })?;
        argv = argv.split_off(idx);
    }

    Ok(ExecutableCommand { line, argv })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RelayErrorKind;

    #[test]
    fn strips_narration_and_joins_continuations() {
        let text = "Copied from devtools, run this:\n\ncurl 'https://api.example.com/v1/client' \\\r\n  -H 'accept: */*' \\\n  --data-raw '{\"a\":1}'\n";
        let cmd = normalize(text).unwrap();
        assert_eq!(
            cmd.line(),
            "curl 'https://api.example.com/v1/client'    -H 'accept: */*'    --data-raw '{\"a\":1}'"
        );
        assert_eq!(
            cmd.argv(),
            &[
                "curl",
                "https://api.example.com/v1/client",
                "-H",
                "accept: */*",
                "--data-raw",
                "{\"a\":1}"
            ]
        );
        assert_eq!(cmd.program(), "curl");
        assert_eq!(cmd.args().len(), 5);
    }

    #[test]
    fn curl_must_be_a_whole_word() {
        let err = normalize("curling is a sport; wget https://x").unwrap_err();
        assert_eq!(err.kind, RelayErrorKind::Extraction);
        assert!(err.message.contains("No curl command found"));
    }

    #[test]
    fn missing_curl_fails() {
        let err = normalize("nothing to run here").unwrap_err();
        assert_eq!(err.kind, RelayErrorKind::Extraction);
    }

    #[test]
    fn unbalanced_quotes_are_parse_errors() {
        let err = normalize_labeled("curl -H 'authorization: Bearer x", "initsend.txt").unwrap_err();
        assert_eq!(err.kind, RelayErrorKind::Parse);
        assert!(err.message.contains("initsend.txt"));
    }

    #[test]
    fn quoted_prefix_glued_to_curl_is_relocated() {
        // `curl"x"` tokenizes to `curlx`; the real executable appears later.
        let cmd = normalize("curl\"x\" curl -s https://x").unwrap();
        assert_eq!(cmd.argv(), &["curl", "-s", "https://x"]);
        assert!(cmd.line().starts_with("curl\"x\""));
    }

    #[test]
    fn no_standalone_curl_token_is_a_command_error() {
        let err = normalize("curl'-s' https://x").unwrap_err();
        assert_eq!(err.kind, RelayErrorKind::Command);
    }
}
