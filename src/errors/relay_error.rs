use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayErrorKind {
    MissingInput,
    Parse,
    Command,
    Extraction,
    Unavailable,
    UpstreamFailure,
    TokenNotFound,
    Injection,
    Timeout,
    InvalidRequest,
    Internal,
}

impl RelayErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            RelayErrorKind::MissingInput => "MISSING_INPUT",
            RelayErrorKind::Parse => "PARSE",
            RelayErrorKind::Command => "COMMAND",
            RelayErrorKind::Extraction => "EXTRACTION",
            RelayErrorKind::Unavailable => "UNAVAILABLE",
            RelayErrorKind::UpstreamFailure => "UPSTREAM_FAILURE",
            RelayErrorKind::TokenNotFound => "TOKEN_NOT_FOUND",
            RelayErrorKind::Injection => "INJECTION",
            RelayErrorKind::Timeout => "TIMEOUT",
            RelayErrorKind::InvalidRequest => "INVALID_REQUEST",
            RelayErrorKind::Internal => "INTERNAL",
        }
    }
}

#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct RelayError {
    pub kind: RelayErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl RelayError {
    pub fn new(kind: RelayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.code().to_string(),
            message: message.into(),
            hint: None,
            details: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// One or more recipe sources are absent; `missing` lists every one of them.
    pub fn missing_input(missing: &[String]) -> Self {
        Self::new(
            RelayErrorKind::MissingInput,
            format!("Missing required file(s): {}", missing.join(", ")),
        )
        .with_details(serde_json::json!({ "missing": missing }))
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Parse, message)
    }

    pub fn command(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Command, message)
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Extraction, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Unavailable, message)
    }

    pub fn upstream_failure(returncode: i32, stderr: &str) -> Self {
        let stderr = stderr.trim();
        Self::new(
            RelayErrorKind::UpstreamFailure,
            format!("initsend curl exited with code {}: {}", returncode, stderr),
        )
        .with_details(serde_json::json!({ "returncode": returncode, "stderr": stderr }))
    }

    pub fn token_not_found(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::TokenNotFound, message)
    }

    pub fn injection(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Injection, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Timeout, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::InvalidRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Internal, message)
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_lists_every_source() {
        let err = RelayError::missing_input(&["initsend.txt".to_string(), "tpl.txt".to_string()]);
        assert_eq!(err.kind, RelayErrorKind::MissingInput);
        assert_eq!(err.to_string(), "Missing required file(s): initsend.txt, tpl.txt");
        assert_eq!(err.details.as_ref().unwrap()["missing"][1], "tpl.txt");
    }

    #[test]
    fn kind_serializes_snake_case_and_code_is_upper_snake_case() {
        let err = RelayError::token_not_found("x");
        let encoded = serde_json::to_value(&err).unwrap();
        assert_eq!(encoded["kind"], "token_not_found");
        assert_eq!(encoded["code"], "TOKEN_NOT_FOUND");
        assert_eq!(RelayErrorKind::MissingInput.code(), "MISSING_INPUT");
    }

    #[test]
    fn upstream_failure_trims_stderr() {
        let err = RelayError::upstream_failure(6, "  could not resolve host\n");
        assert_eq!(err.code, "UPSTREAM_FAILURE");
        assert!(err.message.ends_with("code 6: could not resolve host"));
    }
}
