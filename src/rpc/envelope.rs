use crate::errors::RelayError;
use crate::managers::flow::FlowResult;
use crate::utils::text::mask_token;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TRIGGER_CALL: &str = "startserver";

#[derive(Debug, Deserialize)]
pub struct TriggerRequest {
    pub call: String,
}

impl TriggerRequest {
    pub fn from_params(params: &Value) -> Result<Self, RelayError> {
        let request: TriggerRequest = serde_json::from_value(params.clone()).map_err(|_| {
            RelayError::invalid_request("params must be an object with a 'call' field")
                .with_hint("Send {\"call\": \"startserver\"}.")
        })?;
        if !request.call.trim().eq_ignore_ascii_case(TRIGGER_CALL) {
            return Err(RelayError::invalid_request(format!(
                "call must be '{}'",
                TRIGGER_CALL
            )));
        }
        Ok(TriggerRequest {
            call: TRIGGER_CALL.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub status: &'static str,
    pub call: String,
    pub token_preview: String,
    pub token: Option<String>,
    pub log_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_error: Option<String>,
    pub initsend: Value,
    pub startserver: Value,
}

impl TriggerResponse {
    /// `status` follows the final command's exit code; the token is only
    /// included in full when exposure is enabled.
    pub fn build(call: String, result: &FlowResult, expose_full_token: bool) -> Self {
        Self {
            status: if result.final_succeeded() { "ok" } else { "error" },
            call,
            token_preview: mask_token(&result.token),
            token: expose_full_token.then(|| result.token.clone()),
            log_path: result
                .log
                .as_ref()
                .map(|reference| reference.path.display().to_string()),
            log_error: result.log_error.clone(),
            initsend: result.initsend.to_payload(),
            startserver: result.startserver.to_payload(),
        }
    }
}

pub fn describe() -> Value {
    serde_json::json!({
        "message": "Send trigger with {\"call\": \"startserver\"} to run the workflow.",
        "methods": ["describe", "health", "trigger"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RelayErrorKind;

    #[test]
    fn trigger_call_is_case_insensitive() {
        let request = TriggerRequest::from_params(&serde_json::json!({"call": "StartServer"})).unwrap();
        assert_eq!(request.call, "startserver");
    }

    #[test]
    fn other_calls_are_rejected() {
        let err = TriggerRequest::from_params(&serde_json::json!({"call": "stop"})).unwrap_err();
        assert_eq!(err.kind, RelayErrorKind::InvalidRequest);
        let err = TriggerRequest::from_params(&Value::Null).unwrap_err();
        assert_eq!(err.kind, RelayErrorKind::InvalidRequest);
    }
}
