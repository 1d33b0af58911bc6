use crate::app::App;
use crate::errors::{ErrorCode, RelayError, RelayErrorKind, RpcError};
use crate::managers::flow::FlowRunner;
use crate::rpc::envelope::{describe, TriggerRequest, TriggerResponse};
use crate::rpc::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::services::logger::Logger;
use crate::utils::redact::{redact_object, redact_text};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

const MAX_ERROR_MESSAGE_BYTES: usize = 4096;

fn map_relay_error(error: &RelayError) -> RpcError {
    let mut lines = vec![
        "RelayError".to_string(),
        format!("kind: {:?}", error.kind).to_lowercase(),
        format!("code: {}", error.code),
        format!(
            "message: {}",
            redact_text(&error.message, MAX_ERROR_MESSAGE_BYTES, None)
        ),
    ];
    if let Some(hint) = &error.hint {
        lines.push(format!("hint: {}", hint));
    }
    let message = lines.join("\n");

    match error.kind {
        RelayErrorKind::InvalidRequest => RpcError::new(ErrorCode::InvalidParams, message),
        RelayErrorKind::Timeout => RpcError::new(ErrorCode::RequestTimeout, message),
        RelayErrorKind::MissingInput | RelayErrorKind::Internal => {
            RpcError::new(ErrorCode::InternalError, message)
        }
        _ => RpcError::new(ErrorCode::UpstreamFailed, message),
    }
}

/// Line-delimited JSON-RPC front end: one flow per `trigger` request.
pub struct RelayServer {
    logger: Logger,
    flow_runner: Arc<FlowRunner>,
    expose_full_token: bool,
    timeout: Option<Duration>,
}

impl RelayServer {
    pub fn new(app: &App) -> Self {
        Self {
            logger: app.logger.child("rpc"),
            flow_runner: app.flow_runner.clone(),
            expose_full_token: app.config.expose_full_token,
            timeout: app.config.timeout_ms.map(Duration::from_millis),
        }
    }

    async fn run_flow(&self) -> Result<crate::managers::flow::FlowResult, RelayError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.flow_runner.run())
                .await
                .map_err(|_| {
                    RelayError::timeout(format!(
                        "Flow did not finish within {} ms",
                        limit.as_millis()
                    ))
                })?,
            None => self.flow_runner.run().await,
        }
    }

    async fn handle_trigger(&self, params: &Value) -> Result<Value, RelayError> {
        let request = TriggerRequest::from_params(params)?;
        let result = self.run_flow().await?;
        let response = TriggerResponse::build(request.call, &result, self.expose_full_token);
        serde_json::to_value(response)
            .map_err(|err| RelayError::internal(format!("Failed to encode response: {}", err)))
    }

    fn handle_health(&self) -> Value {
        serde_json::json!({
            "status": "ok",
            "log": self.logger.stats(),
            "flow_log": self.flow_runner.flow_log().stats(),
        })
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone()?;
        self.logger.debug(
            "request",
            Some(&serde_json::json!({ "method": request.method })),
        );
        let response = match request.method.as_str() {
            "describe" => JsonRpcResponse::success(id, describe()),
            "health" => JsonRpcResponse::success(id, self.handle_health()),
            "trigger" => match self.handle_trigger(&request.params).await {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(err) => {
                    let mapped = map_relay_error(&err);
                    let data = serde_json::to_value(&err)
                        .ok()
                        .map(|value| redact_object(&value, MAX_ERROR_MESSAGE_BYTES, None));
                    JsonRpcResponse::failure(id, mapped.code.as_i32(), mapped.message, data)
                }
            },
            _ => JsonRpcResponse::failure(
                id,
                ErrorCode::MethodNotFound.as_i32(),
                "Method not found".to_string(),
                None,
            ),
        };
        Some(response)
    }

    async fn write_response<W: AsyncWrite + Unpin>(
        writer: &mut W,
        response: &JsonRpcResponse,
    ) -> Result<(), RelayError> {
        let payload = serde_json::to_string(response).unwrap_or_default();
        writer.write_all(payload.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), RelayError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut writer = BufWriter::new(writer);

        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let parsed: Value = match serde_json::from_str(trimmed) {
                Ok(value) => value,
                Err(_) => {
                    let response = JsonRpcResponse::failure(
                        Value::Null,
                        ErrorCode::ParseError.as_i32(),
                        "Parse error".to_string(),
                        None,
                    );
                    Self::write_response(&mut writer, &response).await?;
                    continue;
                }
            };

            let request: JsonRpcRequest = match serde_json::from_value(parsed) {
                Ok(req) => req,
                Err(_) => {
                    let response = JsonRpcResponse::failure(
                        Value::Null,
                        ErrorCode::InvalidRequest.as_i32(),
                        "Invalid request".to_string(),
                        None,
                    );
                    Self::write_response(&mut writer, &response).await?;
                    continue;
                }
            };

            if request.is_notification() {
                continue;
            }
            if let Some(response) = self.handle_request(request).await {
                Self::write_response(&mut writer, &response).await?;
            }
        }

        Ok(())
    }

    pub async fn run_stdio(&self) -> Result<(), RelayError> {
        self.logger.info("listening on stdio", None);
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}
