use crate::errors::RelayError;
use crate::services::executor::{CommandExecutor, ExecutionOutcome};
use crate::services::extractor::extract;
use crate::services::flow_log::{FlowLog, LogReference};
use crate::services::injector::inject_labeled;
use crate::services::logger::Logger;
use crate::services::normalizer::normalize_labeled;
use crate::services::recipe_source::{missing_sources, RecipeSource};
use crate::utils::redact::redact_text;
use serde::Serialize;
use std::sync::Arc;

const LOG_PREVIEW_BYTES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    ValidatingInputs,
    FetchingToken,
    InjectingTemplate,
    ExecutingFinal,
    Done,
    Failed,
}

/// Everything one completed flow produced.
#[derive(Debug, Clone, Serialize)]
pub struct FlowResult {
    pub token: String,
    pub initsend: ExecutionOutcome,
    pub startserver: ExecutionOutcome,
    pub log: Option<LogReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_error: Option<String>,
}

impl FlowResult {
    pub fn final_succeeded(&self) -> bool {
        self.startserver.succeeded()
    }
}

/// Refreshes the session token with the initsend recipe and replays it into
/// the startserver template.
#[derive(Clone)]
pub struct FlowRunner {
    logger: Logger,
    executor: Arc<dyn CommandExecutor>,
    flow_log: FlowLog,
    initsend: RecipeSource,
    template: RecipeSource,
}

impl FlowRunner {
    pub fn new(
        logger: Logger,
        executor: Arc<dyn CommandExecutor>,
        flow_log: FlowLog,
        initsend: RecipeSource,
        template: RecipeSource,
    ) -> Self {
        Self {
            logger: logger.child("flow"),
            executor,
            flow_log,
            initsend,
            template,
        }
    }

    pub fn flow_log(&self) -> &FlowLog {
        &self.flow_log
    }

    fn enter(&self, state: FlowState) {
        self.logger
            .debug("state", Some(&serde_json::json!({ "state": state })));
    }

    pub async fn run(&self) -> Result<FlowResult, RelayError> {
        let mut state = FlowState::ValidatingInputs;
        let outcome = self.run_states(&mut state).await;
        match outcome {
            Ok(result) => {
                self.enter(FlowState::Done);
                Ok(result)
            }
            Err(err) => {
                self.logger.error(
                    "flow failed",
                    Some(&serde_json::json!({
                        "state": state,
                        "kind": err.kind,
                        "message": redact_text(&err.message, LOG_PREVIEW_BYTES, None),
                    })),
                );
                self.enter(FlowState::Failed);
                Err(err)
            }
        }
    }

    async fn run_states(&self, state: &mut FlowState) -> Result<FlowResult, RelayError> {
        self.enter(*state);
        let missing = missing_sources(&[&self.initsend, &self.template]);
        if !missing.is_empty() {
            return Err(RelayError::missing_input(&missing));
        }

        *state = FlowState::FetchingToken;
        self.enter(*state);
        let initsend_label = self.initsend.label();
        let initsend_text = self.initsend.read().await?;
        let initsend_cmd = normalize_labeled(&initsend_text, &initsend_label)?;
        let initsend = self.executor.execute(&initsend_cmd).await?;
        if !initsend.succeeded() {
            return Err(RelayError::upstream_failure(
                initsend.returncode,
                &initsend.stderr,
            ));
        }
        let token = extract(&initsend.stdout)
            .filter(|token| !token.value.is_empty())
            .ok_or_else(|| {
                RelayError::token_not_found(
                    "Unable to locate last_active_token.jwt in initsend response.",
                )
                .with_details(serde_json::json!({
                    "stdout_preview": redact_text(&initsend.stdout, LOG_PREVIEW_BYTES, None),
                }))
            })?;
        self.logger.info(
            "token refreshed",
            Some(&serde_json::json!({ "tier": token.tier })),
        );

        *state = FlowState::InjectingTemplate;
        self.enter(*state);
        let template_label = self.template.label();
        let template_text = self.template.read().await?;
        let injected = inject_labeled(&template_text, &token.value, &template_label)?;
        let startserver_cmd = normalize_labeled(&injected, &template_label)?;

        *state = FlowState::ExecutingFinal;
        self.enter(*state);
        let startserver = self.executor.execute(&startserver_cmd).await?;
        if !startserver.succeeded() {
            self.logger.warn(
                "startserver exited non-zero",
                Some(&serde_json::json!({
                    "returncode": startserver.returncode,
                    "stderr": redact_text(startserver.stderr.trim(), LOG_PREVIEW_BYTES, None),
                })),
            );
        }

        let secrets = [token.value.clone()];
        let (log, log_error) = match self.flow_log.append(&token.value, &initsend, &startserver) {
            Ok(reference) => (Some(reference), None),
            Err(err) => (
                None,
                Some(redact_text(&err.message, usize::MAX, Some(secrets.as_slice()))),
            ),
        };

        self.logger.info(
            "flow completed",
            Some(&serde_json::json!({
                "startserver_returncode": startserver.returncode,
                "log_path": self.flow_log.path(),
            })),
        );
        Ok(FlowResult {
            token: token.value,
            initsend,
            startserver,
            log,
            log_error,
        })
    }
}
