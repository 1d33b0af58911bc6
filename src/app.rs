use crate::config::RelayConfig;
use crate::managers::flow::FlowRunner;
use crate::services::executor::{CommandExecutor, ProcessExecutor};
use crate::services::flow_log::FlowLog;
use crate::services::logger::Logger;
use crate::services::recipe_source::RecipeSource;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub config: RelayConfig,
    pub flow_runner: Arc<FlowRunner>,
}

impl App {
    pub fn initialize(config: RelayConfig, logger: Logger) -> Self {
        let executor: Arc<dyn CommandExecutor> =
            Arc::new(ProcessExecutor::new(logger.clone(), config.curl_bin.clone()));
        Self::with_executor(config, logger, executor)
    }

    pub fn with_executor(
        config: RelayConfig,
        logger: Logger,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        let flow_log = FlowLog::new(logger.clone(), config.log_path.clone());
        let flow_runner = Arc::new(FlowRunner::new(
            logger.clone(),
            executor,
            flow_log,
            RecipeSource::file(&config.initsend_path),
            RecipeSource::file(&config.template_path),
        ));
        logger.debug(
            "initialized",
            Some(&serde_json::json!({
                "initsend": config.initsend_path,
                "template": config.template_path,
                "log_path": config.log_path,
                "curl_bin": config.curl_bin,
                "timeout_ms": config.timeout_ms,
            })),
        );
        Self {
            logger,
            config,
            flow_runner,
        }
    }
}
