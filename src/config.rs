use crate::utils::feature_flags::is_expose_full_token_enabled;
use crate::utils::paths::{
    normalize_env_value, resolve_curl_bin, resolve_flow_log_path, resolve_initsend_path,
    resolve_start_template_path,
};
use std::path::PathBuf;

/// Runtime settings, resolved from the environment and overridable from the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub initsend_path: PathBuf,
    pub template_path: PathBuf,
    pub log_path: PathBuf,
    pub curl_bin: Option<PathBuf>,
    pub expose_full_token: bool,
    pub timeout_ms: Option<u64>,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self {
            initsend_path: resolve_initsend_path(),
            template_path: resolve_start_template_path(),
            log_path: resolve_flow_log_path(),
            curl_bin: resolve_curl_bin(),
            expose_full_token: is_expose_full_token_enabled(),
            timeout_ms: normalize_env_value(std::env::var("STARTSERVER_TIMEOUT_MS").ok())
                .and_then(|raw| raw.parse::<u64>().ok())
                .filter(|ms| *ms > 0),
        }
    }
}
