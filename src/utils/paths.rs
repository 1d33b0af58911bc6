use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_INITSEND_FILE: &str = "initsend.txt";
pub const DEFAULT_START_TEMPLATE_FILE: &str = "serverstart-orig.txt";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const FLOW_LOG_FILE_NAME: &str = "startserver.jsonl";

pub(crate) fn normalize_env_value(value: Option<String>) -> Option<String> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered == "undefined" || lowered == "null" {
        return None;
    }
    Some(trimmed.to_string())
}

fn normalize_env_path(value: Option<String>) -> Option<PathBuf> {
    normalize_env_value(value).map(PathBuf::from)
}

pub fn resolve_initsend_path() -> PathBuf {
    normalize_env_path(env::var("INITSEND_FILE").ok())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INITSEND_FILE))
}

pub fn resolve_start_template_path() -> PathBuf {
    normalize_env_path(env::var("START_TEMPLATE_FILE").ok())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_START_TEMPLATE_FILE))
}

pub fn resolve_log_dir() -> PathBuf {
    normalize_env_path(env::var("STARTSERVER_LOG_DIR").ok())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
}

pub fn resolve_flow_log_path() -> PathBuf {
    if let Some(path) = normalize_env_path(env::var("STARTSERVER_LOG_PATH").ok()) {
        return path;
    }
    flow_log_path_in(&resolve_log_dir())
}

pub fn flow_log_path_in(dir: &Path) -> PathBuf {
    dir.join(FLOW_LOG_FILE_NAME)
}

pub fn resolve_curl_bin() -> Option<PathBuf> {
    normalize_env_path(env::var("STARTSERVER_CURL_BIN").ok())
}

pub fn ensure_dir_exists(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
