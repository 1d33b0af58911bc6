use crate::errors::RelayError;
use crate::services::executor::ExecutionOutcome;
use crate::services::logger::Logger;
use crate::utils::paths::ensure_dir_exists;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// One persisted flow, written as a single JSON line.
#[derive(Debug, Clone, Serialize)]
pub struct FlowRecord<'a> {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub token: &'a str,
    pub initsend: &'a ExecutionOutcome,
    pub startserver: &'a ExecutionOutcome,
}

/// Locates a record inside the append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogReference {
    pub path: PathBuf,
    pub record_id: Uuid,
}

#[derive(Debug, Default, Clone)]
pub struct FlowLogStats {
    pub logged: u64,
    pub errors: u64,
}

/// Append-only JSON Lines sink. Records are never rewritten.
#[derive(Clone)]
pub struct FlowLog {
    logger: Logger,
    file_path: PathBuf,
    queue: Arc<Mutex<()>>,
    stats: Arc<Mutex<FlowLogStats>>,
}

impl FlowLog {
    pub fn new(logger: Logger, file_path: impl Into<PathBuf>) -> Self {
        Self {
            logger: logger.child("flow_log"),
            file_path: file_path.into(),
            queue: Arc::new(Mutex::new(())),
            stats: Arc::new(Mutex::new(FlowLogStats::default())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn write_line(&self, payload: &str) -> std::io::Result<()> {
        let _guard = self.queue.lock().unwrap_or_else(|err| err.into_inner());
        ensure_dir_exists(&self.file_path)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        file.write_all(payload.as_bytes())
    }

    pub fn append(
        &self,
        token: &str,
        initsend: &ExecutionOutcome,
        startserver: &ExecutionOutcome,
    ) -> Result<LogReference, RelayError> {
        let record = FlowRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            token,
            initsend,
            startserver,
        };
        let mut payload = serde_json::to_string(&record)
            .map_err(|err| RelayError::internal(format!("Failed to encode flow record: {}", err)))?;
        payload.push('\n');

        if let Err(err) = self.write_line(&payload) {
            if let Ok(mut stats) = self.stats.lock() {
                stats.errors += 1;
            }
            self.logger.warn(
                "Flow log write failed",
                Some(&serde_json::json!({"error": err.to_string(), "path": self.file_path})),
            );
            return Err(RelayError::internal(format!(
                "Failed to append to log file {}: {}",
                self.file_path.display(),
                err
            )));
        }
        if let Ok(mut stats) = self.stats.lock() {
            stats.logged += 1;
        }
        Ok(LogReference {
            path: self.file_path.clone(),
            record_id: record.id,
        })
    }

    pub fn stats(&self) -> serde_json::Value {
        let stats = self.stats.lock().unwrap_or_else(|err| err.into_inner());
        serde_json::json!({
            "logged": stats.logged,
            "errors": stats.errors,
            "path": self.file_path,
        })
    }
}
