#![allow(dead_code)]

use chrono::Utc;
use once_cell::sync::Lazy;
use startrelay::errors::RelayError;
use startrelay::services::executor::{CommandExecutor, ExecutionOutcome};
use startrelay::services::normalizer::ExecutableCommand;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn tmp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create tmp dir");
    dir
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

/// Replies with canned `(returncode, stdout, stderr)` triples and records every argv it saw.
pub struct ScriptedExecutor {
    replies: StdMutex<VecDeque<(i32, String, String)>>,
    seen: StdMutex<Vec<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn new(replies: Vec<(i32, &str, &str)>) -> Self {
        Self {
            replies: StdMutex::new(
                replies
                    .into_iter()
                    .map(|(code, out, err)| (code, out.to_string(), err.to_string()))
                    .collect(),
            ),
            seen: StdMutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<Vec<String>> {
        self.seen.lock().expect("seen lock").clone()
    }
}

#[async_trait::async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, command: &ExecutableCommand) -> Result<ExecutionOutcome, RelayError> {
        self.seen
            .lock()
            .expect("seen lock")
            .push(command.argv().to_vec());
        let (returncode, stdout, stderr) = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .ok_or_else(|| RelayError::unavailable("no scripted reply left"))?;
        Ok(ExecutionOutcome {
            command: command.line().to_string(),
            returncode,
            stdout,
            stderr,
            executed_at: Utc::now(),
        })
    }
}

pub const INITSEND_RECIPE: &str = "Refresh the Clerk session (copied from devtools):\n\ncurl 'https://clerk.example.com/v1/client/sessions/sess_1/touch' \\\n  -X POST \\\n  -H 'content-type: application/x-www-form-urlencoded' \\\n  --data-raw 'active_organization_id='\n";

pub const START_TEMPLATE: &str = "StartSession call:\ncurl 'https://api.example.com/StartSession' \\\n  -H 'content-type: application/json' \\\n  -H \"authorization: Bearer oldtoken\" \\\n  --data-raw '{\"server\":\"alpha\"}'\n";
