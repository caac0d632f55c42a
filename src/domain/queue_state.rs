use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Queue-level lifecycle of a background job. `Completed` means the worker
/// ran to the end and recorded a stage result; whether that result is a
/// success is the stage result's business, not the queue's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueueState {
    Queued,
    Running,
    Retrying,
    Completed,
    Failed,
}

impl QueueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueState::Queued => "QUEUED",
            QueueState::Running => "RUNNING",
            QueueState::Retrying => "RETRYING",
            QueueState::Completed => "COMPLETED",
            QueueState::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueState::Completed | QueueState::Failed)
    }
}

impl FromStr for QueueState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(QueueState::Queued),
            "RUNNING" => Ok(QueueState::Running),
            "RETRYING" => Ok(QueueState::Retrying),
            "COMPLETED" => Ok(QueueState::Completed),
            "FAILED" => Ok(QueueState::Failed),
            _ => Err(format!("Invalid queue state: {}", s)),
        }
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
