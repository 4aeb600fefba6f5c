//! Dispatch record types.

use serde::{Deserialize, Serialize};

pub type RunId = String;

/// Outcome of one entry-script execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Succeeded,
    Failed,
    TimedOut,
}

impl DispatchStatus {
    pub fn from_exit_code(exit_code: Option<i32>) -> Self {
        match exit_code {
            Some(0) => DispatchStatus::Succeeded,
            _ => DispatchStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchManifest {
    pub run_id: RunId,
    pub case_name: String,
    /// Entry script file name, relative to the case directory.
    pub script: String,
    /// RFC 3339 start time.
    pub timestamp: String,
    pub elapsed_s: f64,
    /// `None` when the process was killed or ended by a signal.
    pub exit_code: Option<i32>,
    pub status: DispatchStatus,
}

/// Captured output streams of a dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchLogs {
    pub stdout: String,
    pub stderr: String,
}
