#[cfg(feature = "args")]
pub mod args;
pub mod config;
pub mod request;
mod response;


pub use config::{Configuration, ConfigurationFields};
pub use request::Request;
pub use response::Response;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt;

pub const GIT_COMMIT: &str = env!("GIT_COMMIT");

#[derive(Serialize, Deserialize, Debug)]
pub struct Pong;

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DaemonInfo {
    pub version: String,
    pub commit: Option<String>,
    pub tool_path: String,
    pub timeout_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActiveState {
    /// Only set on the first state query of the daemon's lifetime
    pub first_update: bool,
    pub state: Configuration,
}

/// How a single ryzenadj execution ended.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvocationStatus {
    Exited { code: i32 },
    /// Killed by a signal before reporting an exit code
    Terminated,
    TimedOut { timeout_ms: u64 },
    SpawnFailed { error: String },
}

impl InvocationStatus {
    pub fn success(&self) -> bool {
        matches!(self, InvocationStatus::Exited { code: 0 })
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationStatus::Exited { code } => write!(f, "exited with code {code}"),
            InvocationStatus::Terminated => write!(f, "terminated by signal"),
            InvocationStatus::TimedOut { timeout_ms } => write!(f, "timed out after {timeout_ms}ms"),
            InvocationStatus::SpawnFailed { error } => write!(f, "could not be started: {error}"),
        }
    }
}

/// Captured outcome of one tool execution.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InvocationResult {
    /// Executable path followed by the arguments
    pub command: Vec<String>,
    pub status: InvocationStatus,
    pub stdout: String,
    pub stderr: String,
    pub timestamp: DateTime<Utc>,
}

impl InvocationResult {
    pub fn args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }

    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Flat field map returned by every apply operation.
///
/// The configuration fields always describe the active configuration after the operation,
/// which differs from the requested one when the invocation failed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApplyResponse {
    pub apply_cpu_offset: bool,
    pub cpu_offset: i32,
    pub cpu_value: String,
    pub apply_gpu_offset: bool,
    pub gpu_offset: i32,
    pub gpu_value: String,
    pub show_debug: bool,
    pub executed: bool,
    pub committed: bool,
    pub details: Option<InvocationResult>,
}

impl ApplyResponse {
    pub fn new(active: &Configuration, details: Option<InvocationResult>, committed: bool) -> Self {
        Self {
            apply_cpu_offset: active.apply_cpu_offset(),
            cpu_offset: active.cpu_offset(),
            cpu_value: active.cpu_value(),
            apply_gpu_offset: active.apply_gpu_offset(),
            gpu_offset: active.gpu_offset(),
            gpu_value: active.gpu_value(),
            show_debug: active.show_debug(),
            executed: details.is_some(),
            committed,
            details,
        }
    }
}
