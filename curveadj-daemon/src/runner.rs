use curveadj_schema::InvocationStatus;
use futures::future::BoxFuture;
use std::{path::Path, process::Stdio, time::Duration};
use tokio::{process::Command, time};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub status: InvocationStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    fn without_output(status: InvocationStatus) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Runs an external executable to completion.
///
/// Failures of any kind are reported through [`ProcessOutput::status`] rather than as errors.
pub trait ToolRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        exec: &'a Path,
        args: &'a [String],
        timeout: Duration,
    ) -> BoxFuture<'a, ProcessOutput>;
}

pub struct CommandRunner;

impl ToolRunner for CommandRunner {
    fn run<'a>(
        &'a self,
        exec: &'a Path,
        args: &'a [String],
        timeout: Duration,
    ) -> BoxFuture<'a, ProcessOutput> {
        Box::pin(async move {
            let mut command = Command::new(exec);
            command
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            match time::timeout(timeout, command.output()).await {
                Ok(Ok(output)) => {
                    let status = match output.status.code() {
                        Some(code) => InvocationStatus::Exited { code },
                        None => InvocationStatus::Terminated,
                    };
                    debug!("{exec:?} finished: {status}");
                    ProcessOutput {
                        status,
                        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    }
                }
                Ok(Err(err)) => {
                    warn!("could not run {exec:?}: {err}");
                    ProcessOutput::without_output(InvocationStatus::SpawnFailed {
                        error: err.to_string(),
                    })
                }
                Err(_) => {
                    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                    warn!("{exec:?} did not finish in {timeout_ms}ms, killing it");
                    ProcessOutput::without_output(InvocationStatus::TimedOut { timeout_ms })
                }
            }
        })
    }
}
