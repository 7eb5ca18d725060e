pub mod diff;
pub mod flags;

use crate::runner::ToolRunner;
use chrono::Utc;
use curveadj_schema::{ApplyResponse, Configuration, ConfigurationFields, InvocationResult};
use diff::diff;
use flags::{generate_delta, generate_full};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// Nothing to change, the tool was not run
    NoOp,
    Invoked {
        result: InvocationResult,
        committed: bool,
    },
}

/// Outcome of an apply operation together with the active configuration right after it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyReport {
    pub outcome: ApplyOutcome,
    pub active: Configuration,
}

impl From<ApplyReport> for ApplyResponse {
    fn from(report: ApplyReport) -> Self {
        match report.outcome {
            ApplyOutcome::NoOp => ApplyResponse::new(&report.active, None, false),
            ApplyOutcome::Invoked { result, committed } => {
                ApplyResponse::new(&report.active, Some(result), committed)
            }
        }
    }
}

/// Owns the last successfully applied configuration and moves the hardware to new ones.
///
/// The active configuration is locked for the whole diff, invoke and commit sequence,
/// and only replaced once the tool reports success.
pub struct Configurer {
    tool_path: PathBuf,
    timeout: Duration,
    runner: Box<dyn ToolRunner>,
    active: Mutex<Configuration>,
}

impl Configurer {
    pub fn new(
        tool_path: PathBuf,
        timeout: Duration,
        runner: Box<dyn ToolRunner>,
        initial: Configuration,
    ) -> Self {
        Self {
            tool_path,
            timeout,
            runner,
            active: Mutex::new(initial),
        }
    }

    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn active(&self) -> Configuration {
        *self.active.lock().await
    }

    /// Applies only the difference between the active configuration and `new`.
    pub async fn apply_delta(&self, new: Configuration) -> ApplyReport {
        let mut active = self.active.lock().await;
        self.apply_delta_locked(&mut active, new).await
    }

    /// Builds the new configuration from `fields` on top of the active one, then applies the delta.
    pub async fn update(&self, fields: &ConfigurationFields) -> ApplyReport {
        let mut active = self.active.lock().await;
        let new = active.merge(fields);
        self.apply_delta_locked(&mut active, new).await
    }

    /// Applies every enabled offset of `config`, regardless of the active configuration.
    pub async fn apply_full(&self, config: Configuration) -> ApplyReport {
        let mut active = self.active.lock().await;
        self.apply_full_locked(&mut active, config).await
    }

    /// Same as [`Configurer::apply_full`], but with fields merged on top of the active configuration.
    pub async fn update_full(&self, fields: &ConfigurationFields) -> ApplyReport {
        let mut active = self.active.lock().await;
        let config = active.merge(fields);
        self.apply_full_locked(&mut active, config).await
    }

    /// Applies the active configuration again in full, e.g. after the hardware lost its state.
    pub async fn reapply(&self) -> ApplyReport {
        let mut active = self.active.lock().await;
        info!("reapplying active configuration");
        let config = *active;
        self.apply_full_locked(&mut active, config).await
    }

    async fn apply_delta_locked(
        &self,
        active: &mut Configuration,
        new: Configuration,
    ) -> ApplyReport {
        let changed = diff(Some(&*active), &new);
        if changed.is_empty() {
            debug!("configuration unchanged, nothing to apply");
            return ApplyReport {
                outcome: ApplyOutcome::NoOp,
                active: *active,
            };
        }
        info!("configuration diff: {changed}");

        let args = generate_delta(&new, &changed);
        if args.is_empty() {
            debug!("diff does not require any arguments");
            return ApplyReport {
                outcome: ApplyOutcome::NoOp,
                active: *active,
            };
        }

        let result = self.invoke(args).await;
        commit(active, new, result)
    }

    async fn apply_full_locked(
        &self,
        active: &mut Configuration,
        config: Configuration,
    ) -> ApplyReport {
        let args = generate_full(&config);
        let result = self.invoke(args).await;
        commit(active, config, result)
    }

    async fn invoke(&self, args: Vec<String>) -> InvocationResult {
        info!("running {:?} with args {args:?}", self.tool_path);
        let output = self.runner.run(&self.tool_path, &args, self.timeout).await;

        if output.status.success() {
            debug!("tool output: {}", output.stdout.trim_end());
        } else {
            warn!(
                "tool {}, stdout: '{}', stderr: '{}'",
                output.status,
                output.stdout.trim_end(),
                output.stderr.trim_end()
            );
        }

        let mut command = Vec::with_capacity(args.len() + 1);
        command.push(self.tool_path.to_string_lossy().into_owned());
        command.extend(args);

        InvocationResult {
            command,
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
            timestamp: Utc::now(),
        }
    }
}

fn commit(active: &mut Configuration, new: Configuration, result: InvocationResult) -> ApplyReport {
    let committed = result.success();
    if committed {
        *active = new;
        debug!("committed configuration {new:?}");
    } else {
        warn!("keeping previous configuration {active:?}");
    }

    ApplyReport {
        outcome: ApplyOutcome::Invoked { result, committed },
        active: *active,
    }
}
