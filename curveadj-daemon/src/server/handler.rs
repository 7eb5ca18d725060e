use crate::{
    config::Config,
    configurer::{ApplyOutcome, Configurer},
    runner::{CommandRunner, ToolRunner},
};
use anyhow::Context;
use curveadj_schema::{ActiveState, ApplyResponse, ConfigurationFields, DaemonInfo, GIT_COMMIT};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct Handler {
    configurer: Arc<Configurer>,
    first_update: Arc<AtomicBool>,
}

impl Handler {
    /// Resolves the tool and brings the hardware to the initial configuration.
    /// Failing to locate the tool at all is fatal, a failed first invocation is not.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let tool_path = config
            .tool
            .resolve_path()
            .context("Could not resolve ryzenadj location")?;
        Ok(Self::with_runner(config, tool_path, Box::new(CommandRunner)).await)
    }

    pub async fn with_runner(
        config: &Config,
        tool_path: PathBuf,
        runner: Box<dyn ToolRunner>,
    ) -> Self {
        info!("using ryzenadj at {tool_path:?}");
        let configurer = Configurer::new(tool_path, config.tool.timeout(), runner, config.initial);

        let report = configurer.apply_full(config.initial).await;
        match &report.outcome {
            ApplyOutcome::Invoked {
                committed: true, ..
            } => info!("applied initial configuration"),
            ApplyOutcome::Invoked { result, .. } => {
                error!("could not apply initial configuration: {}", result.status);
            }
            ApplyOutcome::NoOp => (),
        }

        Self {
            configurer: Arc::new(configurer),
            first_update: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn configurer(&self) -> &Configurer {
        &self.configurer
    }

    pub fn daemon_info(&self) -> DaemonInfo {
        DaemonInfo {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            commit: Some(GIT_COMMIT.to_owned()),
            tool_path: self.configurer.tool_path().to_string_lossy().into_owned(),
            timeout_ms: u64::try_from(self.configurer.timeout().as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub async fn active_state(&self) -> ActiveState {
        ActiveState {
            first_update: self.first_update.swap(false, Ordering::SeqCst),
            state: self.configurer.active().await,
        }
    }

    pub async fn set_configuration(&self, fields: &ConfigurationFields) -> ApplyResponse {
        self.configurer.update(fields).await.into()
    }

    pub async fn apply_full_configuration(&self, fields: &ConfigurationFields) -> ApplyResponse {
        self.configurer.update_full(fields).await.into()
    }

    pub async fn reapply(&self) -> ApplyResponse {
        self.configurer.reapply().await.into()
    }

    pub async fn resume_from_suspend(&self) -> ApplyResponse {
        info!("resumed from suspend, reapplying configuration");
        let response = self.reapply().await;
        if !response.committed {
            warn!("configuration could not be restored after resume");
        }
        response
    }
}
