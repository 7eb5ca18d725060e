use anyhow::{bail, ensure, Context};
use curveadj_schema::Configuration;
use nix::unistd::getuid;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::{
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

const FILE_NAME: &str = "config.yaml";
const DEFAULT_ADMIN_GROUPS: [&str; 2] = ["wheel", "sudo"];
pub const TOOL_NAME: &str = "ryzenadj";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub daemon: Daemon,
    #[serde(default)]
    pub tool: Tool,
    #[serde(default = "default_reapply_on_resume")]
    pub reapply_on_resume: bool,
    /// Configuration applied on startup
    #[serde(default)]
    pub initial: Configuration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon: Daemon::default(),
            tool: Tool::default(),
            reapply_on_resume: default_reapply_on_resume(),
            initial: Configuration::default(),
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Daemon {
    pub log_level: String,
    #[serde(default = "default_admin_groups")]
    pub admin_groups: Vec<String>,
    pub tcp_listen_address: Option<String>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            admin_groups: default_admin_groups(),
            tcp_listen_address: None,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tool {
    /// Looked up in `$PATH` when not set
    pub path: Option<PathBuf>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for Tool {
    fn default() -> Self {
        Self {
            path: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Tool {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolves the executable location. The resulting file is not required to exist,
    /// a missing binary shows up later as a failed invocation.
    pub fn resolve_path(&self) -> anyhow::Result<PathBuf> {
        self.resolve_path_in(env::var_os("PATH"))
    }

    fn resolve_path_in(&self, search_path: Option<OsString>) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.path {
            ensure!(!path.as_os_str().is_empty(), "Configured tool path is empty");
            return Ok(path.clone());
        }

        if let Some(search_path) = search_path {
            if let Some(path) = env::split_paths(&search_path)
                .map(|dir| dir.join(TOOL_NAME))
                .find(|candidate| candidate.is_file())
            {
                debug!("found {TOOL_NAME} at {path:?}");
                return Ok(path);
            }
        }

        bail!("Could not find {TOOL_NAME} in $PATH, please set `tool.path` in the config file")
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Option<Self>> {
        Self::load_from(&get_path())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&get_path())
    }

    pub fn load_or_create() -> anyhow::Result<Self> {
        if let Some(config) = Config::load()? {
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    fn load_from(path: &Path) -> anyhow::Result<Option<Self>> {
        if path.exists() {
            let raw_config = fs::read_to_string(path).context("Could not open config file")?;
            let config =
                serde_yaml::from_str(&raw_config).context("Could not deserialize config")?;
            Ok(Some(config))
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Could not create config directory")?;
            }
            Ok(None)
        }
    }

    fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        debug!("saving config to {path:?}");
        let raw_config = serde_yaml::to_string(self)?;
        fs::write(path, raw_config).context("Could not write config")
    }
}

fn get_path() -> PathBuf {
    if getuid().is_root() {
        PathBuf::from("/etc/curveadj").join(FILE_NAME)
    } else {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("curveadj").join(FILE_NAME)
    }
}

fn default_admin_groups() -> Vec<String> {
    DEFAULT_ADMIN_GROUPS.map(str::to_owned).to_vec()
}

fn default_reapply_on_resume() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    10_000
}
