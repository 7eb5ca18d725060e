use crate::config::ConfigurationFields;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum Request {
    Ping,
    DaemonInfo,
    ActiveState,
    /// Apply only what changed compared to the active configuration
    SetConfiguration(ConfigurationFields),
    /// Apply every enabled offset regardless of the active configuration
    ApplyFullConfiguration(ConfigurationFields),
    Reapply,
    ResumeFromSuspend,
}
