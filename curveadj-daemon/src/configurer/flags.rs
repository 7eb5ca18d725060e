use super::diff::{ConfigDiff, ConfigField};
use curveadj_schema::{config::neutral_value, Configuration};
use indexmap::IndexMap;

/// ryzenadj options driven by a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TuningFlag {
    /// Curve optimizer offset for all CPU cores
    CpuAllCores,
    /// Curve optimizer offset for the iGPU
    Gpu,
}

impl TuningFlag {
    pub fn name(self) -> &'static str {
        match self {
            TuningFlag::CpuAllCores => "set-coall",
            TuningFlag::Gpu => "set-cogfx",
        }
    }
}

/// One value slot per flag. Later writes replace earlier ones without moving the slot,
/// so CPU arguments always come before GPU arguments.
#[derive(Default)]
struct FlagSlots(IndexMap<TuningFlag, String>);

impl FlagSlots {
    fn set(&mut self, flag: TuningFlag, value: String) {
        self.0.insert(flag, value);
    }

    fn into_args(self) -> Vec<String> {
        self.0
            .into_iter()
            .map(|(flag, value)| format!("--{}={value}", flag.name()))
            .collect()
    }
}

struct Parameter {
    flag: TuningFlag,
    enabled: bool,
    value: String,
    enable_field: ConfigField,
    offset_field: ConfigField,
}

fn parameters(config: &Configuration) -> [Parameter; 2] {
    [
        Parameter {
            flag: TuningFlag::CpuAllCores,
            enabled: config.apply_cpu_offset(),
            value: config.cpu_value(),
            enable_field: ConfigField::ApplyCpuOffset,
            offset_field: ConfigField::CpuOffset,
        },
        Parameter {
            flag: TuningFlag::Gpu,
            enabled: config.apply_gpu_offset(),
            value: config.gpu_value(),
            enable_field: ConfigField::ApplyGpuOffset,
            offset_field: ConfigField::GpuOffset,
        },
    ]
}

/// Arguments that set every enabled offset. Disabled offsets are left untouched.
pub fn generate_full(config: &Configuration) -> Vec<String> {
    let mut slots = FlagSlots::default();
    for parameter in parameters(config) {
        if parameter.enabled {
            slots.set(parameter.flag, parameter.value);
        }
    }
    slots.into_args()
}

/// Arguments needed to move the hardware to `new`, given the fields that changed.
///
/// Rules are evaluated per parameter in a fixed order and the last matching one wins:
/// 1. offset changed while enabled: apply the new offset
/// 2. just enabled: apply the full offset
/// 3. just disabled: reset to the neutral value
pub fn generate_delta(new: &Configuration, changed: &ConfigDiff) -> Vec<String> {
    let mut slots = FlagSlots::default();
    for parameter in parameters(new) {
        if changed.contains(parameter.offset_field) && parameter.enabled {
            slots.set(parameter.flag, parameter.value.clone());
        }

        if changed.contains(parameter.enable_field) {
            if parameter.enabled {
                slots.set(parameter.flag, parameter.value);
            } else {
                slots.set(parameter.flag, neutral_value());
            }
        }
    }
    slots.into_args()
}
