use serde::{Deserialize, Serialize};

/// Neutral encoded value understood by ryzenadj for both the CPU and GPU curve offsets.
pub const BASE_MAGNITUDE: i32 = 0x0010_0000;

/// Desired curve optimizer state.
///
/// Offsets are clamped into `[-BASE_MAGNITUDE, 0]` on construction, so a value of this type
/// can never describe an over-volting request. Deserialization goes through the same path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "RawConfiguration", into = "RawConfiguration")]
pub struct Configuration {
    apply_cpu_offset: bool,
    cpu_offset: i32,
    apply_gpu_offset: bool,
    gpu_offset: i32,
    show_debug: bool,
}

impl Configuration {
    pub fn new(
        apply_cpu_offset: bool,
        cpu_offset: i32,
        apply_gpu_offset: bool,
        gpu_offset: i32,
        show_debug: bool,
    ) -> Self {
        Self {
            apply_cpu_offset,
            cpu_offset: clamp_offset(cpu_offset),
            apply_gpu_offset,
            gpu_offset: clamp_offset(gpu_offset),
            show_debug,
        }
    }

    pub fn apply_cpu_offset(&self) -> bool {
        self.apply_cpu_offset
    }

    pub fn cpu_offset(&self) -> i32 {
        self.cpu_offset
    }

    pub fn apply_gpu_offset(&self) -> bool {
        self.apply_gpu_offset
    }

    pub fn gpu_offset(&self) -> i32 {
        self.gpu_offset
    }

    pub fn show_debug(&self) -> bool {
        self.show_debug
    }

    /// Encoded CPU value, e.g. `0xffff6` for an offset of -10
    pub fn cpu_value(&self) -> String {
        encode_offset(self.cpu_offset)
    }

    /// Encoded GPU value
    pub fn gpu_value(&self) -> String {
        encode_offset(self.gpu_offset)
    }

    /// Builds a new configuration from a partial set of fields,
    /// taking every missing field from `self`.
    pub fn merge(&self, fields: &ConfigurationFields) -> Self {
        Self::new(
            fields.apply_cpu_offset.unwrap_or(self.apply_cpu_offset),
            fields.cpu_offset.unwrap_or(self.cpu_offset),
            fields.apply_gpu_offset.unwrap_or(self.apply_gpu_offset),
            fields.gpu_offset.unwrap_or(self.gpu_offset),
            fields.show_debug.unwrap_or(self.show_debug),
        )
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(true, 0, false, 0, false)
    }
}

/// Encoded value with no offset applied
pub fn neutral_value() -> String {
    encode_offset(0)
}

fn encode_offset(offset: i32) -> String {
    format!("{:#x}", BASE_MAGNITUDE + clamp_offset(offset))
}

fn clamp_offset(offset: i32) -> i32 {
    offset.clamp(-BASE_MAGNITUDE, 0)
}

#[derive(Serialize, Deserialize)]
struct RawConfiguration {
    apply_cpu_offset: bool,
    cpu_offset: i32,
    apply_gpu_offset: bool,
    gpu_offset: i32,
    #[serde(default)]
    show_debug: bool,
}

impl From<RawConfiguration> for Configuration {
    fn from(raw: RawConfiguration) -> Self {
        Self::new(
            raw.apply_cpu_offset,
            raw.cpu_offset,
            raw.apply_gpu_offset,
            raw.gpu_offset,
            raw.show_debug,
        )
    }
}

impl From<Configuration> for RawConfiguration {
    fn from(config: Configuration) -> Self {
        Self {
            apply_cpu_offset: config.apply_cpu_offset,
            cpu_offset: config.cpu_offset,
            apply_gpu_offset: config.apply_gpu_offset,
            gpu_offset: config.gpu_offset,
            show_debug: config.show_debug,
        }
    }
}

/// Field map received from a client. Unknown fields are rejected,
/// missing ones are filled in from the active configuration.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigurationFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_cpu_offset: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_offset: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_gpu_offset: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_offset: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_debug: Option<bool>,
}

impl From<Configuration> for ConfigurationFields {
    fn from(config: Configuration) -> Self {
        Self {
            apply_cpu_offset: Some(config.apply_cpu_offset),
            cpu_offset: Some(config.cpu_offset),
            apply_gpu_offset: Some(config.apply_gpu_offset),
            gpu_offset: Some(config.gpu_offset),
            show_debug: Some(config.show_debug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{neutral_value, Configuration, ConfigurationFields, BASE_MAGNITUDE};
    use pretty_assertions::assert_eq;

    #[test]
    fn positive_offsets_are_clamped() {
        let config = Configuration::new(true, 15, true, 1, false);
        assert_eq!(config.cpu_offset(), 0);
        assert_eq!(config.gpu_offset(), 0);
    }

    #[test]
    fn offsets_never_positive() {
        for offset in [i32::MIN, -BASE_MAGNITUDE - 1, -30, -1, 0, 1, 30, i32::MAX] {
            let config = Configuration::new(true, offset, true, offset, false);
            assert!(config.cpu_offset() <= 0);
            assert!(config.gpu_offset() <= 0);
            assert!(config.cpu_offset() >= -BASE_MAGNITUDE);
        }
    }

    #[test]
    fn negative_offsets_kept() {
        let config = Configuration::new(true, -10, false, -3, false);
        assert_eq!(config.cpu_offset(), -10);
        assert_eq!(config.gpu_offset(), -3);
    }

    #[test]
    fn encoded_values() {
        let config = Configuration::new(true, -10, true, -3, false);
        assert_eq!(config.cpu_value(), "0xffff6");
        assert_eq!(config.gpu_value(), "0xffffd");
        assert_eq!(neutral_value(), "0x100000");
        assert_eq!(Configuration::default().cpu_value(), "0x100000");
    }

    #[test]
    fn lowest_offset_encodes_to_zero() {
        let config = Configuration::new(true, i32::MIN, false, 0, false);
        assert_eq!(config.cpu_value(), "0x0");
    }

    #[test]
    fn deserialize_clamps() {
        let config: Configuration = serde_json::from_str(
            r#"{"apply_cpu_offset": true, "cpu_offset": 20, "apply_gpu_offset": false, "gpu_offset": -4}"#,
        )
        .unwrap();
        assert_eq!(config, Configuration::new(true, 0, false, -4, false));
    }

    #[test]
    fn merge_keeps_missing_fields() {
        let active = Configuration::new(true, -5, true, -2, true);
        let fields = ConfigurationFields {
            cpu_offset: Some(-8),
            ..Default::default()
        };
        assert_eq!(active.merge(&fields), Configuration::new(true, -8, true, -2, true));
    }

    #[test]
    fn merge_clamps() {
        let fields = ConfigurationFields {
            gpu_offset: Some(7),
            ..Default::default()
        };
        assert_eq!(Configuration::default().merge(&fields).gpu_offset(), 0);
    }

    #[test]
    fn unknown_field_rejected() {
        let result =
            serde_json::from_str::<ConfigurationFields>(r#"{"cpu_offset": -1, "voltage": 3}"#);
        assert!(result.is_err());
    }
}
