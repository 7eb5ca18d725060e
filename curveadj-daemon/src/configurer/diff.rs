use curveadj_schema::Configuration;
use indexmap::IndexSet;
use std::fmt;

/// Configuration fields that influence the generated tool arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    ApplyCpuOffset,
    CpuOffset,
    ApplyGpuOffset,
    GpuOffset,
}

impl ConfigField {
    pub const ALL: [ConfigField; 4] = [
        ConfigField::ApplyCpuOffset,
        ConfigField::CpuOffset,
        ConfigField::ApplyGpuOffset,
        ConfigField::GpuOffset,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConfigField::ApplyCpuOffset => "apply_cpu_offset",
            ConfigField::CpuOffset => "cpu_offset",
            ConfigField::ApplyGpuOffset => "apply_gpu_offset",
            ConfigField::GpuOffset => "gpu_offset",
        }
    }

    fn differs(self, old: &Configuration, new: &Configuration) -> bool {
        match self {
            ConfigField::ApplyCpuOffset => old.apply_cpu_offset() != new.apply_cpu_offset(),
            ConfigField::CpuOffset => old.cpu_offset() != new.cpu_offset(),
            ConfigField::ApplyGpuOffset => old.apply_gpu_offset() != new.apply_gpu_offset(),
            ConfigField::GpuOffset => old.gpu_offset() != new.gpu_offset(),
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Changed fields, in comparison order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiff(IndexSet<ConfigField>);

impl ConfigDiff {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: ConfigField) -> bool {
        self.0.contains(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = ConfigField> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<ConfigField> for ConfigDiff {
    fn from_iter<I: IntoIterator<Item = ConfigField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ConfigDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, field) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(field.name())?;
        }
        f.write_str("]")
    }
}

/// Lists the fields of `new` that differ from `old`. Without a previous configuration
/// every field is reported as changed.
pub fn diff(old: Option<&Configuration>, new: &Configuration) -> ConfigDiff {
    match old {
        None => ConfigField::ALL.into_iter().collect(),
        Some(old) if old == new => ConfigDiff::default(),
        Some(old) => ConfigField::ALL
            .into_iter()
            .filter(|field| field.differs(old, new))
            .collect(),
    }
}
