//! Tool settings types.
//!
//! Settings choose the defaults for a run (merge policy, interpolation
//! behaviour, output format, built-in secret backends). CLI flags override them.

use crate::format::OutputFormat;
use crate::interpolate::{MAX_PASSES, ResolveOptions};
use crate::merge::{ListStrategy, MapStrategy, MergeOptions};
use crate::processor::ProcessOptions;
use crate::secrets::{FileResolver, SecretRegistry};
use serde::{Deserialize, Serialize};

/// Top-level tool settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub merge: MergeSettings,

    #[serde(default)]
    pub interpolation: InterpolationSettings,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub secrets: SecretSettings,
}

/// Merge policy defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSettings {
    /// List policy (default: append_unique).
    #[serde(default)]
    pub list_strategy: ListStrategy,

    /// Mapping policy (default: merge).
    #[serde(default)]
    pub dict_strategy: MapStrategy,
}

/// Interpolation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpolationSettings {
    /// Resolve placeholders at all (default: true).
    #[serde(default = "default_true")]
    pub resolve: bool,

    /// Fail when placeholders remain unresolved (default: true).
    #[serde(default = "default_true")]
    pub validate: bool,

    /// Call secret backends (default: true).
    #[serde(default = "default_true")]
    pub secrets: bool,

    /// Resolution pass cap (default: 10).
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
}

impl Default for InterpolationSettings {
    fn default() -> Self {
        Self {
            resolve: true,
            validate: true,
            secrets: true,
            max_passes: default_max_passes(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_passes() -> usize {
    MAX_PASSES
}

/// Output defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Built-in secret backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSettings {
    /// Enable the `file.path(...)` backend (default: true).
    #[serde(default = "default_true")]
    pub file_backend: bool,
}

impl Default for SecretSettings {
    fn default() -> Self {
        Self { file_backend: true }
    }
}

impl Settings {
    /// Processing options derived from these settings.
    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            merge: MergeOptions::new(self.merge.list_strategy, self.merge.dict_strategy),
            resolve: self.interpolation.resolve,
            interpolation: ResolveOptions {
                secrets: self.interpolation.secrets,
                validate: self.interpolation.validate,
                max_passes: self.interpolation.max_passes,
            },
            ..ProcessOptions::default()
        }
    }

    /// Secret registry with the enabled built-in backends.
    pub fn secret_registry(&self) -> SecretRegistry {
        let mut registry = SecretRegistry::new();
        if self.secrets.file_backend {
            registry = registry.with_resolver(FileResolver::new());
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.merge.list_strategy, ListStrategy::AppendUnique);
        assert_eq!(settings.merge.dict_strategy, MapStrategy::Merge);
        assert!(settings.interpolation.validate);
        assert_eq!(settings.interpolation.max_passes, 10);
        assert_eq!(settings.output.format, OutputFormat::Yaml);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let settings: Settings =
            serde_yaml::from_str("merge:\n  list_strategy: override\ninterpolation:\n  validate: false\n")
                .unwrap();
        assert_eq!(settings.merge.list_strategy, ListStrategy::Override);
        assert_eq!(settings.merge.dict_strategy, MapStrategy::Merge);
        assert!(!settings.interpolation.validate);
        assert!(settings.interpolation.secrets);
    }

    #[test]
    fn test_process_options_and_registry() {
        let mut settings = Settings::default();
        settings.interpolation.secrets = false;
        settings.secrets.file_backend = false;

        let options = settings.process_options();
        assert!(!options.interpolation.secrets);
        assert!(options.interpolation.validate);
        assert!(settings.secret_registry().is_empty());
        assert_eq!(Settings::default().secret_registry().names(), vec!["file"]);
    }
}
