//! Settings loader with tier-based merging.
//!
//! Loads settings from multiple tiers and merges them with the crate's own
//! merge engine (lists replaced, mappings merged key by key).

use super::types::Settings;
use crate::error::{StrataError, StrataResult};
use crate::format::OutputFormat;
use crate::merge::{ListStrategy, MapStrategy, MergeOptions, merge_all};
use crate::value::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Project-level settings file, relative to the working directory.
pub const PROJECT_FILE: &str = ".yaml-strata.yaml";

/// Settings file name inside the user directory.
pub const USER_FILE: &str = "config.yaml";

/// Settings tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SettingsTier {
    /// Built-in defaults (lowest priority)
    Defaults = 0,
    /// Project-level file (./.yaml-strata.yaml)
    Project = 1,
    /// User-level file (~/.yaml-strata/config.yaml)
    User = 2,
    /// Explicit file from --config or YAML_STRATA_CONFIG
    Explicit = 3,
    /// Environment variables
    Environment = 4,
}

impl std::fmt::Display for SettingsTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsTier::Defaults => write!(f, "defaults"),
            SettingsTier::Project => write!(f, "project"),
            SettingsTier::User => write!(f, "user"),
            SettingsTier::Explicit => write!(f, "explicit"),
            SettingsTier::Environment => write!(f, "environment"),
        }
    }
}

/// Paths for each settings tier.
#[derive(Debug, Clone, Default)]
pub struct SettingsPaths {
    /// Project-level settings file
    pub project_file: Option<PathBuf>,
    /// User-level settings directory
    pub user_dir: Option<PathBuf>,
    /// Explicit settings file; replaces the project and user tiers
    pub explicit_file: Option<PathBuf>,
}

impl SettingsPaths {
    /// Discover settings paths from environment and defaults.
    pub fn discover() -> Self {
        // User dir: YAML_STRATA_USER_DIR or ~/.yaml-strata
        let user_dir = std::env::var("YAML_STRATA_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".yaml-strata")));

        let explicit_file = std::env::var("YAML_STRATA_CONFIG").ok().map(PathBuf::from);

        Self {
            project_file: Some(PathBuf::from(PROJECT_FILE)),
            user_dir,
            explicit_file,
        }
    }

    /// Create paths with explicit locations.
    pub fn with_paths(project_file: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_file,
            user_dir,
            explicit_file: None,
        }
    }

    /// Use `path` instead of the project and user tiers.
    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    pub fn user_file(&self) -> Option<PathBuf> {
        self.user_dir.as_ref().map(|dir| dir.join(USER_FILE))
    }
}

/// Settings loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    /// Paths for each tier
    pub paths: SettingsPaths,
    settings: Settings,
    /// Files that contributed, lowest tier first
    sources: Vec<(SettingsTier, PathBuf)>,
}

impl SettingsLoader {
    /// Load settings from all tiers using the process environment.
    pub fn load() -> StrataResult<Self> {
        Self::load_with_paths(SettingsPaths::discover())
    }

    /// Load settings with explicit paths using the process environment.
    pub fn load_with_paths(paths: SettingsPaths) -> StrataResult<Self> {
        Self::load_with_env(paths, |key| std::env::var(key).ok())
    }

    /// Load settings with explicit paths and an environment lookup.
    pub fn load_with_env<F>(paths: SettingsPaths, env: F) -> StrataResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut tiers: Vec<Mapping> = Vec::new();
        let mut sources = Vec::new();

        // Tier 1: Defaults
        let defaults = serde_yaml::to_value(Settings::default()).map_err(StrataError::internal)?;
        if let Value::Mapping(map) = Value::from_yaml(defaults)? {
            tiers.push(map);
        }

        if let Some(explicit) = &paths.explicit_file {
            // An explicit file must exist and parse
            tiers.push(read_explicit(explicit)?);
            sources.push((SettingsTier::Explicit, explicit.clone()));
        } else {
            // Tier 2: Project file
            if let Some(project_file) = &paths.project_file
                && let Some(map) = read_discovered(project_file, SettingsTier::Project)
            {
                tiers.push(map);
                sources.push((SettingsTier::Project, project_file.clone()));
            }

            // Tier 3: User file
            if let Some(user_file) = paths.user_file()
                && let Some(map) = read_discovered(&user_file, SettingsTier::User)
            {
                tiers.push(map);
                sources.push((SettingsTier::User, user_file));
            }
        }

        let merged = merge_all(tiers, &MergeOptions::layered());
        let json = serde_json::to_value(Value::Mapping(merged)).map_err(StrataError::internal)?;
        let mut settings: Settings =
            serde_json::from_value(json).map_err(StrataError::invalid_settings)?;

        // Tier 4: Environment variable overrides
        Self::apply_env_overrides(&mut settings, env)?;

        debug!(sources = sources.len(), "Loaded settings");
        Ok(Self {
            paths,
            settings,
            sources,
        })
    }

    /// Apply environment variable overrides to settings.
    fn apply_env_overrides<F>(settings: &mut Settings, env: F) -> StrataResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = env("YAML_STRATA_LIST_MERGE") {
            settings.merge.list_strategy = value.parse::<ListStrategy>()?;
        }

        if let Some(value) = env("YAML_STRATA_DICT_MERGE") {
            settings.merge.dict_strategy = value.parse::<MapStrategy>()?;
        }

        if let Some(value) = env("YAML_STRATA_SKIP_SECRETS")
            && is_truthy(&value)
        {
            settings.interpolation.secrets = false;
        }

        if let Some(value) = env("YAML_STRATA_OUTPUT_FORMAT") {
            settings.output.format = value.parse::<OutputFormat>()?;
        }

        Ok(())
    }

    /// Get the loaded settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get mutable access to the settings.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Consume the loader and return the settings.
    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Files that contributed to the settings, lowest tier first.
    pub fn sources(&self) -> &[(SettingsTier, PathBuf)] {
        &self.sources
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Read a settings file as a mapping. An empty file is an empty mapping.
fn read_settings_file(path: &Path) -> anyhow::Result<Mapping> {
    let content = std::fs::read_to_string(path)?;
    match Value::parse_yaml(&content)? {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(map) => Ok(map),
        other => anyhow::bail!("settings must be a mapping, found {}", other),
    }
}

fn read_explicit(path: &Path) -> StrataResult<Mapping> {
    read_settings_file(path).map_err(|e| {
        StrataError::invalid_settings(format!("cannot load {}: {}", path.display(), e))
            .with_path(path.display().to_string())
    })
}

fn read_discovered(path: &Path, tier: SettingsTier) -> Option<Mapping> {
    if !path.is_file() {
        return None;
    }
    match read_settings_file(path) {
        Ok(map) => Some(map),
        Err(e) => {
            warn!(
                tier = %tier,
                path = %path.display(),
                error = %e,
                "Skipping unreadable settings file"
            );
            None
        }
    }
}
