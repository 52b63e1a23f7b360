//! Tool settings.
//!
//! Settings are merged from tiers, lowest to highest priority:
//! 1. **Defaults** - built in
//! 2. **Project** - `./.yaml-strata.yaml`
//! 3. **User** - `~/.yaml-strata/config.yaml`
//! 4. **Environment** - the variables below
//!
//! Command-line flags are applied on top by the binary.
//!
//! ## Environment Variables
//! - `YAML_STRATA_CONFIG` - Explicit settings file (replaces project and user tiers)
//! - `YAML_STRATA_USER_DIR` - User settings dir (default: `~/.yaml-strata`)
//! - `YAML_STRATA_LIST_MERGE` - List merge strategy
//! - `YAML_STRATA_DICT_MERGE` - Mapping merge strategy
//! - `YAML_STRATA_SKIP_SECRETS` - Skip secret backends when truthy
//! - `YAML_STRATA_OUTPUT_FORMAT` - `yaml` or `json`

mod loader;
mod types;

pub use loader::{PROJECT_FILE, SettingsLoader, SettingsPaths, SettingsTier, USER_FILE};
pub use types::*;
