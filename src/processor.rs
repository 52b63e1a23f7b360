//! End-to-end processing of a configuration path.
//!
//! discover levels → parse fragments → fold with the merge engine → add
//! path values → resolve interpolations → exclude / filter / enclosing key.

use crate::error::{StrataError, StrataResult};
use crate::hierarchy::Hierarchy;
use crate::interpolate::{self, ResolveOptions};
use crate::merge::{MergeOptions, merge};
use crate::secrets::SecretRegistry;
use crate::value::{Mapping, Value};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options for one processing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOptions {
    pub merge: MergeOptions,
    /// Run the interpolation resolver at all.
    pub resolve: bool,
    pub interpolation: ResolveOptions,
    /// Keep only these top-level keys (empty keeps everything).
    pub filters: Vec<String>,
    /// Drop these top-level keys.
    pub exclude: Vec<String>,
    /// Wrap the result under this key.
    pub enclosing_key: Option<String>,
    /// Unwrap the result from this key.
    pub remove_enclosing_key: Option<String>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            merge: MergeOptions::default(),
            resolve: true,
            interpolation: ResolveOptions::default(),
            filters: Vec::new(),
            exclude: Vec::new(),
            enclosing_key: None,
            remove_enclosing_key: None,
        }
    }
}

/// Successful processing result.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub data: Mapping,
    pub warnings: Vec<String>,
    /// Fragments merged, in order.
    pub files: Vec<PathBuf>,
}

/// Result contract handed to output: data plus warnings and fatal errors.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Report {
    /// A fatal error is the sole reported error and leaves no data.
    pub fn from_result(result: &StrataResult<Processed>) -> Self {
        match result {
            Ok(processed) => Self {
                data: Value::Mapping(processed.data.clone()),
                warnings: processed.warnings.clone(),
                errors: Vec::new(),
            },
            Err(err) => Self {
                data: Value::Mapping(Mapping::new()),
                warnings: Vec::new(),
                errors: vec![err.to_string()],
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the merge and resolution pipeline with a fixed set of secret backends.
#[derive(Debug, Clone, Default)]
pub struct ConfigProcessor {
    secrets: SecretRegistry,
}

impl ConfigProcessor {
    pub fn new(secrets: SecretRegistry) -> Self {
        Self { secrets }
    }

    pub fn secrets(&self) -> &SecretRegistry {
        &self.secrets
    }

    /// Process `path` (relative to, or inside, `base`).
    pub async fn process(
        &self,
        base: &Path,
        path: &Path,
        options: &ProcessOptions,
    ) -> StrataResult<Processed> {
        let hierarchy = Hierarchy::discover(base, path)?;
        let merged = merge_hierarchy(&hierarchy, &options.merge)?;
        let files: Vec<PathBuf> = hierarchy.files().map(Path::to_path_buf).collect();
        info!(
            path = %path.display(),
            fragments = files.len(),
            "Merged configuration hierarchy"
        );

        let (data, mut warnings) = if options.resolve {
            let resolution =
                interpolate::resolve(&merged, &options.interpolation, &self.secrets).await?;
            debug!(
                passes = resolution.passes,
                converged = resolution.converged,
                "Resolved interpolations"
            );
            (resolution.data, resolution.warnings)
        } else {
            (merged, Vec::new())
        };

        let data = post_process(data, options, &mut warnings);
        Ok(Processed {
            data,
            warnings,
            files,
        })
    }
}

/// Fold every fragment of the hierarchy, then the path values.
pub fn merge_hierarchy(hierarchy: &Hierarchy, options: &MergeOptions) -> StrataResult<Mapping> {
    let mut merged = Mapping::new();
    for file in hierarchy.files() {
        debug!(file = %file.display(), "Merging fragment");
        let fragment = load_fragment(file)?;
        merged = merge(&merged, &fragment, options);
    }
    Ok(merge(&merged, &hierarchy.path_values(), options))
}

/// Read and parse one YAML fragment. An empty file is an empty mapping.
pub fn load_fragment(path: &Path) -> StrataResult<Mapping> {
    let display = path.display().to_string();
    let content =
        std::fs::read_to_string(path).map_err(|e| StrataError::unreadable(&display, e))?;
    match Value::parse_yaml(&content).map_err(|e| StrataError::unparsable(&display, e))? {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(map) => Ok(map),
        other => Err(StrataError::unparsable(
            &display,
            format!("top-level document must be a mapping, found {}", other),
        )),
    }
}

/// Exclude, filter, then remove/add the enclosing key.
pub fn post_process(
    mut data: Mapping,
    options: &ProcessOptions,
    warnings: &mut Vec<String>,
) -> Mapping {
    for key in &options.exclude {
        data.shift_remove(key);
    }

    if !options.filters.is_empty() {
        data.retain(|key, _| options.filters.contains(key));
    }

    if let Some(key) = &options.remove_enclosing_key {
        match data.shift_remove(key) {
            Some(Value::Mapping(inner)) => data = inner,
            Some(other) => {
                let message = format!(
                    "Enclosing key '{}' does not hold a mapping; leaving it in place",
                    key
                );
                warn!("{}", message);
                warnings.push(message);
                data.insert(key.clone(), other);
            }
            None => {
                let message = format!("Enclosing key '{}' not found; nothing removed", key);
                warn!("{}", message);
                warnings.push(message);
            }
        }
    }

    if let Some(key) = &options.enclosing_key {
        let mut wrapped = Mapping::new();
        wrapped.insert(key.clone(), Value::Mapping(data));
        data = wrapped;
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::mapping;
    use tempfile::TempDir;

    #[test]
    fn test_load_fragment_rejects_non_mapping() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("list.yaml");
        std::fs::write(&file, "- a\n- b\n").unwrap();
        let err = load_fragment(&file).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnparsableFragment);
    }

    #[test]
    fn test_load_fragment_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("bad.yaml");
        std::fs::write(&file, "a: [unclosed\n").unwrap();
        let err = load_fragment(&file).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnparsableFragment);
        assert_eq!(err.path.as_deref(), Some(file.display().to_string().as_str()));
    }

    #[test]
    fn test_load_fragment_missing_file() {
        let err = load_fragment(Path::new("/no/such/fragment.yaml")).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnreadableFragment);
    }

    #[test]
    fn test_post_process_order() {
        let data = mapping! {
            "app" => mapping! { "name" => "svc", "debug" => true },
            "meta" => "x",
            "secret" => "y",
        };
        let options = ProcessOptions {
            exclude: vec!["secret".into()],
            filters: vec!["app".into(), "secret".into()],
            remove_enclosing_key: Some("app".into()),
            enclosing_key: Some("config".into()),
            ..ProcessOptions::default()
        };
        let mut warnings = Vec::new();
        let result = post_process(data, &options, &mut warnings);
        assert_eq!(
            result,
            mapping! { "config" => mapping! { "name" => "svc", "debug" => true } }
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_remove_missing_enclosing_key_warns() {
        let data = mapping! { "a" => 1 };
        let options = ProcessOptions {
            remove_enclosing_key: Some("wrapper".into()),
            ..ProcessOptions::default()
        };
        let mut warnings = Vec::new();
        let result = post_process(data.clone(), &options, &mut warnings);
        assert_eq!(result, data);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_report_from_error() {
        let result: StrataResult<Processed> = Err(StrataError::path_not_found("x"));
        let report = Report::from_result(&result);
        assert!(!report.is_success());
        assert_eq!(report.errors, vec!["Path not found: x".to_string()]);
        assert_eq!(report.data, Value::Mapping(Mapping::new()));
    }
}
