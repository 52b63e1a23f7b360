//! Directory hierarchy discovery.
//!
//! A configuration path such as `env=prod/region=eu/app` under a base
//! directory expands to one level per ancestor, root first:
//!
//! ```text
//! base/
//! base/env=prod/
//! base/env=prod/region=eu/
//! base/env=prod/region=eu/app/
//! ```
//!
//! Each level contributes its `*.yaml` / `*.yml` files in filename order.
//! Segments shaped like `key=value` also contribute `key: value` pairs.

use crate::error::{StrataError, StrataResult};
use crate::value::{Mapping, Value};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// One directory in the hierarchy with the fragments it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Ordered, root-to-leaf view of a configuration path.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    base: PathBuf,
    segments: Vec<String>,
    levels: Vec<Level>,
}

impl Hierarchy {
    /// Discover the levels for `path` relative to `base`.
    ///
    /// `path` may also be absolute, as long as it lies under `base`.
    pub fn discover(base: &Path, path: &Path) -> StrataResult<Self> {
        let relative = if path.is_absolute() {
            path.strip_prefix(base).map_err(|_| {
                StrataError::path_not_found(&path.display().to_string())
                    .with_details(format!("must be inside {}", base.display()))
            })?
        } else {
            path
        };

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_string_lossy().to_string()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StrataError::path_not_found(&path.display().to_string())
                        .with_details("path must descend from the base directory"));
                }
            }
        }

        let leaf = segments.iter().fold(base.to_path_buf(), |dir, s| dir.join(s));
        if !leaf.is_dir() {
            return Err(StrataError::path_not_found(&leaf.display().to_string()));
        }

        let mut levels = Vec::with_capacity(segments.len() + 1);
        let mut dir = base.to_path_buf();
        levels.push(Level {
            files: yaml_files(&dir)?,
            dir: dir.clone(),
        });
        for segment in &segments {
            dir = dir.join(segment);
            levels.push(Level {
                files: yaml_files(&dir)?,
                dir: dir.clone(),
            });
        }

        debug!(
            base = %base.display(),
            levels = levels.len(),
            "Discovered configuration hierarchy"
        );

        Ok(Self {
            base: base.to_path_buf(),
            segments,
            levels,
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Levels from base to leaf.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Every fragment, in merge order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.levels
            .iter()
            .flat_map(|level| level.files.iter().map(PathBuf::as_path))
    }

    /// `key: value` pairs from `key=value` segments of the path.
    pub fn path_values(&self) -> Mapping {
        segment_values(self.segments.iter().map(String::as_str))
    }
}

/// `key: value` pairs from the `key=value` segments of `path`.
///
/// Only the first `=` splits; both sides must be non-empty. Later segments
/// override earlier ones with the same key.
pub fn path_values(path: &Path) -> Mapping {
    let segments: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    segment_values(segments.iter().map(String::as_str))
}

fn segment_values<'a>(segments: impl Iterator<Item = &'a str>) -> Mapping {
    let mut values = Mapping::new();
    for segment in segments {
        if let Some((key, value)) = segment.split_once('=')
            && !key.is_empty()
            && !value.is_empty()
        {
            values.insert(key.to_string(), Value::string(value));
        }
    }
    values
}

/// YAML files directly inside `dir`, sorted by file name.
pub fn yaml_files(dir: &Path) -> StrataResult<Vec<PathBuf>> {
    let dir_display = dir.display().to_string();
    let entries = std::fs::read_dir(dir).map_err(|e| StrataError::unreadable(&dir_display, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StrataError::unreadable(&dir_display, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        if is_yaml {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
