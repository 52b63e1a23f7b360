//! Local file secret backend.
//!
//! `file.path(/run/secrets/db)` returns the file contents;
//! `file.path(/run/secrets/app.yaml).key(password)` parses the file as YAML
//! and returns the display string of a top-level key.

use super::{SecretError, SecretReference, SecretResolver};
use crate::value::Value;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

pub const FILE_SCHEME: &str = "file";

#[derive(Debug, Clone, Default)]
pub struct FileResolver;

impl FileResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretResolver for FileResolver {
    fn name(&self) -> &str {
        FILE_SCHEME
    }

    fn supports(&self, scheme: &str) -> bool {
        scheme == FILE_SCHEME
    }

    async fn resolve(
        &self,
        scheme: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<String, SecretError> {
        let path = SecretReference::require(scheme, params, "path")?;
        debug!(path = %path, "Reading file secret");
        let content = tokio::fs::read_to_string(path).await?;

        let Some(key) = params.get("key") else {
            let trimmed = content
                .strip_suffix('\n')
                .map(|s| s.strip_suffix('\r').unwrap_or(s))
                .unwrap_or(&content);
            return Ok(trimmed.to_string());
        };

        let document = Value::parse_yaml(&content).map_err(|e| SecretError::Backend {
            backend: FILE_SCHEME.to_string(),
            message: format!("{} is not valid YAML: {}", path, e),
        })?;
        document
            .as_mapping()
            .and_then(|map| map.get(key.as_str()))
            .map(|value| value.to_string())
            .ok_or_else(|| SecretError::NotFound(format!("{} in {}", key, path)))
    }
}
