//! Output formatting for YAML and JSON.

use crate::error::{StrataError, StrataResult};
use crate::processor::Report;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format for merged documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl FromStr for OutputFormat {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            other => Err(StrataError::invalid_settings(format!(
                "unknown output format '{}' (expected yaml or json)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a document. Any value shape is accepted, including sequences or
/// mappings produced by whole-string interpolation.
pub fn render(value: &Value, format: OutputFormat) -> StrataResult<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(value).map_err(StrataError::internal),
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(StrataError::internal),
    }
}

/// Render a full report as pretty JSON.
pub fn render_report(report: &Report) -> StrataResult<String> {
    serde_json::to_string_pretty(report)
        .map(|mut json| {
            json.push('\n');
            json
        })
        .map_err(StrataError::internal)
}
