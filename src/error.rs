//! Structured error types for merge and resolution failures.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors
    InvalidMergeStrategy,
    InvalidSettings,

    // Input errors
    PathNotFound,
    UnreadableFragment,
    UnparsableFragment,

    // Resolution errors
    MissingSecretParameter,
    UnresolvedInterpolation,

    // Internal errors
    InternalError,
}

/// Fatal error that aborts a merge or resolution call.
#[derive(Debug, Serialize)]
pub struct StrataError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl StrataError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            details: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn invalid_strategy(kind: &str, value: &str, allowed: &[&str]) -> Self {
        Self::new(
            ErrorCode::InvalidMergeStrategy,
            format!(
                "Invalid {} merge strategy '{}' (expected one of: {})",
                kind,
                value,
                allowed.join(", ")
            ),
        )
    }

    pub fn invalid_settings(reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidSettings,
            format!("Invalid settings: {}", reason),
        )
    }

    pub fn path_not_found(path: &str) -> Self {
        Self::new(ErrorCode::PathNotFound, format!("Path not found: {}", path)).with_path(path)
    }

    pub fn unreadable(path: &str, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::UnreadableFragment,
            format!("Unable to read {}: {}", path, err),
        )
        .with_path(path)
    }

    pub fn unparsable(path: &str, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::UnparsableFragment,
            format!("Unable to parse {}: {}", path, err),
        )
        .with_path(path)
    }

    pub fn missing_secret_parameter(scheme: &str, parameter: &str) -> Self {
        Self::new(
            ErrorCode::MissingSecretParameter,
            format!(
                "Secret scheme '{}' requires parameter '{}'",
                scheme, parameter
            ),
        )
    }

    pub fn unresolved(placeholders: &[String]) -> Self {
        Self::new(
            ErrorCode::UnresolvedInterpolation,
            format!(
                "Interpolation could not be resolved: {}",
                placeholders.join(", ")
            ),
        )
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for StrataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StrataError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for StrataError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<StrataError>() {
            Ok(strata_err) => strata_err,
            Err(err) => StrataError::internal(err),
        }
    }
}

/// Result type for merge and resolution operations.
pub type StrataResult<T> = std::result::Result<T, StrataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message() {
        let err = StrataError::path_not_found("a/b");
        assert_eq!(err.to_string(), "Path not found: a/b");
        assert_eq!(err.path.as_deref(), Some("a/b"));
    }

    #[test]
    fn test_serialized_code_is_screaming_snake() {
        let err = StrataError::missing_secret_parameter("file", "path");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "MISSING_SECRET_PARAMETER");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_from_anyhow_preserves_typed_error() {
        let original = anyhow::Error::new(StrataError::unresolved(&["a: {{b}}".to_string()]));
        let err: StrataError = original.into();
        assert_eq!(err.code, ErrorCode::UnresolvedInterpolation);

        let other: StrataError = anyhow::anyhow!("boom").into();
        assert_eq!(other.code, ErrorCode::InternalError);
        assert_eq!(other.message, "boom");
    }
}
