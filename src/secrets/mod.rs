//! Secret resolver registry.
//!
//! Secret placeholders look like `scheme.name(value).name(value)`. The
//! scheme selects a backend; the `name(value)` segments become its
//! parameters. Backends are plain [`SecretResolver`] objects kept in
//! registration order by a [`SecretRegistry`]; the first one that supports a
//! scheme handles it.

mod file;

pub use file::FileResolver;

use crate::error::StrataError;
use async_trait::async_trait;
use regex_lite::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

static SECRET_EXPR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_-]*)((?:\.[A-Za-z_][A-Za-z0-9_-]*\([^()]*\))+)$")
        .expect("secret expression pattern is valid")
});

static SECRET_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.([A-Za-z_][A-Za-z0-9_-]*)\(([^()]*)\)").expect("secret parameter pattern is valid")
});

/// Failure reported by a secret backend.
#[derive(Debug, Error)]
pub enum SecretError {
    /// A parameter the backend cannot work without is absent. Fatal.
    #[error("secret scheme '{scheme}' requires parameter '{parameter}'")]
    MissingParameter { scheme: String, parameter: String },

    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("{backend} backend error: {message}")]
    Backend { backend: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SecretError {
    /// Whether this failure must abort resolution instead of leaving the
    /// placeholder unresolved.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SecretError::MissingParameter { .. })
    }
}

impl From<SecretError> for StrataError {
    fn from(err: SecretError) -> Self {
        match err {
            SecretError::MissingParameter { scheme, parameter } => {
                StrataError::missing_secret_parameter(&scheme, &parameter)
            }
            other => StrataError::internal(other),
        }
    }
}

/// Parsed secret placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    pub scheme: String,
    pub params: BTreeMap<String, String>,
}

impl SecretReference {
    /// Parse `scheme.name(value)...`. Returns `None` for anything else.
    pub fn parse(expr: &str) -> Option<Self> {
        let captures = SECRET_EXPR.captures(expr)?;
        let scheme = captures.get(1)?.as_str().to_string();
        let segments = captures.get(2)?.as_str();
        let params = SECRET_PARAM
            .captures_iter(segments)
            .filter_map(|c| Some((c.get(1)?.as_str().to_string(), c.get(2)?.as_str().to_string())))
            .collect();
        Some(Self { scheme, params })
    }

    /// Look up a required parameter.
    pub fn require<'a>(
        scheme: &str,
        params: &'a BTreeMap<String, String>,
        name: &str,
    ) -> Result<&'a str, SecretError> {
        params
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SecretError::MissingParameter {
                scheme: scheme.to_string(),
                parameter: name.to_string(),
            })
    }
}

impl fmt::Display for SecretReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scheme)?;
        for (name, value) in &self.params {
            write!(f, ".{}({})", name, value)?;
        }
        Ok(())
    }
}

/// A secret backend.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Whether this backend handles `scheme`.
    fn supports(&self, scheme: &str) -> bool;

    /// Fetch the secret value.
    async fn resolve(
        &self,
        scheme: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<String, SecretError>;
}

/// Ordered collection of secret backends.
#[derive(Clone, Default)]
pub struct SecretRegistry {
    resolvers: Vec<Arc<dyn SecretResolver>>,
}

impl SecretRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in local backends.
    pub fn with_builtin() -> Self {
        Self::new().with_resolver(FileResolver::new())
    }

    /// Add a backend after those already registered.
    pub fn with_resolver(mut self, resolver: impl SecretResolver + 'static) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    pub fn register(&mut self, resolver: Arc<dyn SecretResolver>) {
        self.resolvers.push(resolver);
    }

    /// First backend supporting `scheme`, in registration order.
    pub fn find(&self, scheme: &str) -> Option<&dyn SecretResolver> {
        self.resolvers
            .iter()
            .find(|r| r.supports(scheme))
            .map(Arc::as_ref)
    }

    pub fn names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl fmt::Debug for SecretRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRegistry")
            .field("resolvers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        name: &'static str,
        scheme: &'static str,
    }

    #[async_trait]
    impl SecretResolver for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn supports(&self, scheme: &str) -> bool {
            scheme == self.scheme
        }

        async fn resolve(
            &self,
            _scheme: &str,
            _params: &BTreeMap<String, String>,
        ) -> Result<String, SecretError> {
            Ok(self.name.to_string())
        }
    }

    #[test]
    fn test_parse_reference() {
        let reference = SecretReference::parse("ssm.path(/app/db).region(us-east-1)").unwrap();
        assert_eq!(reference.scheme, "ssm");
        assert_eq!(reference.params["path"], "/app/db");
        assert_eq!(reference.params["region"], "us-east-1");
    }

    #[test]
    fn test_parse_rejects_plain_paths() {
        assert!(SecretReference::parse("a.b.c").is_none());
        assert!(SecretReference::parse("ssm").is_none());
        assert!(SecretReference::parse("ssm.path(x).tail").is_none());
    }

    #[test]
    fn test_parse_allows_empty_value() {
        let reference = SecretReference::parse("vault.path()").unwrap();
        assert_eq!(reference.params["path"], "");
        let err = SecretReference::require("vault", &reference.params, "path").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_registry_uses_first_match() {
        let registry = SecretRegistry::new()
            .with_resolver(Fixed { name: "first", scheme: "s3" })
            .with_resolver(Fixed { name: "second", scheme: "s3" })
            .with_resolver(Fixed { name: "third", scheme: "ssm" });

        assert_eq!(registry.find("s3").map(|r| r.name()), Some("first"));
        assert_eq!(registry.find("ssm").map(|r| r.name()), Some("third"));
        assert!(registry.find("vault").is_none());
        assert_eq!(registry.names(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_fatal_error_converts_to_missing_parameter() {
        let err = SecretError::MissingParameter {
            scheme: "vault".into(),
            parameter: "path".into(),
        };
        assert!(err.is_fatal());
        let strata: StrataError = err.into();
        assert_eq!(strata.code, crate::error::ErrorCode::MissingSecretParameter);
    }

    #[test]
    fn test_non_parameter_errors_are_recoverable() {
        assert!(!SecretError::NotFound("x".into()).is_fatal());
        let backend = SecretError::Backend {
            backend: "vault".into(),
            message: "sealed".into(),
        };
        assert!(!backend.is_fatal());
        assert_eq!(backend.to_string(), "vault backend error: sealed");
    }
}
