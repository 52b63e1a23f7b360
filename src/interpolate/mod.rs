//! Interpolation resolver.
//!
//! Rewrites `{{ ... }}` placeholders in string scalars against the merged
//! document itself. Resolved values may contain further placeholders, so
//! the whole tree is rewritten pass after pass, each pass reading the
//! previous pass's output, until nothing changes or [`MAX_PASSES`] is hit.
//!
//! Per placeholder, in order:
//! 1. `env(NAME)` reads an environment variable (missing = empty string)
//! 2. `scheme.name(value)...` is handed to the secret registry
//! 3. anything else is a dot-separated path into the document
//!
//! Unresolvable placeholders are left as written and reported as warnings.
//! Escaped placeholders (`` {{`expr`}} ``) are unwrapped once at the very end.

mod placeholder;

pub use placeholder::{
    Expression, Placeholder, has_live_placeholder, is_whole_placeholder, placeholders, unescape,
};

use crate::error::{StrataError, StrataResult};
use crate::secrets::{SecretReference, SecretRegistry};
use crate::value::{Mapping, Scalar, Value};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

/// Upper bound on full-tree resolution passes.
pub const MAX_PASSES: usize = 10;

/// Options for one resolution call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Call secret backends. When false, secret placeholders are left alone.
    pub secrets: bool,
    /// Fail if live placeholders remain after the fixed point.
    pub validate: bool,
    /// Pass cap (at least one pass always runs).
    pub max_passes: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            secrets: true,
            validate: false,
            max_passes: MAX_PASSES,
        }
    }
}

/// Outcome of a resolution call.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub data: Mapping,
    pub warnings: Vec<String>,
    /// Number of passes run, including the final unchanged one.
    pub passes: usize,
    /// A pass produced no change before the cap.
    pub converged: bool,
}

/// Resolve all placeholders in `data`.
///
/// Fails only on problems that are not scoped to a single placeholder: a
/// secret backend reporting a missing required parameter, or (with
/// `validate`) placeholders that survive resolution.
pub async fn resolve(
    data: &Mapping,
    options: &ResolveOptions,
    secrets: &SecretRegistry,
) -> StrataResult<Resolution> {
    let max_passes = options.max_passes.max(1);
    let mut current = Value::Mapping(data.clone());
    let mut warnings = Vec::new();
    let mut passes = 0;
    let mut converged = false;

    while passes < max_passes {
        passes += 1;
        let mut pass = Pass {
            context: &current,
            options,
            secrets,
            warnings: Vec::new(),
        };
        let next = pass.rewrite(&current).await?;
        warnings = pass.warnings;
        if next == current {
            converged = true;
            break;
        }
        debug!(pass = passes, "Interpolation pass changed the document");
        current = next;
    }

    for warning in &warnings {
        warn!("{}", warning);
    }
    if !converged {
        let message = format!(
            "Interpolation did not reach a fixed point after {} passes; result may be partially resolved",
            max_passes
        );
        warn!("{}", message);
        warnings.push(message);
    }

    if options.validate {
        let mut unresolved = Vec::new();
        collect_unresolved(&current, "", options.secrets, &mut unresolved);
        if !unresolved.is_empty() {
            return Err(StrataError::unresolved(&unresolved));
        }
    }

    let data = match unescape_value(current) {
        Value::Mapping(map) => map,
        other => {
            return Err(StrataError::internal(format!(
                "resolution produced a non-mapping root: {}",
                other
            )));
        }
    };

    Ok(Resolution {
        data,
        warnings,
        passes,
        converged,
    })
}

/// One full-tree rewrite against a frozen context.
struct Pass<'a> {
    context: &'a Value,
    options: &'a ResolveOptions,
    secrets: &'a SecretRegistry,
    warnings: Vec<String>,
}

impl<'a> Pass<'a> {
    fn warn(&mut self, message: String) {
        if !self.warnings.contains(&message) {
            debug!("{}", message);
            self.warnings.push(message);
        }
    }

    fn rewrite<'b>(
        &'b mut self,
        value: &'b Value,
    ) -> Pin<Box<dyn Future<Output = StrataResult<Value>> + 'b>> {
        Box::pin(async move {
            Ok(match value {
                Value::Scalar(Scalar::String(text)) => self.rewrite_string(text).await?,
                Value::Null | Value::Scalar(_) => value.clone(),
                Value::Sequence(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        out.push(self.rewrite(item).await?);
                    }
                    Value::Sequence(out)
                }
                Value::Mapping(map) => {
                    let mut out = Mapping::with_capacity(map.len());
                    for (key, item) in map {
                        out.insert(key.clone(), self.rewrite(item).await?);
                    }
                    Value::Mapping(out)
                }
            })
        })
    }

    async fn rewrite_string(&mut self, text: &str) -> StrataResult<Value> {
        let found = placeholders(text);
        if found.is_empty() {
            return Ok(Value::string(text));
        }
        let whole = is_whole_placeholder(text);

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for placeholder in &found {
            out.push_str(&text[last..placeholder.start]);
            last = placeholder.end;

            if placeholder.is_escaped() {
                out.push_str(placeholder.raw);
                continue;
            }
            match self.evaluate(placeholder).await? {
                Some(value) if whole && value.is_structured() => return Ok(value),
                Some(value) => out.push_str(&value.to_string()),
                None => out.push_str(placeholder.raw),
            }
        }
        out.push_str(&text[last..]);
        Ok(Value::string(out))
    }

    /// `None` leaves the placeholder text in place.
    async fn evaluate(&mut self, placeholder: &Placeholder<'_>) -> StrataResult<Option<Value>> {
        match Expression::parse(placeholder.expr) {
            Expression::Env(name) => Ok(Some(Value::string(
                std::env::var(name).unwrap_or_default(),
            ))),
            Expression::Secret(reference) => self.resolve_secret(&reference, placeholder.raw).await,
            Expression::Path(path) => match self.context.lookup(path) {
                Some(value) => Ok(Some(value.clone())),
                None => {
                    self.warn(format!(
                        "Unresolved reference '{}' in {}",
                        path, placeholder.raw
                    ));
                    Ok(None)
                }
            },
        }
    }

    async fn resolve_secret(
        &mut self,
        reference: &SecretReference,
        raw: &str,
    ) -> StrataResult<Option<Value>> {
        if !self.options.secrets {
            return Ok(None);
        }
        let Some(resolver) = self.secrets.find(&reference.scheme) else {
            self.warn(format!(
                "No secret resolver for scheme '{}' in {}",
                reference.scheme, raw
            ));
            return Ok(None);
        };

        match resolver.resolve(&reference.scheme, &reference.params).await {
            Ok(secret) => Ok(Some(Value::string(secret))),
            Err(err) if err.is_fatal() => {
                Err(StrataError::from(err).with_details(raw.to_string()))
            }
            Err(err) => {
                self.warn(format!(
                    "Secret resolver '{}' failed for {}: {}",
                    resolver.name(),
                    raw,
                    err
                ));
                Ok(None)
            }
        }
    }
}

/// Record `key.path: {{expr}}` for every live placeholder left in the tree.
fn collect_unresolved(value: &Value, path: &str, secrets_enabled: bool, out: &mut Vec<String>) {
    match value {
        Value::Scalar(Scalar::String(text)) => {
            for placeholder in placeholders(text) {
                if placeholder.is_escaped() {
                    continue;
                }
                let is_secret = matches!(Expression::parse(placeholder.expr), Expression::Secret(_));
                if is_secret && !secrets_enabled {
                    continue;
                }
                out.push(format!("{}: {}", path, placeholder.raw));
            }
        }
        Value::Null | Value::Scalar(_) => {}
        Value::Sequence(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_unresolved(item, &join_path(path, &index.to_string()), secrets_enabled, out);
            }
        }
        Value::Mapping(map) => {
            for (key, item) in map {
                collect_unresolved(item, &join_path(path, key), secrets_enabled, out);
            }
        }
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}.{}", parent, child)
    }
}

/// Unwrap escaped placeholders everywhere in the tree. Keys are untouched.
fn unescape_value(value: Value) -> Value {
    match value {
        Value::Scalar(Scalar::String(text)) => Value::string(unescape(&text)),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(unescape_value).collect()),
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(key, item)| (key, unescape_value(item)))
                .collect(),
        ),
        other => other,
    }
}
