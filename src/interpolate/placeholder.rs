//! Placeholder grammar.
//!
//! - `{{ expr }}` is live; `expr` is trimmed
//! - `` {{`expr`}} `` is escaped and never evaluated
//! - only innermost placeholders are matched, so `{{a.{{b}}}}` resolves `b` first

use crate::secrets::SecretReference;
use regex_lite::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder pattern is valid"));

static ESCAPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*`([^`{}]*)`\s*\}\}").expect("escaped placeholder pattern is valid")
});

static ENV_EXPR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^env\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)$").expect("env pattern is valid")
});

/// One `{{...}}` occurrence inside a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub start: usize,
    pub end: usize,
    /// Full text including braces.
    pub raw: &'a str,
    /// Trimmed expression between the braces.
    pub expr: &'a str,
}

impl Placeholder<'_> {
    pub fn is_escaped(&self) -> bool {
        self.expr.len() >= 2 && self.expr.starts_with('`') && self.expr.ends_with('`')
    }
}

/// Innermost placeholders in `text`, left to right.
pub fn placeholders(text: &str) -> Vec<Placeholder<'_>> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1)?;
            Some(Placeholder {
                start: whole.start(),
                end: whole.end(),
                raw: whole.as_str(),
                expr: inner.as_str().trim(),
            })
        })
        .collect()
}

/// True if a live placeholder remains in `text`.
pub fn has_live_placeholder(text: &str) -> bool {
    placeholders(text).iter().any(|p| !p.is_escaped())
}

/// The placeholder spans the whole (trimmed) string and no other `{` occurs,
/// so a structured result may replace the scalar.
pub fn is_whole_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with("{{") && trimmed.ends_with("}}") && text.matches('{').count() == 2
}

/// Turn every `` {{`expr`}} `` into `{{expr}}`.
pub fn unescape(text: &str) -> String {
    ESCAPED
        .replace_all(text, |caps: &Captures<'_>| format!("{{{{{}}}}}", &caps[1]))
        .into_owned()
}

/// What a placeholder expression asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression<'a> {
    /// `env(NAME)`
    Env(&'a str),
    /// `scheme.name(value)...`
    Secret(SecretReference),
    /// `a.b.c`
    Path(&'a str),
}

impl<'a> Expression<'a> {
    /// Classify an expression: environment lookups first, then secrets,
    /// everything else is a path.
    pub fn parse(expr: &'a str) -> Self {
        if let Some(name) = ENV_EXPR.captures(expr).and_then(|c| c.get(1)) {
            return Expression::Env(name.as_str());
        }
        if let Some(reference) = SecretReference::parse(expr) {
            return Expression::Secret(reference);
        }
        Expression::Path(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_innermost_placeholders() {
        let found = placeholders("{{ a }} and {{projects.{{selected}}.tagging}}");
        let exprs: Vec<&str> = found.iter().map(|p| p.expr).collect();
        assert_eq!(exprs, vec!["a", "selected"]);
        assert_eq!(found[0].raw, "{{ a }}");
    }

    #[test]
    fn test_escaped_detection() {
        let found = placeholders("{{`a.b`}}");
        assert_eq!(found.len(), 1);
        assert!(found[0].is_escaped());
        assert!(!has_live_placeholder("{{`a.b`}} text"));
        assert!(has_live_placeholder("{{`a.b`}} {{c}}"));
    }

    #[test]
    fn test_whole_placeholder() {
        assert!(is_whole_placeholder("{{a.b}}"));
        assert!(is_whole_placeholder("  {{ a.b }} "));
        assert!(!is_whole_placeholder("x{{a.b}}"));
        assert!(!is_whole_placeholder("{{a}}{{b}}"));
        assert!(!is_whole_placeholder("{{a.{{b}}}}"));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("{{`a.b`}}"), "{{a.b}}");
        assert_eq!(unescape("x {{ `env(HOME)` }} y"), "x {{env(HOME)}} y");
        assert_eq!(unescape("{{a.b}}"), "{{a.b}}");
    }

    #[test]
    fn test_expression_classification() {
        assert_eq!(Expression::parse("env(HOME)"), Expression::Env("HOME"));
        assert_eq!(Expression::parse("a.b.c"), Expression::Path("a.b.c"));
        match Expression::parse("foo.path(x)") {
            Expression::Secret(reference) => {
                assert_eq!(reference.scheme, "foo");
                assert_eq!(reference.params["path"], "x");
            }
            other => panic!("expected secret, got {:?}", other),
        }
    }
}
