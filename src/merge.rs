//! Deep merge of configuration fragments.
//!
//! Folds a `source` mapping into a `target` mapping under a
//! [`MergeOptions`] policy, producing a fresh tree. Neither input is
//! modified and the output shares no nodes with them.
//!
//! - Mappings present on both sides: replaced or merged recursively ([`MapStrategy`])
//! - Sequences present on both sides: combined per [`ListStrategy`]
//! - Everything else: the source value wins, unless it is null

use crate::error::StrataError;
use crate::value::{Mapping, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How two sequences under the same key are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ListStrategy {
    /// Source list replaces target list.
    Override,
    /// Target items, then source items.
    Append,
    /// Source items, then target items.
    Prepend,
    /// Target items, then source items not already present (default).
    #[default]
    AppendUnique,
}

/// How two mappings under the same key are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum MapStrategy {
    /// Source mapping replaces target mapping.
    Override,
    /// Recurse key by key (default).
    #[default]
    Merge,
}

impl ListStrategy {
    pub const NAMES: [&'static str; 4] = ["override", "append", "prepend", "append_unique"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListStrategy::Override => "override",
            ListStrategy::Append => "append",
            ListStrategy::Prepend => "prepend",
            ListStrategy::AppendUnique => "append_unique",
        }
    }
}

impl MapStrategy {
    pub const NAMES: [&'static str; 2] = ["override", "merge"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MapStrategy::Override => "override",
            MapStrategy::Merge => "merge",
        }
    }
}

/// Lowercase and accept `-` in place of `_`.
fn normalize_strategy(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('-', "_")
}

impl FromStr for ListStrategy {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_strategy(s).as_str() {
            "override" => Ok(ListStrategy::Override),
            "append" => Ok(ListStrategy::Append),
            "prepend" => Ok(ListStrategy::Prepend),
            "append_unique" => Ok(ListStrategy::AppendUnique),
            _ => Err(StrataError::invalid_strategy("list", s, &Self::NAMES)),
        }
    }
}

impl FromStr for MapStrategy {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_strategy(s).as_str() {
            "override" => Ok(MapStrategy::Override),
            "merge" => Ok(MapStrategy::Merge),
            _ => Err(StrataError::invalid_strategy("dict", s, &Self::NAMES)),
        }
    }
}

impl TryFrom<String> for ListStrategy {
    type Error = StrataError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for MapStrategy {
    type Error = StrataError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for ListStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for MapStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Merge policy applied uniformly across a whole tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergeOptions {
    #[serde(default)]
    pub list_strategy: ListStrategy,
    #[serde(default)]
    pub map_strategy: MapStrategy,
}

impl MergeOptions {
    pub fn new(list_strategy: ListStrategy, map_strategy: MapStrategy) -> Self {
        Self {
            list_strategy,
            map_strategy,
        }
    }

    /// Override lists and merge maps, the policy used for layered tool settings.
    pub fn layered() -> Self {
        Self::new(ListStrategy::Override, MapStrategy::Merge)
    }
}

/// Merge `source` into `target`, with `source` taking precedence.
///
/// # Example
/// ```
/// use yaml_strata::mapping;
/// use yaml_strata::merge::{merge, MergeOptions};
/// use yaml_strata::value::Value;
///
/// let base = mapping! { "env" => "default", "list" => vec![Value::from("a")] };
/// let overlay = mapping! { "env" => "prod", "list" => vec![Value::from("b")] };
/// let merged = merge(&base, &overlay, &MergeOptions::default());
/// assert_eq!(merged["env"], Value::from("prod"));
/// assert_eq!(merged["list"], Value::from(vec![Value::from("a"), Value::from("b")]));
/// ```
pub fn merge(target: &Mapping, source: &Mapping, options: &MergeOptions) -> Mapping {
    let mut merged = target.clone();
    for (key, source_value) in source {
        let value = match target.get(key) {
            Some(target_value) => merge_value(target_value, source_value, options),
            None => source_value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    merged
}

/// Merge two values found under the same key.
pub fn merge_value(target: &Value, source: &Value, options: &MergeOptions) -> Value {
    match (target, source) {
        (Value::Mapping(target_map), Value::Mapping(source_map)) => match options.map_strategy {
            MapStrategy::Override => Value::Mapping(source_map.clone()),
            MapStrategy::Merge => Value::Mapping(merge(target_map, source_map, options)),
        },
        (Value::Sequence(target_items), Value::Sequence(source_items)) => Value::Sequence(
            merge_sequences(target_items, source_items, options.list_strategy),
        ),
        // Null means "not specified": keep what was there
        (target, Value::Null) => target.clone(),
        (_, source) => source.clone(),
    }
}

/// Combine two sequences under a list strategy.
pub fn merge_sequences(target: &[Value], source: &[Value], strategy: ListStrategy) -> Vec<Value> {
    match strategy {
        ListStrategy::Override => source.to_vec(),
        ListStrategy::Append => target.iter().chain(source).cloned().collect(),
        ListStrategy::Prepend => source.iter().chain(target).cloned().collect(),
        ListStrategy::AppendUnique => {
            let mut merged = target.to_vec();
            for item in source {
                if !merged.iter().any(|existing| same_item(existing, item)) {
                    merged.push(item.clone());
                }
            }
            merged
        }
    }
}

/// List item equality for `AppendUnique`.
///
/// Scalars compare by value; anything structured compares by display
/// rendering, so differently ordered but equal mappings count as distinct.
fn same_item(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null | Value::Scalar(_), Value::Null | Value::Scalar(_)) => a == b,
        _ => a.to_string() == b.to_string(),
    }
}

/// Fold fragments left to right, starting from an empty accumulator.
pub fn merge_all(fragments: impl IntoIterator<Item = Mapping>, options: &MergeOptions) -> Mapping {
    fragments
        .into_iter()
        .fold(Mapping::new(), |acc, fragment| merge(&acc, &fragment, options))
}
