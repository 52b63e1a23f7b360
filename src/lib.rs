//! yaml-strata library
//!
//! Hierarchical YAML configuration: fragments discovered along a directory
//! path are deep-merged under a selectable policy, then `{{ ... }}`
//! placeholders are resolved against the merged tree, the environment and
//! pluggable secret backends.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod hierarchy;
pub mod interpolate;
pub mod logging;
pub mod merge;
pub mod processor;
pub mod secrets;
pub mod value;

pub use error::{ErrorCode, StrataError, StrataResult};
pub use merge::{ListStrategy, MapStrategy, MergeOptions, merge};
pub use processor::{ConfigProcessor, ProcessOptions, Processed, Report};
pub use value::{Mapping, Value};
