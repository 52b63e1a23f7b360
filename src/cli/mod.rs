//! CLI definitions for yaml-strata
//!
//! This module defines the CLI structure using clap's derive macros.

use crate::merge::{ListStrategy, MapStrategy};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the merged document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// YAML document (default)
    Yaml,
    /// Pretty-printed JSON
    Json,
}

/// Merge a hierarchy of YAML fragments and resolve its interpolations
#[derive(Parser, Debug)]
#[command(name = "yaml-strata", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration path, relative to the base directory (e.g. env=prod/region=eu)
    pub path: PathBuf,

    /// Base directory of the hierarchy (default: current directory)
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// List merge strategy: override, append, prepend, append_unique
    #[arg(long)]
    pub list_merge_strategy: Option<ListStrategy>,

    /// Mapping merge strategy: override, merge
    #[arg(long)]
    pub dict_merge_strategy: Option<MapStrategy>,

    /// Output format (overrides settings)
    #[arg(long, value_enum)]
    pub output_format: Option<OutputFormatArg>,

    /// Write output to this file instead of stdout
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Keep only these top-level keys (repeatable)
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// Drop these top-level keys (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Wrap the result under this key
    #[arg(long)]
    pub enclosing_key: Option<String>,

    /// Unwrap the result from this key
    #[arg(long)]
    pub remove_enclosing_key: Option<String>,

    /// Do not resolve interpolation placeholders
    #[arg(long)]
    pub skip_interpolation_resolving: bool,

    /// Do not fail on unresolved placeholders
    #[arg(long)]
    pub skip_interpolation_validation: bool,

    /// Do not call secret backends
    #[arg(long)]
    pub skip_secrets: bool,

    /// Print the full report (data, warnings, errors) as JSON
    #[arg(long)]
    pub report: bool,

    /// Path to settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: String,
}
