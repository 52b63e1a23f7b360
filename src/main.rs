//! yaml-strata
//!
//! Merges the YAML fragments found along a directory path and prints the
//! resolved document.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};
use yaml_strata::cli::{Cli, OutputFormatArg};
use yaml_strata::config::{Settings, SettingsLoader, SettingsPaths};
use yaml_strata::format::{OutputFormat, render, render_report};
use yaml_strata::logging::{LogTarget, init_logging};
use yaml_strata::processor::{ConfigProcessor, Report};
use yaml_strata::value::Value;

/// Convert CLI OutputFormatArg to settings OutputFormat.
fn cli_format_to_config(arg: OutputFormatArg) -> OutputFormat {
    match arg {
        OutputFormatArg::Yaml => OutputFormat::Yaml,
        OutputFormatArg::Json => OutputFormat::Json,
    }
}

/// Apply command-line flags on top of the loaded settings.
fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(strategy) = cli.list_merge_strategy {
        settings.merge.list_strategy = strategy;
    }
    if let Some(strategy) = cli.dict_merge_strategy {
        settings.merge.dict_strategy = strategy;
    }
    if let Some(format) = cli.output_format {
        settings.output.format = cli_format_to_config(format);
    }
    if cli.skip_interpolation_resolving {
        settings.interpolation.resolve = false;
    }
    if cli.skip_interpolation_validation {
        settings.interpolation.validate = false;
    }
    if cli.skip_secrets {
        settings.interpolation.secrets = false;
    }
}

/// Write rendered output to a file, or to stdout.
fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!(path = %path.display(), "Wrote output");
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(content.as_bytes())?;
            handle.flush()?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut paths = SettingsPaths::discover();
    if let Some(config_path) = &cli.config {
        paths = paths.with_explicit(config_path);
    }
    let mut loader = SettingsLoader::load_with_paths(paths).context("Failed to load settings")?;
    for (tier, path) in loader.sources() {
        debug!(tier = %tier, path = %path.display(), "Using settings file");
    }

    apply_cli_overrides(loader.settings_mut(), &cli);
    let settings = loader.into_settings();

    let base = match &cli.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let mut options = settings.process_options();
    options.filters = cli.filters.clone();
    options.exclude = cli.exclude.clone();
    options.enclosing_key = cli.enclosing_key.clone();
    options.remove_enclosing_key = cli.remove_enclosing_key.clone();

    let processor = ConfigProcessor::new(settings.secret_registry());
    debug!(backends = ?processor.secrets().names(), "Secret backends");
    let result = processor.process(&base, &cli.path, &options).await;

    if cli.report {
        let report = Report::from_result(&result);
        write_output(&render_report(&report)?, cli.output_file.as_deref())?;
        if !report.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let processed = result?;
    let rendered = render(&Value::Mapping(processed.data), settings.output.format)?;
    write_output(&rendered, cli.output_file.as_deref())?;

    Ok(())
}
