//! Logging setup for the command-line tool.
//!
//! Diagnostics go through `tracing`. The binary installs a `FmtSubscriber`
//! whose writer is picked by `--log`: `0`/`off`, `1`/`stdout`, `2`/`stderr`
//! or a file name (appended, without ANSI colours). `RUST_LOG` directives
//! are honoured on top of the base level.

use anyhow::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    Off,
    Stdout,
    #[default]
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Parse a `--log` argument. Anything that is not a known keyword is a file name.
    pub fn parse(arg: &str) -> Self {
        match arg {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            filename => LogTarget::File(PathBuf::from(filename)),
        }
    }
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

/// Install the global subscriber. `verbose` raises the level from INFO to DEBUG.
pub fn init_logging(target: &LogTarget, verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    match target {
        LogTarget::Off => {
            // No logging
        }
        LogTarget::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(level))
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(level))
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::File(path) => {
            // Log to file (append mode)
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(level))
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_target() {
        assert_eq!(LogTarget::parse("0"), LogTarget::Off);
        assert_eq!(LogTarget::parse("off"), LogTarget::Off);
        assert_eq!(LogTarget::parse("1"), LogTarget::Stdout);
        assert_eq!(LogTarget::parse("stderr"), LogTarget::Stderr);
        assert_eq!(
            LogTarget::parse("strata.log"),
            LogTarget::File(PathBuf::from("strata.log"))
        );
        assert_eq!(LogTarget::default(), LogTarget::Stderr);
    }

    #[test]
    fn test_env_filter_uses_base_level() {
        // SAFETY: no other test in this crate reads RUST_LOG.
        unsafe {
            std::env::remove_var("RUST_LOG");
        }
        assert_eq!(env_filter(Level::DEBUG).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(env_filter(Level::INFO).max_level_hint(), Some(LevelFilter::INFO));
    }
}
