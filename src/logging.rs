//! Logging setup for the vault binary.
//!
//! Events go to stdout and are appended to the configured log file. When
//! `RUST_LOG` is set it replaces the configured level entirely; otherwise
//! the vault logs at the configured level and sqlx is held at `warn` so
//! per-statement chatter does not drown out catalog events.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{Result, VaultError};

/// Targets capped below the configured level unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["sqlx=warn"];

/// Parse a level name, case-insensitively. Unknown names yield `None`.
pub(crate) fn parse_level(level: &str) -> Option<Level> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Filter directives used when `RUST_LOG` is absent.
fn default_directives(level: Level) -> String {
    let mut directives = level.to_string().to_ascii_lowercase();
    for quiet in QUIET_TARGETS {
        directives.push(',');
        directives.push_str(quiet);
    }
    directives
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    let directives = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(from_env) if !from_env.trim().is_empty() => from_env,
        _ => default_directives(parse_level(level).unwrap_or(Level::INFO)),
    };
    EnvFilter::try_new(&directives)
        .map_err(|e| VaultError::Config(format!("invalid log filter '{directives}': {e}")))
}

/// Open the log file for appending, creating parent directories.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Install the global subscriber writing to stdout and the log file.
///
/// Fails if the file cannot be opened or a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(&config.level)?;
    let log_file = Arc::new(open_log_file(Path::new(&config.file))?);
    let writer = std::io::stdout.and(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .try_init()
        .map_err(|e| VaultError::Config(format!("logging already initialized: {e}")))
}

/// Install a stdout-only subscriber. Used when the log file is unusable.
///
/// Does nothing if a subscriber is already installed.
pub fn init_console_only(level: &str) {
    let filter = build_filter(level)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(Level::INFO)));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(true)
                .with_target(true),
        )
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_level_case_insensitive() {
        assert_eq!(parse_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level("Info"), Some(Level::INFO));
        assert_eq!(parse_level("warning"), Some(Level::WARN));
        assert_eq!(parse_level("ERROR"), Some(Level::ERROR));
    }

    #[test]
    fn test_parse_level_rejects_unknown() {
        assert_eq!(parse_level("verbose"), None);
        assert_eq!(parse_level(""), None);
    }

    #[test]
    fn test_default_directives_quiet_sqlx() {
        assert_eq!(default_directives(Level::DEBUG), "debug,sqlx=warn");
        assert!(EnvFilter::try_new(default_directives(Level::TRACE)).is_ok());
    }

    #[test]
    fn test_log_file_is_appended() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("vault.log");

        writeln!(open_log_file(&path).unwrap(), "first run").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second run").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first run\nsecond run\n");
    }
}
