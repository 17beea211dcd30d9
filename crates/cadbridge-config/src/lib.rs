//! Shared configuration for the cadbridge command bridge.
//!
//! The bridge and any controller tooling agree on where the protocol files
//! live and how often the bridge polls for commands. Values are layered in
//! the usual order: command-line flags win over `CADBRIDGE_*` environment
//! variables, which win over the built-in defaults in [`defaults`].

pub mod defaults;
pub mod logging;
pub mod paths;

use std::ffi::OsString;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_POLL_INTERVAL_MS, default_bridge_dir, default_log_filter_string,
    default_log_format, default_poll_interval,
};
pub use self::logging::{LogFormat, LogFormatParseError};
pub use self::paths::{BridgePaths, BridgePathsError};

/// Resolved bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Parser, Serialize, Deserialize)]
#[command(
    name = "cadbridged",
    version,
    about = "Relays file-based commands into a single-threaded CAD host"
)]
pub struct Config {
    /// Directory holding `commands.json`, `results.json`, and
    /// `bridge_status.json`.
    #[arg(long, env = "CADBRIDGE_DIR", default_value_t = default_bridge_dir())]
    pub bridge_dir: Utf8PathBuf,

    /// Milliseconds between checks for a pending command.
    #[arg(
        long,
        env = "CADBRIDGE_POLL_INTERVAL_MS",
        default_value_t = DEFAULT_POLL_INTERVAL_MS
    )]
    pub poll_interval_ms: u64,

    /// Tracing filter expression (for example `info` or `cadbridge=debug`).
    #[arg(long, env = "CADBRIDGE_LOG_FILTER", default_value_t = default_log_filter_string())]
    pub log_filter: String,

    /// Log output format: `json` or `compact`.
    #[arg(long, env = "CADBRIDGE_LOG_FORMAT", default_value_t = default_log_format())]
    pub log_format: LogFormat,

    /// Name of an in-memory design to open when the host starts.
    #[arg(long, env = "CADBRIDGE_OPEN_DESIGN")]
    pub open_design: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bridge_dir: default_bridge_dir(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            open_design: None,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Arguments`] when the arguments cannot be
    /// parsed (including `--help` and `--version` requests) and
    /// [`ConfigError::InvalidPollInterval`] when validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::try_parse()?.validated()
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first item is treated as the binary name, matching
    /// [`std::env::args_os`].
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)?.validated()
    }

    /// Checks invariants clap cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPollInterval`] for a zero interval.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        Ok(self)
    }

    /// Interval between poller ticks.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line or environment values could not be parsed.
    #[error(transparent)]
    Arguments(#[from] clap::Error),
    /// The poll interval must be at least one millisecond.
    #[error("poll interval must be greater than zero")]
    InvalidPollInterval,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
        assert!(config.open_design.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::load_from_iter([
            "cadbridged",
            "--bridge-dir",
            "/srv/bridge",
            "--poll-interval-ms",
            "250",
            "--log-filter",
            "cadbridge=debug",
            "--log-format",
            "compact",
            "--open-design",
            "Bracket",
        ])
        .expect("flags should parse");

        assert_eq!(config.bridge_dir, Utf8PathBuf::from("/srv/bridge"));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.log_filter(), "cadbridge=debug");
        assert_eq!(config.log_format(), LogFormat::Compact);
        assert_eq!(config.open_design.as_deref(), Some("Bracket"));
    }

    #[rstest]
    #[case(&["cadbridged", "--poll-interval-ms", "0"])]
    fn rejects_zero_poll_interval(#[case] args: &[&str]) {
        let error = Config::load_from_iter(args).expect_err("zero interval must fail");
        assert!(matches!(error, ConfigError::InvalidPollInterval));
    }

    #[rstest]
    #[case(&["cadbridged", "--log-format", "pretty"])]
    #[case(&["cadbridged", "--poll-interval-ms", "soon"])]
    #[case(&["cadbridged", "--no-such-flag"])]
    fn rejects_malformed_arguments(#[case] args: &[&str]) {
        let error = Config::load_from_iter(args).expect_err("arguments must fail");
        assert!(matches!(error, ConfigError::Arguments(_)));
    }
}
