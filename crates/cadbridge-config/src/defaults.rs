use std::env;
use std::time::Duration;

use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Directory name appended to the platform data directory.
pub const BRIDGE_DIR_NAME: &str = "cadbridge";

/// Default interval between poller ticks, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Default log filter expression used by the bridge binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default poll interval as a [`Duration`].
#[must_use]
pub const fn default_poll_interval() -> Duration {
    Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
}

/// Owned log filter value used where allocation is required (e.g. clap).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the bridge binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Computes the default directory holding the command, result, and status
/// files.
///
/// Prefers the platform's local data directory and falls back to the
/// temporary directory when that is unavailable or not valid UTF-8.
#[must_use]
pub fn default_bridge_dir() -> Utf8PathBuf {
    let mut base = dirs::data_local_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .unwrap_or_else(fallback_base_directory);
    base.push(BRIDGE_DIR_NAME);
    base
}

fn fallback_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
