//! Output format for the bridge's diagnostic log on stderr.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How `cadbridged` renders log lines.
///
/// Parsed from `--log-format` or `CADBRIDGE_LOG_FORMAT`, ignoring case.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, with span fields flattened in. Suits a
    /// host that captures the bridge's stderr into a log collector.
    #[default]
    Json,
    /// Terse single-line text for watching the bridge in a terminal.
    Compact,
}

/// Error returned when a `--log-format` value names no known format.
pub type LogFormatParseError = strum::ParseError;
