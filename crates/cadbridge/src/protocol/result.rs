//! The result document and its writer.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::command::CommandId;
use super::errors::ProtocolError;
use super::files;

/// Outcome of a single command.
///
/// On success `result` carries the handler payload and `error` is null; on
/// failure the reverse holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Identifier of the command this answers.
    pub command_id: CommandId,
    /// Whether the handler succeeded.
    pub success: bool,
    /// Handler payload on success.
    pub result: Option<Value>,
    /// Human-readable failure message.
    pub error: Option<String>,
    /// Seconds since the Unix epoch at the time of writing.
    pub timestamp: f64,
}

impl CommandResult {
    /// Builds a successful result stamped with the current time.
    #[must_use]
    pub fn success(command_id: CommandId, result: Value) -> Self {
        Self {
            command_id,
            success: true,
            result: Some(result),
            error: None,
            timestamp: unix_timestamp(),
        }
    }

    /// Builds a failed result stamped with the current time.
    #[must_use]
    pub fn failure(command_id: CommandId, error: impl Into<String>) -> Self {
        Self {
            command_id,
            success: false,
            result: None,
            error: Some(error.into()),
            timestamp: unix_timestamp(),
        }
    }
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |elapsed| elapsed.as_secs_f64())
}

/// Writes results for the controller to pick up.
///
/// Only the latest result is retained; each write replaces the file.
#[derive(Debug, Clone)]
pub struct ResultChannel {
    path: PathBuf,
}

impl ResultChannel {
    /// Creates a channel targeting the given results file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the results file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists a result.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Write`] when the file cannot be replaced.
    pub fn write(&self, result: &CommandResult) -> Result<(), ProtocolError> {
        files::write_json(&self.path, "result", result)
    }

    /// Persists a success result for `command_id`.
    ///
    /// # Errors
    ///
    /// See [`ResultChannel::write`].
    pub fn write_success(&self, command_id: CommandId, result: Value) -> Result<(), ProtocolError> {
        self.write(&CommandResult::success(command_id, result))
    }

    /// Persists a failure result for `command_id`.
    ///
    /// # Errors
    ///
    /// See [`ResultChannel::write`].
    pub fn write_failure(
        &self,
        command_id: CommandId,
        error: impl Into<String>,
    ) -> Result<(), ProtocolError> {
        self.write(&CommandResult::failure(command_id, error))
    }

    /// Reads the latest result, if one has been written.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Read`] or [`ProtocolError::Malformed`] when
    /// the file exists but cannot be decoded.
    pub fn read_latest(&self) -> Result<Option<CommandResult>, ProtocolError> {
        files::read_json(&self.path, "result")
    }

    /// Deletes the results file, returning whether one was present.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Remove`] when deletion fails for a reason
    /// other than the file being absent.
    pub fn clear(&self) -> Result<bool, ProtocolError> {
        files::remove_if_present(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn success_serializes_null_error() {
        let result = CommandResult::success(7, json!({"message": "pong"}));
        let encoded = serde_json::to_value(&result).expect("encode");

        assert_eq!(encoded["command_id"], json!(7));
        assert_eq!(encoded["success"], json!(true));
        assert_eq!(encoded["result"], json!({"message": "pong"}));
        assert!(encoded["error"].is_null());
        assert!(encoded["timestamp"].as_f64().is_some_and(|ts| ts > 0.0));
    }

    #[test]
    fn failure_serializes_null_result() {
        let result = CommandResult::failure(8, "No active design");
        let encoded = serde_json::to_value(&result).expect("encode");

        assert_eq!(encoded["success"], json!(false));
        assert!(encoded["result"].is_null());
        assert_eq!(encoded["error"], json!("No active design"));
    }

    #[test]
    fn later_writes_replace_earlier_results() {
        let dir = TempDir::new().expect("temp dir");
        let channel = ResultChannel::new(dir.path().join("results.json"));

        channel.write_success(1, json!({"message": "pong"})).expect("first");
        channel.write_failure(2, "Unknown action: fly").expect("second");

        let latest = channel.read_latest().expect("read").expect("present");
        assert_eq!(latest.command_id, 2);
        assert!(!latest.success);
        assert_eq!(latest.error.as_deref(), Some("Unknown action: fly"));
    }

    #[test]
    fn clear_removes_the_latest_result() {
        let dir = TempDir::new().expect("temp dir");
        let channel = ResultChannel::new(dir.path().join("results.json"));
        assert!(!channel.clear().expect("clear absent"));

        channel.write_success(1, json!({"message": "pong"})).expect("write");
        assert!(channel.clear().expect("clear"));
        assert_eq!(channel.read_latest().expect("read"), None);
    }
}
