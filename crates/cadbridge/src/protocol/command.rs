//! The pending-command document and its reader.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use super::errors::ProtocolError;
use super::{PROTOCOL_TARGET, files};

/// Controller-assigned command identifier.
pub type CommandId = i64;

/// Free-form parameter mapping attached to a command.
pub type Params = Map<String, Value>;

/// A single request written by the controller.
///
/// Fields decode one at a time and leniently, so a partially written or
/// oddly typed document still yields a command:
///
/// - `id` accepts integers and whole-valued floats; anything else is 0.
/// - `action` accepts strings; other non-null values use their JSON text,
///   so `"action": 5` fails later as `Unknown action: 5`.
/// - `params` accepts an object; anything else is empty.
///
/// A zero id is never newer than the initial last-seen id and is therefore
/// ignored by the watcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Monotonically increasing identifier chosen by the controller.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: CommandId,
    /// Registered handler name.
    #[serde(default, deserialize_with = "lenient_action")]
    pub action: String,
    /// Handler parameters.
    #[serde(default, deserialize_with = "lenient_params")]
    pub params: Params,
}

impl Command {
    /// Builds a command.
    #[must_use]
    pub fn new(id: CommandId, action: impl Into<String>, params: Params) -> Self {
        Self {
            id,
            action: action.into(),
            params,
        }
    }

    /// Builds a command with no parameters.
    #[must_use]
    pub fn bare(id: CommandId, action: impl Into<String>) -> Self {
        Self::new(id, action, Params::new())
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<CommandId, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Number(number) = Value::deserialize(deserializer)? else {
        return Ok(0);
    };
    Ok(number
        .as_i64()
        .or_else(|| number.as_f64().and_then(whole_id))
        .unwrap_or(0))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the value is whole and inside the i64 range"
)]
fn whole_id(value: f64) -> Option<CommandId> {
    const LIMIT: f64 = 9_007_199_254_740_992.0;
    (value.fract() == 0.0 && value.abs() <= LIMIT).then_some(value as CommandId)
}

fn lenient_action<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(action) => action,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_params<'de, D>(deserializer: D) -> Result<Params, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(params) => params,
        _ => Params::new(),
    })
}

/// Reads the single-slot command file.
#[derive(Debug, Clone)]
pub struct CommandSource {
    path: PathBuf,
}

impl CommandSource {
    /// Creates a reader for the given command file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the command file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current command, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Read`] when the file exists but cannot be
    /// read and [`ProtocolError::Malformed`] when it is not a command.
    pub fn try_read(&self) -> Result<Option<Command>, ProtocolError> {
        files::read_json(&self.path, "command")
    }

    /// Reads the current command, treating every failure as "nothing
    /// pending".
    ///
    /// The controller may be midway through a write; the next poll will
    /// pick the command up, so failures are only traced.
    #[must_use]
    pub fn read_pending(&self) -> Option<Command> {
        match self.try_read() {
            Ok(command) => command,
            Err(error) => {
                trace!(
                    target: PROTOCOL_TARGET,
                    path = %self.path.display(),
                    %error,
                    "command file unreadable; treating as empty"
                );
                None
            }
        }
    }

    /// Writes a command atomically. Used by controllers and tests.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Write`] when the file cannot be written.
    pub fn write(&self, command: &Command) -> Result<(), ProtocolError> {
        files::write_json(&self.path, "command", command)
    }

    /// Deletes any stale command, returning whether one was present.
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
    use std::fs;

    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn source() -> (TempDir, CommandSource) {
        let dir = TempDir::new().expect("temp dir");
        let source = CommandSource::new(dir.path().join("commands.json"));
        (dir, source)
    }

    #[rstest]
    fn missing_file_is_not_pending(source: (TempDir, CommandSource)) {
        let (_dir, source) = source;
        assert_eq!(source.try_read().expect("missing file"), None);
    }

    #[rstest]
    fn decodes_full_command(source: (TempDir, CommandSource)) {
        let (_dir, source) = source;
        fs::write(
            source.path(),
            br#"{"id": 3, "action": "draw_circle", "params": {"radius": 2}}"#,
        )
        .expect("seed");

        let command = source.read_pending().expect("command present");
        assert_eq!(command.id, 3);
        assert_eq!(command.action, "draw_circle");
        assert_eq!(command.params.get("radius"), Some(&json!(2)));
    }

    #[rstest]
    #[case::no_params(r#"{"id": 4, "action": "ping"}"#)]
    #[case::null_params(r#"{"id": 4, "action": "ping", "params": null}"#)]
    fn absent_params_decode_empty(source: (TempDir, CommandSource), #[case] body: &str) {
        let (_dir, source) = source;
        fs::write(source.path(), body).expect("seed");

        let command = source.read_pending().expect("command present");
        assert_eq!(command, Command::bare(4, "ping"));
    }

    #[rstest]
    fn missing_id_defaults_to_zero(source: (TempDir, CommandSource)) {
        let (_dir, source) = source;
        fs::write(source.path(), br#"{"action": "ping"}"#).expect("seed");
        assert_eq!(source.read_pending().map(|command| command.id), Some(0));
    }

    #[rstest]
    #[case::float_id(r#"{"id": 6.0, "action": "ping"}"#, Command::bare(6, "ping"))]
    #[case::numeric_action(r#"{"id": 6, "action": 5}"#, Command::bare(6, "5"))]
    #[case::null_action(r#"{"id": 6, "action": null}"#, Command::bare(6, ""))]
    #[case::list_params(r#"{"id": 6, "action": "ping", "params": [1]}"#, Command::bare(6, "ping"))]
    #[case::string_id(r#"{"id": "six", "action": "ping"}"#, Command::bare(0, "ping"))]
    #[case::fractional_id(r#"{"id": 6.5, "action": "ping"}"#, Command::bare(0, "ping"))]
    fn oddly_typed_fields_still_decode(
        source: (TempDir, CommandSource),
        #[case] body: &str,
        #[case] expected: Command,
    ) {
        let (_dir, source) = source;
        fs::write(source.path(), body).expect("seed");
        assert_eq!(source.read_pending(), Some(expected));
    }

    #[rstest]
    #[case::truncated(r#"{"id": 5, "act"#)]
    #[case::bare_string(r#""ping""#)]
    #[case::bare_number("42")]
    fn unreadable_content_is_swallowed(source: (TempDir, CommandSource), #[case] body: &str) {
        let (_dir, source) = source;
        fs::write(source.path(), body).expect("seed");

        assert!(source.try_read().is_err());
        assert_eq!(source.read_pending(), None);
    }

    #[rstest]
    fn write_then_clear(source: (TempDir, CommandSource)) {
        let (_dir, source) = source;
        source.write(&Command::bare(9, "ping")).expect("write");
        assert_eq!(source.read_pending(), Some(Command::bare(9, "ping")));

        assert!(source.clear().expect("clear"));
        assert_eq!(source.read_pending(), None);
    }
}
