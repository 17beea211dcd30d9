//! Controller side of the file protocol.
//!
//! [`BridgeClient`] writes commands and waits for their results. It touches
//! only the protocol files, so it may run in another thread or process.

use std::thread;
use std::time::{Duration, Instant};

use cadbridge_config::BridgePaths;
use thiserror::Error;
use tracing::trace;

use crate::protocol::{
    BridgeStatus, Command, CommandId, CommandResult, CommandSource, Params, ProtocolError,
    ResultChannel, StatusFile,
};

const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client");

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_POLL: Duration = Duration::from_millis(50);

/// Errors raised by [`BridgeClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// A protocol file could not be read or written.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// No matching result appeared in time.
    #[error("no result for command {command_id} within {timeout:?}")]
    Timeout {
        /// Command that went unanswered.
        command_id: CommandId,
        /// How long the client waited.
        timeout: Duration,
    },
}

/// Writes commands for a bridge and collects their results.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    commands: CommandSource,
    results: ResultChannel,
    status: StatusFile,
    next_id: CommandId,
    timeout: Duration,
    poll_interval: Duration,
}

impl BridgeClient {
    /// Creates a client whose first command id is 1.
    #[must_use]
    pub fn new(paths: &BridgePaths) -> Self {
        Self {
            commands: CommandSource::new(paths.commands_path()),
            results: ResultChannel::new(paths.results_path()),
            status: StatusFile::new(paths.status_path()),
            next_id: 1,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL,
        }
    }

    /// Sets how long [`send`](Self::send) waits for a result.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how often the result file is re-read while waiting.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the id used by the next [`send`](Self::send).
    #[must_use]
    pub const fn with_next_id(mut self, next_id: CommandId) -> Self {
        self.next_id = next_id;
        self
    }

    /// Id the next [`send`](Self::send) will use.
    #[must_use]
    pub const fn next_id(&self) -> CommandId {
        self.next_id
    }

    /// Sends `action` under the next id and waits for its result.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] if the command cannot be written
    /// and [`ClientError::Timeout`] if no result arrives in time.
    pub fn send(&mut self, action: &str, params: Params) -> Result<CommandResult, ClientError> {
        let id = self.next_id;
        self.next_id += 1;
        self.submit(&Command::new(id, action, params))
    }

    /// Writes `command` as-is and waits for its result.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn submit(&self, command: &Command) -> Result<CommandResult, ClientError> {
        self.discard_result_for(command.id)?;
        self.post(command)?;
        self.wait_for(command.id)
    }

    /// Writes `command` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] if the command cannot be written.
    pub fn post(&self, command: &Command) -> Result<(), ClientError> {
        trace!(
            target: CLIENT_TARGET,
            command_id = command.id,
            action = %command.action,
            "posting command"
        );
        self.commands.write(command)?;
        Ok(())
    }

    /// Waits until the result file reports `command_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Timeout`] after the configured timeout and
    /// [`ClientError::Protocol`] if the result file becomes unreadable.
    pub fn wait_for(&self, command_id: CommandId) -> Result<CommandResult, ClientError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match self.results.read_latest() {
                Ok(Some(result)) if result.command_id == command_id => return Ok(result),
                Ok(_) => {}
                Err(error) if error.is_malformed() => {
                    trace!(target: CLIENT_TARGET, %error, "result file not ready");
                }
                Err(error) => return Err(error.into()),
            }
            if Instant::now() >= deadline {
                return Err(ClientError::Timeout {
                    command_id,
                    timeout: self.timeout,
                });
            }
            thread::sleep(self.poll_interval);
        }
    }

    /// Removes a lingering result that already carries `command_id`, so
    /// [`wait_for`](Self::wait_for) only sees the answer to the new command.
    fn discard_result_for(&self, command_id: CommandId) -> Result<(), ClientError> {
        match self.results.read_latest() {
            Ok(Some(previous)) if previous.command_id == command_id => {
                trace!(target: CLIENT_TARGET, command_id, "discarding earlier result");
                self.results.clear()?;
            }
            Ok(_) => {}
            Err(error) if error.is_malformed() => {}
            Err(error) => return Err(error.into()),
        }
        Ok(())
    }

    /// Reads the bridge status, if the bridge has written one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] if the file is unreadable.
    pub fn status(&self) -> Result<Option<BridgeStatus>, ClientError> {
        Ok(self.status.read()?)
    }
}
