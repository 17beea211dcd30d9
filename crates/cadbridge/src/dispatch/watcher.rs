//! At-most-once filtering of the pending command.

use serde::Deserialize;
use tracing::trace;

use super::DISPATCH_TARGET;
use super::dispatcher::Dispatcher;
use crate::protocol::{CommandId, CommandSource};

/// Summary of one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Identifier of the dispatched command.
    pub command_id: CommandId,
    /// Action the command named.
    pub action: String,
    /// Failure message written to the controller, if any.
    pub error: Option<String>,
}

impl CommandOutcome {
    /// Whether the command succeeded.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Deserialize)]
struct CheckRequest {
    #[serde(default)]
    check_commands: bool,
}

/// Relay callback state: dispatches a command only when its id is newer
/// than the last one processed.
///
/// A fresh watcher starts at id 0, so commands must use positive ids.
pub struct CommandWatcher {
    source: CommandSource,
    dispatcher: Dispatcher,
    last_processed_id: CommandId,
}

impl CommandWatcher {
    /// Creates a watcher that has processed nothing yet.
    #[must_use]
    pub const fn new(source: CommandSource, dispatcher: Dispatcher) -> Self {
        Self {
            source,
            dispatcher,
            last_processed_id: 0,
        }
    }

    /// Identifier of the most recently dispatched command.
    #[must_use]
    pub const fn last_processed_id(&self) -> CommandId {
        self.last_processed_id
    }

    /// Handles a relay payload, checking for a command when it asks to.
    ///
    /// Payloads that are not JSON or lack `"check_commands": true` are
    /// ignored.
    pub fn handle_event(&mut self, payload: &str) -> Option<CommandOutcome> {
        let wanted = serde_json::from_str::<CheckRequest>(payload)
            .is_ok_and(|request| request.check_commands);
        if !wanted {
            trace!(target: DISPATCH_TARGET, payload, "ignoring relay payload");
            return None;
        }
        self.check()
    }

    /// Reads the pending command and dispatches it if it is new.
    pub fn check(&mut self) -> Option<CommandOutcome> {
        let command = self.source.read_pending()?;
        if command.id <= self.last_processed_id {
            return None;
        }

        let error = self
            .dispatcher
            .dispatch(&command)
            .err()
            .map(|error| error.to_string());
        self.last_processed_id = command.id;
        Some(CommandOutcome {
            command_id: command.id,
            action: command.action,
            error,
        })
    }
}
