//! Error types for command dispatch failures.
//!
//! Each variant's message is exactly what the controller receives in the
//! failure result.

use thiserror::Error;

use crate::context::ContextError;
use crate::handler::HandlerError;

/// Errors surfaced while dispatching a single command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The action needs a design and none is open.
    #[error("No active design")]
    NoActiveDesign,

    /// No handler is registered for the action.
    #[error("Unknown action: {action}")]
    UnknownAction {
        /// Action named by the command.
        action: String,
    },

    /// The handler reported a failure.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// The handler panicked; the panic was contained.
    #[error("handler panicked: {message}")]
    HandlerPanicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl DispatchError {
    /// Creates an unknown action error.
    #[must_use]
    pub fn unknown_action(action: impl Into<String>) -> Self {
        Self::UnknownAction {
            action: action.into(),
        }
    }

    /// Creates a contained panic error.
    #[must_use]
    pub fn handler_panicked(message: impl Into<String>) -> Self {
        Self::HandlerPanicked {
            message: message.into(),
        }
    }
}

impl From<ContextError> for DispatchError {
    fn from(error: ContextError) -> Self {
        match error {
            ContextError::NoActiveDesign => Self::NoActiveDesign,
            other => Self::Handler(HandlerError::from(other)),
        }
    }
}
