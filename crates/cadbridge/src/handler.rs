//! The contract every command handler implements.

use thiserror::Error;

use crate::context::{CommandContext, ContextError};
use crate::host::HostError;
use crate::protocol::{CommandId, Params, ProtocolError};

/// Signature shared by all handlers.
///
/// A handler writes its own success result through the context. Returning
/// an error causes the dispatcher to write a failure result carrying the
/// error's message instead.
pub type HandlerFn = fn(&CommandContext<'_>, CommandId, &Params) -> Result<(), HandlerError>;

/// Failures a handler can report.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Handler-specific failure with a message for the controller.
    #[error("{0}")]
    Failed(String),

    /// A parameter had the wrong type.
    #[error("Invalid parameter '{name}': expected {expected}")]
    InvalidParameter {
        /// Parameter key.
        name: String,
        /// Human-readable expected type.
        expected: &'static str,
    },

    /// A context precondition was not met.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The host rejected an operation.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The success result could not be recorded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A failure wrapped with the action being attempted.
    #[error("Failed to {action}: {source}")]
    During {
        /// Short description of the attempted action.
        action: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<Self>,
    },
}

impl HandlerError {
    /// Creates a handler-specific failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Creates an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            expected,
        }
    }

    /// Returns a mapper that prefixes failures as `Failed to {action}: ...`.
    ///
    /// ```ignore
    /// sketch.add_arc(center, start, end).map_err(HandlerError::during("draw arc"))?;
    /// ```
    #[must_use]
    pub fn during<E>(action: &'static str) -> impl FnOnce(E) -> Self
    where
        E: Into<Self>,
    {
        move |error| Self::During {
            action,
            source: Box::new(error.into()),
        }
    }
}
