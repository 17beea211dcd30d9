//! Error types for the event relay.

use thiserror::Error;

/// Errors raised by relay registration and firing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The event name is already registered.
    #[error("event '{name}' is already registered")]
    AlreadyRegistered {
        /// Event name.
        name: String,
    },

    /// The event is not (or no longer) registered.
    #[error("event '{name}' is not registered")]
    NotRegistered {
        /// Event name.
        name: String,
    },

    /// The host side of the relay has shut down or been dropped.
    #[error("host event loop is unavailable")]
    HostUnavailable,
}
