//! Error types for bridge start-up.

use thiserror::Error;

use crate::poller::PollerError;
use crate::protocol::ProtocolError;
use crate::relay::RelayError;

/// Errors returned by [`Bridge::start`](super::Bridge::start).
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bridge was started twice without stopping.
    #[error("bridge is already running")]
    AlreadyRunning,

    /// The running status could not be written.
    #[error("failed to write bridge status: {0}")]
    Status(#[source] ProtocolError),

    /// A stale command file could not be removed.
    #[error("failed to clear stale commands: {0}")]
    ClearCommands(#[source] ProtocolError),

    /// A result left by an earlier run could not be removed.
    #[error("failed to clear stale results: {0}")]
    ClearResults(#[source] ProtocolError),

    /// The check event could not be registered or bound.
    #[error("failed to bind relay event: {0}")]
    Relay(#[from] RelayError),

    /// The poller thread could not be started.
    #[error(transparent)]
    Poller(#[from] PollerError),
}
