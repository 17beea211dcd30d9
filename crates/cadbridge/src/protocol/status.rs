//! Liveness document written on start and stop.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::ProtocolError;
use super::files;

/// Bridge lifecycle state as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeState {
    /// Commands are being accepted.
    Running,
    /// The bridge has shut down.
    Stopped,
}

/// Contents of the status file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStatus {
    /// Current state.
    pub status: BridgeState,
    /// Human-readable detail.
    pub message: String,
}

impl BridgeStatus {
    /// Status written once the bridge accepts commands.
    #[must_use]
    pub fn running() -> Self {
        Self {
            status: BridgeState::Running,
            message: "Bridge active".to_owned(),
        }
    }

    /// Status written once the bridge has stopped.
    #[must_use]
    pub fn stopped() -> Self {
        Self {
            status: BridgeState::Stopped,
            message: "Bridge stopped".to_owned(),
        }
    }
}

/// Reads and writes the status file.
#[derive(Debug, Clone)]
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    /// Creates a handle for the given status file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the status file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the status file.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Write`] when the file cannot be replaced.
    pub fn write(&self, status: &BridgeStatus) -> Result<(), ProtocolError> {
        files::write_json(&self.path, "status", status)
    }

    /// Reads the status file, if present.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Read`] or [`ProtocolError::Malformed`] when
    /// the file exists but cannot be decoded.
    pub fn read(&self) -> Result<Option<BridgeStatus>, ProtocolError> {
        files::read_json(&self.path, "status")
    }
}
