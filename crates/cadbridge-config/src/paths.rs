//! Derives the file locations shared by the bridge and its controller.
//!
//! The bridge directory houses three independent JSON documents: the pending
//! command written by the controller, the latest result written by the
//! bridge, and the bridge liveness record. Both sides must agree on the
//! layout, so the names live here rather than in either binary.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::Config;

/// File name of the pending command document.
pub const COMMANDS_FILE: &str = "commands.json";
/// File name of the latest result document.
pub const RESULTS_FILE: &str = "results.json";
/// File name of the bridge status document.
pub const STATUS_FILE: &str = "bridge_status.json";

/// Canonical paths for the bridge's file protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgePaths {
    bridge_dir: PathBuf,
    commands_path: PathBuf,
    results_path: PathBuf,
    status_path: PathBuf,
}

impl BridgePaths {
    /// Derives paths from the configuration and creates the bridge directory.
    ///
    /// # Errors
    ///
    /// Returns [`BridgePathsError::BridgeDirectory`] if the directory cannot
    /// be created.
    pub fn from_config(config: &Config) -> Result<Self, BridgePathsError> {
        Self::prepare(config.bridge_dir.as_std_path())
    }

    /// Derives paths beneath `dir` and creates it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`BridgePathsError::BridgeDirectory`] if the directory cannot
    /// be created.
    pub fn prepare(dir: &Path) -> Result<Self, BridgePathsError> {
        fs::create_dir_all(dir).map_err(|source| BridgePathsError::BridgeDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self::in_dir(dir))
    }

    /// Derives paths beneath `dir` without touching the filesystem.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            commands_path: dir.join(COMMANDS_FILE),
            results_path: dir.join(RESULTS_FILE),
            status_path: dir.join(STATUS_FILE),
            bridge_dir: dir.to_path_buf(),
        }
    }

    /// Directory holding the protocol files.
    #[must_use]
    pub fn bridge_dir(&self) -> &Path {
        self.bridge_dir.as_path()
    }

    /// Path to the pending command written by the controller.
    #[must_use]
    pub fn commands_path(&self) -> &Path {
        self.commands_path.as_path()
    }

    /// Path to the latest result written by the bridge.
    #[must_use]
    pub fn results_path(&self) -> &Path {
        self.results_path.as_path()
    }

    /// Path to the bridge status record.
    #[must_use]
    pub fn status_path(&self) -> &Path {
        self.status_path.as_path()
    }
}

/// Errors raised while deriving bridge paths.
#[derive(Debug, Error)]
pub enum BridgePathsError {
    /// Creating the bridge directory failed.
    #[error("failed to prepare bridge directory '{path}': {source}")]
    BridgeDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn derives_file_names_inside_bridge_dir() {
        let paths = BridgePaths::in_dir(Path::new("/srv/bridge"));
        assert_eq!(paths.bridge_dir(), Path::new("/srv/bridge"));
        assert!(paths.commands_path().ends_with("commands.json"));
        assert!(paths.results_path().ends_with("results.json"));
        assert!(paths.status_path().ends_with("bridge_status.json"));
    }

    #[test]
    fn from_config_creates_missing_directory() {
        let temp = TempDir::new().expect("temp dir");
        let nested = temp.path().join("nested").join("bridge");
        let config = Config {
            bridge_dir: Utf8PathBuf::from_path_buf(nested.clone()).expect("utf8 temp path"),
            ..Config::default()
        };

        let paths = BridgePaths::from_config(&config).expect("paths should derive");

        assert!(nested.is_dir(), "bridge directory should exist");
        assert_eq!(paths.bridge_dir(), nested.as_path());
    }

    #[test]
    fn prepare_reports_unusable_directory() {
        let temp = TempDir::new().expect("temp dir");
        let blocker = temp.path().join("file");
        fs::write(&blocker, b"not a directory").expect("write blocker");

        let error = BridgePaths::prepare(&blocker.join("bridge"))
            .expect_err("directory beneath a file must fail");
        assert!(matches!(error, BridgePathsError::BridgeDirectory { .. }));
    }
}
