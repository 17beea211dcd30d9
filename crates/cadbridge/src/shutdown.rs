//! Termination signal handling for the bridge binary.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

const SHUTDOWN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::shutdown");

const SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Errors reported by the signal listener.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The listener thread could not be started.
    #[error("failed to spawn signal listener: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Flag raised once a termination signal arrives.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Creates a lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Whether shutdown was requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// The underlying flag, for [`EventRelay::run_until`](crate::relay::EventRelay::run_until).
    #[must_use]
    pub fn as_atomic(&self) -> &AtomicBool {
        &self.requested
    }
}

/// Raises `flag` on the first SIGTERM, SIGINT, SIGQUIT, or SIGHUP.
///
/// The listener runs on a detached thread named `cadbridge-signals`.
///
/// # Errors
///
/// Returns [`ShutdownError`] if the handlers or the thread cannot be set up.
pub fn listen(flag: ShutdownFlag) -> Result<(), ShutdownError> {
    let mut signals = Signals::new(SIGNALS).map_err(|source| ShutdownError::Install { source })?;
    thread::Builder::new()
        .name("cadbridge-signals".to_owned())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!(target: SHUTDOWN_TARGET, signal, "shutdown signal received");
                flag.request();
            }
        })
        .map_err(|source| ShutdownError::Spawn { source })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let flag = ShutdownFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_requested());

        flag.request();
        assert!(observer.is_requested());
        assert!(observer.as_atomic().load(Ordering::Acquire));
    }
}
