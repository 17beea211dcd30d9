//! Explicit start/stop lifecycle for the command bridge.
//!
//! [`Bridge`] owns every piece the bridge installs into the host: the status
//! file, the relay registration and callback, and the poller thread. Pieces
//! are recorded as soon as they exist so [`Bridge::stop`] can tear down
//! exactly what a full or partial start left behind.

mod errors;

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use cadbridge_config::{BridgePaths, Config, default_poll_interval};
use tracing::{debug, trace, warn};

use crate::dispatch::{CommandOutcome, CommandWatcher, Dispatcher};
use crate::health::BridgeReporter;
use crate::host::HostApplication;
use crate::poller::Poller;
use crate::protocol::{BridgeStatus, CommandId, CommandSource, ResultChannel, StatusFile};
use crate::registry::HandlerRegistry;
use crate::relay::{CHECK_COMMANDS_EVENT, EventRelay, EventToken, SubscriptionId};

pub use self::errors::BridgeError;

const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Tunables applied on [`Bridge::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Time between poller ticks.
    pub poll_interval: Duration,
}

impl BridgeSettings {
    /// Settings with the given poll interval.
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Settings taken from the loaded configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self::new(config.poll_interval())
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self::new(default_poll_interval())
    }
}

/// The command bridge installed into one host.
///
/// Lives on the host thread. Dropping it stops it.
pub struct Bridge {
    host: Rc<dyn HostApplication>,
    relay: Rc<EventRelay>,
    registry: Rc<HandlerRegistry>,
    paths: BridgePaths,
    settings: BridgeSettings,
    reporter: Arc<dyn BridgeReporter>,
    status: StatusFile,
    status_written: bool,
    token: Option<EventToken>,
    subscription: Option<SubscriptionId>,
    watcher: Option<Rc<RefCell<CommandWatcher>>>,
    poller: Option<Poller>,
}

impl Bridge {
    /// Prepares a bridge without touching the host or the filesystem.
    #[must_use]
    pub fn new(
        host: Rc<dyn HostApplication>,
        relay: Rc<EventRelay>,
        paths: BridgePaths,
        registry: Rc<HandlerRegistry>,
        settings: BridgeSettings,
        reporter: Arc<dyn BridgeReporter>,
    ) -> Self {
        let status = StatusFile::new(paths.status_path());
        Self {
            host,
            relay,
            registry,
            paths,
            settings,
            reporter,
            status,
            status_written: false,
            token: None,
            subscription: None,
            watcher: None,
            poller: None,
        }
    }

    /// Protocol file locations.
    #[must_use]
    pub const fn paths(&self) -> &BridgePaths {
        &self.paths
    }

    /// Whether the poller is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.poller.is_some()
    }

    /// Watermark of the current (or most recent) run; 0 before any command.
    #[must_use]
    pub fn last_processed_id(&self) -> CommandId {
        self.watcher
            .as_ref()
            .map_or(0, |watcher| watcher.borrow().last_processed_id())
    }

    /// Installs the bridge and starts polling.
    ///
    /// Leftovers from an earlier failed start are torn down first.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AlreadyRunning`] when called twice, otherwise
    /// the error from the first step that failed. Steps that completed before
    /// the failure stay in place until [`Bridge::stop`].
    pub fn start(&mut self) -> Result<(), BridgeError> {
        if self.is_running() {
            return Err(BridgeError::AlreadyRunning);
        }
        self.release_pieces();

        self.reporter.starting(self.paths.bridge_dir());
        match self.install() {
            Ok(()) => {
                self.reporter.started(self.settings.poll_interval);
                Ok(())
            }
            Err(error) => {
                self.reporter.start_failed(&error);
                Err(error)
            }
        }
    }

    /// Tears down whatever is installed. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if !self.has_pieces() {
            return;
        }
        self.reporter.stopping();
        self.release_pieces();
        self.reporter.stopped(self.last_processed_id());
    }

    fn install(&mut self) -> Result<(), BridgeError> {
        self.status
            .write(&BridgeStatus::running())
            .map_err(BridgeError::Status)?;
        self.status_written = true;

        let source = CommandSource::new(self.paths.commands_path());
        if source.clear().map_err(BridgeError::ClearCommands)? {
            debug!(target: LIFECYCLE_TARGET, "cleared stale command");
        }
        let results = ResultChannel::new(self.paths.results_path());
        if results.clear().map_err(BridgeError::ClearResults)? {
            debug!(target: LIFECYCLE_TARGET, "cleared stale result");
        }

        let token = self.token.insert(self.relay.register(CHECK_COMMANDS_EVENT)?);

        let dispatcher = Dispatcher::new(
            Rc::clone(&self.host),
            Rc::clone(&self.registry),
            results,
        );
        let watcher = Rc::new(RefCell::new(CommandWatcher::new(source, dispatcher)));
        self.watcher = Some(Rc::clone(&watcher));
        let reporter = Arc::clone(&self.reporter);
        let subscription = self.relay.on_event(token, move |payload| {
            // Host callbacks must not re-enter; a nested check is skipped.
            let Ok(mut watcher) = watcher.try_borrow_mut() else {
                trace!(target: LIFECYCLE_TARGET, "check already in progress");
                return;
            };
            if let Some(outcome) = watcher.handle_event(payload) {
                report_outcome(&*reporter, &outcome);
            }
        })?;
        self.subscription = Some(subscription);

        self.poller = Some(Poller::spawn(self.relay.handle(), self.settings.poll_interval)?);
        Ok(())
    }

    const fn has_pieces(&self) -> bool {
        self.status_written
            || self.token.is_some()
            || self.subscription.is_some()
            || self.poller.is_some()
    }

    fn release_pieces(&mut self) {
        if let Some(poller) = self.poller.take()
            && let Err(error) = poller.join()
        {
            warn!(target: LIFECYCLE_TARGET, %error, "poller did not stop cleanly");
        }

        let subscription = self.subscription.take();
        if let Some(token) = self.token.take() {
            if let Some(subscription) = subscription
                && !self.relay.remove_handler(&token, subscription)
            {
                debug!(target: LIFECYCLE_TARGET, "bridge callback already removed");
            }
            if !self.relay.unregister(&token) {
                debug!(target: LIFECYCLE_TARGET, "check event already unregistered");
            }
        }

        if mem::take(&mut self.status_written)
            && let Err(error) = self.status.write(&BridgeStatus::stopped())
        {
            warn!(target: LIFECYCLE_TARGET, %error, "failed to write stopped status");
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.stop();
    }
}

fn report_outcome(reporter: &dyn BridgeReporter, outcome: &CommandOutcome) {
    reporter.command_completed(outcome.command_id, &outcome.action, outcome.success());
}
