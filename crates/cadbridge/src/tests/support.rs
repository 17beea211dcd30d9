//! Shared fixtures for bridge scenarios.

use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use cadbridge_config::BridgePaths;
use tempfile::TempDir;

use crate::client::BridgeClient;
use crate::handlers;
use crate::health::BridgeReporter;
use crate::host::InMemoryHost;
use crate::lifecycle::{Bridge, BridgeError, BridgeSettings};
use crate::protocol::CommandId;
use crate::registry::HandlerRegistry;
use crate::relay::EventRelay;

/// Poll interval used by scenario bridges.
pub(crate) const TEST_INTERVAL: Duration = Duration::from_millis(20);

/// A lifecycle event captured by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reported {
    Starting,
    Started,
    StartFailed(String),
    Stopping,
    Stopped(CommandId),
    Completed {
        command_id: CommandId,
        action: String,
        success: bool,
    },
}

/// Reporter double that records every event in order.
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    events: Mutex<Vec<Reported>>,
}

impl RecordingReporter {
    pub(crate) fn events(&self) -> Vec<Reported> {
        self.lock().clone()
    }

    pub(crate) fn completed(&self) -> Vec<(CommandId, bool)> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                Reported::Completed {
                    command_id,
                    success,
                    ..
                } => Some((*command_id, *success)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: Reported) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Reported>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BridgeReporter for RecordingReporter {
    fn starting(&self, _bridge_dir: &Path) {
        self.record(Reported::Starting);
    }

    fn started(&self, _poll_interval: Duration) {
        self.record(Reported::Started);
    }

    fn start_failed(&self, error: &BridgeError) {
        self.record(Reported::StartFailed(error.to_string()));
    }

    fn stopping(&self) {
        self.record(Reported::Stopping);
    }

    fn stopped(&self, last_processed_id: CommandId) {
        self.record(Reported::Stopped(last_processed_id));
    }

    fn command_completed(&self, command_id: CommandId, action: &str, success: bool) {
        self.record(Reported::Completed {
            command_id,
            action: action.to_owned(),
            success,
        });
    }
}

/// Raises the flag when dropped so the host loop ends even if the
/// controller thread panics.
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// A bridge over an in-memory host in a temporary directory.
///
/// Fields drop in order, so the bridge stops before its directory goes.
pub(crate) struct BridgeFixture {
    pub(crate) bridge: Bridge,
    pub(crate) paths: BridgePaths,
    pub(crate) host: Rc<InMemoryHost>,
    pub(crate) relay: Rc<EventRelay>,
    pub(crate) reporter: Arc<RecordingReporter>,
    _dir: TempDir,
}

impl BridgeFixture {
    /// Builds an unstarted bridge with the built-in handlers.
    pub(crate) fn new(design: Option<&str>) -> Self {
        Self::with_registry(design, handlers::registry(), TEST_INTERVAL)
    }

    pub(crate) fn with_registry(
        design: Option<&str>,
        registry: HandlerRegistry,
        interval: Duration,
    ) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let paths = BridgePaths::prepare(dir.path()).expect("bridge paths");
        let host = Rc::new(design.map_or_else(InMemoryHost::new, InMemoryHost::with_design));
        let relay = Rc::new(EventRelay::new());
        let reporter = Arc::new(RecordingReporter::default());
        let bridge = Bridge::new(
            host.clone(),
            Rc::clone(&relay),
            paths.clone(),
            Rc::new(registry),
            BridgeSettings::new(interval),
            reporter.clone(),
        );
        Self {
            bridge,
            paths,
            host,
            relay,
            reporter,
            _dir: dir,
        }
    }

    /// Builds and starts a bridge with the built-in handlers.
    pub(crate) fn started(design: Option<&str>) -> Self {
        let mut fixture = Self::new(design);
        fixture.bridge.start().expect("bridge starts");
        fixture
    }

    /// A client with short timeouts for this bridge.
    pub(crate) fn client(&self) -> BridgeClient {
        BridgeClient::new(&self.paths)
            .with_timeout(Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(5))
    }

    /// Runs `controller` on its own thread while this thread acts as the
    /// host event loop. Returns once the controller finishes.
    pub(crate) fn drive<T, F>(&self, controller: F) -> T
    where
        T: Send + 'static,
        F: FnOnce(BridgeClient) -> T + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let guard = StopOnDrop(Arc::clone(&stop));
        let client = self.client();
        let worker = thread::spawn(move || {
            let _guard = guard;
            controller(client)
        });
        let _delivered = self.relay.run_until(&stop);
        worker.join().expect("controller thread panicked")
    }
}
