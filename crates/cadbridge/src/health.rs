//! Structured health reporting for bridge lifecycle events.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::lifecycle::BridgeError;
use crate::protocol::CommandId;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait BridgeReporter: Send + Sync {
    /// Invoked before the bridge starts.
    fn starting(&self, bridge_dir: &Path);

    /// Invoked once the poller is running.
    fn started(&self, poll_interval: Duration);

    /// Invoked when start fails part-way.
    fn start_failed(&self, error: &BridgeError);

    /// Invoked before the bridge tears down.
    fn stopping(&self);

    /// Invoked after teardown. `last_processed_id` is the final watermark.
    fn stopped(&self, last_processed_id: CommandId);

    /// Invoked after each dispatched command.
    fn command_completed(&self, command_id: CommandId, action: &str, success: bool);
}

impl<T> BridgeReporter for Arc<T>
where
    T: BridgeReporter + ?Sized,
{
    fn starting(&self, bridge_dir: &Path) {
        (**self).starting(bridge_dir);
    }

    fn started(&self, poll_interval: Duration) {
        (**self).started(poll_interval);
    }

    fn start_failed(&self, error: &BridgeError) {
        (**self).start_failed(error);
    }

    fn stopping(&self) {
        (**self).stopping();
    }

    fn stopped(&self, last_processed_id: CommandId) {
        (**self).stopped(last_processed_id);
    }

    fn command_completed(&self, command_id: CommandId, action: &str, success: bool) {
        (**self).command_completed(command_id, action, success);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredBridgeReporter;

impl StructuredBridgeReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BridgeReporter for StructuredBridgeReporter {
    fn starting(&self, bridge_dir: &Path) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bridge_starting",
            bridge_dir = %bridge_dir.display(),
            "starting command bridge"
        );
    }

    fn started(&self, poll_interval: Duration) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bridge_started",
            poll_interval_ms = poll_interval.as_millis(),
            "command bridge active"
        );
    }

    fn start_failed(&self, error: &BridgeError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bridge_start_failed",
            error = %error,
            "command bridge failed to start"
        );
    }

    fn stopping(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bridge_stopping",
            "stopping command bridge"
        );
    }

    fn stopped(&self, last_processed_id: CommandId) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bridge_stopped",
            last_processed_id,
            "command bridge stopped"
        );
    }

    fn command_completed(&self, command_id: CommandId, action: &str, success: bool) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "command_completed",
            command_id,
            action,
            success,
            "command processed"
        );
    }
}
