//! Background timer that asks the host thread to check for commands.
//!
//! The poller never touches host state. Each tick posts
//! [`CHECK_COMMANDS_EVENT`] through a [`RelayHandle`]; the host thread does
//! the rest when it drains the relay.

use std::io;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace};

use crate::relay::{CHECK_COMMANDS_EVENT, CHECK_COMMANDS_PAYLOAD, RelayError, RelayHandle};

/// Tracing target for poller activity.
pub(crate) const POLLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::poller");

const THREAD_NAME: &str = "cadbridge-poller";

/// Errors raised while running the poller thread.
#[derive(Debug, Error)]
pub enum PollerError {
    /// The operating system refused to start the thread.
    #[error("failed to spawn poller thread: {0}")]
    Spawn(#[source] io::Error),
    /// The poller thread panicked before it could be joined.
    #[error("poller thread panicked")]
    ThreadPanicked,
}

/// Cancellation flag the poller can sleep on.
#[derive(Debug, Default)]
struct CancelSignal {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl CancelSignal {
    fn cancel(&self) {
        let mut cancelled = self
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled = true;
        self.wake.notify_all();
    }

    /// Sleeps for `timeout` unless cancelled first. Returns `true` once
    /// cancelled.
    fn wait(&self, timeout: Duration) -> bool {
        let cancelled = self
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (cancelled, _) = self
            .wake
            .wait_timeout_while(cancelled, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled
    }
}

/// Handle to the running poller thread.
///
/// Dropping the handle cancels the thread without waiting for it.
#[derive(Debug)]
pub struct Poller {
    signal: Arc<CancelSignal>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Poller {
    /// Starts a thread that fires the check event every `interval`.
    ///
    /// The first event fires after one full interval.
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::Spawn`] if the thread cannot be created.
    pub fn spawn(relay: RelayHandle, interval: Duration) -> Result<Self, PollerError> {
        let signal = Arc::new(CancelSignal::default());
        let thread_signal = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(move || run_poll_loop(&relay, &thread_signal, interval))
            .map_err(PollerError::Spawn)?;
        debug!(
            target: POLLER_TARGET,
            interval_ms = interval.as_millis(),
            "poller started"
        );
        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Asks the thread to stop. Returns immediately.
    pub fn cancel(&self) {
        self.signal.cancel();
    }

    /// Cancels the thread and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::ThreadPanicked`] if the thread panicked.
    pub fn join(mut self) -> Result<(), PollerError> {
        self.signal.cancel();
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| PollerError::ThreadPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.signal.cancel();
    }
}

fn run_poll_loop(relay: &RelayHandle, signal: &CancelSignal, interval: Duration) {
    let mut failing = false;
    while !signal.wait(interval) {
        match relay.fire_coalesced(CHECK_COMMANDS_EVENT, CHECK_COMMANDS_PAYLOAD) {
            Ok(queued) => {
                if !queued {
                    trace!(target: POLLER_TARGET, "previous check still queued");
                }
                failing = false;
            }
            Err(error) => {
                // Expected while the host is busy or shutting down.
                if !failing {
                    log_fire_error(&error);
                }
                failing = true;
            }
        }
    }
    debug!(target: POLLER_TARGET, "poller stopped");
}

fn log_fire_error(error: &RelayError) {
    trace!(target: POLLER_TARGET, %error, "check event not delivered");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use rstest::rstest;

    use super::*;
    use crate::relay::EventRelay;

    const INTERVAL: Duration = Duration::from_millis(10);

    #[test]
    fn cancel_signal_wakes_sleepers() {
        let signal = Arc::new(CancelSignal::default());
        let sleeper = Arc::clone(&signal);
        let started = Instant::now();
        let waiter = thread::spawn(move || sleeper.wait(Duration::from_secs(30)));

        thread::sleep(Duration::from_millis(20));
        signal.cancel();

        assert!(waiter.join().expect("join"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn cancel_signal_times_out_when_idle() {
        let signal = CancelSignal::default();
        assert!(!signal.wait(Duration::from_millis(5)));
    }

    #[rstest]
    fn poller_fires_check_events() {
        let relay = EventRelay::new();
        let token = relay.register(CHECK_COMMANDS_EVENT).expect("register");
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        relay
            .on_event(&token, move |payload| {
                assert_eq!(payload, CHECK_COMMANDS_PAYLOAD);
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("subscribe");

        let poller = Poller::spawn(relay.handle(), INTERVAL).expect("spawn");
        let deadline = Instant::now() + Duration::from_secs(5);
        while seen.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            let _delivered = relay.drain();
            thread::sleep(INTERVAL);
        }
        poller.join().expect("join");

        assert!(seen.load(Ordering::SeqCst) >= 3);
    }

    #[rstest]
    fn a_stalled_host_sees_one_queued_check() {
        let relay = EventRelay::new();
        let token = relay.register(CHECK_COMMANDS_EVENT).expect("register");
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        relay
            .on_event(&token, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("subscribe");

        let poller = Poller::spawn(relay.handle(), INTERVAL).expect("spawn");
        thread::sleep(INTERVAL * 10);
        poller.join().expect("join");

        assert_eq!(relay.drain(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    fn join_returns_promptly_with_long_interval() {
        let relay = EventRelay::new();
        let poller = Poller::spawn(relay.handle(), Duration::from_secs(60)).expect("spawn");
        let started = Instant::now();
        poller.join().expect("join");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[rstest]
    fn survives_an_unavailable_host() {
        let relay = EventRelay::new();
        let handle = relay.handle();
        drop(relay);

        let poller = Poller::spawn(handle, INTERVAL).expect("spawn");
        thread::sleep(INTERVAL * 5);
        poller.join().expect("poller keeps running after fire errors");
    }
}
