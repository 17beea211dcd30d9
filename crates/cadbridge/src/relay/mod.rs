//! Cross-thread hand-off into the host's single-threaded event loop.
//!
//! The [`EventRelay`] lives on the host thread and owns the receiving end
//! of an unbounded queue. Any thread holding a [`RelayHandle`] can post a
//! named event without blocking; the host delivers queued events to their
//! callbacks whenever it calls [`EventRelay::drain`]. Callbacks therefore
//! always run on the host thread.
//!
//! Periodic senders use [`RelayHandle::fire_coalesced`], which keeps at
//! most one undelivered copy of an event in the queue while the host thread
//! is busy.

mod errors;

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::mem;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};
use std::time::Duration;

use tracing::{debug, trace};

pub use self::errors::RelayError;

/// Tracing target for relay operations.
pub(crate) const RELAY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::relay");

/// Event the bridge registers to trigger a command check.
pub const CHECK_COMMANDS_EVENT: &str = "cadbridge.check_commands";

/// Payload posted with [`CHECK_COMMANDS_EVENT`].
pub const CHECK_COMMANDS_PAYLOAD: &str = r#"{"check_commands":true}"#;

/// How long [`EventRelay::run_until`] waits before rechecking its stop flag.
const RUN_TICK: Duration = Duration::from_millis(50);

type Callback = Box<dyn FnMut(&str)>;

#[derive(Debug)]
struct Fired {
    name: String,
    payload: String,
    coalesced: bool,
}

/// Names with a coalesced event still waiting in the queue.
type Pending = Arc<Mutex<HashSet<String>>>;

fn lock_pending(pending: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Proof of registration for one event name.
#[derive(Debug, PartialEq, Eq)]
pub struct EventToken {
    name: String,
}

impl EventToken {
    /// Registered event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Identifies one callback attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registration {
    subscriptions: Vec<(SubscriptionId, Callback)>,
}

/// Thread-safe, non-blocking sender into an [`EventRelay`].
#[derive(Debug, Clone)]
pub struct RelayHandle {
    sender: mpsc::Sender<Fired>,
    available: Arc<AtomicBool>,
    pending: Pending,
}

impl RelayHandle {
    /// Posts an event for the host thread to deliver later.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HostUnavailable`] once the relay has shut down
    /// or been dropped. Callers polling on a timer may ignore it.
    pub fn fire(&self, name: &str, payload: impl Into<String>) -> Result<(), RelayError> {
        self.send(name, payload.into(), false)
    }

    /// Posts an event unless an earlier coalesced copy is still queued.
    ///
    /// Returns `false` when the event was folded into the queued copy. Once
    /// the host thread starts delivering that copy, the next call queues a
    /// new one.
    ///
    /// # Errors
    ///
    /// See [`fire`](Self::fire).
    pub fn fire_coalesced(
        &self,
        name: &str,
        payload: impl Into<String>,
    ) -> Result<bool, RelayError> {
        if !lock_pending(&self.pending).insert(name.to_owned()) {
            return Ok(false);
        }
        self.send(name, payload.into(), true)
            .inspect_err(|_| {
                lock_pending(&self.pending).remove(name);
            })
            .map(|()| true)
    }

    fn send(&self, name: &str, payload: String, coalesced: bool) -> Result<(), RelayError> {
        if !self.available.load(Ordering::Acquire) {
            return Err(RelayError::HostUnavailable);
        }
        self.sender
            .send(Fired {
                name: name.to_owned(),
                payload,
                coalesced,
            })
            .map_err(|_| RelayError::HostUnavailable)
    }

    /// Whether the host side still accepts events.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }
}

/// Host-thread event queue with named, callback-driven events.
///
/// Not `Send`: it must be created, drained, and dropped on the host thread.
pub struct EventRelay {
    sender: mpsc::Sender<Fired>,
    receiver: mpsc::Receiver<Fired>,
    available: Arc<AtomicBool>,
    pending: Pending,
    events: RefCell<HashMap<String, Registration>>,
    next_subscription: Cell<u64>,
    _host_thread: PhantomData<Rc<()>>,
}

impl Default for EventRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRelay {
    /// Creates a relay bound to the calling thread.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            available: Arc::new(AtomicBool::new(true)),
            pending: Pending::default(),
            events: RefCell::new(HashMap::new()),
            next_subscription: Cell::new(0),
            _host_thread: PhantomData,
        }
    }

    /// Returns a sender other threads can use to post events.
    #[must_use]
    pub fn handle(&self) -> RelayHandle {
        RelayHandle {
            sender: self.sender.clone(),
            available: Arc::clone(&self.available),
            pending: Arc::clone(&self.pending),
        }
    }

    /// Registers an event name.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::AlreadyRegistered`] if the name is taken.
    pub fn register(&self, name: &str) -> Result<EventToken, RelayError> {
        let mut events = self.events.borrow_mut();
        if events.contains_key(name) {
            return Err(RelayError::AlreadyRegistered {
                name: name.to_owned(),
            });
        }
        events.insert(name.to_owned(), Registration::default());
        debug!(target: RELAY_TARGET, event = name, "event registered");
        Ok(EventToken {
            name: name.to_owned(),
        })
    }

    /// Attaches a callback to a registered event.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotRegistered`] if the token's event has been
    /// unregistered.
    pub fn on_event<F>(&self, token: &EventToken, callback: F) -> Result<SubscriptionId, RelayError>
    where
        F: FnMut(&str) + 'static,
    {
        let mut events = self.events.borrow_mut();
        let registration =
            events
                .get_mut(&token.name)
                .ok_or_else(|| RelayError::NotRegistered {
                    name: token.name.clone(),
                })?;
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        registration.subscriptions.push((id, Box::new(callback)));
        Ok(id)
    }

    /// Detaches a callback. Returns `false` if it was not attached.
    #[must_use]
    pub fn remove_handler(&self, token: &EventToken, subscription: SubscriptionId) -> bool {
        let mut events = self.events.borrow_mut();
        let Some(registration) = events.get_mut(&token.name) else {
            return false;
        };
        let before = registration.subscriptions.len();
        registration
            .subscriptions
            .retain(|(id, _)| *id != subscription);
        registration.subscriptions.len() != before
    }

    /// Removes an event and all its callbacks. Returns `false` if it was
    /// not registered.
    #[must_use]
    pub fn unregister(&self, token: &EventToken) -> bool {
        let removed = self.events.borrow_mut().remove(&token.name).is_some();
        if removed {
            debug!(target: RELAY_TARGET, event = %token.name, "event unregistered");
        }
        removed
    }

    /// Delivers every queued event on the calling thread.
    ///
    /// Returns the number of events that reached at least one callback.
    /// Events for unregistered names are dropped.
    #[must_use]
    pub fn drain(&self) -> usize {
        let mut delivered = 0;
        while let Ok(fired) = self.receiver.try_recv() {
            if self.deliver(&fired) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Runs a host event loop until `stop` is set, delivering events as
    /// they arrive. Returns the number of events delivered.
    #[must_use]
    pub fn run_until(&self, stop: &AtomicBool) -> usize {
        let mut delivered = 0;
        while !stop.load(Ordering::Acquire) {
            match self.receiver.recv_timeout(RUN_TICK) {
                Ok(fired) => {
                    if self.deliver(&fired) {
                        delivered += 1;
                    }
                    delivered += self.drain();
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        delivered
    }

    /// Stops accepting events; later [`RelayHandle::fire`] calls fail with
    /// [`RelayError::HostUnavailable`].
    pub fn shutdown(&self) {
        if self.available.swap(false, Ordering::AcqRel) {
            debug!(target: RELAY_TARGET, "relay shut down");
        }
    }

    fn deliver(&self, fired: &Fired) -> bool {
        if fired.coalesced {
            lock_pending(&self.pending).remove(&fired.name);
        }
        // Callbacks are taken out while they run so they may use the relay.
        let mut callbacks = {
            let mut events = self.events.borrow_mut();
            let Some(registration) = events.get_mut(&fired.name) else {
                trace!(target: RELAY_TARGET, event = %fired.name, "dropping unregistered event");
                return false;
            };
            mem::take(&mut registration.subscriptions)
        };
        if callbacks.is_empty() {
            return false;
        }

        for (_, callback) in &mut callbacks {
            callback(&fired.payload);
        }

        if let Some(registration) = self.events.borrow_mut().get_mut(&fired.name) {
            let added = mem::replace(&mut registration.subscriptions, callbacks);
            registration.subscriptions.extend(added);
        }
        true
    }
}

impl Drop for EventRelay {
    fn drop(&mut self) {
        self.available.store(false, Ordering::Release);
    }
}
