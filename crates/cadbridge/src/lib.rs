//! Command bridge between an external controller and a single-threaded CAD
//! host.
//!
//! A controller writes one pending command at a time to `commands.json` in
//! the bridge directory and reads the outcome back from `results.json`. The
//! host engine is not thread-safe, so the bridge never touches it from
//! anywhere but the host thread:
//!
//! 1. A background [`Poller`] fires [`relay::CHECK_COMMANDS_EVENT`] through a
//!    [`RelayHandle`] on a fixed interval.
//! 2. The host drains its [`EventRelay`] on its own schedule, which runs the
//!    bridge callback on the host thread.
//! 3. The callback's [`CommandWatcher`] reads the pending command and, if its
//!    id is newer than the last one processed, passes it to the
//!    [`Dispatcher`].
//! 4. The dispatcher resolves a handler from the [`HandlerRegistry`], runs it
//!    against a fresh [`CommandContext`], and records exactly one result.
//!
//! [`Bridge`] ties these together with an explicit start/stop lifecycle and
//! reports each stage through a [`BridgeReporter`]. The [`host`] module
//! defines the engine API as the [`HostApplication`] trait and ships an
//! in-memory engine so the bridge can run without a proprietary CAD package.

pub mod client;
pub mod context;
pub mod dispatch;
pub mod handler;
pub mod handlers;
pub mod health;
pub mod host;
pub mod lifecycle;
pub mod poller;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod shutdown;
pub mod telemetry;

pub use client::{BridgeClient, ClientError};
pub use context::{CommandContext, ContextError};
pub use dispatch::{CommandOutcome, CommandWatcher, DispatchError, Dispatcher};
pub use handler::{HandlerError, HandlerFn};
pub use health::{BridgeReporter, StructuredBridgeReporter};
pub use host::{HostApplication, InMemoryHost};
pub use lifecycle::{Bridge, BridgeError, BridgeSettings};
pub use poller::{Poller, PollerError};
pub use protocol::{BridgeStatus, Command, CommandId, CommandResult, Params, ProtocolError};
pub use registry::{Category, HandlerRegistry, RegistryError};
pub use relay::{EventRelay, RelayError, RelayHandle};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
