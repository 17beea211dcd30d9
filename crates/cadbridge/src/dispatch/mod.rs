//! Command dispatch on the host thread.
//!
//! The [`CommandWatcher`] filters the pending command by identifier and
//! hands anything new to the [`Dispatcher`], which walks each command
//! through a fixed sequence of stages:
//!
//! ```text
//! Received -> Validated -> ContextBound -> Executing -> Completed
//! ```
//!
//! Every failure along the way becomes a failure result for the controller;
//! nothing escapes to the host's event loop.

mod dispatcher;
mod errors;
mod watcher;

pub use self::dispatcher::{CONTEXT_FREE_ACTIONS, DispatchStage, Dispatcher};
pub use self::errors::DispatchError;
pub use self::watcher::{CommandOutcome, CommandWatcher};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
