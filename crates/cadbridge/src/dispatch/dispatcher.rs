//! Validation, routing, and contained execution of a single command.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use strum::Display;
use tracing::{debug, warn};

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use crate::context::CommandContext;
use crate::handler::HandlerFn;
use crate::host::HostApplication;
use crate::protocol::{Command, ResultChannel};
use crate::registry::HandlerRegistry;

/// Actions that run without an open design.
pub const CONTEXT_FREE_ACTIONS: &[&str] = &["ping", "message"];

/// Stages a command passes through, recorded on every dispatch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchStage {
    /// Decoded from the command file.
    Received,
    /// Preconditions checked.
    Validated,
    /// Handler resolved.
    ContextBound,
    /// Handler running.
    Executing,
    /// Result written.
    Completed,
}

/// Routes commands to registered handlers against the live host.
///
/// Holds `Rc` handles and is therefore confined to the host thread.
pub struct Dispatcher {
    host: Rc<dyn HostApplication>,
    registry: Rc<HandlerRegistry>,
    results: ResultChannel,
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        host: Rc<dyn HostApplication>,
        registry: Rc<HandlerRegistry>,
        results: ResultChannel,
    ) -> Self {
        Self {
            host,
            registry,
            results,
        }
    }

    /// The channel results are written to.
    #[must_use]
    pub fn results(&self) -> &ResultChannel {
        &self.results
    }

    /// Dispatches one command, writing a failure result for any error.
    ///
    /// The returned error has already been reported to the controller; it is
    /// returned so callers can observe the outcome.
    ///
    /// # Errors
    ///
    /// Returns the [`DispatchError`] that stopped the command.
    pub fn dispatch(&self, command: &Command) -> Result<(), DispatchError> {
        debug!(
            target: DISPATCH_TARGET,
            stage = %DispatchStage::Received,
            command_id = command.id,
            action = %command.action,
            "command received"
        );

        let outcome = self.execute(command);
        if let Err(error) = &outcome {
            warn!(
                target: DISPATCH_TARGET,
                stage = %DispatchStage::Completed,
                command_id = command.id,
                action = %command.action,
                %error,
                "command failed"
            );
            if let Err(write_error) = self.results.write_failure(command.id, error.to_string()) {
                warn!(
                    target: DISPATCH_TARGET,
                    command_id = command.id,
                    error = %write_error,
                    "failed to record failure result"
                );
            }
        } else {
            debug!(
                target: DISPATCH_TARGET,
                stage = %DispatchStage::Completed,
                command_id = command.id,
                action = %command.action,
                "command completed"
            );
        }
        outcome
    }

    fn execute(&self, command: &Command) -> Result<(), DispatchError> {
        let ctx = CommandContext::new(self.host.as_ref(), &self.results);

        if !CONTEXT_FREE_ACTIONS.contains(&command.action.as_str()) {
            ctx.require_active_document()?;
        }
        debug!(
            target: DISPATCH_TARGET,
            stage = %DispatchStage::Validated,
            command_id = command.id,
            "preconditions satisfied"
        );

        let handler = self
            .registry
            .lookup(&command.action)
            .ok_or_else(|| DispatchError::unknown_action(&command.action))?;
        debug!(
            target: DISPATCH_TARGET,
            stage = %DispatchStage::ContextBound,
            command_id = command.id,
            category = ?self.registry.category_of(&command.action),
            "handler resolved"
        );

        debug!(
            target: DISPATCH_TARGET,
            stage = %DispatchStage::Executing,
            command_id = command.id,
            "invoking handler"
        );
        run_contained(handler, &ctx, command)
    }
}

fn run_contained(
    handler: HandlerFn,
    ctx: &CommandContext<'_>,
    command: &Command,
) -> Result<(), DispatchError> {
    match panic::catch_unwind(AssertUnwindSafe(|| {
        handler(ctx, command.id, &command.params)
    })) {
        Ok(result) => result.map_err(DispatchError::from),
        Err(payload) => Err(DispatchError::handler_panicked(panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
