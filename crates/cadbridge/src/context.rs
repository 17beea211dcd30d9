//! Per-dispatch access to the host's current document state.
//!
//! A [`CommandContext`] is built fresh for every command and holds only
//! borrowed references. Each accessor asks the host again, so a document
//! opened or closed between commands is always observed.

use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use crate::handler::HandlerError;
use crate::host::{
    Component, Design, ExtrudeFeatureCollection, HostApplication, Sketch, SketchCollection,
};
use crate::protocol::{CommandId, ResultChannel};

/// Precondition failures raised by context accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The host has no open design document.
    #[error("No active design")]
    NoActiveDesign,

    /// The design contains no sketches at all.
    #[error("No sketches in design")]
    NoSketches,

    /// A sketch index fell outside the design's sketches.
    #[error("Invalid sketch index {index}. Design has {count} sketches.")]
    InvalidSketchIndex {
        /// Requested global index.
        index: i64,
        /// Sketches in the design.
        count: usize,
    },
}

/// A sketch located by global index together with its owner.
#[derive(Debug, Clone)]
pub struct SketchTarget {
    /// Component that owns the sketch.
    pub component: Rc<Component>,
    /// The sketch itself.
    pub sketch: Rc<Sketch>,
    /// Resolved global index.
    pub index: usize,
}

/// Handler-facing view of the host and the result channel.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    host: &'a dyn HostApplication,
    results: &'a ResultChannel,
}

impl<'a> CommandContext<'a> {
    /// Binds a context to the host and result channel.
    #[must_use]
    pub fn new(host: &'a dyn HostApplication, results: &'a ResultChannel) -> Self {
        Self { host, results }
    }

    /// The host application.
    #[must_use]
    pub fn host(&self) -> &'a dyn HostApplication {
        self.host
    }

    /// The channel handlers report through.
    #[must_use]
    pub fn results(&self) -> &'a ResultChannel {
        self.results
    }

    /// The active design, if any.
    #[must_use]
    pub fn design(&self) -> Option<Rc<Design>> {
        self.host.active_design()
    }

    /// Root component of the active design.
    #[must_use]
    pub fn root_component(&self) -> Option<Rc<Component>> {
        self.design().map(|design| design.root_component())
    }

    /// Sketches of the root component.
    #[must_use]
    pub fn sketch_collection(&self) -> Option<SketchCollection> {
        self.root_component().map(|root| root.sketches())
    }

    /// Extrude features of the root component.
    #[must_use]
    pub fn extrude_feature_collection(&self) -> Option<ExtrudeFeatureCollection> {
        self.root_component().map(|root| root.extrude_features())
    }

    /// Returns the active design or fails with "No active design".
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoActiveDesign`] when no document is open.
    pub fn require_active_document(&self) -> Result<Rc<Design>, ContextError> {
        self.design().ok_or(ContextError::NoActiveDesign)
    }

    /// Resolves a sketch by global index across the component tree.
    ///
    /// `None` and `-1` select the most recently listed sketch.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoActiveDesign`], [`ContextError::NoSketches`],
    /// or [`ContextError::InvalidSketchIndex`].
    pub fn resolve_sketch(&self, index: Option<i64>) -> Result<SketchTarget, ContextError> {
        let design = self.require_active_document()?;
        let mut sketches = design.all_sketches();
        let count = sketches.len();
        if count == 0 {
            return Err(ContextError::NoSketches);
        }

        let requested = match index {
            None | Some(-1) => i64::try_from(count - 1).unwrap_or(i64::MAX),
            Some(value) => value,
        };
        let invalid = || ContextError::InvalidSketchIndex {
            index: requested,
            count,
        };
        let position = usize::try_from(requested).map_err(|_| invalid())?;
        if position >= count {
            return Err(invalid());
        }
        let (component, sketch) = sketches.swap_remove(position);
        Ok(SketchTarget {
            component,
            sketch,
            index: position,
        })
    }

    /// Resolves a sketch among the root component's own sketches.
    ///
    /// `None` and `-1` select the root's last sketch. An empty root reports
    /// an invalid index rather than [`ContextError::NoSketches`].
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoActiveDesign`] or
    /// [`ContextError::InvalidSketchIndex`].
    pub fn resolve_root_sketch(&self, index: Option<i64>) -> Result<Rc<Sketch>, ContextError> {
        let sketches = self
            .sketch_collection()
            .ok_or(ContextError::NoActiveDesign)?;
        let count = sketches.count();
        let requested = match index {
            None | Some(-1) => i64::try_from(count).map_or(i64::MAX, |count| count - 1),
            Some(value) => value,
        };
        usize::try_from(requested)
            .ok()
            .and_then(|position| sketches.item(position))
            .ok_or(ContextError::InvalidSketchIndex {
                index: requested,
                count,
            })
    }

    /// Writes a success result for `command_id`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Protocol`] when the result cannot be written.
    pub fn respond(&self, command_id: CommandId, result: Value) -> Result<(), HandlerError> {
        self.results
            .write_success(command_id, result)
            .map_err(HandlerError::from)
    }
}
