//! The host application seen from the bridge.
//!
//! The CAD engine is single-threaded and non-reentrant; every type here uses
//! `Rc` and `RefCell` and is therefore `!Send`, which keeps host access on
//! the thread that created it.

mod memory;
mod model;

use std::rc::Rc;

use thiserror::Error;

pub use self::memory::InMemoryHost;
pub use self::model::{
    Body, Component, Design, ExtrudeFeature, ExtrudeFeatureCollection, FeatureOperation,
    ParameterChange, Point, Profile, Sketch, SketchCollection, SketchCurve, SketchPlane,
    UserParameter,
};

/// Tracing target for host-side activity.
pub(crate) const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

/// Operations the bridge needs from the host application.
pub trait HostApplication {
    /// Returns the active design document, if one is open.
    fn active_design(&self) -> Option<Rc<Design>>;

    /// Displays a message to the host's user.
    fn show_message(&self, title: &str, text: &str);
}

/// Failures raised by host model operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// The requested profile index is out of range.
    #[error("Invalid profile. Has {count}")]
    InvalidProfile {
        /// Requested index.
        index: i64,
        /// Profiles available on the sketch.
        count: usize,
    },

    /// A combining extrude found no body to combine with.
    #[error("no body to {operation} in component {component}")]
    NoTargetBody {
        /// Requested operation.
        operation: FeatureOperation,
        /// Component that was searched.
        component: String,
    },

    /// A geometric input was rejected.
    #[error("{0}")]
    InvalidGeometry(String),
}
