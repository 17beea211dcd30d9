use std::cell::RefCell;
use std::rc::Rc;

use tracing::info;

use super::model::Design;
use super::{HOST_TARGET, HostApplication};

/// A host application whose documents live entirely in memory.
///
/// Used by the `cadbridged` binary and by tests in place of a real CAD
/// package. Messages shown to the user are logged and retained so callers
/// can inspect them.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    active: RefCell<Option<Rc<Design>>>,
    messages: RefCell<Vec<(String, String)>>,
}

impl InMemoryHost {
    /// Creates a host with no open document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host with a freshly opened design.
    #[must_use]
    pub fn with_design(name: &str) -> Self {
        let host = Self::new();
        let _design = host.open_design(name);
        host
    }

    /// Opens a new empty design and makes it active.
    #[must_use]
    pub fn open_design(&self, name: &str) -> Rc<Design> {
        let design = Design::new(name);
        self.active.replace(Some(Rc::clone(&design)));
        info!(target: HOST_TARGET, design = name, "design opened");
        design
    }

    /// Closes the active design, returning it if one was open.
    #[must_use]
    pub fn close_active(&self) -> Option<Rc<Design>> {
        let closed = self.active.take();
        if let Some(design) = &closed {
            info!(target: HOST_TARGET, design = design.name(), "design closed");
        }
        closed
    }

    /// Messages shown so far, as `(title, text)` pairs.
    #[must_use]
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.borrow().clone()
    }
}

impl HostApplication for InMemoryHost {
    fn active_design(&self) -> Option<Rc<Design>> {
        self.active.borrow().clone()
    }

    fn show_message(&self, title: &str, text: &str) {
        info!(target: HOST_TARGET, title, text, "message shown");
        self.messages
            .borrow_mut()
            .push((title.to_owned(), text.to_owned()));
    }
}
