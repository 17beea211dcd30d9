//! Action-name to handler lookup.
//!
//! The [`HandlerRegistry`] is built once from static per-category tables and
//! is immutable afterwards. Tables are merged in order; when two tables name
//! the same action the later entry wins, and the collision is logged and
//! kept in [`HandlerRegistry::duplicates`]. [`HandlerRegistry::strict`]
//! refuses collisions outright.

use std::collections::HashMap;

use strum::{Display, EnumIter};
use thiserror::Error;
use tracing::{debug, warn};

use crate::handler::HandlerFn;

/// Tracing target for registry construction.
pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Handler groupings, listed in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    /// Connectivity and user messages.
    Basic,
    /// User parameters.
    Parameters,
    /// Sketch creation and closed shapes.
    SketchPrimitives,
    /// Open sketch curves.
    SketchCurves,
    /// Geometric sketch constraints.
    SketchConstraints,
    /// Solid-creating features.
    FeaturesBasic,
    /// Features that modify existing bodies.
    FeaturesModify,
    /// Read-only design queries.
    Queries,
    /// Construction geometry.
    Construction,
    /// File export.
    Export,
    /// Components and joints.
    Assembly,
    /// Timeline manipulation.
    Timeline,
}

/// One action bound to its handler.
#[derive(Debug, Clone, Copy)]
pub struct HandlerEntry {
    /// Wire name of the action.
    pub action: &'static str,
    /// Function invoked for the action.
    pub handler: HandlerFn,
}

impl HandlerEntry {
    /// Binds `action` to `handler`.
    #[must_use]
    pub const fn new(action: &'static str, handler: HandlerFn) -> Self {
        Self { action, handler }
    }
}

/// A category and the entries it contributes. An empty table is valid.
#[derive(Debug, Clone, Copy)]
pub struct CategoryTable {
    /// Category the entries belong to.
    pub category: Category,
    /// Entries in declaration order.
    pub entries: &'static [HandlerEntry],
}

/// A collision found while merging tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateAction {
    /// Action registered more than once.
    pub action: &'static str,
    /// Category whose entry was replaced.
    pub replaced: Category,
    /// Category whose entry now serves the action.
    pub winner: Category,
}

/// Errors raised while building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two tables named the same action.
    #[error("action '{action}' registered by both {first} and {second}")]
    DuplicateAction {
        /// Colliding action.
        action: &'static str,
        /// Category that registered it first.
        first: Category,
        /// Category that registered it again.
        second: Category,
    },
}

#[derive(Debug, Clone, Copy)]
struct Registered {
    handler: HandlerFn,
    category: Category,
}

/// Immutable mapping from action name to handler.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Registered>,
    duplicates: Vec<DuplicateAction>,
}

impl HandlerRegistry {
    /// Merges tables in order, letting later entries replace earlier ones.
    #[must_use]
    pub fn from_tables(tables: &[CategoryTable]) -> Self {
        let mut registry = Self::default();
        for table in tables {
            for entry in table.entries {
                if let Some(collision) = registry.insert(table.category, entry) {
                    warn!(
                        target: REGISTRY_TARGET,
                        action = collision.action,
                        replaced = %collision.replaced,
                        winner = %collision.winner,
                        "duplicate action; later registration wins"
                    );
                    registry.duplicates.push(collision);
                }
            }
        }
        debug!(
            target: REGISTRY_TARGET,
            actions = registry.len(),
            duplicates = registry.duplicates.len(),
            "handler registry built"
        );
        registry
    }

    /// Merges tables in order, rejecting any duplicate action.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateAction`] for the first collision.
    pub fn strict(tables: &[CategoryTable]) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for table in tables {
            for entry in table.entries {
                if let Some(collision) = registry.insert(table.category, entry) {
                    return Err(RegistryError::DuplicateAction {
                        action: collision.action,
                        first: collision.replaced,
                        second: collision.winner,
                    });
                }
            }
        }
        Ok(registry)
    }

    fn insert(&mut self, category: Category, entry: &HandlerEntry) -> Option<DuplicateAction> {
        let previous = self.handlers.insert(
            entry.action,
            Registered {
                handler: entry.handler,
                category,
            },
        )?;
        Some(DuplicateAction {
            action: entry.action,
            replaced: previous.category,
            winner: category,
        })
    }

    /// Looks up the handler for `action`. Matching is exact.
    #[must_use]
    pub fn lookup(&self, action: &str) -> Option<HandlerFn> {
        self.handlers.get(action).map(|registered| registered.handler)
    }

    /// Category currently serving `action`.
    #[must_use]
    pub fn category_of(&self, action: &str) -> Option<Category> {
        self.handlers.get(action).map(|registered| registered.category)
    }

    /// Registered action names, sorted.
    #[must_use]
    pub fn actions(&self) -> Vec<&'static str> {
        let mut actions: Vec<_> = self.handlers.keys().copied().collect();
        actions.sort_unstable();
        actions
    }

    /// Collisions resolved while building.
    #[must_use]
    pub fn duplicates(&self) -> &[DuplicateAction] {
        &self.duplicates
    }

    /// Number of distinct actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when no actions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests;
