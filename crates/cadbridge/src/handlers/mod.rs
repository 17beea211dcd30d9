//! Built-in command handlers, grouped into per-category tables.
//!
//! Tables are listed in merge order. Categories without shipped handlers
//! keep an empty table so the registry layout stays stable as handlers are
//! added.

mod basic;
mod features;
mod parameters;
mod queries;
mod sketch;
mod support;

use crate::registry::{Category, CategoryTable, HandlerRegistry};

/// Every handler table, in merge order.
pub const CATEGORY_TABLES: &[CategoryTable] = &[
    CategoryTable {
        category: Category::Basic,
        entries: basic::ENTRIES,
    },
    CategoryTable {
        category: Category::Parameters,
        entries: parameters::ENTRIES,
    },
    CategoryTable {
        category: Category::SketchPrimitives,
        entries: sketch::PRIMITIVES,
    },
    CategoryTable {
        category: Category::SketchCurves,
        entries: sketch::CURVES,
    },
    CategoryTable {
        category: Category::SketchConstraints,
        entries: &[],
    },
    CategoryTable {
        category: Category::FeaturesBasic,
        entries: features::BASIC,
    },
    CategoryTable {
        category: Category::FeaturesModify,
        entries: &[],
    },
    CategoryTable {
        category: Category::Queries,
        entries: queries::ENTRIES,
    },
    CategoryTable {
        category: Category::Construction,
        entries: &[],
    },
    CategoryTable {
        category: Category::Export,
        entries: &[],
    },
    CategoryTable {
        category: Category::Assembly,
        entries: &[],
    },
    CategoryTable {
        category: Category::Timeline,
        entries: &[],
    },
];

/// Builds the registry of built-in handlers.
#[must_use]
pub fn registry() -> HandlerRegistry {
    HandlerRegistry::from_tables(CATEGORY_TABLES)
}
