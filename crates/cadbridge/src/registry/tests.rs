//! Unit tests for the handler registry.

use rstest::{fixture, rstest};
use strum::IntoEnumIterator;

use super::*;
use crate::context::CommandContext;
use crate::handler::HandlerError;
use crate::protocol::{CommandId, Params};

fn noop(_: &CommandContext<'_>, _: CommandId, _: &Params) -> Result<(), HandlerError> {
    Ok(())
}

fn refuse(_: &CommandContext<'_>, _: CommandId, _: &Params) -> Result<(), HandlerError> {
    Err(HandlerError::failed("refused"))
}

const BASIC: &[HandlerEntry] = &[
    HandlerEntry::new("ping", noop),
    HandlerEntry::new("message", noop),
];
const QUERIES: &[HandlerEntry] = &[HandlerEntry::new("get_info", noop)];
const SHADOWING: &[HandlerEntry] = &[HandlerEntry::new("ping", refuse)];

#[fixture]
fn tables() -> Vec<CategoryTable> {
    vec![
        CategoryTable {
            category: Category::Basic,
            entries: BASIC,
        },
        CategoryTable {
            category: Category::Export,
            entries: &[],
        },
        CategoryTable {
            category: Category::Queries,
            entries: QUERIES,
        },
    ]
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn empty_tables_give_an_empty_registry() {
    let registry = HandlerRegistry::from_tables(&[]);
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    assert!(registry.duplicates().is_empty());
}

#[rstest]
fn merges_every_table(tables: Vec<CategoryTable>) {
    let registry = HandlerRegistry::from_tables(&tables);
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.actions(), ["get_info", "message", "ping"]);
    assert!(registry.duplicates().is_empty());
}

#[rstest]
fn records_category_of_each_action(tables: Vec<CategoryTable>) {
    let registry = HandlerRegistry::from_tables(&tables);
    assert_eq!(registry.category_of("ping"), Some(Category::Basic));
    assert_eq!(registry.category_of("get_info"), Some(Category::Queries));
    assert_eq!(registry.category_of("export_stl"), None);
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[rstest]
#[case("ping", true)]
#[case("get_info", true)]
#[case("PING", false)]
#[case("", false)]
#[case("fly", false)]
fn lookup_is_exact(tables: Vec<CategoryTable>, #[case] action: &str, #[case] found: bool) {
    let registry = HandlerRegistry::from_tables(&tables);
    assert_eq!(registry.lookup(action).is_some(), found);
}

// ---------------------------------------------------------------------------
// Duplicates
// ---------------------------------------------------------------------------

#[rstest]
fn later_table_wins_and_is_recorded(mut tables: Vec<CategoryTable>) {
    tables.push(CategoryTable {
        category: Category::Timeline,
        entries: SHADOWING,
    });

    let registry = HandlerRegistry::from_tables(&tables);

    assert_eq!(registry.len(), 3);
    assert_eq!(registry.category_of("ping"), Some(Category::Timeline));
    assert_eq!(
        registry.duplicates(),
        [DuplicateAction {
            action: "ping",
            replaced: Category::Basic,
            winner: Category::Timeline,
        }]
    );
}

#[rstest]
fn strict_accepts_disjoint_tables(tables: Vec<CategoryTable>) {
    let registry = HandlerRegistry::strict(&tables).expect("no collisions");
    assert_eq!(registry.len(), 3);
}

#[rstest]
fn strict_rejects_duplicates(mut tables: Vec<CategoryTable>) {
    tables.push(CategoryTable {
        category: Category::Timeline,
        entries: SHADOWING,
    });

    let error = HandlerRegistry::strict(&tables).expect_err("collision");
    assert_eq!(
        error,
        RegistryError::DuplicateAction {
            action: "ping",
            first: Category::Basic,
            second: Category::Timeline,
        }
    );
    assert_eq!(
        error.to_string(),
        "action 'ping' registered by both basic and timeline"
    );
}

#[test]
fn categories_render_in_snake_case() {
    let names: Vec<String> = Category::iter().map(|category| category.to_string()).collect();
    assert_eq!(names.len(), 12);
    assert_eq!(names.first().map(String::as_str), Some("basic"));
    assert!(names.iter().any(|name| name == "sketch_primitives"));
    assert!(names.iter().any(|name| name == "features_modify"));
}
