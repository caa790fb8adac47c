//! Architecture Validation Integration Tests
//!
//! Confirms that the hierarchy engine, the manager facade and the SQLite
//! store are usable from the crate root without any CLI dependencies
//! (clap, dirs), so other front ends can reuse them.
//!
//! **Architecture Invariant:**
//! This file must NOT import anything from main.rs. It only uses types
//! exported from the `tagtree::` crate root.
//!
//! **CLI types that are NOT exported from the crate root:**
//! - Cli (clap command parser)
//! - Commands (clap subcommands enum)
//! - SortArg (clap value enum)

use std::collections::HashMap;

use anyhow::Result;
use tagtree::{
    BuildOutcome, Database, DocumentId, Forest, HierarchyBuilder, HierarchyConfig,
    HierarchyError, HierarchyManager, HierarchyStats, SearchQuery, SortField, TagId, TagRecord,
    TagService, TagStore, TagType,
};

// =============================================================================
// Engine isolation
// =============================================================================

#[test]
fn test_builder_runs_without_store() {
    let outcome: BuildOutcome = HierarchyBuilder::new()
        .record(TagRecord::builder("1", "Root").build())
        .build();

    let forest: &Forest = &outcome.forest;
    assert_eq!(forest.len(), 1);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_empty_input_builds_empty_forest() {
    let outcome = HierarchyBuilder::new().build();

    assert!(outcome.forest.is_empty());
    assert!(outcome.forest.roots().is_empty());
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_search_query_is_constructible_from_root() {
    assert!(SearchQuery::new("   ").is_unconstrained());
    assert!(!SearchQuery::new("rust").is_unconstrained());
}

#[test]
fn test_sort_field_parses_cli_spellings() {
    assert_eq!("name".parse::<SortField>().ok(), Some(SortField::Name));
    assert_eq!("type".parse::<SortField>().ok(), Some(SortField::Type));
    assert_eq!("count".parse::<SortField>().ok(), Some(SortField::TotalCount));
}

// =============================================================================
// Manager facade
// =============================================================================

#[test]
fn test_manager_with_custom_separator() {
    let mut manager = HierarchyManager::new(HierarchyConfig {
        path_separator: "/".to_string(),
        ..Default::default()
    });
    manager.rebuild(vec![
        TagRecord::builder("a", "A").build(),
        TagRecord::builder("b", "B").parent("a").build(),
    ]);

    assert_eq!(manager.path("b").ok().as_deref(), Some("A/B"));
}

#[test]
fn test_manager_reports_missing_tag() {
    let manager = HierarchyManager::default();

    assert_eq!(
        manager.path("ghost"),
        Err(HierarchyError::NotFound(TagId::new("ghost")))
    );
}

#[test]
fn test_manager_stats_on_empty_manager() {
    let manager = HierarchyManager::default();

    assert_eq!(manager.stats(), HierarchyStats::default());
}

#[test]
fn test_unknown_count_entries_are_ignored() {
    let mut manager = HierarchyManager::default();
    manager.rebuild(vec![TagRecord::builder("1", "Root").build()]);

    let ignored = manager.update_counts(HashMap::from([
        (TagId::new("1"), 2),
        (TagId::new("nope"), 9),
    ]));

    assert_eq!(ignored, 1);
    assert_eq!(manager.stats().documents, 2);
}

// =============================================================================
// Store behind the trait seam
// =============================================================================

#[test]
fn test_service_usable_as_trait_object() -> Result<()> {
    let service = TagService::new(Database::in_memory()?);
    let store: &dyn TagStore = &service;

    store.create_tag(
        &TagRecord::builder("ops", "Operations")
            .tag_type(TagType::Category)
            .build(),
    )?;
    service.tag_document(&DocumentId::new("runbook"), &TagId::new("ops"))?;

    let mut manager = HierarchyManager::default();
    manager.refresh_from(store)?;

    let ops = manager.find_node("ops").expect("ops node");
    assert_eq!(ops.record().tag_type, TagType::Category);
    assert_eq!(ops.total_count(), 1);

    Ok(())
}
