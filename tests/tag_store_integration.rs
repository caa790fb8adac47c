use std::sync::{Arc, Mutex};

use anyhow::Result;
use tagtree::{
    Database, DocumentId, HierarchyError, HierarchyEvent, HierarchyManager, TagId, TagRecord,
    TagService, TagStore, TagType,
};
use tempfile::TempDir;

/// Seeds a small client/technology taxonomy.
fn seed(service: &TagService) -> Result<()> {
    service.create_tag(&TagRecord::builder("clients", "Clients").build())?;
    service.create_tag(
        &TagRecord::builder("acme", "Acme Corp")
            .tag_type(TagType::Client)
            .parent("clients")
            .build(),
    )?;
    service.create_tag(
        &TagRecord::builder("acme-web", "Acme Website")
            .tag_type(TagType::Client)
            .parent("acme")
            .description("Marketing site rebuild")
            .build(),
    )?;
    service.create_tag(
        &TagRecord::builder("rust", "Rust")
            .tag_type(TagType::Technology)
            .build(),
    )?;
    Ok(())
}

#[test]
fn test_hierarchy_survives_reopening_database() -> Result<()> {
    // Arrange: on-disk database seeded and tagged, then closed
    let dir = TempDir::new()?;
    let path = dir.path().join("tags.db");
    {
        let service = TagService::new(Database::open(&path)?);
        seed(&service)?;
        service.tag_document(&DocumentId::new("doc-1"), &TagId::new("acme-web"))?;
        service.tag_document(&DocumentId::new("doc-2"), &TagId::new("acme-web"))?;
        service.tag_document(&DocumentId::new("doc-2"), &TagId::new("acme"))?;
    }

    // Act: reopen and refresh a manager from the store
    let service = TagService::new(Database::open(&path)?);
    let mut manager = HierarchyManager::default();
    let warnings = manager.refresh_from(&service)?.to_vec();

    // Assert: structure and rolled-up counts match the persisted data
    assert!(warnings.is_empty());
    assert_eq!(manager.len(), 4);
    assert_eq!(
        manager.path("acme-web")?,
        "Clients > Acme Corp > Acme Website"
    );

    let clients = manager.find_node("clients").expect("clients node");
    assert_eq!(clients.direct_count(), 0);
    assert_eq!(clients.total_count(), 3);
    assert_eq!(manager.find_node("acme").expect("acme node").total_count(), 3);
    assert_eq!(manager.find_node("rust").expect("rust node").total_count(), 0);

    Ok(())
}

#[test]
fn test_reparenting_through_store_moves_subtree() -> Result<()> {
    // Arrange
    let service = TagService::new(Database::in_memory()?);
    seed(&service)?;
    service.tag_document(&DocumentId::new("doc-1"), &TagId::new("acme-web"))?;

    // Act: move the Acme subtree under Rust
    let mut acme = service.get_tag("acme")?.expect("acme exists");
    acme.parent_id = Some(TagId::new("rust"));
    service.update_tag(&TagId::new("acme"), &acme)?;

    let mut manager = HierarchyManager::default();
    manager.refresh_from(&service)?;

    // Assert
    assert_eq!(manager.path("acme-web")?, "Rust > Acme Corp > Acme Website");
    assert_eq!(manager.find_node("rust").expect("rust").total_count(), 1);
    assert_eq!(manager.find_node("clients").expect("clients").total_count(), 0);

    Ok(())
}

#[test]
fn test_store_cycle_is_demoted_on_rebuild() -> Result<()> {
    // Arrange: the store accepts a parent loop across two updates
    let service = TagService::new(Database::in_memory()?);
    seed(&service)?;
    let mut clients = service.get_tag("clients")?.expect("clients exists");
    clients.parent_id = Some(TagId::new("acme"));
    service.update_tag(&TagId::new("clients"), &clients)?;

    // Act
    let mut manager = HierarchyManager::default();
    let warnings = manager.refresh_from(&service)?.to_vec();

    // Assert: both loop members become roots, everything stays reachable
    let cycles: Vec<&TagId> = warnings
        .iter()
        .filter(|w| matches!(w, HierarchyError::CycleDetected { .. }))
        .map(HierarchyError::tag_id)
        .collect();
    assert_eq!(cycles.len(), 2);
    assert!(manager.find_node("clients").expect("clients").parent().is_none());
    assert!(manager.find_node("acme").expect("acme").parent().is_none());
    assert_eq!(manager.find_node("acme-web").expect("acme-web").level(), 1);
    assert_eq!(manager.forest().walk().count(), manager.len());

    Ok(())
}

#[test]
fn test_delete_keeps_descendants_in_tree() -> Result<()> {
    // Arrange
    let service = TagService::new(Database::in_memory()?);
    seed(&service)?;

    // Act
    service.delete_tag(&TagId::new("acme"))?;
    let mut manager = HierarchyManager::default();
    manager.refresh_from(&service)?;

    // Assert: the grandchild is now a direct child of the old grandparent
    assert!(manager.find_node("acme").is_none());
    assert_eq!(manager.path("acme-web")?, "Clients > Acme Website");

    Ok(())
}

#[test]
fn test_search_over_stored_descriptions() -> Result<()> {
    // Arrange
    let service = TagService::new(Database::in_memory()?);
    seed(&service)?;
    let mut manager = HierarchyManager::default();
    manager.refresh_from(&service)?;
    manager.collapse_all();

    // Act
    let roots: Vec<String> = manager
        .search("marketing")
        .iter()
        .map(|r| r.id().to_string())
        .collect();
    let revealed = manager.reveal_matches("marketing");

    // Assert: match lives under Clients and its ancestors were expanded
    assert_eq!(roots, vec!["clients"]);
    assert_eq!(revealed, 1);
    assert!(manager.find_node("clients").expect("clients").is_expanded());
    assert!(manager.find_node("acme").expect("acme").is_expanded());

    Ok(())
}

#[test]
fn test_observer_sees_refresh_events() -> Result<()> {
    // Arrange
    let service = TagService::new(Database::in_memory()?);
    seed(&service)?;
    let events: Arc<Mutex<Vec<HierarchyEvent>>> = Arc::default();
    let sink = Arc::clone(&events);

    let mut manager = HierarchyManager::default();
    manager.subscribe(move |event: &HierarchyEvent| {
        sink.lock().expect("event lock").push(event.clone());
    });

    // Act
    manager.refresh_from(&service)?;

    // Assert
    let events = events.lock().expect("event lock");
    assert_eq!(
        events.as_slice(),
        &[HierarchyEvent::Rebuilt {
            nodes: 4,
            warnings: 0
        }]
    );

    Ok(())
}
