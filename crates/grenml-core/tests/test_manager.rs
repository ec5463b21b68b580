use grenml_core::{
    GrenmlError, GrenmlManager, GrenmlObject, Institution, Link, ManagerConfig, Node,
    PropertyUpdate, Query, Result,
};

fn populated() -> Result<GrenmlManager> {
    let mut manager = GrenmlManager::new("Test Topology");
    manager.add_institution(Institution::builder("Primary").id("P").build()?, true)?;
    manager.add_institutions([
        Institution::builder("Univ A").id("UA").institution_type("University").build()?,
        Institution::builder("Univ B").id("UB").institution_type("University").build()?,
    ])?;
    manager.add_nodes([
        Node::builder("Node 1").id("N1").owner("UA").latitude(45.0).longitude(-75.0).build()?,
        Node::builder("Node 2").id("N2").owner("UB").build()?,
    ])?;
    manager.add_link(Link::builder("N1-N2").id("L1").nodes(["N1", "N2"]).build()?)?;
    Ok(manager)
}

#[test]
fn test_insert_then_read_returns_every_id() -> Result<()> {
    let mut manager = GrenmlManager::new("T");
    let ids: Vec<String> = (0..5).map(|i| format!("I{}", i)).collect();
    for id in &ids {
        manager.add_institution(Institution::builder(id.as_str()).id(id).build()?, false)?;
    }
    let read: Vec<&str> = manager
        .get_institutions(&Query::new())
        .into_iter()
        .map(|i| i.id())
        .collect();
    assert_eq!(read, ids.iter().map(String::as_str).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_duplicate_insert_fails() -> Result<()> {
    let mut manager = populated()?;
    let err = manager
        .add_node(Node::builder("Other").id("N1").build()?)
        .unwrap_err();
    assert!(matches!(err, GrenmlError::AttributeId { .. }));
    assert_eq!(manager.get_nodes(&Query::new()).len(), 2);
    Ok(())
}

#[test]
fn test_empty_collections_are_not_errors() -> Result<()> {
    let mut manager = GrenmlManager::new("T");
    manager.add_institution(Institution::new("Owner"), true)?;
    assert!(manager.get_nodes(&Query::new()).is_empty());
    assert!(manager.get_links(&Query::new()).is_empty());
    assert!(manager.validate(true)?.is_empty());
    Ok(())
}

#[test]
fn test_queries_through_the_manager() -> Result<()> {
    let manager = populated()?;
    let universities = manager.get_institutions(&Query::new().eq("type", "University"));
    assert_eq!(universities.len(), 2);

    let owned_by_a = manager.get_nodes(&Query::new().filter("owners__contains", "UA"));
    assert_eq!(owned_by_a.len(), 1);
    assert_eq!(owned_by_a[0].id(), "N1");

    let link = manager.get_link(&Query::new().contains("nodes", vec!["N1", "N2"]))?;
    assert_eq!(link.id(), "L1");

    let located = manager.get_node(&Query::new().eq("latitude", 45).eq("longitude", -75))?;
    assert_eq!(located.id(), "N1");

    let err = manager.get_node(&Query::new().eq("name", "Node 3")).unwrap_err();
    assert_eq!(err, GrenmlError::NodeNotFound("name=Node 3".into()));
    Ok(())
}

#[test]
fn test_primary_owner_joins_owners() -> Result<()> {
    let manager = populated()?;
    for node in manager.get_nodes(&Query::new()) {
        assert!(node.owners.contains("P"));
    }
    assert!(manager.get_link(&Query::by_id("L1"))?.owners.contains("P"));
    Ok(())
}

#[test]
fn test_delete_by_predicate() -> Result<()> {
    let mut manager = populated()?;
    let removed = manager.delete_institutions(&Query::new().filter("id__in", vec!["UA", "UB"]));
    assert_eq!(removed.len(), 2);
    assert!(manager
        .get_institution(&Query::by_id("UA"))
        .unwrap_err()
        .is_not_found());
    assert_eq!(manager.get_institutions(&Query::new()).len(), 1);

    let errors = manager.validate(false)?;
    assert_eq!(errors.len(), 2, "{:?}", errors);
    assert!(errors.iter().all(|e| e.contains("does not exist in parent Topology")));

    assert!(manager.delete_links(&Query::by_id("missing")).is_empty());
    Ok(())
}

#[test]
fn test_owner_management() -> Result<()> {
    let mut manager = populated()?;
    manager.add_owner_to_link("L1", "UA")?;
    manager.remove_owner_from_link("L1", "P")?;
    let link = manager.get_link(&Query::by_id("L1"))?;
    assert!(link.owners.contains("UA"));
    assert!(!link.owners.contains("P"));

    let err = manager.remove_owner_from_link("L1", "P").unwrap_err();
    assert!(err.is_key_error());

    manager.add_owner_to_node("N2", "UNKNOWN")?;
    assert!(!manager.validate(false)?.is_empty());
    Ok(())
}

#[test]
fn test_property_updates() -> Result<()> {
    let mut manager = populated()?;
    let query = Query::by_id("N1");
    manager.update_property::<Node>(&query, "Tag", &PropertyUpdate::append("core"))?;
    manager.update_property::<Node>(&query, "tag", &PropertyUpdate::append("edge"))?;
    assert_eq!(
        manager.get_node(&query)?.properties().get("TAG"),
        Some(&["core".to_string(), "edge".to_string()][..])
    );

    manager.update_property::<Node>(&query, "tag", &PropertyUpdate::remove_value("core"))?;
    let err = manager
        .update_property::<Node>(&query, "tag", &PropertyUpdate::remove_value("core"))
        .unwrap_err();
    assert!(err.is_value_error());

    let err = manager
        .update_property::<Node>(&query, "tag", &PropertyUpdate::new(Some("x".into()), true, true))
        .unwrap_err();
    assert!(err.is_value_error());

    let err = manager
        .update_property::<Institution>(&Query::by_id("P"), "id", &PropertyUpdate::remove())
        .unwrap_err();
    assert!(err.is_key_error());

    manager.update_property::<Institution>(
        &Query::by_id("UA"),
        "address",
        &PropertyUpdate::append("1 Campus Dr"),
    )?;
    assert_eq!(manager.get_institution(&Query::by_id("UA"))?.address(), Some("1 Campus Dr"));
    Ok(())
}

#[test]
fn test_appending_a_type_replaces_the_placeholder() -> Result<()> {
    let mut manager = populated()?;
    let query = Query::by_id("P");
    manager.update_property::<Institution>(&query, "type", &PropertyUpdate::append("NREN"))?;
    let primary = manager.get_institution(&query)?;
    assert_eq!(primary.institution_type(), "NREN");
    assert!(!primary.types().contains("unknown"));
    assert_eq!(manager.get_institutions(&Query::new().eq("type", "NREN")).len(), 1);
    Ok(())
}

#[test]
fn test_failed_bulk_update_changes_nothing() -> Result<()> {
    let mut manager = populated()?;
    manager.update_property::<Node>(&Query::by_id("N1"), "tag", &PropertyUpdate::append("x"))?;

    let everything = Query::new();
    let err = manager
        .update_property::<Node>(&everything, "tag", &PropertyUpdate::remove_value("x"))
        .unwrap_err();
    assert!(err.is_value_error());
    assert_eq!(
        manager.get_node(&Query::by_id("N1"))?.properties().get("tag"),
        Some(&["x".to_string()][..])
    );
    Ok(())
}

#[test]
fn test_mutable_lookup() -> Result<()> {
    let mut manager = populated()?;
    manager
        .get_institution_mut(&Query::by_id("UA"))?
        .add_address("1 Campus Dr");
    let found = manager.get_institution(&Query::new().contains("address", "1 Campus Dr"))?;
    assert_eq!(found.id(), "UA");
    Ok(())
}

#[test]
fn test_configured_builders() -> Result<()> {
    let config = ManagerConfig::default().with_id_generation(grenml_core::IdGeneration::Random);
    let manager = GrenmlManager::with_config("T", config)?;
    let a = manager.node("N").build()?;
    let b = manager.node("N").build()?;
    assert_ne!(a, b);
    Ok(())
}
