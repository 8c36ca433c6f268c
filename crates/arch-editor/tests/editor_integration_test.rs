//! Integration tests for arch-editor crate
//!
//! These tests drive a diagram through the public commands and check that the
//! registry, the cells and the persisted forms stay in agreement.

use arch_editor::{
    CellValue, EditorConfig, EditorContext, EditorObject, Error, commands, deletion, edges, lookup,
    ordering, serializer,
};
use arch_graph::{CellId, Geometry, GraphCodec, GraphHost, MemoryGraph, NewCell, NoHooks};
use arch_schema::{OClass, OProperty, PropertyType, validate_registry};

type Ctx = EditorContext<MemoryGraph<CellValue>>;

/// Helper building `Person.cars -> Car`, with `Car` extending `Vehicle`
fn create_fleet() -> anyhow::Result<Ctx> {
    let mut ctx = EditorContext::in_memory(EditorConfig::default());
    commands::add_class(&mut ctx, OClass::new("Vehicle"), 0.0, 0.0)?;
    commands::add_property(&mut ctx, "Vehicle", OProperty::new("wheels", "", PropertyType::Integer))?;
    commands::add_property(&mut ctx, "Vehicle", OProperty::new("color", "", PropertyType::String))?;

    let mut car = OClass::new("Car").with_super_class("Vehicle");
    car.push_property(OProperty::new("plate", "Car", PropertyType::String));
    commands::add_class(&mut ctx, car, 200.0, 0.0)?;

    commands::add_class(&mut ctx, OClass::new("Person"), 400.0, 0.0)?;
    commands::add_property(&mut ctx, "Person", OProperty::new("cars", "", PropertyType::LinkList))?;
    commands::set_linked_class(&mut ctx, "Person", "cars", Some("Car"))?;
    Ok(ctx)
}

fn class_cell(ctx: &Ctx, name: &str) -> CellId {
    ctx.registry().class(name).unwrap().cell.unwrap()
}

#[test]
fn test_fleet_is_consistent() -> anyhow::Result<()> {
    let ctx = create_fleet()?;
    assert!(validate_registry(ctx.registry()).is_valid());
    assert_eq!(lookup::all_class_names(ctx.host()), vec!["Vehicle", "Car", "Person"]);

    let car = ctx.registry().class("Car").unwrap();
    let names: Vec<&str> = car.sorted_properties().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["wheels", "color", "plate"]);
    for property in &car.properties {
        let cell = property.cell.unwrap();
        assert_eq!(ctx.host().parent(cell), car.cell);
        assert_eq!(ctx.property_of(cell), Some(property));
    }
    assert_eq!(ordering::min_order_among_valid(ctx.registry(), &car.properties), 2);
    Ok(())
}

#[test]
fn test_export_is_topological() -> anyhow::Result<()> {
    let mut ctx = EditorContext::in_memory(EditorConfig::default());
    commands::add_class(&mut ctx, OClass::new("SportsCar").with_super_class("Car"), 0.0, 0.0)?;
    commands::add_class(&mut ctx, OClass::new("Car"), 200.0, 0.0)?;
    commands::add_class(&mut ctx, OClass::new("Boat"), 400.0, 0.0)?;

    let exported = serializer::export_schema_json(&ctx)?;
    let names: Vec<String> = arch_schema::parse_class_array(&exported)?
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Car", "Boat", "SportsCar"]);
    Ok(())
}

#[test]
fn test_edges_follow_entity_state() -> anyhow::Result<()> {
    let mut ctx = EditorContext::in_memory(EditorConfig::default());
    commands::add_class(&mut ctx, OClass::new("Vehicle").persisted(), 0.0, 0.0)?;
    commands::add_class(&mut ctx, OClass::new("Car").with_super_class("Vehicle").persisted(), 200.0, 0.0)?;
    commands::add_class(&mut ctx, OClass::new("Boat").with_super_class("Vehicle"), 400.0, 0.0)?;

    let host = ctx.host();
    let car_edge = host.edges_between(class_cell(&ctx, "Car"), class_cell(&ctx, "Vehicle"));
    let boat_edge = host.edges_between(class_cell(&ctx, "Boat"), class_cell(&ctx, "Vehicle"));
    assert_eq!(host.value(car_edge[0]), Some(&CellValue::Relation));
    assert_eq!(host.value(boat_edge[0]), Some(&CellValue::UnsavedInheritance));

    assert!(!deletion::is_deletable(&ctx, car_edge[0]));
    assert!(deletion::is_deletable(&ctx, boat_edge[0]));
    Ok(())
}

#[test]
fn test_reconcile_twice_equals_once() -> anyhow::Result<()> {
    let mut ctx = create_fleet()?;
    let (car, person) = (class_cell(&ctx, "Car"), class_cell(&ctx, "Person"));

    let once = edges::reconcile(&mut ctx, person, car, true, false, CellValue::Relation)?;
    let twice = edges::reconcile(&mut ctx, person, car, true, false, CellValue::Relation)?;
    assert_eq!(once, twice);
    assert_eq!(ctx.host().edges_between(person, car).len(), 1);
    Ok(())
}

#[test]
fn test_protected_link_survives_plain_delete() -> anyhow::Result<()> {
    let mut ctx = create_fleet()?;
    let cars = ctx.registry().property("Person", "cars").unwrap().cell.unwrap();
    let link = ctx.host().edges_between(cars, class_cell(&ctx, "Car"))[0];
    commands::set_exists_in_db(&mut ctx, "Person", true)?;
    {
        // mark the link persisted the way a database sync would
        let session = ctx.edit();
        session.registry.property_mut("Person", "cars").unwrap().set_exists_in_db(true);
    }

    assert!(deletion::delete_cells(&mut ctx, &[link], false)?.is_empty());
    assert!(ctx.host().contains(link));
    assert_eq!(
        ctx.registry().property("Person", "cars").unwrap().linked_class.as_deref(),
        Some("Car")
    );

    assert_eq!(deletion::delete_cells(&mut ctx, &[link], true)?, vec![link]);
    assert!(ctx.registry().property("Person", "cars").unwrap().linked_class.is_none());
    Ok(())
}

#[test]
fn test_mixed_delete_keeps_only_protected_link() -> anyhow::Result<()> {
    let mut ctx = create_fleet()?;
    commands::set_exists_in_db(&mut ctx, "Person", true)?;
    {
        let session = ctx.edit();
        session.registry.property_mut("Person", "cars").unwrap().set_exists_in_db(true);
    }
    commands::add_class(&mut ctx, OClass::new("Boat").with_super_class("Vehicle"), 600.0, 0.0)?;
    let dock = commands::add_class(&mut ctx, OClass::new("Dock"), 800.0, 0.0)?;

    let cars = ctx.registry().property("Person", "cars").unwrap().cell.unwrap();
    let link = ctx.host().edges_between(cars, class_cell(&ctx, "Car"))[0];
    let boat_edge = ctx.host().edges_between(class_cell(&ctx, "Boat"), class_cell(&ctx, "Vehicle"))[0];
    assert!(!deletion::is_deletable(&ctx, link));
    assert!(deletion::is_deletable(&ctx, boat_edge));

    let removed = deletion::delete_cells(&mut ctx, &[link, boat_edge, dock], false)?;
    assert_eq!(removed, vec![boat_edge, dock]);
    assert!(ctx.host().contains(link));
    assert!(!ctx.registry().contains("Dock"));
    assert!(ctx.registry().class("Boat").unwrap().super_class.is_none());
    assert_eq!(
        ctx.registry().property("Person", "cars").unwrap().linked_class.as_deref(),
        Some("Car")
    );
    Ok(())
}

#[test]
fn test_failed_removal_closes_scope() -> anyhow::Result<()> {
    let mut ctx = create_fleet()?;
    let before = ctx.host().completed_updates();

    let err = deletion::remove_cell(&mut ctx, CellId(4242), true).unwrap_err();
    assert!(matches!(err, Error::Graph(_)));
    assert_eq!(ctx.host().update_level(), 0);
    assert_eq!(ctx.host().completed_updates(), before + 1);
    assert!(ctx.registry().contains("Car"));
    Ok(())
}

#[test]
fn test_deleting_superclass_cascades() -> anyhow::Result<()> {
    let mut ctx = create_fleet()?;
    let vehicle = class_cell(&ctx, "Vehicle");
    deletion::delete_cells(&mut ctx, &[vehicle], false)?;

    let car = ctx.registry().class("Car").unwrap();
    assert!(car.super_class.is_none());
    let names: Vec<&str> = car.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["plate"]);
    assert_eq!(lookup::class_property_cells(ctx.host(), car.cell.unwrap()).len(), 1);
    assert!(validate_registry(ctx.registry()).is_valid());
    Ok(())
}

#[test]
fn test_document_round_trip() -> anyhow::Result<()> {
    let ctx = create_fleet()?;
    let text = serializer::save_document(&ctx)?.to_json_string()?;
    assert!(!text.contains("existsInEditor"));

    let document = arch_graph::GraphDocument::from_json_str(&text)?;
    let loaded = serializer::load_document(EditorConfig::default(), &document)?;

    assert_eq!(serializer::export_schema_json(&loaded)?, serializer::export_schema_json(&ctx)?);
    for class in ctx.registry().classes() {
        let restored = loaded.registry().class(&class.name).unwrap();
        assert_eq!(restored.cell, class.cell);
        for property in &class.properties {
            assert_eq!(restored.property(&property.name).unwrap().cell, property.cell);
        }
    }
    let cars = loaded.registry().property("Person", "cars").unwrap().cell.unwrap();
    assert_eq!(loaded.host().edges_between(cars, class_cell(&loaded, "Car")).len(), 1);

    let json = ctx.registry().class("Car").unwrap().to_json().to_json_string()?;
    let found = serializer::find_or_create_class_from_json(&loaded, &json)?.unwrap();
    assert!(found.is_existing());
    assert_eq!(found.class().name, "Car");
    Ok(())
}

#[test]
fn test_exported_classes_rebuild_in_fresh_editor() -> anyhow::Result<()> {
    let mut source = EditorContext::in_memory(EditorConfig::default());
    commands::add_class(&mut source, OClass::new("Vehicle").persisted(), 0.0, 0.0)?;
    commands::add_class(&mut source, OClass::new("Car").with_super_class("Vehicle"), 200.0, 0.0)?;
    let exported = arch_schema::parse_class_array(&serializer::export_schema_json(&source)?)?;
    assert_eq!(exported.len(), 2);

    let fresh: Ctx = EditorContext::in_memory(EditorConfig::default());
    for entry in &exported {
        let rebuilt = serializer::find_or_create_class_from_json(&fresh, &entry.to_json_string()?)?.unwrap();
        assert!(!rebuilt.is_existing());
        let original = source.registry().class(&entry.name).unwrap();
        let rebuilt = rebuilt.into_owned();
        assert_eq!(rebuilt.name, original.name);
        assert_eq!(rebuilt.exists_in_db, original.exists_in_db);
        assert_eq!(rebuilt.super_class, original.super_class);
        assert!(rebuilt.cell.is_none());
    }
    assert!(fresh.registry().is_empty());
    Ok(())
}

/// Document as written before payloads were versioned
fn legacy_document(version: u32) -> anyhow::Result<arch_graph::GraphDocument> {
    let mut graph: MemoryGraph<CellValue> = MemoryGraph::new();
    let embedded = |json: &str| {
        CellValue::EditorObject(EditorObject {
            json: json.to_string(),
            version,
        })
    };
    graph.add_cell(
        NewCell::new(embedded(r#"{"name":"Vehicle","existsInDb":true}"#), Geometry::new(0.0, 0.0, 160.0, 50.0)),
        CellId::ROOT,
    )?;
    let car = graph.add_cell(
        NewCell::new(
            embedded(
                r#"{"name":"Car","superClasses":["Vehicle"],"properties":[{"name":"plate","ownerClass":"Car","type":"STRING"}]}"#,
            ),
            Geometry::new(200.0, 0.0, 160.0, 50.0),
        ),
        CellId::ROOT,
    )?;
    graph.add_cell(
        NewCell::new(
            embedded(r#"{"name":"plate","ownerClass":"Car","type":"STRING"}"#),
            Geometry::new(0.0, 0.0, 0.0, 20.0),
        ),
        car,
    )?;
    Ok(GraphCodec::encode(&graph, &NoHooks)?)
}

#[test]
fn test_legacy_document_is_migrated() -> anyhow::Result<()> {
    let loaded = serializer::load_document(EditorConfig::default(), &legacy_document(0)?)?;

    let car = loaded.registry().class("Car").unwrap();
    assert_eq!(car.super_class.as_deref(), Some("Vehicle"));
    let plate = car.property("plate").unwrap().cell.unwrap();
    assert_eq!(loaded.host().value(plate), Some(&CellValue::property("Car", "plate")));
    assert_eq!(loaded.host().style(class_cell(&loaded, "Vehicle")), Some("OCLASS_EXISTS"));
    assert_eq!(loaded.host().style(plate), Some("OPROPERTY"));
    Ok(())
}

#[test]
fn test_legacy_and_future_payloads_can_be_refused() -> anyhow::Result<()> {
    let strict = EditorConfig::default().reject_legacy_payloads();
    let err = serializer::load_document(strict, &legacy_document(0)?).unwrap_err();
    assert!(matches!(
        err,
        Error::Schema(arch_schema::Error::UnsupportedVersion { found: 0, .. })
    ));

    let err = serializer::load_document(EditorConfig::default(), &legacy_document(2)?).unwrap_err();
    assert!(matches!(
        err,
        Error::Schema(arch_schema::Error::UnsupportedVersion { found: 2, .. })
    ));
    Ok(())
}

#[test]
fn test_import_into_empty_editor() -> anyhow::Result<()> {
    let source = create_fleet()?;
    let json = serializer::export_schema_json(&source)?;

    let mut ctx = EditorContext::in_memory(EditorConfig::default());
    let added = serializer::import_schema_json(&mut ctx, &json)?;
    assert_eq!(added, vec!["Vehicle", "Person", "Car"]);
    assert_eq!(ctx.host().completed_updates(), 1);

    assert_eq!(serializer::export_schema_json(&ctx)?, json);
    let cars = ctx.registry().property("Person", "cars").unwrap().cell.unwrap();
    assert_eq!(ctx.host().edges_between(cars, class_cell(&ctx, "Car")).len(), 1);
    assert!(validate_registry(ctx.registry()).is_valid());

    let err = serializer::import_schema_json(&mut ctx, r#"[{"name":"Bad Name"}]"#).unwrap_err();
    assert!(matches!(err, Error::Schema(arch_schema::Error::InvalidName { .. })));
    assert_eq!(ctx.registry().len(), 3);
    Ok(())
}
