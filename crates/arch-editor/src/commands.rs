//! Edits a user triggers on the diagram
//!
//! Every command validates its input before the first mutation, then runs in
//! one update scope and leaves the registry and the diagram in agreement:
//! each registered class has a vertex, each property a row inside it,
//! inheritance and link references have their edges, and subclasses carry
//! copies of their superclass's properties.

use std::collections::HashSet;

use arch_graph::{CellId, GraphHost};
use arch_schema::{
    Error as SchemaError, InheritanceGraph, OClass, OProperty, SchemaRegistry, ancestors,
    validate_name,
};
use tracing::{debug, info};

use crate::context::{EditSession, EditorContext};
use crate::deletion;
use crate::edges::reconcile_in;
use crate::factory::{create_class_vertex, create_property_vertex};
use crate::ordering::{next_order, shift_after};
use crate::payload::CellValue;
use crate::{Error, Result};

/// Place a class on the diagram at `(x, y)`, with a row per property.
///
/// Edges to classes already on the diagram are drawn in both directions:
/// superclass, subclasses, linked classes and properties linking here.
pub fn add_class<H>(ctx: &mut EditorContext<H>, class: OClass, x: f64, y: f64) -> Result<CellId>
where
    H: GraphHost<Value = CellValue>,
{
    check_new_class(ctx.registry(), &class)?;
    let mut session = ctx.edit();
    insert_class(&mut session, class, x, y)
}

/// Append a property to a class, after every order-valid property
pub fn add_property<H>(ctx: &mut EditorContext<H>, class: &str, property: OProperty) -> Result<CellId>
where
    H: GraphHost<Value = CellValue>,
{
    let registry = ctx.registry();
    let owner = registry
        .class(class)
        .ok_or_else(|| Error::class_not_found(class))?;
    validate_name(&property.name)?;
    check_property_name_free(registry, owner, &property.name)?;
    let class_cell = owner
        .cell
        .ok_or_else(|| Error::NotOnDiagram(owner.name.clone()))?;

    let owner_name = owner.name.clone();
    let mut property = OProperty {
        owner_class: owner_name.clone(),
        order: next_order(registry, &owner.properties),
        subclass_property: false,
        cell: None,
        ..property
    };

    let mut session = ctx.edit();
    let cell = session
        .host
        .add_cell(create_property_vertex(session.config, &property), class_cell)?;
    property.cell = Some(cell);
    let name = property.name.clone();
    if let Some(owner) = session.registry.class_mut(&owner_name) {
        owner.properties_for_delete.retain(|p| p.name != name);
        owner.properties.push(property);
    }

    wire_class(&mut session, &owner_name)?;
    sync_inherited_properties(&mut session, &owner_name)?;
    info!(class = %owner_name, property = %name, %cell, "Added property");
    Ok(cell)
}

/// Point a class at a new superclass, or detach it with `None`.
///
/// The edge drawn for an edited superclass is always marked unsaved.
pub fn set_super_class<H>(ctx: &mut EditorContext<H>, class: &str, super_class: Option<&str>) -> Result<()>
where
    H: GraphHost<Value = CellValue>,
{
    let registry = ctx.registry();
    let current = registry
        .class(class)
        .ok_or_else(|| Error::class_not_found(class))?;
    let unchanged = match (current.super_class.as_deref(), super_class) {
        (Some(old), Some(new)) => old.eq_ignore_ascii_case(new),
        (None, None) => true,
        _ => false,
    };
    if unchanged {
        return Ok(());
    }

    if let Some(parent) = super_class {
        validate_name(parent)?;
        if InheritanceGraph::from_registry(registry).would_create_cycle(&current.name, parent) {
            return Err(SchemaError::Inheritance(format!(
                "'{}' cannot extend '{parent}': the hierarchy would become cyclic",
                current.name
            ))
            .into());
        }
        let inherited = registry.effective_property_names(parent);
        if let Some(clash) = current
            .properties
            .iter()
            .find(|p| !p.subclass_property && inherited.contains(&p.name))
        {
            return Err(SchemaError::duplicate_property(&current.name, &clash.name).into());
        }
    }

    let name = current.name.clone();
    let cell = current.cell;
    let old_parent_cell = current
        .super_class
        .as_deref()
        .and_then(|s| registry.class(s))
        .and_then(|c| c.cell);
    let new_parent = super_class.map(|s| registry.class(s).map_or_else(|| s.to_string(), |c| c.name.clone()));
    let new_parent_cell = super_class.and_then(|s| registry.class(s)).and_then(|c| c.cell);

    let parent_registered = super_class.is_some_and(|s| registry.contains(s));

    let mut session = ctx.edit();
    if let Some(class) = session.registry.class_mut(&name) {
        class.super_class.clone_from(&new_parent);
    }
    if new_parent.is_some() && !parent_registered {
        drop_inherited_copies(&mut session, &name)?;
    }
    if let (Some(cell), Some(old)) = (cell, old_parent_cell) {
        reconcile_in(&mut *session.host, cell, old, false, false, CellValue::Relation)?;
    }
    if let (Some(cell), Some(new)) = (cell, new_parent_cell) {
        reconcile_in(&mut *session.host, cell, new, true, true, CellValue::UnsavedInheritance)?;
    }
    sync_inherited_properties(&mut session, &name)?;
    info!(class = %name, super_class = ?new_parent, "Changed superclass");
    Ok(())
}

/// Point a property at a linked class, or unlink it with `None`.
///
/// Any inverse pairing is dropped, since the partner lived on the old class.
pub fn set_linked_class<H>(
    ctx: &mut EditorContext<H>,
    class: &str,
    property: &str,
    linked: Option<&str>,
) -> Result<()>
where
    H: GraphHost<Value = CellValue>,
{
    let registry = ctx.registry();
    let current = registry
        .property(class, property)
        .ok_or_else(|| SchemaError::property_not_found(class, property))?;
    if current.subclass_property {
        return Err(Error::invalid_link(
            class,
            property,
            "an inherited property follows its superclass",
        ));
    }
    if let Some(linked) = linked {
        validate_name(linked)?;
    }
    let unchanged = match (current.linked_class.as_deref(), linked) {
        (Some(old), Some(new)) => old.eq_ignore_ascii_case(new),
        (None, None) => true,
        _ => false,
    };
    if unchanged {
        return Ok(());
    }

    let owner = current.owner_class.clone();
    let name = current.name.clone();
    let cell = current.cell;
    let old_target = current
        .linked_class
        .as_deref()
        .and_then(|l| registry.class(l))
        .and_then(|c| c.cell);
    let new_target = linked.and_then(|l| registry.class(l)).and_then(|c| c.cell);
    let linked_name = linked.map(|l| registry.class(l).map_or_else(|| l.to_string(), |c| c.name.clone()));

    let mut session = ctx.edit();
    unpair(session.registry, &owner, &name);
    if let Some(property) = session.registry.property_mut(&owner, &name) {
        property.linked_class = linked_name;
    }
    if let (Some(cell), Some(old)) = (cell, old_target) {
        reconcile_in(&mut *session.host, cell, old, false, false, CellValue::Relation)?;
    }
    if let (Some(cell), Some(new)) = (cell, new_target) {
        reconcile_in(&mut *session.host, cell, new, true, false, CellValue::Relation)?;
    }
    sync_inherited_properties(&mut session, &owner)?;
    debug!(class = %owner, property = %name, "Changed linked class");
    Ok(())
}

/// Pair a property with a property of its linked class, or unpair it.
///
/// Pairing is symmetric. Previous partners on either side are released, but
/// only if they still point back.
pub fn set_inverse_property<H>(
    ctx: &mut EditorContext<H>,
    class: &str,
    property: &str,
    inverse: Option<&str>,
) -> Result<()>
where
    H: GraphHost<Value = CellValue>,
{
    let registry = ctx.registry();
    let current = registry
        .property(class, property)
        .ok_or_else(|| SchemaError::property_not_found(class, property))?;
    let owner = current.owner_class.clone();
    let name = current.name.clone();

    let partner = match inverse {
        None => None,
        Some(inverse) => {
            let linked = current
                .linked_class
                .as_deref()
                .ok_or_else(|| Error::invalid_link(&owner, &name, "the property has no linked class"))?;
            let partner = registry
                .property(linked, inverse)
                .ok_or_else(|| SchemaError::property_not_found(linked, inverse))?;
            if !partner
                .linked_class
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case(&owner))
            {
                return Err(Error::invalid_link(
                    &owner,
                    &name,
                    format!("'{linked}.{inverse}' does not link back to '{owner}'"),
                ));
            }
            Some((partner.owner_class.clone(), partner.name.clone()))
        }
    };

    let session = ctx.edit();
    unpair(session.registry, &owner, &name);
    if let Some((partner_owner, partner_name)) = partner {
        unpair(session.registry, &partner_owner, &partner_name);
        if let Some(property) = session.registry.property_mut(&owner, &name) {
            property.inverse_property = Some(partner_name.clone());
        }
        if let Some(partner) = session.registry.property_mut(&partner_owner, &partner_name) {
            partner.inverse_property = Some(name.clone());
        }
    }
    debug!(class = %owner, property = %name, inverse = ?inverse, "Changed inverse property");
    Ok(())
}

/// Mark a class as persisted or editor-only and restyle its cells
pub fn set_exists_in_db<H>(ctx: &mut EditorContext<H>, class: &str, exists_in_db: bool) -> Result<()>
where
    H: GraphHost<Value = CellValue>,
{
    let name = ctx
        .registry()
        .class(class)
        .map(|c| c.name.clone())
        .ok_or_else(|| Error::class_not_found(class))?;

    let mut session = ctx.edit();
    if let Some(class) = session.registry.class_mut(&name) {
        class.set_exists_in_db(exists_in_db);
    }
    session.restyle_class(&name)
}

/// Re-apply persisted-state styles to every class and property cell
pub fn refresh_all_cells<H>(ctx: &mut EditorContext<H>) -> Result<()>
where
    H: GraphHost<Value = CellValue>,
{
    let names: Vec<String> = ctx.registry().classes().map(|c| c.name.clone()).collect();
    let mut session = ctx.edit();
    for name in &names {
        session.restyle_class(name)?;
    }
    debug!(classes = names.len(), "Refreshed all cells");
    Ok(())
}

/// Remove a class vertex with its rows and edges
pub fn remove_class<H>(ctx: &mut EditorContext<H>, class: &str) -> Result<Vec<CellId>>
where
    H: GraphHost<Value = CellValue>,
{
    let owner = ctx
        .registry()
        .class(class)
        .ok_or_else(|| Error::class_not_found(class))?;
    let cell = owner
        .cell
        .ok_or_else(|| Error::NotOnDiagram(owner.name.clone()))?;
    deletion::remove_cell(ctx, cell, true)
}

/// Remove a property row with its edges
pub fn remove_property<H>(ctx: &mut EditorContext<H>, class: &str, property: &str) -> Result<Vec<CellId>>
where
    H: GraphHost<Value = CellValue>,
{
    let current = ctx
        .registry()
        .property(class, property)
        .ok_or_else(|| SchemaError::property_not_found(class, property))?;
    let cell = current
        .cell
        .ok_or_else(|| Error::NotOnDiagram(current.owner_class.clone()))?;
    deletion::remove_cell(ctx, cell, true)
}

pub(crate) fn check_new_class(registry: &SchemaRegistry, class: &OClass) -> Result<()> {
    validate_name(&class.name)?;
    if registry.contains(&class.name) {
        return Err(SchemaError::DuplicateClass(class.name.clone()).into());
    }

    let inherited = match &class.super_class {
        Some(parent) => {
            validate_name(parent)?;
            if InheritanceGraph::from_registry(registry).would_create_cycle(&class.name, parent) {
                return Err(SchemaError::Inheritance(format!(
                    "'{}' cannot extend '{parent}': the hierarchy would become cyclic",
                    class.name
                ))
                .into());
            }
            registry.effective_property_names(parent)
        }
        None => Vec::new(),
    };

    let mut seen = HashSet::new();
    for property in &class.properties {
        validate_name(&property.name)?;
        let shadows = !property.subclass_property && inherited.contains(&property.name);
        if !seen.insert(property.name.as_str()) || shadows {
            return Err(SchemaError::duplicate_property(&class.name, &property.name).into());
        }
    }
    Ok(())
}

fn check_property_name_free(registry: &SchemaRegistry, owner: &OClass, name: &str) -> Result<()> {
    if registry
        .effective_property_names(&owner.name)
        .iter()
        .any(|n| n == name)
    {
        return Err(SchemaError::duplicate_property(&owner.name, name).into());
    }
    for class in registry.classes() {
        let descends = ancestors(registry, &class.name)
            .iter()
            .any(|a| a.name.eq_ignore_ascii_case(&owner.name));
        if descends && class.properties.iter().any(|p| !p.subclass_property && p.name == name) {
            return Err(SchemaError::duplicate_property(&class.name, name).into());
        }
    }
    Ok(())
}

/// Insert a checked class with its rows, then draw its edges and copies
pub(crate) fn insert_class<H>(session: &mut EditSession<'_, H>, class: OClass, x: f64, y: f64) -> Result<CellId>
where
    H: GraphHost<Value = CellValue>,
{
    let mut class = class;
    class.reset_transient();
    let name = class.name.clone();
    let root = session.host.root();
    let cell = session
        .host
        .add_cell(create_class_vertex(session.config, &class, x, y), root)?;
    class.cell = Some(cell);
    class.exists_in_editor = true;

    for property in &mut class.properties {
        property.owner_class.clone_from(&name);
        let row = session
            .host
            .add_cell(create_property_vertex(session.config, property), cell)?;
        property.cell = Some(row);
    }
    session.registry.insert(class)?;

    wire_class(session, &name)?;
    sync_inherited_properties(session, &name)?;
    info!(class = %name, %cell, "Added class");
    Ok(cell)
}

/// Marker for an inheritance edge drawn from entity state
fn inheritance_marker(class: &OClass, parent: &OClass) -> CellValue {
    if class.exists_in_db && parent.exists_in_db {
        CellValue::Relation
    } else {
        CellValue::UnsavedInheritance
    }
}

/// Marker of an inheritance edge already joining two vertices.
///
/// Once drawn, an edge keeps its marker until the superclass is edited.
fn current_inheritance_marker<H>(host: &H, source: CellId, target: CellId) -> Option<CellValue>
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    host.edges_between(source, target)
        .into_iter()
        .find_map(|edge| host.value(edge))
        .filter(|value| matches!(value, CellValue::Relation | CellValue::UnsavedInheritance))
        .cloned()
}

/// Draw every edge a class takes part in, towards classes on the diagram
fn wire_class<H>(session: &mut EditSession<'_, H>, name: &str) -> Result<()>
where
    H: GraphHost<Value = CellValue>,
{
    let registry = &*session.registry;
    let Some(class) = registry.class(name) else {
        return Ok(());
    };
    let Some(cell) = class.cell else {
        return Ok(());
    };
    let refers_here = |target: Option<&str>| target.is_some_and(|t| t.eq_ignore_ascii_case(&class.name));

    let host = &*session.host;
    let marker = |source: CellId, target: CellId, sub: &OClass, parent: &OClass| {
        current_inheritance_marker(host, source, target).unwrap_or_else(|| inheritance_marker(sub, parent))
    };

    let mut wanted: Vec<(CellId, CellId, CellValue)> = Vec::new();
    if let Some(parent) = class.super_class.as_deref().and_then(|s| registry.class(s)) {
        if let Some(parent_cell) = parent.cell {
            wanted.push((cell, parent_cell, marker(cell, parent_cell, class, parent)));
        }
    }
    for property in class.properties.iter().filter(|p| !p.subclass_property) {
        let target = property
            .linked_class
            .as_deref()
            .and_then(|l| registry.class(l))
            .and_then(|c| c.cell);
        if let (Some(row), Some(target)) = (property.cell, target) {
            wanted.push((row, target, CellValue::Relation));
        }
    }
    for other in registry.classes().filter(|c| !c.name.eq_ignore_ascii_case(&class.name)) {
        if let Some(other_cell) = other.cell.filter(|_| refers_here(other.super_class.as_deref())) {
            wanted.push((other_cell, cell, marker(other_cell, cell, other, class)));
        }
        for property in other.properties.iter().filter(|p| !p.subclass_property) {
            if let Some(row) = property.cell.filter(|_| refers_here(property.linked_class.as_deref())) {
                wanted.push((row, cell, CellValue::Relation));
            }
        }
    }

    for (source, target, value) in wanted {
        reconcile_in(&mut *session.host, source, target, true, false, value)?;
    }
    Ok(())
}

/// Names of the classes directly extending `name`
pub(crate) fn direct_subclasses(registry: &SchemaRegistry, name: &str) -> Vec<String> {
    registry
        .classes()
        .filter(|c| c.super_class.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(name)))
        .map(|c| c.name.clone())
        .collect()
}

/// Drop the inverse pairing of a property, and the partner's if it still points back
pub(crate) fn unpair(registry: &mut SchemaRegistry, owner: &str, name: &str) {
    let Some(property) = registry.property_mut(owner, name) else {
        return;
    };
    let Some(inverse) = property.inverse_property.take() else {
        return;
    };
    let Some(linked) = property.linked_class.clone() else {
        return;
    };
    if let Some(partner) = registry.property_mut(&linked, &inverse) {
        let points_back = partner.inverse_property.as_deref() == Some(name)
            && partner
                .linked_class
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case(owner));
        if points_back {
            partner.inverse_property = None;
        }
    }
}

/// Re-derive the inherited property copies of `name` and of every class below it.
///
/// A class whose superclass is registered carries one copy of each of the
/// superclass's properties (its own and its inherited ones), and its own
/// order-valid properties are moved after them. A class without a superclass
/// carries no copies. A class whose superclass is not registered keeps the
/// copies it has, as when a document names a superclass that was never
/// placed; editing the superclass drops them first.
pub(crate) fn sync_inherited_properties<H>(session: &mut EditSession<'_, H>, name: &str) -> Result<()>
where
    H: GraphHost<Value = CellValue>,
{
    let mut pending = vec![name.to_string()];
    let mut visited = HashSet::new();
    while let Some(current) = pending.pop() {
        if !visited.insert(current.to_ascii_lowercase()) {
            continue;
        }
        sync_class_copies(session, &current)?;
        pending.extend(direct_subclasses(session.registry, &current));
    }
    Ok(())
}

/// Remove every inherited copy a class carries, with its row
fn drop_inherited_copies<H>(session: &mut EditSession<'_, H>, name: &str) -> Result<()>
where
    H: GraphHost<Value = CellValue>,
{
    let Some(class) = session.registry.class_mut(name) else {
        return Ok(());
    };
    let rows: Vec<CellId> = class
        .properties
        .iter()
        .filter(|p| p.subclass_property)
        .filter_map(|p| p.cell)
        .collect();
    class.properties.retain(|p| !p.subclass_property);

    let rows: Vec<CellId> = rows.into_iter().filter(|row| session.host.contains(*row)).collect();
    if !rows.is_empty() {
        session.host.remove_cells(&rows, true)?;
    }
    debug!(class = name, removed = rows.len(), "Dropped inherited properties");
    Ok(())
}

fn sync_class_copies<H>(session: &mut EditSession<'_, H>, name: &str) -> Result<()>
where
    H: GraphHost<Value = CellValue>,
{
    let registry = &*session.registry;
    let Some(class) = registry.class(name) else {
        return Ok(());
    };
    let desired: Vec<OProperty> = match class.super_class.as_deref() {
        None => Vec::new(),
        Some(parent) => match registry.class(parent) {
            Some(parent) => parent
                .properties
                .iter()
                .filter(|p| class.property(&p.name).is_none_or(OProperty::is_subclass_property))
                .map(|p| {
                    let mut copy = p.inherited_by(&class.name);
                    copy.exists_in_db = p.exists_in_db && class.exists_in_db;
                    copy.inverse_property = None;
                    copy
                })
                .collect(),
            None => return Ok(()),
        },
    };

    let class_cell = class.cell;
    let stale: Vec<(String, Option<CellId>)> = class
        .properties
        .iter()
        .filter(|p| p.subclass_property && !desired.iter().any(|d| d.name == p.name))
        .map(|p| (p.name.clone(), p.cell))
        .collect();
    let floor = desired.iter().map(|p| p.order).max().map(|m| m.saturating_add(1));

    let mut created = Vec::new();
    if let Some(class) = session.registry.class_mut(name) {
        for (stale_name, _) in &stale {
            class.remove_property(stale_name);
        }
        for copy in desired {
            match class.property_mut(&copy.name) {
                Some(existing) => {
                    let cell = existing.cell;
                    *existing = copy;
                    existing.cell = cell;
                }
                None => {
                    created.push(copy.name.clone());
                    class.properties.push(copy);
                }
            }
        }
    }

    let stale_cells: Vec<CellId> = stale
        .iter()
        .filter_map(|(_, cell)| *cell)
        .filter(|cell| session.host.contains(*cell))
        .collect();
    if !stale_cells.is_empty() {
        session.host.remove_cells(&stale_cells, true)?;
    }
    if let Some(class_cell) = class_cell.filter(|c| session.host.contains(*c)) {
        for property_name in &created {
            let Some(property) = session.registry.property(name, property_name) else {
                continue;
            };
            let row = create_property_vertex(session.config, property);
            let row = session.host.add_cell(row, class_cell)?;
            if let Some(property) = session.registry.property_mut(name, property_name) {
                property.cell = Some(row);
            }
        }
    }
    if let Some(floor) = floor {
        shift_after(session.registry, name, floor);
    }
    if !stale.is_empty() || !created.is_empty() {
        debug!(
            class = name,
            removed = stale.len(),
            added = created.len(),
            "Synchronized inherited properties"
        );
    }
    Ok(())
}
