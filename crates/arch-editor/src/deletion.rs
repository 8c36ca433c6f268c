//! Deciding what a user may delete, and deleting it
//!
//! Removing cells from the host and removing entities from the registry
//! happen in the same update scope. Edges are turned back into the entity
//! references they stood for: an edge between two class vertices clears the
//! subclass's superclass, an edge leaving a property row clears that
//! property's link. A removed persisted property is remembered on its class
//! so it can be dropped from the database.

use std::collections::HashMap;

use arch_graph::{Cell, CellId, GraphHost, for_each};
use arch_schema::SchemaRegistry;
use tracing::{debug, info};

use crate::commands::{direct_subclasses, sync_inherited_properties, unpair};
use crate::context::{EditSession, EditorContext};
use crate::payload::CellValue;
use crate::Result;

/// Whether the user may delete `cell`.
///
/// Vertices are always deletable. An inheritance edge is protected only
/// while both classes exist in the database and the edge is not marked
/// unsaved. A link edge is protected while its property is persisted with
/// a linked class.
pub fn is_deletable<H>(ctx: &EditorContext<H>, cell: CellId) -> bool
where
    H: GraphHost<Value = CellValue>,
{
    let host = ctx.host();
    if cell == host.root() || !host.contains(cell) {
        return false;
    }
    let Some((source, target)) = host.terminals(cell) else {
        return true;
    };

    match host.value(source) {
        Some(CellValue::Class { .. }) => {
            if host.value(cell) == Some(&CellValue::UnsavedInheritance) {
                return true;
            }
            let persisted = |id| ctx.class_of(id).is_some_and(|c| c.exists_in_db);
            !(persisted(source) && persisted(target))
        }
        Some(CellValue::Property { .. }) => ctx.property_of(source).is_none_or(|p| p.can_disconnect()),
        _ => true,
    }
}

/// The subset of `cells` a deletion request may remove.
///
/// Unknown cells and the root are dropped. Link edges whose property cannot
/// be disconnected are kept unless `force` is set.
pub fn cells_for_removal<H>(ctx: &EditorContext<H>, cells: &[CellId], force: bool) -> Vec<CellId>
where
    H: GraphHost<Value = CellValue>,
{
    let host = ctx.host();
    let mut keep: Vec<CellId> = Vec::with_capacity(cells.len());
    for_each(cells.iter().copied(), |cell, _| {
        if cell == host.root() || !host.contains(cell) {
            debug!(%cell, "Skipping cell that cannot be removed");
            return;
        }
        if !force {
            let protected_link = host
                .terminals(cell)
                .and_then(|(source, _)| ctx.property_of(source))
                .is_some_and(|p| !p.can_disconnect());
            if protected_link {
                debug!(%cell, "Keeping edge of a persisted link");
                return;
            }
        }
        if !keep.contains(&cell) {
            keep.push(cell);
        }
    });
    keep
}

/// Delete the removable subset of `cells`, with their children and edges,
/// and update the registry to match. Returns the cells removed.
pub fn delete_cells<H>(ctx: &mut EditorContext<H>, cells: &[CellId], force: bool) -> Result<Vec<CellId>>
where
    H: GraphHost<Value = CellValue>,
{
    let keep = cells_for_removal(ctx, cells, force);
    if keep.is_empty() {
        return Ok(Vec::new());
    }
    let removed = remove_in_session(ctx, &keep, true)?;
    info!(requested = cells.len(), removed = removed.len(), "Deleted cells");
    Ok(removed)
}

/// Remove one cell without any filtering.
///
/// An unknown cell is an error; the host is left untouched.
pub fn remove_cell<H>(ctx: &mut EditorContext<H>, cell: CellId, include_edges: bool) -> Result<Vec<CellId>>
where
    H: GraphHost<Value = CellValue>,
{
    remove_in_session(ctx, &[cell], include_edges)
}

fn remove_in_session<H>(ctx: &mut EditorContext<H>, cells: &[CellId], include_edges: bool) -> Result<Vec<CellId>>
where
    H: GraphHost<Value = CellValue>,
{
    let mut session = ctx.edit();
    let removed = session.host.remove_cells(cells, include_edges)?;
    apply_removal(&mut session, &removed)?;
    Ok(removed.iter().map(|cell| cell.id).collect())
}

/// Entity update implied by one removed cell
#[derive(Debug)]
enum Unlink {
    Inheritance { source: String, target: String },
    Link { owner: String, property: String },
    Property { owner: String, name: String },
    Class(String),
}

fn apply_removal<H>(session: &mut EditSession<'_, H>, removed: &[Cell<CellValue>]) -> Result<()>
where
    H: GraphHost<Value = CellValue>,
{
    let values: HashMap<CellId, &CellValue> = removed.iter().map(|cell| (cell.id, &cell.value)).collect();
    let value_of = |id: CellId| values.get(&id).copied().or_else(|| session.host.value(id));

    let mut edges = Vec::new();
    let mut properties = Vec::new();
    let mut classes = Vec::new();
    for cell in removed {
        if let Some((source, target)) = cell.terminals() {
            match (value_of(source), value_of(target)) {
                (Some(CellValue::Class { name: source }), Some(CellValue::Class { name: target })) => {
                    edges.push(Unlink::Inheritance {
                        source: source.clone(),
                        target: target.clone(),
                    });
                }
                (Some(CellValue::Property { owner, name }), _) => edges.push(Unlink::Link {
                    owner: owner.clone(),
                    property: name.clone(),
                }),
                _ => {}
            }
            continue;
        }
        match &cell.value {
            CellValue::Property { owner, name } => properties.push(Unlink::Property {
                owner: owner.clone(),
                name: name.clone(),
            }),
            CellValue::Class { name } => classes.push(Unlink::Class(name.clone())),
            _ => {}
        }
    }

    let registry = &mut *session.registry;
    let mut resync: Vec<String> = Vec::new();
    for unlink in edges.into_iter().chain(properties).chain(classes) {
        debug!(?unlink, "Updating registry for removed cell");
        match unlink {
            Unlink::Inheritance { source, target } => {
                // a reused edge may point from the superclass to the subclass
                let subclass = if extends(registry, &source, &target) {
                    source
                } else if extends(registry, &target, &source) {
                    target
                } else {
                    continue;
                };
                if let Some(sub) = registry.class_mut(&subclass) {
                    sub.super_class = None;
                }
                resync.push(subclass);
            }
            Unlink::Link { owner, property } => {
                unpair(registry, &owner, &property);
                if let Some(link) = registry.property_mut(&owner, &property) {
                    link.linked_class = None;
                    resync.extend(direct_subclasses(registry, &owner));
                }
            }
            Unlink::Property { owner, name } => {
                let Some(mut property) = registry.remove_property(&owner, &name) else {
                    continue;
                };
                if property.subclass_property {
                    // inherited copies are re-derived by the resync
                    resync.push(owner);
                    continue;
                }
                if property.exists_in_db {
                    property.cell = None;
                    if let Some(class) = registry.class_mut(&owner) {
                        class.properties_for_delete.push(property);
                    }
                }
                resync.extend(direct_subclasses(registry, &owner));
            }
            Unlink::Class(name) => {
                let subclasses = direct_subclasses(registry, &name);
                if registry.remove_class(&name).is_some() {
                    resync.extend(subclasses);
                }
            }
        }
    }

    for class in resync {
        if session.registry.contains(&class) {
            sync_inherited_properties(session, &class)?;
        }
    }
    Ok(())
}

fn extends(registry: &SchemaRegistry, class: &str, parent: &str) -> bool {
    registry
        .class(class)
        .and_then(|c| c.super_class.as_deref())
        .is_some_and(|s| s.eq_ignore_ascii_case(parent))
}
