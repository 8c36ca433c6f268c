//! Finding cells by class and property name

use arch_graph::{CellId, GraphHost, for_each};

use crate::hierarchy::owner_class_cell;
use crate::payload::CellValue;

/// Class vertices directly below the root, in diagram order
pub fn class_cells<H>(host: &H) -> Vec<CellId>
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    host.child_vertices(host.root())
        .into_iter()
        .filter(|cell| host.value(*cell).is_some_and(CellValue::is_class))
        .collect()
}

/// Names of every class on the diagram
pub fn all_class_names<H>(host: &H) -> Vec<String>
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    class_cells(host)
        .into_iter()
        .filter_map(|cell| host.value(cell)?.class_name().map(str::to_string))
        .collect()
}

/// Vertex of the class named exactly `name`
pub fn cell_by_class_name<H>(host: &H, name: &str) -> Option<CellId>
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    let mut result = None;
    for_each(class_cells(host), |cell, trigger| {
        if host.value(cell).and_then(CellValue::class_name) == Some(name) {
            result = Some(cell);
            trigger.stop = true;
        }
    });
    result
}

/// Whether a class named `name`, ignoring ASCII case, is on the diagram
pub fn exists_class_in_graph<H>(host: &H, name: &str) -> bool
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    let mut exists = false;
    for_each(class_cells(host), |cell, trigger| {
        if host
            .value(cell)
            .and_then(CellValue::class_name)
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
        {
            exists = true;
            trigger.stop = true;
        }
    });
    exists
}

/// Property rows of a class vertex
pub fn class_property_cells<H>(host: &H, class_cell: CellId) -> Vec<CellId>
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    host.child_vertices(class_cell)
        .into_iter()
        .filter(|cell| host.value(*cell).is_some_and(CellValue::is_property))
        .collect()
}

/// Row of the property `name` inside a class vertex
pub fn property_cell_by_name<H>(host: &H, class_cell: CellId, name: &str) -> Option<CellId>
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    let mut result = None;
    for_each(class_property_cells(host, class_cell), |cell, trigger| {
        if host
            .value(cell)
            .and_then(CellValue::property_key)
            .is_some_and(|(_, n)| n == name)
        {
            result = Some(cell);
            trigger.stop = true;
        }
    });
    result
}

/// Top-level edges carrying `value`
pub fn edges_with_value<H>(host: &H, value: &CellValue) -> Vec<CellId>
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    host.child_edges(host.root())
        .into_iter()
        .filter(|edge| host.value(*edge) == Some(value))
        .collect()
}

/// Whether a link edge may end at `cell`: a class vertex, or a row inside one
pub fn is_valid_property_target<H>(host: &H, cell: CellId) -> bool
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    match host.value(cell) {
        Some(CellValue::Class { .. }) => true,
        Some(CellValue::Property { .. }) => owner_class_cell(host, cell).is_some(),
        _ => false,
    }
}
