//! Owner lookup through the containment tree

use std::collections::HashSet;

use arch_graph::{CellId, GraphHost};
use tracing::warn;

use crate::context::EditorContext;
use crate::payload::CellValue;

/// Nearest class vertex at or above `cell`.
///
/// Returns `None` for the root, for unknown cells, for cells outside any
/// class box, and when the parent chain loops.
pub fn resolve_owner_class<H>(ctx: &EditorContext<H>, cell: CellId) -> Option<CellId>
where
    H: GraphHost<Value = CellValue>,
{
    owner_class_cell(ctx.host(), cell)
}

pub(crate) fn owner_class_cell<H>(host: &H, cell: CellId) -> Option<CellId>
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    let root = host.root();
    let mut visited = HashSet::new();
    let mut current = cell;

    loop {
        if current == root {
            return None;
        }
        if !visited.insert(current) {
            warn!(cell = %cell, at = %current, "Containment cycle while resolving owner class");
            return None;
        }
        if host.value(current).is_some_and(CellValue::is_class) {
            return Some(current);
        }
        current = host.parent(current)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use arch_graph::{Cell, Geometry, NewCell, Result};

    #[test]
    fn test_resolves_through_parents() {
        let mut ctx = EditorContext::in_memory(EditorConfig::default());
        let host = ctx.host_mut();
        let class = host
            .add_cell(NewCell::new(CellValue::class("Car"), Geometry::default()), CellId::ROOT)
            .unwrap();
        let property = host
            .add_cell(NewCell::new(CellValue::property("Car", "plate"), Geometry::default()), class)
            .unwrap();
        let loose = host
            .add_cell(NewCell::new(CellValue::Relation, Geometry::default()), CellId::ROOT)
            .unwrap();

        assert_eq!(resolve_owner_class(&ctx, class), Some(class));
        assert_eq!(resolve_owner_class(&ctx, property), Some(class));
        assert_eq!(resolve_owner_class(&ctx, loose), None);
        assert_eq!(resolve_owner_class(&ctx, CellId::ROOT), None);
        assert_eq!(resolve_owner_class(&ctx, CellId(404)), None);
    }

    /// Host whose cells all claim each other as parent
    struct Looping;

    static RELATION: CellValue = CellValue::Relation;

    impl GraphHost for Looping {
        type Value = CellValue;

        fn root(&self) -> CellId {
            CellId::ROOT
        }
        fn contains(&self, _id: CellId) -> bool {
            true
        }
        fn value(&self, _id: CellId) -> Option<&CellValue> {
            Some(&RELATION)
        }
        fn set_value(&mut self, id: CellId, _value: CellValue) -> Result<CellValue> {
            Err(arch_graph::Error::cell_not_found(id))
        }
        fn parent(&self, id: CellId) -> Option<CellId> {
            Some(if id == CellId(1) { CellId(2) } else { CellId(1) })
        }
        fn is_vertex(&self, _id: CellId) -> bool {
            true
        }
        fn is_edge(&self, _id: CellId) -> bool {
            false
        }
        fn terminals(&self, _id: CellId) -> Option<(CellId, CellId)> {
            None
        }
        fn geometry(&self, _id: CellId) -> Option<Geometry> {
            None
        }
        fn style(&self, _id: CellId) -> Option<&str> {
            None
        }
        fn set_style(&mut self, _id: CellId, _style: Option<String>) -> Result<()> {
            Ok(())
        }
        fn child_vertices(&self, _parent: CellId) -> Vec<CellId> {
            Vec::new()
        }
        fn child_edges(&self, _parent: CellId) -> Vec<CellId> {
            Vec::new()
        }
        fn edges_between(&self, _a: CellId, _b: CellId) -> Vec<CellId> {
            Vec::new()
        }
        fn add_cell(&mut self, _cell: NewCell<CellValue>, parent: CellId) -> Result<CellId> {
            Err(arch_graph::Error::cell_not_found(parent))
        }
        fn connect(&mut self, source: CellId, _target: CellId, _value: CellValue) -> Result<CellId> {
            Err(arch_graph::Error::cell_not_found(source))
        }
        fn remove_cells(&mut self, _cells: &[CellId], _include_edges: bool) -> Result<Vec<Cell<CellValue>>> {
            Ok(Vec::new())
        }
        fn begin_update(&mut self) {}
        fn end_update(&mut self) {}
    }

    #[test]
    fn test_parent_cycle_terminates() {
        assert_eq!(owner_class_cell(&Looping, CellId(1)), None);
    }
}
