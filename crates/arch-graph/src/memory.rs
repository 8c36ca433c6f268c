//! In-memory graph host

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, trace};

use crate::cell::{Cell, CellId, CellKind, Geometry, NewCell};
use crate::host::GraphHost;
use crate::{Error, Result};

/// Change notification recorded by [`MemoryGraph`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Added(CellId),
    Connected {
        edge: CellId,
        source: CellId,
        target: CellId,
    },
    Removed(CellId),
    ValueChanged(CellId),
    StyleChanged(CellId),
}

/// Reference [`GraphHost`] keeping cells in ordered maps.
///
/// Changes made inside an update batch are buffered and published as one
/// edit when the outermost batch ends. Changes made outside any batch are
/// published as single-change edits.
#[derive(Debug, Clone)]
pub struct MemoryGraph<V> {
    cells: BTreeMap<CellId, Cell<V>>,
    root_children: Vec<CellId>,
    next_id: u64,
    update_level: usize,
    completed_updates: usize,
    pending: Vec<ChangeEvent>,
    edits: Vec<Vec<ChangeEvent>>,
}

impl<V> MemoryGraph<V> {
    /// Create an empty graph holding only the root container
    pub fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
            root_children: Vec::new(),
            next_id: 1,
            update_level: 0,
            completed_updates: 0,
            pending: Vec::new(),
            edits: Vec::new(),
        }
    }

    /// Current batch nesting depth
    pub fn update_level(&self) -> usize {
        self.update_level
    }

    /// Number of outermost batches that have been closed
    pub fn completed_updates(&self) -> usize {
        self.completed_updates
    }

    /// Published edits, oldest first
    pub fn edits(&self) -> &[Vec<ChangeEvent>] {
        &self.edits
    }

    /// Number of cells, the root excluded
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell<V>> {
        self.cells.get(&id)
    }

    /// Children of `parent` in insertion order
    pub fn children(&self, parent: CellId) -> &[CellId] {
        if parent == CellId::ROOT {
            &self.root_children
        } else {
            self.cells
                .get(&parent)
                .map_or(&[][..], |cell| cell.children.as_slice())
        }
    }

    /// Mutable access to a payload without publishing a change
    pub fn value_mut(&mut self, id: CellId) -> Option<&mut V> {
        self.cells.get_mut(&id).map(|cell| &mut cell.value)
    }

    /// Insert a decoded cell keeping its identifier; the parent must exist
    pub(crate) fn restore(&mut self, cell: Cell<V>) -> Result<()> {
        if cell.id == CellId::ROOT || self.cells.contains_key(&cell.id) {
            return Err(Error::codec(
                "restore cell",
                format!("duplicate cell id {}", cell.id),
            ));
        }
        self.attach(cell.parent, cell.id)?;
        self.next_id = self.next_id.max(cell.id.0 + 1);
        self.cells.insert(cell.id, Cell {
            children: Vec::new(),
            ..cell
        });
        Ok(())
    }

    fn allocate(&mut self) -> CellId {
        let id = CellId(self.next_id);
        self.next_id += 1;
        id
    }

    fn attach(&mut self, parent: CellId, child: CellId) -> Result<()> {
        if parent == CellId::ROOT {
            self.root_children.push(child);
            return Ok(());
        }
        match self.cells.get_mut(&parent) {
            Some(cell) if cell.is_vertex() => {
                cell.children.push(child);
                Ok(())
            }
            Some(_) => Err(Error::invalid_parent(parent, "edges cannot contain cells")),
            None => Err(Error::cell_not_found(parent)),
        }
    }

    fn detach(&mut self, parent: CellId, child: CellId) {
        if parent == CellId::ROOT {
            self.root_children.retain(|id| *id != child);
        } else if let Some(cell) = self.cells.get_mut(&parent) {
            cell.children.retain(|id| *id != child);
        }
    }

    fn record(&mut self, event: ChangeEvent) {
        trace!(?event, "Graph change");
        self.pending.push(event);
        if self.update_level == 0 {
            self.publish();
        }
    }

    fn publish(&mut self) {
        if !self.pending.is_empty() {
            self.edits.push(std::mem::take(&mut self.pending));
        }
    }

    fn collect_subtree(&self, id: CellId, out: &mut Vec<CellId>, seen: &mut HashSet<CellId>) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            out.push(current);
            if let Some(cell) = self.cells.get(&current) {
                stack.extend(cell.children.iter().rev().copied());
            }
        }
    }
}

impl<V> Default for MemoryGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> GraphHost for MemoryGraph<V> {
    type Value = V;

    fn root(&self) -> CellId {
        CellId::ROOT
    }

    fn contains(&self, id: CellId) -> bool {
        id == CellId::ROOT || self.cells.contains_key(&id)
    }

    fn value(&self, id: CellId) -> Option<&V> {
        self.cells.get(&id).map(|cell| &cell.value)
    }

    fn set_value(&mut self, id: CellId, value: V) -> Result<V> {
        let cell = self
            .cells
            .get_mut(&id)
            .ok_or_else(|| Error::cell_not_found(id))?;
        let previous = std::mem::replace(&mut cell.value, value);
        self.record(ChangeEvent::ValueChanged(id));
        Ok(previous)
    }

    fn parent(&self, id: CellId) -> Option<CellId> {
        self.cells.get(&id).map(|cell| cell.parent)
    }

    fn is_vertex(&self, id: CellId) -> bool {
        self.cells.get(&id).is_some_and(Cell::is_vertex)
    }

    fn is_edge(&self, id: CellId) -> bool {
        self.cells.get(&id).is_some_and(Cell::is_edge)
    }

    fn terminals(&self, id: CellId) -> Option<(CellId, CellId)> {
        self.cells.get(&id).and_then(Cell::terminals)
    }

    fn geometry(&self, id: CellId) -> Option<Geometry> {
        self.cells.get(&id).map(|cell| cell.geometry)
    }

    fn style(&self, id: CellId) -> Option<&str> {
        self.cells.get(&id).and_then(|cell| cell.style.as_deref())
    }

    fn set_style(&mut self, id: CellId, style: Option<String>) -> Result<()> {
        let cell = self
            .cells
            .get_mut(&id)
            .ok_or_else(|| Error::cell_not_found(id))?;
        if cell.style != style {
            cell.style = style;
            self.record(ChangeEvent::StyleChanged(id));
        }
        Ok(())
    }

    fn child_vertices(&self, parent: CellId) -> Vec<CellId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|id| self.is_vertex(*id))
            .collect()
    }

    fn child_edges(&self, parent: CellId) -> Vec<CellId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|id| self.is_edge(*id))
            .collect()
    }

    fn edges_between(&self, a: CellId, b: CellId) -> Vec<CellId> {
        self.cells
            .values()
            .filter(|cell| match cell.kind {
                CellKind::Edge { source, target } => {
                    (source == a && target == b) || (source == b && target == a)
                }
                CellKind::Vertex => false,
            })
            .map(|cell| cell.id)
            .collect()
    }

    fn add_cell(&mut self, cell: NewCell<V>, parent: CellId) -> Result<CellId> {
        let id = self.allocate();
        self.attach(parent, id)?;
        self.cells.insert(id, Cell {
            id,
            value: cell.value,
            kind: CellKind::Vertex,
            parent,
            children: Vec::new(),
            geometry: cell.geometry,
            style: cell.style,
        });
        self.record(ChangeEvent::Added(id));
        Ok(id)
    }

    fn connect(&mut self, source: CellId, target: CellId, value: V) -> Result<CellId> {
        for terminal in [source, target] {
            if !self.is_vertex(terminal) {
                return Err(Error::cell_not_found(terminal));
            }
        }
        let id = self.allocate();
        self.root_children.push(id);
        self.cells.insert(id, Cell {
            id,
            value,
            kind: CellKind::Edge { source, target },
            parent: CellId::ROOT,
            children: Vec::new(),
            geometry: Geometry::default(),
            style: None,
        });
        self.record(ChangeEvent::Connected {
            edge: id,
            source,
            target,
        });
        Ok(id)
    }

    fn remove_cells(&mut self, cells: &[CellId], include_edges: bool) -> Result<Vec<Cell<V>>> {
        // Validate the whole request first so a bad id never leaves a partial removal.
        for id in cells {
            if *id == CellId::ROOT {
                return Err(Error::RootMutation {
                    operation: "removed".to_string(),
                });
            }
            if !self.cells.contains_key(id) {
                return Err(Error::cell_not_found(*id));
            }
        }

        let mut seen = HashSet::new();
        let mut doomed = Vec::new();
        for id in cells {
            self.collect_subtree(*id, &mut doomed, &mut seen);
        }
        if include_edges {
            let vertices: HashSet<CellId> = doomed.iter().copied().collect();
            let edges: Vec<CellId> = self
                .cells
                .values()
                .filter(|cell| {
                    cell.terminals().is_some_and(|(source, target)| {
                        vertices.contains(&source) || vertices.contains(&target)
                    })
                })
                .map(|cell| cell.id)
                .collect();
            for edge in edges {
                if seen.insert(edge) {
                    doomed.push(edge);
                }
            }
        }

        let mut removed = Vec::with_capacity(doomed.len());
        for id in doomed {
            if let Some(cell) = self.cells.remove(&id) {
                self.detach(cell.parent, id);
                self.record(ChangeEvent::Removed(id));
                removed.push(cell);
            }
        }
        debug!(count = removed.len(), include_edges, "Removed cells");
        Ok(removed)
    }

    fn begin_update(&mut self) {
        self.update_level += 1;
    }

    fn end_update(&mut self) {
        if self.update_level == 0 {
            return;
        }
        self.update_level -= 1;
        if self.update_level == 0 {
            self.completed_updates += 1;
            self.publish();
        }
    }
}
