//! The graph host contract

use crate::Result;
use crate::cell::{Cell, CellId, Geometry, NewCell};

/// Capabilities the schema engine needs from a diagram library.
///
/// A host owns vertices and edges, each carrying one payload of type
/// [`GraphHost::Value`]. Vertices form a containment tree below
/// [`GraphHost::root`]; edges live under the root and reference two cells.
///
/// Mutations may be batched between [`GraphHost::begin_update`] and
/// [`GraphHost::end_update`]. Calls nest; only the outermost `end_update`
/// publishes the batch. Use [`crate::UpdateScope`] instead of calling the pair
/// by hand so the batch is closed on every exit path.
pub trait GraphHost {
    /// Payload carried by every cell
    type Value;

    /// The root container; it has no payload and cannot be removed
    fn root(&self) -> CellId;

    /// Whether the host currently holds `id` (the root included)
    fn contains(&self, id: CellId) -> bool;

    fn value(&self, id: CellId) -> Option<&Self::Value>;

    /// Replace a payload, returning the previous one
    fn set_value(&mut self, id: CellId, value: Self::Value) -> Result<Self::Value>;

    /// Structural parent; `None` for the root and unknown cells
    fn parent(&self, id: CellId) -> Option<CellId>;

    fn is_vertex(&self, id: CellId) -> bool;

    fn is_edge(&self, id: CellId) -> bool;

    /// Source and target of an edge
    fn terminals(&self, id: CellId) -> Option<(CellId, CellId)>;

    fn geometry(&self, id: CellId) -> Option<Geometry>;

    fn style(&self, id: CellId) -> Option<&str>;

    fn set_style(&mut self, id: CellId, style: Option<String>) -> Result<()>;

    /// Vertices directly contained in `parent`, in insertion order
    fn child_vertices(&self, parent: CellId) -> Vec<CellId>;

    /// Edges directly contained in `parent`, in insertion order
    fn child_edges(&self, parent: CellId) -> Vec<CellId>;

    /// Edges connecting `a` and `b` in either direction
    fn edges_between(&self, a: CellId, b: CellId) -> Vec<CellId>;

    /// Insert a vertex below `parent`
    fn add_cell(&mut self, cell: NewCell<Self::Value>, parent: CellId) -> Result<CellId>;

    /// Create an edge from `source` to `target` under the root
    fn connect(&mut self, source: CellId, target: CellId, value: Self::Value) -> Result<CellId>;

    /// Remove cells with their descendants, and with every edge touching a
    /// removed cell when `include_edges` is set. Returns the removed records.
    fn remove_cells(
        &mut self,
        cells: &[CellId],
        include_edges: bool,
    ) -> Result<Vec<Cell<Self::Value>>>;

    fn begin_update(&mut self);

    fn end_update(&mut self);
}
