//! Keeping zero or one edge between two vertices

use arch_graph::{CellId, GraphHost, UpdateScope};
use tracing::trace;

use crate::context::EditorContext;
use crate::payload::CellValue;
use crate::Result;

/// Make the edges between `source` and `target` match `connect`.
///
/// Existing edges, in either direction, are removed when `connect` is false
/// or when `force_remove` asks for a fresh edge. When `connect` is set and no
/// edge is left, one is created with `value`; otherwise the first existing
/// edge is kept, its payload set to `value`, and any further duplicates are
/// removed. Afterwards exactly one edge joins the two vertices if `connect`
/// is set and none otherwise. Returns the surviving edge.
///
/// Runs in one update scope. Entities are never touched.
pub fn reconcile<H>(
    ctx: &mut EditorContext<H>,
    source: CellId,
    target: CellId,
    connect: bool,
    force_remove: bool,
    value: CellValue,
) -> Result<Option<CellId>>
where
    H: GraphHost<Value = CellValue>,
{
    let mut host = UpdateScope::enter(ctx.host_mut());
    reconcile_in(&mut *host, source, target, connect, force_remove, value)
}

pub(crate) fn reconcile_in<H>(
    host: &mut H,
    source: CellId,
    target: CellId,
    connect: bool,
    force_remove: bool,
    value: CellValue,
) -> Result<Option<CellId>>
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    let mut existing = host.edges_between(source, target);
    if !existing.is_empty() && (!connect || force_remove) {
        host.remove_cells(&existing, true)?;
        existing.clear();
    }
    if !connect {
        trace!(%source, %target, "Disconnected vertices");
        return Ok(None);
    }

    let Some((&kept, duplicates)) = existing.split_first() else {
        let edge = host.connect(source, target, value)?;
        trace!(%source, %target, %edge, "Connected vertices");
        return Ok(Some(edge));
    };
    if !duplicates.is_empty() {
        host.remove_cells(duplicates, true)?;
    }
    if host.value(kept) != Some(&value) {
        host.set_value(kept, value)?;
    }
    trace!(%source, %target, edge = %kept, "Reused existing edge");
    Ok(Some(kept))
}
