//! Cell records held by a graph host
#![allow(clippy::must_use_candidate)] // Small accessors read clearly without #[must_use].
#![allow(clippy::return_self_not_must_use)] // Builder helpers are used in chains.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a vertex or edge inside a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub u64);

impl CellId {
    /// Identifier reserved for the host's root container.
    pub const ROOT: CellId = CellId(0);
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position and size of a cell
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Whether a cell is a vertex or an edge between two cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    Vertex,
    Edge { source: CellId, target: CellId },
}

/// A cell stored in a host
#[derive(Debug, Clone, PartialEq)]
pub struct Cell<V> {
    pub id: CellId,
    pub value: V,
    pub kind: CellKind,
    /// Structural parent; `CellId::ROOT` for top-level cells
    pub parent: CellId,
    pub children: Vec<CellId>,
    pub geometry: Geometry,
    pub style: Option<String>,
}

impl<V> Cell<V> {
    pub fn is_vertex(&self) -> bool {
        matches!(self.kind, CellKind::Vertex)
    }

    pub fn is_edge(&self) -> bool {
        matches!(self.kind, CellKind::Edge { .. })
    }

    /// Source and target of an edge
    pub fn terminals(&self) -> Option<(CellId, CellId)> {
        match self.kind {
            CellKind::Edge { source, target } => Some((source, target)),
            CellKind::Vertex => None,
        }
    }

    /// True if this edge touches `id` at either end
    pub fn touches(&self, id: CellId) -> bool {
        self.terminals()
            .is_some_and(|(source, target)| source == id || target == id)
    }
}

/// A vertex description that has not been inserted into a host yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewCell<V> {
    pub value: V,
    pub geometry: Geometry,
    pub style: Option<String>,
}

impl<V> NewCell<V> {
    pub fn new(value: V, geometry: Geometry) -> Self {
        Self {
            value,
            geometry,
            style: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}
