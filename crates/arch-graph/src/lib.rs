#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # arch-graph
//!
//! Graph host contract and in-memory diagram model for the schema designer.
//!
//! The schema engine never talks to a concrete diagram library. It consumes the
//! [`GraphHost`] trait: vertices and edges carrying a payload, parent/child
//! containment, edge lookup and batched updates. [`MemoryGraph`] is the
//! reference host, and [`GraphCodec`] turns a host model into a generic
//! [`GraphDocument`] with write/read hooks for domain payloads.

/// Cell identifiers, geometry and cell records.
pub mod cell;
/// Generic document encoder/decoder with composable hooks.
pub mod codec;
/// Persisted diagram document and its metadata.
pub mod document;
/// The graph host contract consumed by the schema engine.
pub mod host;
/// In-memory host with change batching.
pub mod memory;
/// Tree node used by the persisted document.
pub mod node;
/// RAII guard over the host's update resource.
pub mod scope;
/// Early-exit iteration and document tree walking.
pub mod traversal;

pub use cell::{Cell, CellId, CellKind, Geometry, NewCell};
pub use codec::{GraphCodec, NoHooks, ReadHook, WriteHook};
pub use document::{DocumentMetadata, GraphDocument};
pub use host::GraphHost;
pub use memory::{ChangeEvent, MemoryGraph};
pub use node::Node;
pub use scope::UpdateScope;
pub use traversal::{Traversal, Trigger, for_each, walk};

use thiserror::Error;

/// Errors raised by graph hosts and the document codec
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cell not found: {id}")]
    CellNotFound { id: CellId },

    #[error("Invalid parent {parent} for cell: {reason}")]
    InvalidParent { parent: CellId, reason: String },

    #[error("The root container cannot be {operation}")]
    RootMutation { operation: String },

    #[error("Codec error in {context}: {message}")]
    Codec { context: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a cell-not-found error.
    pub fn cell_not_found(id: CellId) -> Self {
        Self::CellNotFound { id }
    }

    /// Build an invalid-parent error with the reason the parent was refused.
    pub fn invalid_parent(parent: CellId, reason: impl Into<String>) -> Self {
        Self::InvalidParent {
            parent,
            reason: reason.into(),
        }
    }

    /// Build a codec error with encode/decode context.
    pub fn codec(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Codec {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Crate-local result type for graph operations.
pub type Result<T> = std::result::Result<T, Error>;
