#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # arch-editor
//!
//! Consistency engine of the schema designer.
//!
//! An [`EditorContext`] owns one diagram (any [`arch_graph::GraphHost`]
//! carrying [`CellValue`] payloads) together with the [`SchemaRegistry`] it
//! shows. Every operation keeps the two in lock-step inside one update scope:
//!
//! - [`factory`] builds class and property vertices,
//! - [`hierarchy`] maps any cell back to its owning class vertex,
//! - [`deletion`] decides what a user may delete and removes it,
//! - [`edges`] keeps exactly zero or one edge between two vertices,
//! - [`ordering`] computes property positions under inheritance,
//! - [`serializer`] exports the schema and persists whole diagrams,
//! - [`commands`] are the edits a user triggers,
//! - [`lookup`] finds cells by class and property name.
//!
//! ## Example Usage
//!
//! ```rust
//! use arch_editor::{EditorConfig, EditorContext, commands, serializer};
//! use arch_schema::{OClass, OProperty, PropertyType};
//!
//! let mut ctx = EditorContext::in_memory(EditorConfig::default());
//! commands::add_class(&mut ctx, OClass::new("Vehicle"), 0.0, 0.0).unwrap();
//! commands::add_class(&mut ctx, OClass::new("Car"), 200.0, 0.0).unwrap();
//! commands::add_property(&mut ctx, "Vehicle", OProperty::new("wheels", "Vehicle", PropertyType::Integer)).unwrap();
//! commands::set_super_class(&mut ctx, "Car", Some("Vehicle")).unwrap();
//!
//! let json = serializer::export_schema_json(&ctx).unwrap();
//! assert!(json.find("\"Vehicle\"").unwrap() < json.find("\"Car\"").unwrap());
//! ```
//!
//! [`SchemaRegistry`]: arch_schema::SchemaRegistry

pub mod commands;
pub mod config;
pub mod context;
pub mod deletion;
pub mod edges;
pub mod factory;
pub mod hierarchy;
pub mod lookup;
pub mod ordering;
pub mod payload;
pub mod serializer;

pub use config::EditorConfig;
pub use context::{EditSession, EditorContext};
pub use payload::{CellValue, EditorObject};
pub use serializer::{ClassFromJson, SchemaReadHooks, SchemaWriteHooks};

use arch_graph::CellId;
use thiserror::Error;

/// Errors that can occur while editing a schema diagram
#[derive(Error, Debug)]
pub enum Error {
    #[error("Graph error: {0}")]
    Graph(#[from] arch_graph::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] arch_schema::Error),

    #[error("Cell {cell} does not show {expected}")]
    UnexpectedPayload { cell: CellId, expected: &'static str },

    #[error("Class '{0}' is not on the diagram")]
    NotOnDiagram(String),

    #[error("Cannot link '{class}.{property}': {reason}")]
    InvalidLink {
        class: String,
        property: String,
        reason: String,
    },

    #[error("Document error: {0}")]
    Document(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn unexpected_payload(cell: CellId, expected: &'static str) -> Self {
        Self::UnexpectedPayload { cell, expected }
    }

    pub fn document(message: impl Into<String>) -> Self {
        Self::Document(message.into())
    }

    pub fn invalid_link(
        class: impl Into<String>,
        property: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidLink {
            class: class.into(),
            property: property.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a missing class in the registry
    pub fn class_not_found(name: impl Into<String>) -> Self {
        Self::Schema(arch_schema::Error::ClassNotFound(name.into()))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
