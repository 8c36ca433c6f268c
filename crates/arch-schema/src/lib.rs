#![deny(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # arch-schema
//!
//! Entity model for the schema designer: classes, properties, inheritance and
//! bidirectional links, plus the JSON wire format and integrity validation.
//!
//! Entities reference each other by name. A class's superclass, a property's
//! linked class and its inverse property are resolved lazily against a
//! [`SchemaRegistry`], so a superclass that only exists in the database (and
//! not in the editor) is still a legal reference.

pub mod inheritance;
pub mod json;
pub mod model;
pub mod registry;
pub mod validate;

pub use inheritance::{InheritanceGraph, ancestors};
pub use json::{
    ClassJson, PAYLOAD_VERSION, PropertyJson, parse_class_array, parse_embedded_class,
    parse_embedded_property,
};
pub use model::{OClass, OProperty, PropertyType};
pub use registry::SchemaRegistry;
pub use validate::{Severity, ValidationIssue, ValidationResult, validate_name, validate_registry};

use thiserror::Error;

/// Errors that can occur when working with the entity model
#[derive(Error, Debug)]
pub enum Error {
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Property '{property}' not found in class '{class}'")]
    PropertyNotFound { class: String, property: String },

    #[error("Class already exists: {0}")]
    DuplicateClass(String),

    #[error("Property '{property}' already exists in class '{class}' or its superclasses")]
    DuplicateProperty { class: String, property: String },

    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Inheritance error: {0}")]
    Inheritance(String),

    #[error("Unsupported payload version {found} (newest supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a property-not-found error for `class.property`.
    pub fn property_not_found(class: impl Into<String>, property: impl Into<String>) -> Self {
        Self::PropertyNotFound {
            class: class.into(),
            property: property.into(),
        }
    }

    /// Build a duplicate-property error for `class.property`.
    pub fn duplicate_property(class: impl Into<String>, property: impl Into<String>) -> Self {
        Self::DuplicateProperty {
            class: class.into(),
            property: property.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
