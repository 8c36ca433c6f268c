//! Persisted diagram document
#![allow(clippy::must_use_candidate)] // Constructors read clearly without #[must_use].
#![allow(clippy::return_self_not_must_use)] // Fluent builder methods return Self for ergonomics.

use crate::Result;
use crate::node::Node;
use serde::{Deserialize, Serialize};

/// Current layout of the document tree written by [`crate::GraphCodec`]
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// A diagram document as handed to storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Root node of the document (`model`)
    pub root: Node,

    /// Document-level metadata
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

/// Metadata associated with a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Layout version of the node tree
    pub format_version: u32,

    /// Tool that wrote the document
    pub generator: Option<String>,

    /// Time the document was encoded
    pub saved_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            format_version: DOCUMENT_FORMAT_VERSION,
            generator: None,
            saved_at: None,
        }
    }
}

impl GraphDocument {
    /// Create a new document with the given root node
    pub fn new(root: Node) -> Self {
        Self {
            root,
            metadata: DocumentMetadata::default(),
        }
    }

    /// Stamp the document with a generator name
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.metadata.generator = Some(generator.into());
        self
    }

    /// Serialize the whole document to JSON text
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a document from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
