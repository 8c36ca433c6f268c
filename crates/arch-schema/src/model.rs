//! Class and property entities
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

use arch_graph::CellId;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Declared type of a property, using the database's type names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    Boolean,
    Integer,
    Short,
    Long,
    Float,
    Double,
    Decimal,
    Byte,
    Date,
    Datetime,
    String,
    Binary,
    Embedded,
    EmbeddedList,
    EmbeddedSet,
    EmbeddedMap,
    Link,
    LinkList,
    LinkSet,
    LinkMap,
    LinkBag,
    Transient,
    Custom,
    Any,
    /// A type name this crate does not know, kept verbatim
    Other(String),
}

impl PropertyType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Integer => "INTEGER",
            Self::Short => "SHORT",
            Self::Long => "LONG",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Decimal => "DECIMAL",
            Self::Byte => "BYTE",
            Self::Date => "DATE",
            Self::Datetime => "DATETIME",
            Self::String => "STRING",
            Self::Binary => "BINARY",
            Self::Embedded => "EMBEDDED",
            Self::EmbeddedList => "EMBEDDEDLIST",
            Self::EmbeddedSet => "EMBEDDEDSET",
            Self::EmbeddedMap => "EMBEDDEDMAP",
            Self::Link => "LINK",
            Self::LinkList => "LINKLIST",
            Self::LinkSet => "LINKSET",
            Self::LinkMap => "LINKMAP",
            Self::LinkBag => "LINKBAG",
            Self::Transient => "TRANSIENT",
            Self::Custom => "CUSTOM",
            Self::Any => "ANY",
            Self::Other(name) => name,
        }
    }

    /// Whether values of this type point at records of a linked class
    pub fn is_link(&self) -> bool {
        matches!(
            self,
            Self::Link | Self::LinkList | Self::LinkSet | Self::LinkMap | Self::LinkBag
        )
    }
}

impl From<&str> for PropertyType {
    fn from(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "BOOLEAN" => Self::Boolean,
            "INTEGER" => Self::Integer,
            "SHORT" => Self::Short,
            "LONG" => Self::Long,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "DECIMAL" => Self::Decimal,
            "BYTE" => Self::Byte,
            "DATE" => Self::Date,
            "DATETIME" => Self::Datetime,
            "STRING" => Self::String,
            "BINARY" => Self::Binary,
            "EMBEDDED" => Self::Embedded,
            "EMBEDDEDLIST" => Self::EmbeddedList,
            "EMBEDDEDSET" => Self::EmbeddedSet,
            "EMBEDDEDMAP" => Self::EmbeddedMap,
            "LINK" => Self::Link,
            "LINKLIST" => Self::LinkList,
            "LINKSET" => Self::LinkSet,
            "LINKMAP" => Self::LinkMap,
            "LINKBAG" => Self::LinkBag,
            "TRANSIENT" => Self::Transient,
            "CUSTOM" => Self::Custom,
            "ANY" => Self::Any,
            _ => Self::Other(name.to_string()),
        }
    }
}

impl From<String> for PropertyType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<PropertyType> for String {
    fn from(property_type: PropertyType) -> Self {
        property_type.as_str().to_string()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed field owned by exactly one class
#[derive(Debug, Clone, PartialEq)]
pub struct OProperty {
    pub name: String,
    /// Name of the declaring class
    pub owner_class: String,
    pub property_type: PropertyType,
    pub exists_in_db: bool,
    /// Target class of a relation-typed property
    pub linked_class: Option<String>,
    /// Name of the paired property on the linked class
    pub inverse_property: Option<String>,
    /// Position hint; authoritative only for order-valid properties
    pub order: i32,
    /// Copy of an ancestor's property carried by a subclass
    pub subclass_property: bool,
    /// Vertex showing this property (transient)
    pub cell: Option<CellId>,
}

impl OProperty {
    pub fn new(
        name: impl Into<String>,
        owner_class: impl Into<String>,
        property_type: impl Into<PropertyType>,
    ) -> Self {
        Self {
            name: name.into(),
            owner_class: owner_class.into(),
            property_type: property_type.into(),
            exists_in_db: false,
            linked_class: None,
            inverse_property: None,
            order: 0,
            subclass_property: false,
            cell: None,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_linked_class(mut self, linked_class: impl Into<String>) -> Self {
        self.linked_class = Some(linked_class.into());
        self
    }

    pub fn persisted(mut self) -> Self {
        self.exists_in_db = true;
        self
    }

    pub fn is_subclass_property(&self) -> bool {
        self.subclass_property
    }

    /// A persisted relation must not be severed from the diagram silently
    pub fn can_disconnect(&self) -> bool {
        !(self.exists_in_db && self.linked_class.is_some())
    }

    /// Assign the persisted flag; everything keyed on it is derived on demand
    pub fn set_exists_in_db(&mut self, exists_in_db: bool) {
        self.exists_in_db = exists_in_db;
        trace!(
            class = %self.owner_class,
            property = %self.name,
            exists_in_db,
            can_disconnect = self.can_disconnect(),
            "Normalized property persisted state"
        );
    }

    /// Copy of this property as carried by `subclass`
    pub fn inherited_by(&self, subclass: &str) -> Self {
        Self {
            owner_class: subclass.to_string(),
            exists_in_db: false,
            subclass_property: true,
            cell: None,
            ..self.clone()
        }
    }
}

/// A named schema class with an optional superclass and owned properties
#[derive(Debug, Clone, PartialEq)]
pub struct OClass {
    pub name: String,
    pub exists_in_db: bool,
    /// Superclass name, resolved lazily
    pub super_class: Option<String>,
    pub properties: Vec<OProperty>,
    /// Persisted properties removed in the editor, to drop from the database
    pub properties_for_delete: Vec<OProperty>,
    /// Vertex showing this class (transient)
    pub cell: Option<CellId>,
    /// Rebuilt from a persisted editor document (transient)
    pub configured_from_editor_config: bool,
    /// Currently placed on the diagram (transient)
    pub exists_in_editor: bool,
}

impl OClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exists_in_db: false,
            super_class: None,
            properties: Vec::new(),
            properties_for_delete: Vec::new(),
            cell: None,
            configured_from_editor_config: false,
            exists_in_editor: false,
        }
    }

    pub fn with_super_class(mut self, super_class: impl Into<String>) -> Self {
        self.super_class = Some(super_class.into());
        self
    }

    pub fn persisted(mut self) -> Self {
        self.exists_in_db = true;
        self
    }

    pub fn is_sub_class(&self) -> bool {
        self.super_class.is_some()
    }

    pub fn property(&self, name: &str) -> Option<&OProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut OProperty> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// Append a property, re-owning it to this class
    pub fn push_property(&mut self, mut property: OProperty) {
        property.owner_class.clone_from(&self.name);
        self.properties.push(property);
    }

    pub fn remove_property(&mut self, name: &str) -> Option<OProperty> {
        let index = self.properties.iter().position(|p| p.name == name)?;
        Some(self.properties.remove(index))
    }

    /// Properties sorted by `order`, ties kept in declaration order
    pub fn sorted_properties(&self) -> Vec<&OProperty> {
        let mut sorted: Vec<&OProperty> = self.properties.iter().collect();
        sorted.sort_by_key(|p| p.order);
        sorted
    }

    /// Assign the persisted flag and re-derive dependent state: a class that
    /// is not in the database cannot own persisted properties.
    pub fn set_exists_in_db(&mut self, exists_in_db: bool) {
        self.exists_in_db = exists_in_db;
        if !exists_in_db {
            for property in &mut self.properties {
                if property.exists_in_db {
                    property.set_exists_in_db(false);
                }
            }
        }
        trace!(class = %self.name, exists_in_db, "Normalized class persisted state");
    }

    /// Forget all editor-session state
    pub fn reset_transient(&mut self) {
        self.cell = None;
        self.configured_from_editor_config = false;
        self.exists_in_editor = false;
        for property in &mut self.properties {
            property.cell = None;
        }
    }
}
