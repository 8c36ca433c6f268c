//! Payloads carried by diagram cells
#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};

/// What a diagram cell shows.
///
/// Class and property vertices carry the key of their entity in the
/// registry; the entity itself lives in [`arch_schema::SchemaRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CellValue {
    /// A class box
    Class { name: String },
    /// A property row inside its owner's box
    Property { owner: String, name: String },
    /// A committed inheritance edge, or a link edge from a property
    Relation,
    /// An inheritance edge that only exists in the editor
    UnsavedInheritance,
    /// An entity as stored in a persisted document
    EditorObject(EditorObject),
}

impl CellValue {
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class { name: name.into() }
    }

    pub fn property(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Property {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Class { name } => Some(name),
            _ => None,
        }
    }

    /// `(owner, name)` of a property payload
    pub fn property_key(&self) -> Option<(&str, &str)> {
        match self {
            Self::Property { owner, name } => Some((owner, name)),
            _ => None,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Self::Class { .. })
    }

    pub fn is_property(&self) -> bool {
        matches!(self, Self::Property { .. })
    }
}

/// Entity JSON embedded in a persisted document.
///
/// `version` is the layout of `json`; documents written before versioning
/// carry none and read as version 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorObject {
    pub json: String,
    #[serde(default)]
    pub version: u32,
}

impl EditorObject {
    /// Wrap entity JSON at the current payload version
    pub fn current(json: String) -> Self {
        Self {
            json,
            version: arch_schema::PAYLOAD_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payloads_carry_explicit_kind() {
        let value = serde_json::to_value(CellValue::property("Car", "owner")).unwrap();
        assert_eq!(value, json!({"kind": "property", "owner": "Car", "name": "owner"}));

        let value = serde_json::to_value(CellValue::UnsavedInheritance).unwrap();
        assert_eq!(value, json!({"kind": "unsavedInheritance"}));
    }

    #[test]
    fn test_editor_object_without_version_is_legacy() {
        let value: CellValue =
            serde_json::from_value(json!({"kind": "editorObject", "json": "{}"})).unwrap();
        assert_eq!(
            value,
            CellValue::EditorObject(EditorObject {
                json: "{}".to_string(),
                version: 0
            })
        );
    }

    #[test]
    fn test_accessors() {
        let class = CellValue::class("Car");
        assert_eq!(class.class_name(), Some("Car"));
        assert!(class.is_class());
        assert!(class.property_key().is_none());

        let property = CellValue::property("Car", "plate");
        assert_eq!(property.property_key(), Some(("Car", "plate")));
        assert!(property.is_property());
        assert_eq!(EditorObject::current("{}".into()).version, arch_schema::PAYLOAD_VERSION);
    }
}
