//! JSON wire format for classes and properties
//!
//! Classes are exchanged as `{name, existsInDb, superClass, properties}` and
//! properties as `{name, ownerClass, type, existsInDb, linkedClass,
//! inverseProperty, order, subClassProperty}`. A class also lists the
//! persisted properties removed in the editor under `propertiesForDelete`,
//! omitted while empty. Editor documents embed the
//! same objects as strings, tagged with [`PAYLOAD_VERSION`].

use crate::model::{OClass, OProperty, PropertyType};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Version of the embedded class/property JSON written today.
///
/// Version 0 is the unversioned legacy layout, where a class listed its
/// superclasses as an array under `superClasses`.
pub const PAYLOAD_VERSION: u32 = 1;

const LEGACY_SUPER_CLASSES: &str = "superClasses";
const SUPER_CLASS: &str = "superClass";

/// Serialized form of an [`OClass`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassJson {
    pub name: String,
    #[serde(default)]
    pub exists_in_db: bool,
    #[serde(default)]
    pub super_class: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyJson>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties_for_delete: Vec<PropertyJson>,
}

/// Serialized form of an [`OProperty`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyJson {
    pub name: String,
    #[serde(default)]
    pub owner_class: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default)]
    pub exists_in_db: bool,
    #[serde(default)]
    pub linked_class: Option<String>,
    #[serde(default)]
    pub inverse_property: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub sub_class_property: bool,
}

impl ClassJson {
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl PropertyJson {
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parse an exported schema: an array of classes, or a single class object
pub fn parse_class_array(json: &str) -> Result<Vec<ClassJson>> {
    let value: Value = serde_json::from_str(json)?;
    let classes = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(classes)
}

/// Parse a class embedded in an editor document at payload `version`
pub fn parse_embedded_class(json: &str, version: u32) -> Result<ClassJson> {
    let mut value = parse_embedded(json, version)?;
    if version == 0 {
        migrate_legacy_class(&mut value);
    }
    Ok(serde_json::from_value(value)?)
}

/// Parse a property embedded in an editor document at payload `version`
pub fn parse_embedded_property(json: &str, version: u32) -> Result<PropertyJson> {
    Ok(serde_json::from_value(parse_embedded(json, version)?)?)
}

fn parse_embedded(json: &str, version: u32) -> Result<Value> {
    if version > PAYLOAD_VERSION {
        return Err(Error::UnsupportedVersion {
            found: version,
            supported: PAYLOAD_VERSION,
        });
    }
    Ok(serde_json::from_str(json)?)
}

/// Rewrite a version 0 class object in place: the first entry of
/// `superClasses` becomes `superClass`.
fn migrate_legacy_class(value: &mut Value) {
    let Some(object) = value.as_object_mut() else {
        return;
    };
    let Some(legacy) = object.remove(LEGACY_SUPER_CLASSES) else {
        return;
    };
    if object.get(SUPER_CLASS).is_some_and(|v| !v.is_null()) {
        return;
    }

    let first = legacy
        .as_array()
        .and_then(|supers| supers.first())
        .cloned()
        .unwrap_or(Value::Null);
    debug!(super_class = %first, "Migrated legacy superClasses array");
    object.insert(SUPER_CLASS.to_string(), first);
}

impl OProperty {
    pub fn to_json(&self) -> PropertyJson {
        PropertyJson {
            name: self.name.clone(),
            owner_class: self.owner_class.clone(),
            property_type: self.property_type.clone(),
            exists_in_db: self.exists_in_db,
            linked_class: self.linked_class.clone(),
            inverse_property: self.inverse_property.clone(),
            order: self.order,
            sub_class_property: self.subclass_property,
        }
    }

    pub fn from_json(json: &PropertyJson) -> Self {
        let mut property = Self::new(&json.name, &json.owner_class, json.property_type.clone());
        property.config_from_json(json);
        property
    }

    /// Overwrite every persisted field from `json`; transient state is kept
    pub fn config_from_json(&mut self, json: &PropertyJson) {
        self.name.clone_from(&json.name);
        self.owner_class.clone_from(&json.owner_class);
        self.property_type = json.property_type.clone();
        self.exists_in_db = json.exists_in_db;
        self.linked_class.clone_from(&json.linked_class);
        self.inverse_property.clone_from(&json.inverse_property);
        self.order = json.order;
        self.subclass_property = json.sub_class_property;
    }
}

impl OClass {
    /// Serialized form with properties sorted by `order`
    pub fn to_json(&self) -> ClassJson {
        ClassJson {
            name: self.name.clone(),
            exists_in_db: self.exists_in_db,
            super_class: self.super_class.clone(),
            properties: self
                .sorted_properties()
                .into_iter()
                .map(OProperty::to_json)
                .collect(),
            properties_for_delete: self.properties_for_delete.iter().map(OProperty::to_json).collect(),
        }
    }

    pub fn from_json(json: &ClassJson) -> Self {
        let mut class = Self::new(&json.name);
        class.config_from_json(json);
        class
    }

    /// Overwrite every persisted field from `json`, replacing the properties.
    ///
    /// A property without an owner is adopted by this class.
    pub fn config_from_json(&mut self, json: &ClassJson) {
        self.name.clone_from(&json.name);
        self.exists_in_db = json.exists_in_db;
        self.super_class.clone_from(&json.super_class);
        self.properties = json
            .properties
            .iter()
            .map(|p| {
                let mut property = OProperty::from_json(p);
                if property.owner_class.is_empty() {
                    property.owner_class.clone_from(&self.name);
                }
                property
            })
            .collect();
        self.properties_for_delete = json.properties_for_delete.iter().map(OProperty::from_json).collect();
    }
}
