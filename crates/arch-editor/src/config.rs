//! Editor presentation settings
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::trace;

/// Box sizes and styles used when building diagram cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Width of a class box (default: 160)
    pub class_width: f64,
    /// Height of a class box (default: 50)
    pub class_height: f64,
    /// Height of a property row (default: 20)
    pub property_height: f64,
    /// Style of a class that only exists in the editor
    pub class_style: String,
    /// Style of a class that exists in the database
    pub class_exists_style: String,
    /// Style of a property that only exists in the editor
    pub property_style: String,
    /// Style of a property that exists in the database
    pub property_exists_style: String,
    /// Read unversioned embedded payloads by migrating them (default: true)
    pub migrate_legacy_payloads: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            class_width: 160.0,
            class_height: 50.0,
            property_height: 20.0,
            class_style: "OCLASS".to_string(),
            class_exists_style: "OCLASS_EXISTS".to_string(),
            property_style: "OPROPERTY".to_string(),
            property_exists_style: "OPROPERTY_EXISTS".to_string(),
            migrate_legacy_payloads: true,
        }
    }
}

impl EditorConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class_size(mut self, width: f64, height: f64) -> Self {
        self.class_width = width;
        self.class_height = height;
        self
    }

    pub fn property_height(mut self, height: f64) -> Self {
        self.property_height = height;
        self
    }

    pub fn reject_legacy_payloads(mut self) -> Self {
        self.migrate_legacy_payloads = false;
        self
    }

    /// Style of a class box for the given persisted state
    pub fn class_style_for(&self, exists_in_db: bool) -> &str {
        if exists_in_db {
            &self.class_exists_style
        } else {
            &self.class_style
        }
    }

    /// Style of a property row for the given persisted state
    pub fn property_style_for(&self, exists_in_db: bool) -> &str {
        if exists_in_db {
            &self.property_exists_style
        } else {
            &self.property_style
        }
    }

    /// Load a config file; `.yaml`/`.yml` files are read as YAML, anything else as JSON
    pub fn from_file(path: &Path) -> Result<Self> {
        trace!("Loading editor config from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validated()
    }

    fn validated(self) -> Result<Self> {
        for (field, value) in [
            ("class_width", self.class_width),
            ("class_height", self.class_height),
            ("property_height", self.property_height),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{field} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert!((config.class_width - 160.0).abs() < f64::EPSILON);
        assert!((config.class_height - 50.0).abs() < f64::EPSILON);
        assert!((config.property_height - 20.0).abs() < f64::EPSILON);
        assert!(config.migrate_legacy_payloads);
    }

    #[test]
    fn test_style_by_persisted_state() {
        let config = EditorConfig::default();
        assert_eq!(config.class_style_for(true), "OCLASS_EXISTS");
        assert_eq!(config.class_style_for(false), "OCLASS");
        assert_eq!(config.property_style_for(true), "OPROPERTY_EXISTS");
        assert_eq!(config.property_style_for(false), "OPROPERTY");
    }

    #[test]
    fn test_config_builder() {
        let config = EditorConfig::new()
            .class_size(200.0, 60.0)
            .property_height(24.0)
            .reject_legacy_payloads();
        assert!((config.class_width - 200.0).abs() < f64::EPSILON);
        assert!((config.property_height - 24.0).abs() < f64::EPSILON);
        assert!(!config.migrate_legacy_payloads);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EditorConfig::from_yaml_str("class_width: 240\nclass_style: draft\n").unwrap();
        assert!((config.class_width - 240.0).abs() < f64::EPSILON);
        assert_eq!(config.class_style, "draft");
        assert_eq!(config.class_exists_style, "OCLASS_EXISTS");
    }

    #[test]
    fn test_json_config() {
        let config = EditorConfig::from_json_str(r#"{"property_height": 18}"#).unwrap();
        assert!((config.property_height - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_size_is_rejected() {
        let err = EditorConfig::from_yaml_str("class_height: -1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file_dispatches_on_extension() {
        let dir = std::env::temp_dir().join(format!("arch-editor-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let yaml = dir.join("editor.yml");
        std::fs::write(&yaml, "class_width: 300\n").unwrap();
        let config = EditorConfig::from_file(&yaml).unwrap();
        assert!((config.class_width - 300.0).abs() < f64::EPSILON);

        let json = dir.join("editor.json");
        std::fs::write(&json, r#"{"class_width": 120}"#).unwrap();
        let config = EditorConfig::from_file(&json).unwrap();
        assert!((config.class_width - 120.0).abs() < f64::EPSILON);

        assert!(EditorConfig::from_file(&dir.join("missing.json")).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
