//! Vertices for classes and properties
//!
//! The factory only describes cells. Inserting them into a host is the
//! caller's job.

use arch_graph::{Geometry, NewCell};
use arch_schema::{OClass, OProperty};

use crate::config::EditorConfig;
use crate::payload::CellValue;

/// A class box of the configured size at `(x, y)`
pub fn create_class_vertex(config: &EditorConfig, class: &OClass, x: f64, y: f64) -> NewCell<CellValue> {
    NewCell::new(
        CellValue::class(&class.name),
        Geometry::new(x, y, config.class_width, config.class_height),
    )
    .with_style(config.class_style_for(class.exists_in_db))
}

/// A property row; its width and position are left to layout
pub fn create_property_vertex(config: &EditorConfig, property: &OProperty) -> NewCell<CellValue> {
    NewCell::new(
        CellValue::property(&property.owner_class, &property.name),
        Geometry::new(0.0, 0.0, 0.0, config.property_height),
    )
    .with_style(config.property_style_for(property.exists_in_db))
}
