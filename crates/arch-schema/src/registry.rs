//! Name-keyed store of the schema's classes

use crate::inheritance::ancestors;
use crate::model::{OClass, OProperty};
use crate::{Error, Result};
use tracing::debug;

/// Registry owning every class of the schema.
///
/// Classes keep insertion order. Lookups by class name ignore ASCII case,
/// matching the database's own name resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    classes: Vec<OClass>,
}

impl SchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &OClass> {
        self.classes.iter()
    }

    pub fn classes_mut(&mut self) -> impl Iterator<Item = &mut OClass> {
        self.classes.iter_mut()
    }

    /// Check if a class exists
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Get a class by name
    pub fn class(&self, name: &str) -> Option<&OClass> {
        self.position(name).map(|i| &self.classes[i])
    }

    pub fn class_mut(&mut self, name: &str) -> Option<&mut OClass> {
        self.position(name).map(|i| &mut self.classes[i])
    }

    pub fn property(&self, class: &str, name: &str) -> Option<&OProperty> {
        self.class(class)?.property(name)
    }

    pub fn property_mut(&mut self, class: &str, name: &str) -> Option<&mut OProperty> {
        self.class_mut(class)?.property_mut(name)
    }

    /// Register a class, rejecting a name already taken
    pub fn insert(&mut self, class: OClass) -> Result<()> {
        if self.contains(&class.name) {
            return Err(Error::DuplicateClass(class.name));
        }
        debug!(class = %class.name, "Registered class");
        self.classes.push(class);
        Ok(())
    }

    /// Remove a class and clear every reference other classes hold to it
    pub fn remove_class(&mut self, name: &str) -> Option<OClass> {
        let index = self.position(name)?;
        let removed = self.classes.remove(index);

        for class in &mut self.classes {
            if class
                .super_class
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(&removed.name))
            {
                class.super_class = None;
            }
            for property in &mut class.properties {
                if property
                    .linked_class
                    .as_deref()
                    .is_some_and(|l| l.eq_ignore_ascii_case(&removed.name))
                {
                    property.linked_class = None;
                    property.inverse_property = None;
                }
            }
        }

        debug!(class = %removed.name, "Removed class");
        Some(removed)
    }

    /// Remove a property and clear the inverse pointer of its partner
    pub fn remove_property(&mut self, class: &str, name: &str) -> Option<OProperty> {
        let removed = self.class_mut(class)?.remove_property(name)?;

        if let (Some(linked), Some(inverse)) = (&removed.linked_class, &removed.inverse_property) {
            if let Some(partner) = self.property_mut(linked, inverse) {
                if partner.inverse_property.as_deref() == Some(removed.name.as_str()) {
                    partner.inverse_property = None;
                }
            }
        }

        debug!(class, property = name, "Removed property");
        Some(removed)
    }

    /// Names of a class's own properties followed by those of its ancestors
    /// that are registered, without duplicates.
    pub fn effective_property_names(&self, class: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let Some(start) = self.class(class) else {
            return names;
        };

        let chain = std::iter::once(start).chain(ancestors(self, &start.name));
        for owner in chain {
            for property in &owner.properties {
                if !names.contains(&property.name) {
                    names.push(property.name.clone());
                }
            }
        }
        names
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.classes
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}
