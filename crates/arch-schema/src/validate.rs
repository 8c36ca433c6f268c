//! Integrity checks over a whole registry

use crate::inheritance::{InheritanceGraph, ancestors};
use crate::registry::SchemaRegistry;
use crate::{Error, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - the schema cannot be applied as is
    Error,
    /// Warning - suspicious but applicable
    Warning,
}

/// One problem found in the schema
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Error message
    pub message: String,
    /// `Class` or `Class.property` the issue is about
    pub path: String,
    /// Severity level
    pub severity: Severity,
    /// Stable issue code
    pub code: &'static str,
}

/// Validation result
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Whether no error was found; warnings do not count
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    /// Issues carrying `code`
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }

    fn push(&mut self, severity: Severity, code: &'static str, path: String, message: String) {
        self.issues.push(ValidationIssue {
            message,
            path,
            severity,
            code,
        });
    }
}

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

fn identifier() -> std::result::Result<&'static Regex, &'static regex::Error> {
    static IDENTIFIER: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    IDENTIFIER
        .get_or_init(|| Regex::new(IDENTIFIER_PATTERN))
        .as_ref()
}

/// Check that `name` can be used as a class or property name
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }
    let re = identifier().map_err(|e| Error::InvalidName {
        name: name.to_string(),
        reason: format!("invalid identifier pattern '{IDENTIFIER_PATTERN}': {e}"),
    })?;
    if !re.is_match(name) {
        return Err(Error::InvalidName {
            name: name.to_string(),
            reason: "expected a letter or '_' followed by letters, digits or '_'".to_string(),
        });
    }
    Ok(())
}

/// Check every class and property of `registry`
pub fn validate_registry(registry: &SchemaRegistry) -> ValidationResult {
    let mut result = ValidationResult::default();
    let mut seen_classes: HashSet<String> = HashSet::new();

    for class in registry.classes() {
        let path = class.name.clone();
        if let Err(e) = validate_name(&class.name) {
            result.push(Severity::Error, "invalid-name", path.clone(), e.to_string());
        }
        if !seen_classes.insert(class.name.to_ascii_lowercase()) {
            result.push(
                Severity::Error,
                "duplicate-class",
                path.clone(),
                format!("Class '{}' is declared more than once", class.name),
            );
        }
        if let Some(parent) = &class.super_class {
            if !registry.contains(parent) {
                result.push(
                    Severity::Warning,
                    "unknown-superclass",
                    path.clone(),
                    format!("Superclass '{parent}' is not part of the schema"),
                );
            }
        }

        let inherited: HashSet<&str> = ancestors(registry, &class.name)
            .into_iter()
            .flat_map(|a| a.properties.iter())
            .filter(|p| !p.subclass_property)
            .map(|p| p.name.as_str())
            .collect();
        let mut seen_properties: HashSet<&str> = HashSet::new();

        for property in &class.properties {
            let path = format!("{}.{}", class.name, property.name);
            if let Err(e) = validate_name(&property.name) {
                result.push(Severity::Error, "invalid-name", path.clone(), e.to_string());
            }
            if !seen_properties.insert(property.name.as_str())
                || (!property.subclass_property && inherited.contains(property.name.as_str()))
            {
                result.push(
                    Severity::Error,
                    "duplicate-property",
                    path.clone(),
                    format!(
                        "Property '{}' is declared more than once in '{}' or its superclasses",
                        property.name, class.name
                    ),
                );
            }

            if property.subclass_property {
                continue;
            }
            let Some(linked) = &property.linked_class else {
                continue;
            };
            if !registry.contains(linked) {
                result.push(
                    Severity::Warning,
                    "unknown-linked-class",
                    path.clone(),
                    format!("Linked class '{linked}' is not part of the schema"),
                );
                continue;
            }
            if let Some(inverse) = &property.inverse_property {
                let points_back = registry.property(linked, inverse).is_some_and(|partner| {
                    partner.inverse_property.as_deref() == Some(property.name.as_str())
                        && partner
                            .linked_class
                            .as_deref()
                            .is_some_and(|l| l.eq_ignore_ascii_case(&class.name))
                });
                if !points_back {
                    result.push(
                        Severity::Error,
                        "asymmetric-inverse",
                        path,
                        format!("Inverse property '{linked}.{inverse}' does not point back"),
                    );
                }
            }
        }
    }

    for class in InheritanceGraph::from_registry(registry).cyclic_classes() {
        result.push(
            Severity::Error,
            "inheritance-cycle",
            class.clone(),
            format!("Class '{class}' inherits from itself"),
        );
    }

    debug!(
        issues = result.issues.len(),
        valid = result.is_valid(),
        "Validated schema"
    );
    result
}
