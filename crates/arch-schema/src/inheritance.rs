//! Superclass chains and cycle detection

use crate::model::OClass;
use crate::registry::SchemaRegistry;
use std::collections::HashSet;
use tracing::warn;

/// Tracks inheritance relationships to detect cycles
#[derive(Debug, Clone, Default)]
pub struct InheritanceGraph {
    edges: Vec<(String, String)>, // (child, parent), lowercased
}

impl InheritanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph of every superclass reference in `registry`
    pub fn from_registry(registry: &SchemaRegistry) -> Self {
        let mut graph = Self::new();
        for class in registry.classes() {
            if let Some(parent) = &class.super_class {
                graph.add_edge(&class.name, parent);
            }
        }
        graph
    }

    pub fn add_edge(&mut self, child: impl AsRef<str>, parent: impl AsRef<str>) {
        self.edges.push((
            child.as_ref().to_ascii_lowercase(),
            parent.as_ref().to_ascii_lowercase(),
        ));
    }

    /// Detect if adding this edge would create a cycle
    pub fn would_create_cycle(&self, child: &str, parent: &str) -> bool {
        let child = child.to_ascii_lowercase();
        let parent = parent.to_ascii_lowercase();
        if child == parent {
            return true;
        }

        // Check if parent depends on child (directly or transitively)
        let mut to_visit = vec![parent];
        let mut visited = HashSet::new();

        while let Some(current) = to_visit.pop() {
            if current == child {
                return true;
            }
            if visited.insert(current.clone()) {
                for (c, p) in &self.edges {
                    if c == &current {
                        to_visit.push(p.clone());
                    }
                }
            }
        }

        false
    }

    /// Classes that take part in a cycle, in edge order
    pub fn cyclic_classes(&self) -> Vec<String> {
        let mut cyclic = Vec::new();
        for (child, parent) in &self.edges {
            let without: Self = Self {
                edges: self
                    .edges
                    .iter()
                    .filter(|(c, p)| !(c == child && p == parent))
                    .cloned()
                    .collect(),
            };
            if without.would_create_cycle(child, parent) && !cyclic.contains(child) {
                cyclic.push(child.clone());
            }
        }
        cyclic
    }
}

/// Registered ancestors of `class`, nearest first.
///
/// The walk stops at the first superclass that is not registered (it may
/// exist only in the database) and at the first class seen twice.
pub fn ancestors<'a>(registry: &'a SchemaRegistry, class: &str) -> Vec<&'a OClass> {
    let mut chain = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(class.to_ascii_lowercase());

    let mut next = registry.class(class).and_then(|c| c.super_class.clone());
    while let Some(name) = next {
        if !visited.insert(name.to_ascii_lowercase()) {
            warn!(class, super_class = %name, "Inheritance cycle detected; chain truncated");
            break;
        }
        let Some(parent) = registry.class(&name) else {
            break;
        };
        chain.push(parent);
        next = parent.super_class.clone();
    }
    chain
}
