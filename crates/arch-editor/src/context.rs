//! The live diagram and the schema it shows

use arch_graph::{CellId, GraphHost, MemoryGraph, UpdateScope};
use arch_schema::{OClass, OProperty, SchemaRegistry};
use tracing::trace;

use crate::config::EditorConfig;
use crate::payload::CellValue;
use crate::Result;

/// One diagram, its entity registry and the presentation settings.
///
/// Passed explicitly to every editor operation.
#[derive(Debug, Clone)]
pub struct EditorContext<H> {
    host: H,
    registry: SchemaRegistry,
    config: EditorConfig,
}

impl EditorContext<MemoryGraph<CellValue>> {
    /// An empty editor backed by the in-memory host
    pub fn in_memory(config: EditorConfig) -> Self {
        Self::new(MemoryGraph::new(), config)
    }
}

impl<H: GraphHost<Value = CellValue>> EditorContext<H> {
    pub fn new(host: H, config: EditorConfig) -> Self {
        Self::with_registry(host, SchemaRegistry::new(), config)
    }

    pub fn with_registry(host: H, registry: SchemaRegistry, config: EditorConfig) -> Self {
        Self {
            host,
            registry,
            config,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn into_parts(self) -> (H, SchemaRegistry, EditorConfig) {
        (self.host, self.registry, self.config)
    }

    /// Class shown by a class vertex
    pub fn class_of(&self, cell: CellId) -> Option<&OClass> {
        class_of(&self.host, &self.registry, cell)
    }

    /// Property shown by a property vertex
    pub fn property_of(&self, cell: CellId) -> Option<&OProperty> {
        property_of(&self.host, &self.registry, cell)
    }

    /// Open one update scope over the host, with write access to the registry
    pub fn edit(&mut self) -> EditSession<'_, H> {
        EditSession {
            host: UpdateScope::enter(&mut self.host),
            registry: &mut self.registry,
            config: &self.config,
        }
    }
}

/// Write access to an editor for the duration of one update scope.
///
/// Dropping the session closes the scope.
pub struct EditSession<'a, H: GraphHost<Value = CellValue>> {
    pub host: UpdateScope<'a, H>,
    pub registry: &'a mut SchemaRegistry,
    pub config: &'a EditorConfig,
}

impl<H: GraphHost<Value = CellValue>> EditSession<'_, H> {
    pub fn class_of(&self, cell: CellId) -> Option<&OClass> {
        class_of(&*self.host, &*self.registry, cell)
    }

    pub fn property_of(&self, cell: CellId) -> Option<&OProperty> {
        property_of(&*self.host, &*self.registry, cell)
    }

    /// Re-apply the persisted-state styles of a class and of its properties
    pub fn restyle_class(&mut self, name: &str) -> Result<()> {
        restyle_class(&mut *self.host, self.registry, self.config, name)
    }
}

pub(crate) fn restyle_class<H>(
    host: &mut H,
    registry: &SchemaRegistry,
    config: &EditorConfig,
    name: &str,
) -> Result<()>
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    let Some(class) = registry.class(name) else {
        return Ok(());
    };

    let mut styles: Vec<(CellId, &str)> = Vec::new();
    if let Some(cell) = class.cell {
        styles.push((cell, config.class_style_for(class.exists_in_db)));
    }
    for property in &class.properties {
        if let Some(cell) = property.cell {
            styles.push((cell, config.property_style_for(property.exists_in_db)));
        }
    }

    for (cell, style) in styles {
        if host.contains(cell) && host.style(cell) != Some(style) {
            host.set_style(cell, Some(style.to_string()))?;
        }
    }
    trace!(class = name, "Restyled class cells");
    Ok(())
}

pub(crate) fn class_of<'r, H>(host: &H, registry: &'r SchemaRegistry, cell: CellId) -> Option<&'r OClass>
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    let name = host.value(cell)?.class_name()?;
    registry.class(name)
}

pub(crate) fn property_of<'r, H>(
    host: &H,
    registry: &'r SchemaRegistry,
    cell: CellId,
) -> Option<&'r OProperty>
where
    H: GraphHost<Value = CellValue> + ?Sized,
{
    let (owner, name) = host.value(cell)?.property_key()?;
    registry.property(owner, name)
}
