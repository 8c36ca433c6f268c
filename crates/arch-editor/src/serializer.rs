//! Schema export and diagram persistence
//!
//! Two formats leave the editor. The schema export is a JSON array of
//! classes, superclass-free classes first. The diagram document is the host
//! codec's node tree, in which class and property payloads are replaced by
//! the entity JSON they stand for.

use arch_graph::{CellId, GraphCodec, GraphDocument, GraphHost, MemoryGraph, ReadHook, UpdateScope, WriteHook, for_each};
use arch_schema::{
    ClassJson, Error as SchemaError, OClass, OProperty, PAYLOAD_VERSION, PropertyJson, SchemaRegistry,
    parse_class_array, parse_embedded_class, parse_embedded_property,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::commands::{check_new_class, insert_class};
use crate::config::EditorConfig;
use crate::context::{EditorContext, restyle_class};
use crate::lookup;
use crate::payload::{CellValue, EditorObject};
use crate::{Error, Result};

/// Written into the metadata of every saved document
pub const GENERATOR: &str = "schema-architect";

/// Entity fields that only make sense inside one editor session
const TRANSIENT_FIELDS: [&str; 3] = ["cell", "configuredFromEditorConfig", "existsInEditor"];

/// Horizontal gap between imported class boxes
const IMPORT_SPACING: f64 = 40.0;

/// Export every class on the diagram as a JSON array.
///
/// Classes without a superclass come first, then the subclasses, each group
/// in diagram order. Properties are sorted by order.
pub fn export_schema_json<H>(ctx: &EditorContext<H>) -> Result<String>
where
    H: GraphHost<Value = CellValue>,
{
    let mut roots: Vec<ClassJson> = Vec::new();
    let mut subclasses: Vec<ClassJson> = Vec::new();
    for_each(lookup::class_cells(ctx.host()), |cell, _| match ctx.class_of(cell) {
        Some(class) if class.is_sub_class() => subclasses.push(class.to_json()),
        Some(class) => roots.push(class.to_json()),
        None => warn!(%cell, "Class vertex has no registered class"),
    });

    debug!(roots = roots.len(), subclasses = subclasses.len(), "Exported schema");
    roots.append(&mut subclasses);
    Ok(serde_json::to_string(&roots)?)
}

/// Write hook replacing class and property payloads by their entity JSON
#[derive(Debug, Clone, Copy)]
pub struct SchemaWriteHooks<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> SchemaWriteHooks<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }
}

impl WriteHook<CellValue> for SchemaWriteHooks<'_> {
    type Error = Error;

    fn write_value(&self, value: &CellValue) -> Result<Option<Value>> {
        let json = match value {
            CellValue::Class { name } => self
                .registry
                .class(name)
                .ok_or_else(|| Error::document(format!("class vertex '{name}' has no registered class")))?
                .to_json()
                .to_json_string()?,
            CellValue::Property { owner, name } => self
                .registry
                .property(owner, name)
                .ok_or_else(|| Error::document(format!("property vertex '{owner}.{name}' has no registered property")))?
                .to_json()
                .to_json_string()?,
            _ => return Ok(None),
        };
        let object = CellValue::EditorObject(EditorObject::current(json));
        Ok(Some(serde_json::to_value(object)?))
    }

    fn is_transient(&self, field: &str) -> bool {
        TRANSIENT_FIELDS.contains(&field)
    }
}

/// Read hook rebuilding the registry from a decoded document.
///
/// The registry is only produced once every payload parsed; a failure leaves
/// it empty.
#[derive(Debug)]
pub struct SchemaReadHooks<'a> {
    config: &'a EditorConfig,
    registry: SchemaRegistry,
}

impl<'a> SchemaReadHooks<'a> {
    pub fn new(config: &'a EditorConfig) -> Self {
        Self {
            config,
            registry: SchemaRegistry::new(),
        }
    }

    pub fn into_registry(self) -> SchemaRegistry {
        self.registry
    }

    fn payload_version(&self, object: &EditorObject) -> Result<u32> {
        if object.version < PAYLOAD_VERSION && !self.config.migrate_legacy_payloads {
            return Err(SchemaError::UnsupportedVersion {
                found: object.version,
                supported: PAYLOAD_VERSION,
            }
            .into());
        }
        Ok(object.version)
    }

    fn read_class(&self, graph: &MemoryGraph<CellValue>, cell: CellId) -> Result<Option<OClass>> {
        let Some(CellValue::EditorObject(object)) = graph.value(cell) else {
            return Ok(None);
        };
        let json = parse_embedded_class(&object.json, self.payload_version(object)?)?;
        let mut class = OClass::from_json(&json);
        class.reset_transient();
        class.cell = Some(cell);
        class.exists_in_editor = true;
        class.configured_from_editor_config = true;

        for row in graph.child_vertices(cell) {
            let Some(CellValue::EditorObject(object)) = graph.value(row) else {
                continue;
            };
            let json = parse_embedded_property(&object.json, self.payload_version(object)?)?;
            match class.property_mut(&json.name) {
                Some(property) => property.cell = Some(row),
                None => {
                    let mut property = OProperty::from_json(&json);
                    property.cell = Some(row);
                    class.push_property(property);
                }
            }
        }
        Ok(Some(class))
    }
}

impl ReadHook<CellValue> for SchemaReadHooks<'_> {
    type Error = Error;

    fn after_decode(&mut self, graph: &mut MemoryGraph<CellValue>) -> Result<()> {
        let mut registry = SchemaRegistry::new();
        for cell in graph.child_vertices(graph.root()) {
            if let Some(class) = self.read_class(graph, cell)? {
                registry.insert(class)?;
            }
        }

        for class in registry.classes_mut() {
            class.set_exists_in_db(class.exists_in_db);
            for property in &mut class.properties {
                property.set_exists_in_db(property.exists_in_db);
            }
        }
        for class in registry.classes() {
            let rows = class
                .properties
                .iter()
                .filter_map(|p| Some((p.cell?, CellValue::property(&class.name, &p.name))));
            let payloads = class.cell.map(|cell| (cell, CellValue::class(&class.name))).into_iter().chain(rows);
            for (cell, payload) in payloads {
                if let Some(value) = graph.value_mut(cell) {
                    *value = payload;
                }
            }
        }

        let mut host = UpdateScope::enter(graph);
        for class in registry.classes() {
            restyle_class(&mut *host, &registry, self.config, &class.name)?;
        }
        drop(host);

        info!(classes = registry.len(), "Restored schema from document");
        self.registry = registry;
        Ok(())
    }
}

/// Encode the whole diagram with its entities
pub fn save_document(ctx: &EditorContext<MemoryGraph<CellValue>>) -> Result<GraphDocument> {
    let document = GraphCodec::encode(ctx.host(), &SchemaWriteHooks::new(ctx.registry()))?;
    Ok(document.with_generator(GENERATOR))
}

/// Rebuild an editor from a saved document
pub fn load_document(config: EditorConfig, document: &GraphDocument) -> Result<EditorContext<MemoryGraph<CellValue>>> {
    let mut hooks = SchemaReadHooks::new(&config);
    let host = GraphCodec::decode(document, &mut hooks)?;
    let registry = hooks.into_registry();
    Ok(EditorContext::with_registry(host, registry, config))
}

/// Class named by a JSON object: the registered one, or a new detached value
#[derive(Debug, Clone, PartialEq)]
pub enum ClassFromJson<'a> {
    Existing(&'a OClass),
    Detached(OClass),
}

impl ClassFromJson<'_> {
    pub fn class(&self) -> &OClass {
        match self {
            Self::Existing(class) => class,
            Self::Detached(class) => class,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, Self::Existing(_))
    }

    pub fn into_owned(self) -> OClass {
        match self {
            Self::Existing(class) => class.clone(),
            Self::Detached(class) => class,
        }
    }
}

/// Resolve class JSON to the class drawn under exactly that name, or build
/// a detached one. Blank input resolves to nothing.
///
/// The name is matched against the diagram case-sensitively, so `car` does
/// not resolve to a drawn `Car`.
pub fn find_or_create_class_from_json<'c, H>(ctx: &'c EditorContext<H>, json: &str) -> Result<Option<ClassFromJson<'c>>>
where
    H: GraphHost<Value = CellValue>,
{
    if json.trim().is_empty() {
        return Ok(None);
    }
    let parsed: ClassJson = serde_json::from_str(json)?;
    let drawn = lookup::cell_by_class_name(ctx.host(), &parsed.name).and_then(|cell| ctx.class_of(cell));
    Ok(Some(match drawn {
        Some(class) => ClassFromJson::Existing(class),
        None => ClassFromJson::Detached(OClass::from_json(&parsed)),
    }))
}

/// Resolve property JSON to the registered property it names
pub fn find_property_from_json<'c, H>(ctx: &'c EditorContext<H>, json: &str) -> Result<Option<&'c OProperty>>
where
    H: GraphHost<Value = CellValue>,
{
    if json.trim().is_empty() {
        return Ok(None);
    }
    let parsed: PropertyJson = serde_json::from_str(json)?;
    Ok(ctx.registry().property(&parsed.owner_class, &parsed.name))
}

/// Add the classes of an exported schema that are not on the diagram yet.
///
/// Every new class is checked before the first is placed, so a rejected
/// import leaves the editor unchanged. Returns the names added.
pub fn import_schema_json<H>(ctx: &mut EditorContext<H>, json: &str) -> Result<Vec<String>>
where
    H: GraphHost<Value = CellValue>,
{
    let parsed = parse_class_array(json)?;

    let mut scratch = ctx.registry().clone();
    let mut incoming = Vec::new();
    for entry in &parsed {
        if scratch.contains(&entry.name) {
            debug!(class = %entry.name, "Skipping class already on the diagram");
            continue;
        }
        let class = OClass::from_json(entry);
        check_new_class(&scratch, &class)?;
        scratch.insert(class.clone())?;
        incoming.push(class);
    }
    if incoming.is_empty() {
        return Ok(Vec::new());
    }

    let column = ctx.registry().len();
    let step = ctx.config().class_width + IMPORT_SPACING;
    let mut session = ctx.edit();
    let mut added = Vec::with_capacity(incoming.len());
    for (i, class) in incoming.into_iter().enumerate() {
        let name = class.name.clone();
        #[allow(clippy::cast_precision_loss)]
        let x = (column + i) as f64 * step;
        insert_class(&mut session, class, x, 0.0)?;
        added.push(name);
    }
    info!(classes = added.len(), "Imported schema");
    Ok(added)
}
