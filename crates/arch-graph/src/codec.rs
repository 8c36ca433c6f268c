//! Generic encoder/decoder between a [`MemoryGraph`] and a [`GraphDocument`]
//!
//! Payloads are written through serde by default. A [`WriteHook`] may replace
//! the encoding of selected payloads and drop transient fields from every
//! object written; a [`ReadHook`] runs once the generic decode of the whole
//! model is complete, to restore whatever the generic decode cannot.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::cell::{Cell, CellId, CellKind, Geometry};
use crate::document::{DOCUMENT_FORMAT_VERSION, GraphDocument};
use crate::memory::MemoryGraph;
use crate::node::Node;
use crate::traversal::{Traversal, walk};
use crate::Error;

const MODEL: &str = "model";
const ROOT: &str = "root";
const CELL: &str = "cell";
const GEOMETRY: &str = "geometry";

/// Intercepts the generic payload writer
pub trait WriteHook<V> {
    type Error: From<Error>;

    /// Encoding to use instead of the default serde form; `None` keeps the default
    fn write_value(&self, value: &V) -> Result<Option<Value>, Self::Error>;

    /// Field names that must never reach the document
    fn is_transient(&self, field: &str) -> bool {
        let _ = field;
        false
    }
}

/// Runs after the generic decode of a document
pub trait ReadHook<V> {
    type Error: From<Error>;

    fn after_decode(&mut self, graph: &mut MemoryGraph<V>) -> Result<(), Self::Error>;
}

/// Hooks that keep the default behavior
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<V> WriteHook<V> for NoHooks {
    type Error = Error;

    fn write_value(&self, _value: &V) -> Result<Option<Value>, Error> {
        Ok(None)
    }
}

impl<V> ReadHook<V> for NoHooks {
    type Error = Error;

    fn after_decode(&mut self, _graph: &mut MemoryGraph<V>) -> Result<(), Error> {
        Ok(())
    }
}

/// Document encoder/decoder for in-memory graphs
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphCodec;

impl GraphCodec {
    /// Encode every cell below the root, parents before children
    pub fn encode<V, W>(graph: &MemoryGraph<V>, hook: &W) -> Result<GraphDocument, W::Error>
    where
        V: Serialize,
        W: WriteHook<V>,
    {
        let mut root = Node::new(ROOT);
        let mut stack: Vec<CellId> = graph.children(CellId::ROOT).iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let Some(cell) = graph.cell(id) else {
                continue;
            };
            root.add_child(encode_cell(cell, hook)?);
            stack.extend(cell.children.iter().rev().copied());
        }

        let mut model = Node::new(MODEL);
        model.add_child(root);
        let mut document = GraphDocument::new(model);
        document.metadata.saved_at = Some(chrono::Utc::now());
        debug!(cells = graph.len(), "Encoded graph document");
        Ok(document)
    }

    /// Decode a document, then hand the rebuilt graph to `hook`
    pub fn decode<V, R>(document: &GraphDocument, hook: &mut R) -> Result<MemoryGraph<V>, R::Error>
    where
        V: DeserializeOwned,
        R: ReadHook<V>,
    {
        if document.root.name != MODEL {
            return Err(Error::codec(
                "decode document",
                format!("expected '{MODEL}' root, found '{}'", document.root.name),
            )
            .into());
        }
        if document.metadata.format_version > DOCUMENT_FORMAT_VERSION {
            return Err(Error::codec(
                "decode document",
                format!(
                    "format version {} is newer than supported version {DOCUMENT_FORMAT_VERSION}",
                    document.metadata.format_version
                ),
            )
            .into());
        }

        let mut collector = CellCollector::default();
        walk(&document.root, &mut collector);

        let mut vertices = Vec::new();
        let mut edges = Vec::new();
        for node in &collector.cells {
            let cell: Cell<V> = decode_cell(node)?;
            if cell.is_edge() {
                edges.push(cell);
            } else {
                vertices.push(cell);
            }
        }

        let mut graph = MemoryGraph::new();
        for cell in vertices.into_iter().chain(edges) {
            trace!(id = %cell.id, "Restoring cell");
            graph.restore(cell)?;
        }
        debug!(cells = graph.len(), "Decoded graph document");

        hook.after_decode(&mut graph)?;
        Ok(graph)
    }
}

fn encode_cell<V, W>(cell: &Cell<V>, hook: &W) -> Result<Node, W::Error>
where
    V: Serialize,
    W: WriteHook<V>,
{
    let mut value = match hook.write_value(&cell.value)? {
        Some(value) => value,
        None => serde_json::to_value(&cell.value).map_err(Error::from)?,
    };
    strip_transient(&mut value, &|field| hook.is_transient(field));

    let mut node = Node::with_value(CELL, value);
    node.set_attribute("id", cell.id.0.to_string())
        .set_attribute("parent", cell.parent.0.to_string());
    match cell.kind {
        CellKind::Vertex => {
            node.set_attribute("vertex", "1");
        }
        CellKind::Edge { source, target } => {
            node.set_attribute("edge", "1")
                .set_attribute("source", source.0.to_string())
                .set_attribute("target", target.0.to_string());
        }
    }
    if let Some(style) = &cell.style {
        node.set_attribute("style", style.clone());
    }

    let mut geometry = Node::new(GEOMETRY);
    geometry
        .set_attribute("x", cell.geometry.x.to_string())
        .set_attribute("y", cell.geometry.y.to_string())
        .set_attribute("width", cell.geometry.width.to_string())
        .set_attribute("height", cell.geometry.height.to_string());
    node.add_child(geometry);
    Ok(node)
}

fn strip_transient(value: &mut Value, is_transient: &dyn Fn(&str) -> bool) {
    match value {
        Value::Object(map) => {
            map.retain(|field, _| !is_transient(field));
            for nested in map.values_mut() {
                strip_transient(nested, is_transient);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_transient(item, is_transient);
            }
        }
        _ => {}
    }
}

fn decode_cell<V: DeserializeOwned>(node: &Node) -> crate::Result<Cell<V>> {
    let id = CellId(parse_attribute(node, "id")?);
    let parent = CellId(parse_attribute(node, "parent")?);
    let kind = if node.attribute("edge") == Some("1") {
        CellKind::Edge {
            source: CellId(parse_attribute(node, "source")?),
            target: CellId(parse_attribute(node, "target")?),
        }
    } else {
        CellKind::Vertex
    };

    let geometry = match node.find_child(GEOMETRY) {
        Some(geometry) => Geometry::new(
            parse_attribute(geometry, "x")?,
            parse_attribute(geometry, "y")?,
            parse_attribute(geometry, "width")?,
            parse_attribute(geometry, "height")?,
        ),
        None => Geometry::default(),
    };

    let value = serde_json::from_value(node.value.clone().unwrap_or(Value::Null))?;

    Ok(Cell {
        id,
        value,
        kind,
        parent,
        children: Vec::new(),
        geometry,
        style: node.attribute("style").map(str::to_string),
    })
}

fn parse_attribute<T>(node: &Node, key: &str) -> crate::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = node
        .attribute(key)
        .ok_or_else(|| Error::codec("decode cell", format!("missing attribute '{key}'")))?;
    raw.parse()
        .map_err(|e| Error::codec("decode cell", format!("attribute '{key}'='{raw}': {e}")))
}

/// Collects every encoded cell node in document order
#[derive(Default)]
struct CellCollector {
    cells: Vec<Node>,
}

impl Traversal for CellCollector {
    fn visit(&mut self, node: &Node, _path: &[String]) {
        if node.name == CELL {
            self.cells.push(node.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::NewCell;
    use crate::host::GraphHost;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Label {
        text: String,
        #[serde(default)]
        scratch: Option<String>,
    }

    fn label(text: &str) -> Label {
        Label {
            text: text.to_string(),
            scratch: Some("temp".to_string()),
        }
    }

    struct DropScratch;

    impl WriteHook<Label> for DropScratch {
        type Error = Error;

        fn write_value(&self, value: &Label) -> crate::Result<Option<Value>> {
            if value.text == "secret" {
                return Ok(Some(serde_json::json!({"text": "redacted"})));
            }
            Ok(None)
        }

        fn is_transient(&self, field: &str) -> bool {
            field == "scratch"
        }
    }

    fn sample_graph() -> (MemoryGraph<Label>, CellId, CellId, CellId) {
        let mut graph = MemoryGraph::new();
        let a = graph
            .add_cell(
                NewCell::new(label("A"), Geometry::new(10.0, 20.0, 160.0, 50.0)).with_style("box"),
                CellId::ROOT,
            )
            .unwrap();
        let row = graph
            .add_cell(NewCell::new(label("row"), Geometry::new(0.0, 0.0, 0.0, 20.0)), a)
            .unwrap();
        let b = graph
            .add_cell(NewCell::new(label("B"), Geometry::default()), CellId::ROOT)
            .unwrap();
        graph.connect(row, b, label("link")).unwrap();
        (graph, a, row, b)
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let (graph, a, row, b) = sample_graph();
        let document = GraphCodec::encode(&graph, &NoHooks).unwrap();
        let decoded: MemoryGraph<Label> = GraphCodec::decode(&document, &mut NoHooks).unwrap();

        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded.child_vertices(CellId::ROOT), vec![a, b]);
        assert_eq!(decoded.child_vertices(a), vec![row]);
        assert_eq!(decoded.style(a), Some("box"));
        assert_eq!(decoded.geometry(a), graph.geometry(a));
        assert_eq!(decoded.edges_between(row, b).len(), 1);
        assert_eq!(decoded.value(b), graph.value(b));
    }

    #[test]
    fn test_write_hook_replaces_and_strips() {
        let mut graph = MemoryGraph::new();
        graph
            .add_cell(NewCell::new(label("secret"), Geometry::default()), CellId::ROOT)
            .unwrap();
        graph
            .add_cell(NewCell::new(label("plain"), Geometry::default()), CellId::ROOT)
            .unwrap();

        let document = GraphCodec::encode(&graph, &DropScratch).unwrap();
        let cells = document.root.find_child(ROOT).unwrap().find_children(CELL);

        assert_eq!(cells[0].value, Some(serde_json::json!({"text": "redacted"})));
        assert_eq!(cells[1].value, Some(serde_json::json!({"text": "plain"})));
    }

    #[test]
    fn test_decode_rejects_foreign_root() {
        let document = GraphDocument::new(Node::new("diagram"));
        let result: crate::Result<MemoryGraph<Label>> = GraphCodec::decode(&document, &mut NoHooks);
        assert!(matches!(result, Err(Error::Codec { .. })));
    }

    #[test]
    fn test_decode_rejects_newer_format() {
        let mut document = GraphDocument::new(Node::new(MODEL));
        document.metadata.format_version = DOCUMENT_FORMAT_VERSION + 1;
        let result: crate::Result<MemoryGraph<Label>> = GraphCodec::decode(&document, &mut NoHooks);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_reports_bad_attribute() {
        let mut cell = Node::with_value(CELL, serde_json::json!({"text": "A"}));
        cell.set_attribute("id", "abc").set_attribute("parent", "0");
        let mut root = Node::new(ROOT);
        root.add_child(cell);
        let mut model = Node::new(MODEL);
        model.add_child(root);

        let result: crate::Result<MemoryGraph<Label>> =
            GraphCodec::decode(&GraphDocument::new(model), &mut NoHooks);
        assert!(matches!(result, Err(Error::Codec { message, .. }) if message.contains("'id'")));
    }

    #[test]
    fn test_read_hook_runs_after_decode() {
        struct Lower;
        impl ReadHook<Label> for Lower {
            type Error = Error;
            fn after_decode(&mut self, graph: &mut MemoryGraph<Label>) -> crate::Result<()> {
                for id in graph.child_vertices(CellId::ROOT) {
                    if let Some(value) = graph.value_mut(id) {
                        value.text = value.text.to_lowercase();
                    }
                }
                Ok(())
            }
        }

        let (graph, a, ..) = sample_graph();
        let document = GraphCodec::encode(&graph, &NoHooks).unwrap();
        let decoded = GraphCodec::decode(&document, &mut Lower).unwrap();
        assert_eq!(decoded.value(a).unwrap().text, "a");
        let b = decoded.child_vertices(CellId::ROOT)[1];
        assert_eq!(decoded.value(b).unwrap().text, "b");
        let row = decoded.child_vertices(a)[0];
        assert_eq!(decoded.value(row).unwrap().text, "row");
    }
}
