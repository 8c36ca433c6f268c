//! Integration tests for arch-graph crate
//!
//! These tests exercise the in-memory host through the generic contract, the
//! way an editor would, and persist the result.

use arch_graph::{
    CellId, Geometry, GraphCodec, GraphDocument, GraphHost, MemoryGraph, NewCell, NoHooks, UpdateScope, for_each,
};

/// Two boxes with one row each, joined by an edge
fn build<H: GraphHost<Value = String>>(host: &mut H) -> arch_graph::Result<(CellId, CellId, CellId)> {
    let mut scope = UpdateScope::enter(host);
    let root = scope.root();
    let a = scope.add_cell(NewCell::new("A".to_string(), Geometry::new(0.0, 0.0, 160.0, 50.0)), root)?;
    let b = scope.add_cell(NewCell::new("B".to_string(), Geometry::new(200.0, 0.0, 160.0, 50.0)), root)?;
    scope.add_cell(NewCell::new("a.x".to_string(), Geometry::new(0.0, 0.0, 0.0, 20.0)), a)?;
    scope.add_cell(NewCell::new("b.y".to_string(), Geometry::new(0.0, 0.0, 0.0, 20.0)), b)?;
    let edge = scope.connect(a, b, "extends".to_string())?;
    Ok((a, b, edge))
}

#[test]
fn test_batched_build_is_one_edit() -> anyhow::Result<()> {
    let mut graph = MemoryGraph::new();
    let (a, b, edge) = build(&mut graph)?;

    assert_eq!(graph.update_level(), 0);
    assert_eq!(graph.completed_updates(), 1);
    assert_eq!(graph.edits().len(), 1);
    assert_eq!(graph.child_vertices(graph.root()), vec![a, b]);
    assert_eq!(graph.child_edges(graph.root()), vec![edge]);
    assert_eq!(graph.edges_between(b, a), vec![edge]);
    Ok(())
}

#[test]
fn test_for_each_stops_after_signal() {
    let mut seen = Vec::new();
    for_each(1..=10, |n, trigger| {
        seen.push(n);
        trigger.stop = n == 3;
    });
    assert_eq!(seen, vec![1, 2, 3]);

    let mut calls = 0;
    for_each(Vec::<u8>::new(), |_, _| calls += 1);
    assert_eq!(calls, 0);
}

#[test]
fn test_removal_cascades_and_returns_records() -> anyhow::Result<()> {
    let mut graph = MemoryGraph::new();
    let (a, b, edge) = build(&mut graph)?;

    let removed = graph.remove_cells(&[a], true)?;
    let ids: Vec<CellId> = removed.iter().map(|c| c.id).collect();
    assert!(ids.contains(&a));
    assert!(ids.contains(&edge));
    assert!(!graph.contains(a));
    assert!(graph.contains(b));
    assert!(graph.child_edges(graph.root()).is_empty());
    Ok(())
}

#[test]
fn test_document_survives_text_round_trip() -> anyhow::Result<()> {
    let mut graph = MemoryGraph::new();
    let (a, b, edge) = build(&mut graph)?;
    graph.set_style(a, Some("BOX".to_string()))?;

    let text = GraphCodec::encode(&graph, &NoHooks)?.to_json_string()?;
    let restored: MemoryGraph<String> = GraphCodec::decode(&GraphDocument::from_json_str(&text)?, &mut NoHooks)?;

    assert_eq!(restored.len(), graph.len());
    assert_eq!(restored.style(a), Some("BOX"));
    assert_eq!(restored.terminals(edge), Some((a, b)));
    assert_eq!(restored.geometry(b), graph.geometry(b));
    assert_eq!(restored.value(edge).map(String::as_str), Some("extends"));
    Ok(())
}
