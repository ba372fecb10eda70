//! Graphviz DOT export of the resource-allocation graph.
//!
//! Text only; turning it into an image is left to `dot` or any other
//! Graphviz consumer.

use std::fmt::Write;

use deadlock_core::{EdgeKind, Node, ResourceGraph};

const PROCESS_COLOR: &str = "lightblue";
const RESOURCE_COLOR: &str = "lightgreen";

/// Render `graph` as a DOT digraph.
///
/// Process nodes are circles, resource nodes boxes; every edge is labelled
/// with its unit count and wait edges are dashed.
#[must_use]
pub fn to_dot(graph: &ResourceGraph) -> String {
    let mut out = String::new();
    out.push_str("digraph resource_allocation {\n");
    out.push_str("  rankdir=LR;\n");
    for node in graph.nodes() {
        let (shape, color) = match node {
            Node::Process(_) => ("circle", PROCESS_COLOR),
            Node::Resource(_) => ("box", RESOURCE_COLOR),
        };
        let _ = writeln!(
            out,
            "  \"{node}\" [shape={shape}, style=filled, fillcolor={color}];"
        );
    }
    for edge in graph.edges() {
        let style = match edge.kind {
            EdgeKind::Holds => "solid",
            EdgeKind::Waits => "dashed",
        };
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [label=\"{}\", style={style}];",
            edge.from, edge.to, edge.units
        );
    }
    out.push_str("}\n");
    out
}
