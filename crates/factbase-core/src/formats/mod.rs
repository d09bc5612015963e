//! # Formats
//!
//! Tuple-Attribute text codec and the binary snapshot format.
//!
//! Text goes through a [`TaDocument`] in both directions: the parser builds
//! one, the writer renders one. Loading only touches a store once the whole
//! input has parsed and every tag is known.

pub mod document;
pub mod lexer;
pub mod parser;
pub mod snapshot;
pub mod writer;

pub use document::{AttributeBlock, BlockTarget, LoadReport, Relation, TaDocument};
pub use parser::parse_document;
pub use snapshot::{SnapshotHeader, graph_from_bytes, graph_to_bytes};
pub use writer::{render, write_graph};

use crate::config::FactConfig;
use crate::graph::FactGraph;
use crate::primitives::MAX_TA_FILE_SIZE;
use crate::types::FactError;
use std::io::Write as _;
use std::path::Path;

// =============================================================================
// STRING ENTRY POINTS
// =============================================================================

/// Parse TA text into a fresh store and resolve its references.
pub fn from_ta_str(text: &str, config: &FactConfig) -> Result<FactGraph, FactError> {
    let mut graph = FactGraph::new();
    apply_ta_str(&mut graph, text, config)?;
    Ok(graph)
}

/// Parse TA text into an existing store, then resolve.
///
/// Nothing is inserted unless the whole text parses.
pub fn apply_ta_str(
    graph: &mut FactGraph,
    text: &str,
    config: &FactConfig,
) -> Result<LoadReport, FactError> {
    let doc = parse_document(text, config)?;
    let mut report = doc.apply_to(graph, config)?;
    report.resolution = graph.resolve_references();
    Ok(report)
}

/// Render a store as TA text.
#[must_use]
pub fn to_ta_string(graph: &FactGraph, config: &FactConfig) -> String {
    write_graph(graph, config)
}

// =============================================================================
// FILE ENTRY POINTS
// =============================================================================

/// Load a TA file into a fresh store.
pub fn load_from_file(path: &Path, config: &FactConfig) -> Result<FactGraph, FactError> {
    let mut graph = FactGraph::new();
    load_into(&mut graph, path, config)?;
    Ok(graph)
}

/// Load a TA file into an existing store.
///
/// The store is untouched when the file cannot be read or does not parse.
pub fn load_into(
    graph: &mut FactGraph,
    path: &Path,
    config: &FactConfig,
) -> Result<LoadReport, FactError> {
    let text = read_ta_file(path)?;
    let report = apply_ta_str(graph, &text, config).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "TA load failed");
        e
    })?;
    tracing::info!(
        path = %path.display(),
        nodes = report.nodes_added,
        edges = report.edges_added,
        dropped = report.resolution.unresolved,
        "TA file loaded"
    );
    Ok(report)
}

/// Write a store to a TA file.
///
/// Text is written to a temporary sibling and renamed over `path`, so a
/// failed save leaves any previous file in place.
pub fn save_to_file(graph: &FactGraph, path: &Path, config: &FactConfig) -> Result<(), FactError> {
    let text = write_graph(graph, config);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| FactError::io(path, e))?;
    tmp.write_all(text.as_bytes())
        .and_then(|()| tmp.flush())
        .map_err(|e| FactError::io(path, e))?;
    tmp.persist(path).map_err(|e| FactError::io(path, e.error))?;

    tracing::info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "TA file written"
    );
    Ok(())
}

fn read_ta_file(path: &Path) -> Result<String, FactError> {
    let metadata = std::fs::metadata(path).map_err(|e| FactError::io(path, e))?;
    if metadata.len() > MAX_TA_FILE_SIZE {
        return Err(FactError::io(
            path,
            format!(
                "file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_TA_FILE_SIZE
            ),
        ));
    }
    std::fs::read_to_string(path).map_err(|e| FactError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeKind, Node, NodeKind};

    const SAMPLE: &str = "\
FACT TUPLE :
$INSTANCE a cFunction
$INSTANCE b cFunction
call a b
call a ghost
FACT ATTRIBUTE :
a { label = alpha }
";

    #[test]
    fn from_str_resolves() {
        let graph = from_ta_str(SAMPLE, &FactConfig::default()).expect("parse");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.find_node("a").map(|n| n.name.as_str()), Some("alpha"));
        let edge = graph.find_edge("a", "b", EdgeKind::Calls).expect("edge");
        assert!(edge.is_resolved());
        assert!(graph.find_edge("a", "ghost", EdgeKind::Calls).is_none());
    }

    #[test]
    fn failed_parse_leaves_store_unchanged() {
        let mut graph = from_ta_str(SAMPLE, &FactConfig::default()).expect("parse");
        let before = graph.clone();
        let bad = "FACT TUPLE :\n$INSTANCE c cClass\nFACT ATTRIBUTE :\nc { k v }\n";
        assert!(apply_ta_str(&mut graph, bad, &FactConfig::default()).is_err());
        assert_eq!(graph.node_count(), before.node_count());
        assert!(!graph.contains_node("c"));
    }

    #[test]
    fn label_attribute_survives_roundtrip() {
        let mut graph = FactGraph::new();
        graph.add_node(Node::new("x", "x", NodeKind::Class)).expect("insert");
        graph.add_node_attribute("x", "label", "Widget").expect("label");
        graph.add_node_attribute("x", "kind", "widget").expect("attr");

        let config = FactConfig::default();
        let reloaded = from_ta_str(&to_ta_string(&graph, &config), &config).expect("parse");
        let before = graph.find_node("x").expect("node");
        let after = reloaded.find_node("x").expect("node");
        assert_eq!(after.name, before.name);
        assert_eq!(after.attributes, before.attributes);
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("facts.ta");
        let config = FactConfig::default();

        let graph = from_ta_str(SAMPLE, &config).expect("parse");
        save_to_file(&graph, &path, &config).expect("save");
        let loaded = load_from_file(&path, &config).expect("load");

        assert_eq!(loaded.node_count(), graph.node_count());
        assert_eq!(loaded.edge_count(), graph.edge_count());
        assert_eq!(loaded.find_node("b").map(|n| n.kind), Some(NodeKind::Function));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_from_file(&dir.path().join("absent.ta"), &FactConfig::default());
        assert!(matches!(result, Err(FactError::Io { .. })));
    }
}
