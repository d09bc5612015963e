//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::{Direction, OutputFormat};
use factbase_core::{
    Edge, EdgeKind, FactConfig, FactError, FactGraph, FactProducer, FactRecord, FileHierarchy,
    LoadReport, Node, NodeKind, RecordProducer, graph_from_bytes, graph_to_bytes, load_into,
    primitives::{MAX_SNAPSHOT_SIZE, SNAPSHOT_MAGIC},
    save_to_file,
};
use std::collections::BTreeMap;
use std::io::Read as _;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a JSON record file (100 MB).
const MAX_RECORDS_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), FactError> {
    let metadata = std::fs::metadata(path).map_err(|e| FactError::io(path, e))?;

    if metadata.len() > max_size {
        return Err(FactError::io(
            path,
            format!(
                "file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                max_size
            ),
        ));
    }
    Ok(())
}

/// Resolve an input path and make sure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, FactError> {
    let canonical = path.canonicalize().map_err(|e| FactError::io(path, e))?;

    if !canonical.is_file() {
        return Err(FactError::io(path, "not a regular file"));
    }

    Ok(canonical)
}

/// Resolve an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, FactError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| FactError::io(parent, e))?;
    if !canonical_parent.is_dir() {
        return Err(FactError::io(parent, "not a directory"));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| FactError::io(path, "output path has no file name"))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Load a [`FactConfig`] from TOML, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<FactConfig, FactError> {
    let Some(path) = path else {
        return Ok(FactConfig::default());
    };
    let validated = validate_file_path(path)?;
    let text = std::fs::read_to_string(&validated).map_err(|e| FactError::io(path, e))?;
    let config: FactConfig = toml::from_str(&text)
        .map_err(|e| FactError::Config(format!("{}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), ?config, "configuration loaded");
    Ok(config)
}

// =============================================================================
// LOADING AND SAVING
// =============================================================================

/// How `query` picks its nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelector {
    Id(String),
    Name(String),
}

/// Whether `path` starts with the snapshot magic.
fn is_snapshot(path: &Path) -> Result<bool, FactError> {
    let mut magic = [0u8; 4];
    let mut file = std::fs::File::open(path).map_err(|e| FactError::io(path, e))?;
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(&magic == SNAPSHOT_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(FactError::io(path, e)),
    }
}

/// Load a fact base from TA text or a snapshot.
///
/// The report is `None` for snapshots, which are loaded wholesale.
pub fn load_graph(
    path: &Path,
    config: &FactConfig,
) -> Result<(FactGraph, Option<LoadReport>), FactError> {
    let validated = validate_file_path(path)?;

    if is_snapshot(&validated)? {
        validate_file_size(&validated, MAX_SNAPSHOT_SIZE as u64)?;
        let bytes = std::fs::read(&validated).map_err(|e| FactError::io(path, e))?;
        let graph = graph_from_bytes(&bytes)?;
        tracing::info!(path = %path.display(), nodes = graph.node_count(), "snapshot loaded");
        return Ok((graph, None));
    }

    let mut graph = FactGraph::new();
    let report = load_into(&mut graph, &validated, config)?;
    Ok((graph, Some(report)))
}

/// Write a fact base in the requested format.
pub fn store_graph(
    graph: &FactGraph,
    path: &Path,
    config: &FactConfig,
    format: OutputFormat,
) -> Result<(), FactError> {
    let validated = validate_output_path(path)?;
    match format {
        OutputFormat::Ta => save_to_file(graph, &validated, config),
        OutputFormat::Snapshot => {
            let bytes = graph_to_bytes(graph)?;
            std::fs::write(&validated, &bytes).map_err(|e| FactError::io(path, e))?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), "snapshot written");
            Ok(())
        }
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn report_json(report: Option<&LoadReport>) -> serde_json::Value {
    match report {
        Some(r) => serde_json::json!({
            "nodes_added": r.nodes_added,
            "duplicate_nodes": r.duplicate_nodes,
            "edges_added": r.edges_added,
            "rejected_edges": r.rejected_edges,
            "missing_targets": r.missing_targets,
            "resolved": r.resolution.resolved,
            "unresolved": r.resolution.unresolved,
        }),
        None => serde_json::Value::Null,
    }
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Parse a fact base and report what loading it did.
pub fn cmd_check(path: &Path, config: &FactConfig, json_mode: bool) -> Result<(), FactError> {
    let (graph, report) = load_graph(path, config)?;

    if json_mode {
        print_json(&serde_json::json!({
            "file": path.to_string_lossy(),
            "valid": true,
            "node_count": graph.node_count(),
            "edge_count": graph.edge_count(),
            "load": report_json(report.as_ref()),
        }));
        return Ok(());
    }

    println!("{}: OK", path.display());
    println!("Nodes: {}", graph.node_count());
    println!("Edges: {}", graph.edge_count());
    if let Some(r) = report {
        println!();
        println!("Duplicate node declarations: {}", r.duplicate_nodes);
        println!("Rejected edges:              {}", r.rejected_edges);
        println!("Dropped references:          {}", r.resolution.unresolved);
        println!("Missing attribute targets:   {}", r.missing_targets);
    }

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Count nodes and edges per kind tag.
pub fn kind_counts(
    graph: &FactGraph,
) -> (BTreeMap<&'static str, usize>, BTreeMap<&'static str, usize>) {
    let mut nodes: BTreeMap<&'static str, usize> =
        NodeKind::ALL.iter().map(|k| (k.tag(), 0)).collect();
    let mut edges: BTreeMap<&'static str, usize> =
        EdgeKind::ALL.iter().map(|k| (k.tag(), 0)).collect();

    for node in graph.nodes() {
        *nodes.entry(node.kind.tag()).or_default() += 1;
    }
    for edge in graph.edges() {
        *edges.entry(edge.kind().tag()).or_default() += 1;
    }
    (nodes, edges)
}

/// Show fact base status.
pub fn cmd_status(path: &Path, config: &FactConfig, json_mode: bool) -> Result<(), FactError> {
    let (graph, _) = load_graph(path, config)?;
    let (nodes, edges) = kind_counts(&graph);

    if json_mode {
        print_json(&serde_json::json!({
            "file": path.to_string_lossy(),
            "entity_relation": config.entity_relation,
            "node_count": graph.node_count(),
            "edge_count": graph.edge_count(),
            "nodes_by_kind": nodes,
            "edges_by_relation": edges,
        }));
        return Ok(());
    }

    println!("Factbase Status");
    println!("===============");
    println!("File: {}", path.display());
    println!();
    println!("Nodes: {}", graph.node_count());
    for (tag, count) in &nodes {
        println!("  {:<12} {}", tag, count);
    }
    println!("Edges: {}", graph.edge_count());
    for (tag, count) in &edges {
        println!("  {:<12} {}", tag, count);
    }

    Ok(())
}

// =============================================================================
// QUERY COMMAND
// =============================================================================

fn edge_json(edge: &Edge) -> serde_json::Value {
    serde_json::json!({
        "source": edge.source(),
        "dest": edge.dest(),
        "relation": edge.kind().tag(),
        "attributes": edge.attributes,
    })
}

fn print_edge(edge: &Edge) {
    println!("    {} -[{}]-> {}", edge.source(), edge.kind(), edge.dest());
    for (key, values) in edge.attributes.iter() {
        println!("      {} = {}", key, values.join(" "));
    }
}

/// Look up nodes and list their edges.
pub fn cmd_query(
    path: &Path,
    config: &FactConfig,
    json_mode: bool,
    selector: &NodeSelector,
    direction: Direction,
    relation: Option<EdgeKind>,
) -> Result<(), FactError> {
    let (graph, _) = load_graph(path, config)?;

    let matches: Vec<&Node> = match selector {
        NodeSelector::Id(id) => graph.find_node(id).into_iter().collect(),
        NodeSelector::Name(name) => graph.find_nodes_by_name(name),
    };

    let show_out = matches!(direction, Direction::Out | Direction::Both);
    let show_in = matches!(direction, Direction::In | Direction::Both);

    if json_mode {
        let results: Vec<serde_json::Value> = matches
            .iter()
            .map(|node| {
                let outgoing: Vec<_> = if show_out {
                    graph
                        .edges_from_source(node.id(), relation)
                        .into_iter()
                        .map(edge_json)
                        .collect()
                } else {
                    Vec::new()
                };
                let incoming: Vec<_> = if show_in {
                    graph
                        .edges_to_dest(node.id(), relation)
                        .into_iter()
                        .map(edge_json)
                        .collect()
                } else {
                    Vec::new()
                };
                serde_json::json!({
                    "id": node.id(),
                    "name": node.name,
                    "kind": node.kind.tag(),
                    "attributes": node.attributes,
                    "outgoing": outgoing,
                    "incoming": incoming,
                })
            })
            .collect();
        print_json(&serde_json::json!({ "matches": results }));
        return Ok(());
    }

    if matches.is_empty() {
        println!("No node matches {:?}", selector);
        return Ok(());
    }

    for node in matches {
        println!("{} ({}) [{}]", node.id(), node.name, node.kind.tag());
        for (key, values) in node.attributes.iter() {
            println!("  {} = {}", key, values.join(" "));
        }
        if show_out {
            println!("  outgoing:");
            for edge in graph.edges_from_source(node.id(), relation) {
                print_edge(edge);
            }
        }
        if show_in {
            println!("  incoming:");
            for edge in graph.edges_to_dest(node.id(), relation) {
                print_edge(edge);
            }
        }
    }

    Ok(())
}

// =============================================================================
// INGEST COMMAND
// =============================================================================

/// Read a JSON array of [`FactRecord`]s.
pub fn read_records(path: &Path) -> Result<Vec<FactRecord>, FactError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_RECORDS_FILE_SIZE)?;

    let contents = std::fs::read(&validated).map_err(|e| FactError::io(path, e))?;
    serde_json::from_slice(&contents)
        .map_err(|e| FactError::Serialization(format!("{}: {}", path.display(), e)))
}

/// Replay records into a fact base and write the result.
pub fn cmd_ingest(
    records: &Path,
    base: Option<&Path>,
    output: &Path,
    config: &FactConfig,
    json_mode: bool,
    hierarchy: bool,
    format: OutputFormat,
) -> Result<(), FactError> {
    tracing::info!(records = %records.display(), "ingesting records");

    let mut producer = RecordProducer::new(read_records(records)?);
    let mut graph = match base {
        Some(path) => load_graph(path, config)?.0,
        None => FactGraph::new(),
    };

    let produced = producer.produce(&mut graph)?;

    let attached = if hierarchy {
        let index = FileHierarchy::from_graph(&graph, config).install(&mut graph, config);
        graph.attach_to_containers(&index, &config.file_attribute)
    } else {
        0
    };
    let resolution = graph.resolve_references();

    store_graph(&graph, output, config, format)?;

    if json_mode {
        print_json(&serde_json::json!({
            "accepted": produced.accepted,
            "rejected": produced.rejected,
            "attached": attached,
            "dropped_references": resolution.unresolved,
            "node_count": graph.node_count(),
            "edge_count": graph.edge_count(),
            "output": output.to_string_lossy(),
        }));
        return Ok(());
    }

    println!(
        "Replayed {} records ({} accepted, {} rejected)",
        producer.len(),
        produced.accepted,
        produced.rejected
    );
    if hierarchy {
        println!("Attached {} nodes to containers", attached);
    }
    println!(
        "Fact base now has {} nodes, {} edges ({} dangling references dropped)",
        graph.node_count(),
        graph.edge_count(),
        resolution.unresolved
    );
    println!("Written to {}", output.display());

    Ok(())
}

// =============================================================================
// CONVERT COMMAND
// =============================================================================

/// Convert between TA text and snapshots.
pub fn cmd_convert(
    input: &Path,
    output: &Path,
    config: &FactConfig,
    json_mode: bool,
    format: OutputFormat,
) -> Result<(), FactError> {
    let (graph, _) = load_graph(input, config)?;
    store_graph(&graph, output, config, format)?;

    if json_mode {
        print_json(&serde_json::json!({
            "input": input.to_string_lossy(),
            "output": output.to_string_lossy(),
            "format": format!("{:?}", format).to_lowercase(),
            "node_count": graph.node_count(),
            "edge_count": graph.edge_count(),
        }));
        return Ok(());
    }

    println!(
        "Converted {} nodes, {} edges: {} -> {}",
        graph.node_count(),
        graph.edge_count(),
        input.display(),
        output.display()
    );

    Ok(())
}
