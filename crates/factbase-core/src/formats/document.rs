//! # TA Document
//!
//! The intermediate form between TA text and a [`FactGraph`]. The parser
//! fills a document, the writer renders one; neither touches a store.
//! [`TaDocument::apply_to`] validates every tag before the first mutation,
//! so a document that fails to apply leaves the store untouched.

use crate::config::FactConfig;
use crate::graph::{FactGraph, ResolveReport};
use crate::primitives::LABEL_ATTRIBUTE;
use crate::types::{AttributeMap, Edge, EdgeKind, FactError, Node, NodeKind};
use std::collections::BTreeSet;

/// One relation of the tuple section, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    /// `(first, second)` tuples. Duplicates collapse.
    pub pairs: BTreeSet<(String, String)>,
    /// Line the relation was first seen on, 0 when built from a store.
    pub line: usize,
}

/// What an attribute block is attached to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum BlockTarget {
    Entity(String),
    /// Applies to every edge from the first id to the second, of any kind.
    Pair(String, String),
}

/// One `target { k = v ... }` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeBlock {
    pub target: BlockTarget,
    pub attributes: AttributeMap,
    pub line: usize,
}

/// Counters from applying a document to a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub nodes_added: usize,
    /// Entity tuples whose id was already registered.
    pub duplicate_nodes: usize,
    pub edges_added: usize,
    /// Edge tuples refused by the store (duplicates, self-containment).
    pub rejected_edges: usize,
    /// Attribute blocks, or values, whose target did not exist.
    pub missing_targets: usize,
    /// Filled in by the loaders that resolve after applying.
    pub resolution: ResolveReport,
}

/// Parsed, not yet applied, TA content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaDocument {
    relations: Vec<Relation>,
    blocks: Vec<AttributeBlock>,
}

impl TaDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tuple under `relation`, creating the relation on first use.
    pub fn add_tuple(&mut self, relation: &str, first: &str, second: &str, line: usize) {
        let pair = (first.to_string(), second.to_string());
        match self.relations.iter_mut().find(|r| r.name == relation) {
            Some(existing) => {
                existing.pairs.insert(pair);
            }
            None => self.relations.push(Relation {
                name: relation.to_string(),
                pairs: BTreeSet::from([pair]),
                line,
            }),
        }
    }

    /// Record an attribute block. Repeated targets are kept as separate
    /// blocks; applying them merges.
    pub fn add_block(&mut self, target: BlockTarget, attributes: AttributeMap, line: usize) {
        self.blocks.push(AttributeBlock {
            target,
            attributes,
            line,
        });
    }

    #[must_use]
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    #[must_use]
    pub fn blocks(&self) -> &[AttributeBlock] {
        &self.blocks
    }

    /// Total number of distinct tuples across relations.
    #[must_use]
    pub fn tuple_count(&self) -> usize {
        self.relations.iter().map(|r| r.pairs.len()).sum()
    }

    // =========================================================================
    // STORE -> DOCUMENT
    // =========================================================================

    /// Capture a store as a document.
    ///
    /// The entity relation comes first, followed by the edge relations in
    /// the order their first edge appears. Nodes whose name differs from
    /// their id get a `label` value carrying the name.
    #[must_use]
    pub fn from_graph(graph: &FactGraph, config: &FactConfig) -> Self {
        let mut doc = Self::new();

        for node in graph.nodes() {
            doc.add_tuple(&config.entity_relation, node.id(), node.kind.tag(), 0);
        }
        for edge in graph.edges() {
            doc.add_tuple(edge.kind().tag(), edge.source(), edge.dest(), 0);
        }

        for node in graph.nodes() {
            let mut attributes = node.attributes.clone();
            if node.name != node.id() {
                attributes.insert(LABEL_ATTRIBUTE, node.name.clone());
            }
            if !attributes.is_empty() {
                doc.add_block(BlockTarget::Entity(node.id().to_string()), attributes, 0);
            }
        }
        for edge in graph.edges().filter(|e| !e.attributes.is_empty()) {
            doc.add_block(
                BlockTarget::Pair(edge.source().to_string(), edge.dest().to_string()),
                edge.attributes.clone(),
                0,
            );
        }

        doc
    }

    // =========================================================================
    // DOCUMENT -> STORE
    // =========================================================================

    /// Materialize the document into `graph`.
    ///
    /// Tags are checked first; an unknown tag fails the call before any
    /// node or edge is inserted. Edges are inserted unresolved. Attribute
    /// blocks whose target is missing are counted and skipped.
    pub fn apply_to(
        &self,
        graph: &mut FactGraph,
        config: &FactConfig,
    ) -> Result<LoadReport, FactError> {
        let (nodes, edges) = self.typed_facts(config)?;
        let mut report = LoadReport::default();

        for mut node in nodes {
            if let Some(label) = self.label_for(node.id()) {
                node.name = label.to_string();
            }
            let id = node.id().to_string();
            match graph.add_node(node) {
                Ok(()) => report.nodes_added += 1,
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "duplicate node declaration ignored");
                    report.duplicate_nodes += 1;
                }
            }
        }

        for edge in edges {
            match graph.add_edge(edge) {
                Ok(()) => report.edges_added += 1,
                Err(e) => {
                    tracing::debug!(error = %e, "edge tuple rejected");
                    report.rejected_edges += 1;
                }
            }
        }

        for block in &self.blocks {
            report.missing_targets += apply_block(graph, block);
        }

        tracing::debug!(
            nodes = report.nodes_added,
            edges = report.edges_added,
            missing = report.missing_targets,
            "document applied"
        );
        Ok(report)
    }

    fn typed_facts(&self, config: &FactConfig) -> Result<(Vec<Node>, Vec<Edge>), FactError> {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        for relation in &self.relations {
            if relation.name == config.entity_relation {
                for (id, tag) in &relation.pairs {
                    let kind = NodeKind::from_tag(tag).ok_or_else(|| {
                        FactError::format(relation.line, format!("unknown node kind `{}`", tag))
                    })?;
                    nodes.push(Node::new(id.as_str(), id.as_str(), kind));
                }
            } else {
                let kind = EdgeKind::from_tag(&relation.name).ok_or_else(|| {
                    FactError::format(
                        relation.line,
                        format!("unknown relation `{}`", relation.name),
                    )
                })?;
                edges.extend(
                    relation
                        .pairs
                        .iter()
                        .map(|(source, dest)| Edge::new(source.as_str(), dest.as_str(), kind)),
                );
            }
        }

        Ok((nodes, edges))
    }

    fn label_for(&self, id: &str) -> Option<&str> {
        self.blocks
            .iter()
            .filter(|b| matches!(&b.target, BlockTarget::Entity(target) if target == id))
            .find_map(|b| b.attributes.get(LABEL_ATTRIBUTE).first())
            .map(String::as_str)
    }
}

/// Apply one block, returning how many targets were missing.
fn apply_block(graph: &mut FactGraph, block: &AttributeBlock) -> usize {
    match &block.target {
        BlockTarget::Entity(id) => {
            if !graph.contains_node(id) {
                tracing::warn!(line = block.line, id = %id, "attribute target node not found");
                return 1;
            }
            for (key, values) in block.attributes.iter() {
                if key == LABEL_ATTRIBUTE {
                    continue;
                }
                for value in values {
                    // Existence was checked above.
                    let _ = graph.add_node_attribute(id, key, value);
                }
            }
            0
        }
        BlockTarget::Pair(source, dest) => {
            let kinds: Vec<EdgeKind> = graph
                .edges_from_source(source, None)
                .into_iter()
                .filter(|e| e.dest() == dest)
                .map(Edge::kind)
                .collect();
            if kinds.is_empty() {
                tracing::warn!(
                    line = block.line,
                    source = %source,
                    dest = %dest,
                    "attribute target edge not found"
                );
                return 1;
            }
            for kind in kinds {
                for (key, values) in block.attributes.iter() {
                    for value in values {
                        let _ = graph.add_edge_attribute(source, dest, kind, key, value);
                    }
                }
            }
            0
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
