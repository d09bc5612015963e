//! # Fact Graph Store
//!
//! The in-memory fact base: exclusive owner of every node and edge.
//!
//! All data structures use `BTreeMap` for deterministic ordering.
//! Outside this module nodes and edges are addressed by id only; the store
//! never hands out mutable references, so every mutation passes through the
//! invariant checks below.
//!
//! ## Invariants
//!
//! - Exactly one node per id.
//! - At most one edge per `(source, dest, kind)`.
//! - No self-loop `Contains` edge.
//! - At most one incoming `Contains` edge per node (containment forest).
//!
//! The name and adjacency indices are derived data and can be recomputed
//! with [`FactGraph::rebuild_indices`].

use crate::hierarchy::ContainerLookup;
use crate::primitives::LABEL_ATTRIBUTE;
use crate::types::{Edge, EdgeKey, EdgeKind, FactError, Node};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// RESOLUTION REPORT
// =============================================================================

/// Outcome of [`FactGraph::resolve_references`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveReport {
    /// Edges left in the store, all of them bound to live nodes.
    pub resolved: usize,
    /// Edges dropped because an endpoint was missing.
    pub unresolved: usize,
}

// =============================================================================
// FACT GRAPH
// =============================================================================

/// The fact graph store.
#[derive(Debug, Clone, Default)]
pub struct FactGraph {
    /// Primary node storage: id -> Node
    nodes: BTreeMap<String, Node>,

    /// Primary edge storage: (source, dest, kind) -> Edge
    edges: BTreeMap<EdgeKey, Edge>,

    /// Display name -> ids carrying that name
    name_index: BTreeMap<String, BTreeSet<String>>,

    /// Source id -> keys of outgoing edges
    outgoing: BTreeMap<String, BTreeSet<EdgeKey>>,

    /// Dest id -> keys of incoming edges
    incoming: BTreeMap<String, BTreeSet<EdgeKey>>,
}

impl FactGraph {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Node mutation
    // -------------------------------------------------------------------------

    /// Register a node.
    ///
    /// Fails with `DuplicateId` if the id is taken; the rejected node is
    /// dropped and the store is unchanged.
    pub fn add_node(&mut self, node: Node) -> Result<(), FactError> {
        if self.nodes.contains_key(node.id()) {
            return Err(FactError::DuplicateId(node.id().to_string()));
        }
        self.register_node(node);
        Ok(())
    }

    /// Register a node without the duplicate check.
    ///
    /// For bulk loads where the caller guarantees unique ids. A node that
    /// does share an id replaces the old one.
    pub fn add_node_trusted(&mut self, node: Node) {
        if let Some(old) = self.nodes.remove(node.id()) {
            self.unindex_name(&old);
        }
        self.register_node(node);
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node_safe(&mut self, id: &str) -> Option<Node> {
        let node = self.remove_node_unsafe(id)?;

        let touching: BTreeSet<EdgeKey> = self
            .outgoing
            .get(id)
            .into_iter()
            .chain(self.incoming.get(id))
            .flatten()
            .cloned()
            .collect();
        for key in &touching {
            self.remove_edge_by_key(key);
        }

        Some(node)
    }

    /// Remove only the node entry.
    ///
    /// Edges that reference `id` stay in the store. The caller is
    /// responsible for removing them, or for a later
    /// [`resolve_references`](Self::resolve_references) pass over edges it
    /// marks unresolved.
    pub fn remove_node_unsafe(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        self.unindex_name(&node);
        Some(node)
    }

    /// Add an attribute value to a node. Re-adding a pair succeeds.
    ///
    /// `label` is reserved: setting it renames the node instead of storing
    /// a value.
    pub fn add_node_attribute(
        &mut self,
        id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), FactError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| FactError::MissingTarget(format!("node {}", id)))?;
        if key != LABEL_ATTRIBUTE {
            node.attributes.insert(key, value);
            return Ok(());
        }
        if node.name != value {
            if let Some(mut renamed) = self.nodes.remove(id) {
                self.unindex_name(&renamed);
                renamed.name = value.to_string();
                self.register_node(renamed);
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Edge mutation
    // -------------------------------------------------------------------------

    /// Register an edge.
    ///
    /// Rejects self-loop `Contains` edges and exact duplicates. A new
    /// `Contains` edge first evicts any existing `Contains` edge into the
    /// same destination.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), FactError> {
        if edge.is_self_containment() {
            return Err(FactError::StructuralViolation(format!(
                "{} cannot contain itself",
                edge.source()
            )));
        }
        if self.edges.contains_key(edge.key()) {
            let key = edge.key();
            return Err(FactError::DuplicateEdge {
                from: key.source.clone(),
                to: key.dest.clone(),
                kind: key.kind,
            });
        }
        self.register_edge(edge);
        Ok(())
    }

    /// Register an edge without the duplicate check.
    ///
    /// An edge with the same key is overwritten. The self-loop and
    /// single-parent rules still apply.
    pub fn add_edge_trusted(&mut self, edge: Edge) -> Result<(), FactError> {
        if edge.is_self_containment() {
            return Err(FactError::StructuralViolation(format!(
                "{} cannot contain itself",
                edge.source()
            )));
        }
        self.remove_edge_by_key(edge.key());
        self.register_edge(edge);
        Ok(())
    }

    /// Remove an edge from storage and both adjacency tables.
    pub fn remove_edge(&mut self, source: &str, dest: &str, kind: EdgeKind) -> Option<Edge> {
        self.remove_edge_by_key(&EdgeKey::new(source, dest, kind))
    }

    /// Add an attribute value to an edge. Re-adding a pair succeeds.
    pub fn add_edge_attribute(
        &mut self,
        source: &str,
        dest: &str,
        kind: EdgeKind,
        key: &str,
        value: &str,
    ) -> Result<(), FactError> {
        let edge = self
            .edges
            .get_mut(&EdgeKey::new(source, dest, kind))
            .ok_or_else(|| {
                FactError::MissingTarget(format!("edge {} -> {} ({})", source, dest, kind))
            })?;
        edge.attributes.insert(key, value);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes whose display name is `name`, ordered by id.
    #[must_use]
    pub fn find_nodes_by_name(&self, name: &str) -> Vec<&Node> {
        self.name_index
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    #[must_use]
    pub fn find_edge(&self, source: &str, dest: &str, kind: EdgeKind) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(source, dest, kind))
    }

    /// Edges leaving `id`, optionally restricted to one kind.
    #[must_use]
    pub fn edges_from_source(&self, id: &str, kind: Option<EdgeKind>) -> Vec<&Edge> {
        self.adjacent(self.outgoing.get(id), kind)
    }

    /// Edges arriving at `id`, optionally restricted to one kind.
    #[must_use]
    pub fn edges_to_dest(&self, id: &str, kind: Option<EdgeKind>) -> Vec<&Edge> {
        self.adjacent(self.incoming.get(id), kind)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges in `(source, dest, kind)` order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    // -------------------------------------------------------------------------
    // Bulk passes
    // -------------------------------------------------------------------------

    /// Bind every unresolved edge whose endpoints are both live; drop the rest.
    ///
    /// Dropped edges are counted, not reported as errors.
    pub fn resolve_references(&mut self) -> ResolveReport {
        let mut bind = Vec::new();
        let mut dangling = Vec::new();

        for (key, edge) in &self.edges {
            if edge.is_resolved() {
                continue;
            }
            if self.nodes.contains_key(&key.source) && self.nodes.contains_key(&key.dest) {
                bind.push(key.clone());
            } else {
                dangling.push(key.clone());
            }
        }

        for key in &bind {
            if let Some(edge) = self.edges.get_mut(key) {
                edge.mark_resolved();
            }
        }
        for key in &dangling {
            let reason = FactError::UnresolvedReference {
                from: key.source.clone(),
                to: key.dest.clone(),
                kind: key.kind,
            };
            tracing::debug!(%reason, "dropping edge");
            self.remove_edge_by_key(key);
        }

        let report = ResolveReport {
            resolved: self.edges.len(),
            unresolved: dangling.len(),
        };
        tracing::info!(
            resolved = report.resolved,
            unresolved = report.unresolved,
            "references resolved"
        );
        report
    }

    /// Link nodes to the container of their source file.
    ///
    /// Only nodes with exactly one value under `file_attribute` are
    /// considered; ambiguous attribution is never guessed. The container
    /// must be a live node. Returns the number of `FileContains` edges added.
    pub fn attach_to_containers<L>(&mut self, lookup: &L, file_attribute: &str) -> usize
    where
        L: ContainerLookup + ?Sized,
    {
        let mut pending = Vec::new();
        for node in self.nodes.values() {
            let [file] = node.attributes.get(file_attribute) else {
                continue;
            };
            let Some(container) = lookup.container_for(file) else {
                continue;
            };
            if container != node.id() && self.nodes.contains_key(&container) {
                pending.push(EdgeKey::new(container, node.id(), EdgeKind::FileContains));
            }
        }

        let mut added = 0usize;
        for key in pending {
            let mut edge = Edge::new(key.source, key.dest, key.kind);
            edge.mark_resolved();
            if self.add_edge(edge).is_ok() {
                added = added.saturating_add(1);
            }
        }
        tracing::debug!(added, "attached nodes to containers");
        added
    }

    /// Release every node and edge. The store stays usable.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.name_index.clear();
        self.outgoing.clear();
        self.incoming.clear();
    }

    /// Recompute the name and adjacency indices from primary storage.
    pub fn rebuild_indices(&mut self) {
        self.name_index.clear();
        self.outgoing.clear();
        self.incoming.clear();

        for node in self.nodes.values() {
            self.name_index
                .entry(node.name.clone())
                .or_default()
                .insert(node.id().to_string());
        }
        for key in self.edges.keys() {
            self.outgoing
                .entry(key.source.clone())
                .or_default()
                .insert(key.clone());
            self.incoming
                .entry(key.dest.clone())
                .or_default()
                .insert(key.clone());
        }
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn register_node(&mut self, mut node: Node) {
        take_label(&mut node);
        self.name_index
            .entry(node.name.clone())
            .or_default()
            .insert(node.id().to_string());
        self.nodes.insert(node.id().to_string(), node);
    }

    fn unindex_name(&mut self, node: &Node) {
        if let Some(ids) = self.name_index.get_mut(&node.name) {
            ids.remove(node.id());
            if ids.is_empty() {
                self.name_index.remove(&node.name);
            }
        }
    }

    fn register_edge(&mut self, edge: Edge) {
        if edge.kind() == EdgeKind::Contains {
            let parents: Vec<EdgeKey> = self
                .incoming
                .get(edge.dest())
                .into_iter()
                .flatten()
                .filter(|key| key.kind == EdgeKind::Contains)
                .cloned()
                .collect();
            for parent in &parents {
                self.remove_edge_by_key(parent);
            }
        }

        let key = edge.key().clone();
        self.outgoing
            .entry(key.source.clone())
            .or_default()
            .insert(key.clone());
        self.incoming
            .entry(key.dest.clone())
            .or_default()
            .insert(key.clone());
        self.edges.insert(key, edge);
    }

    fn remove_edge_by_key(&mut self, key: &EdgeKey) -> Option<Edge> {
        let edge = self.edges.remove(key)?;
        Self::unindex_edge(&mut self.outgoing, &key.source, key);
        Self::unindex_edge(&mut self.incoming, &key.dest, key);
        Some(edge)
    }

    fn unindex_edge(index: &mut BTreeMap<String, BTreeSet<EdgeKey>>, id: &str, key: &EdgeKey) {
        if let Some(keys) = index.get_mut(id) {
            keys.remove(key);
            if keys.is_empty() {
                index.remove(id);
            }
        }
    }

    fn adjacent(&self, keys: Option<&BTreeSet<EdgeKey>>, kind: Option<EdgeKind>) -> Vec<&Edge> {
        keys.into_iter()
            .flatten()
            .filter(|key| kind.is_none_or(|k| key.kind == k))
            .filter_map(|key| self.edges.get(key))
            .collect()
    }
}

// =============================================================================
// SERIALIZATION SUPPORT
// =============================================================================

/// Serializable representation of the store for snapshots.
///
/// Only primary storage is carried; indices are rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl From<&FactGraph> for SerializableGraph {
    fn from(graph: &FactGraph) -> Self {
        Self {
            nodes: graph.nodes.values().cloned().collect(),
            edges: graph.edges.values().cloned().collect(),
        }
    }
}

/// Move a stored `label` attribute into the node name. The first value wins.
fn take_label(node: &mut Node) {
    if let Some(label) = node.attributes.remove(LABEL_ATTRIBUTE).into_iter().next() {
        node.name = label;
    }
}

impl From<SerializableGraph> for FactGraph {
    fn from(sg: SerializableGraph) -> Self {
        let mut graph = FactGraph::new();

        for mut node in sg.nodes {
            take_label(&mut node);
            graph.nodes.insert(node.id().to_string(), node);
        }
        for edge in sg.edges {
            // Self containment is never stored, even from a snapshot.
            if !edge.is_self_containment() {
                graph.edges.insert(edge.key().clone(), edge);
            }
        }

        graph.rebuild_indices();
        graph
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;

    fn function(id: &str) -> Node {
        Node::new(id, id, NodeKind::Function)
    }

    fn contains(source: &str, dest: &str) -> Edge {
        Edge::new(source, dest, EdgeKind::Contains)
    }

    #[test]
    fn add_and_find_node() {
        let mut graph = FactGraph::new();
        graph.add_node(function("main.c[main]")).expect("insert");

        let node = graph.find_node("main.c[main]");
        assert_eq!(node.map(|n| n.kind), Some(NodeKind::Function));
        assert!(graph.find_node("absent").is_none());
    }

    #[test]
    fn duplicate_id_rejected_and_original_kept() {
        let mut graph = FactGraph::new();
        graph
            .add_node(Node::new("x", "first", NodeKind::Class))
            .expect("insert");

        let result = graph.add_node(Node::new("x", "second", NodeKind::Enum));
        assert!(matches!(result, Err(FactError::DuplicateId(id)) if id == "x"));

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.find_node("x").map(|n| n.name.as_str()), Some("first"));
        assert!(graph.find_nodes_by_name("second").is_empty());
    }

    #[test]
    fn label_attribute_renames_node() {
        let mut graph = FactGraph::new();
        let mut node = Node::new("x", "x", NodeKind::Class);
        node.attributes.insert("label", "Widget");
        node.attributes.insert("label", "Gadget");
        graph.add_node(node).expect("insert");

        let stored = graph.find_node("x").expect("node");
        assert_eq!(stored.name, "Widget");
        assert!(stored.attributes.get("label").is_empty());

        graph.add_node_attribute("x", "label", "Sprocket").expect("label");
        let stored = graph.find_node("x").expect("node");
        assert_eq!(stored.name, "Sprocket");
        assert!(stored.attributes.is_empty());
        assert!(graph.find_nodes_by_name("Widget").is_empty());
        assert_eq!(graph.find_nodes_by_name("Sprocket").len(), 1);
    }

    #[test]
    fn duplicate_edge_error_names_endpoints() {
        let mut graph = FactGraph::new();
        graph.add_edge(Edge::new("a", "b", EdgeKind::Calls)).expect("edge");
        let err = graph
            .add_edge(Edge::new("a", "b", EdgeKind::Calls))
            .expect_err("duplicate");
        assert_eq!(err.to_string(), "Duplicate edge: a -> b (call)");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn trusted_insert_replaces_and_reindexes() {
        let mut graph = FactGraph::new();
        graph.add_node_trusted(Node::new("x", "old", NodeKind::Class));
        graph.add_node_trusted(Node::new("x", "new", NodeKind::Class));

        assert_eq!(graph.node_count(), 1);
        assert!(graph.find_nodes_by_name("old").is_empty());
        assert_eq!(graph.find_nodes_by_name("new").len(), 1);
    }

    #[test]
    fn names_are_not_unique() {
        let mut graph = FactGraph::new();
        graph
            .add_node(Node::new("a.c[init]", "init", NodeKind::Function))
            .expect("insert");
        graph
            .add_node(Node::new("b.c[init]", "init", NodeKind::Function))
            .expect("insert");

        let ids: Vec<_> = graph
            .find_nodes_by_name("init")
            .into_iter()
            .map(|n| n.id())
            .collect();
        assert_eq!(ids, vec!["a.c[init]", "b.c[init]"]);
    }

    #[test]
    fn name_index_removes_exactly_the_target() {
        let mut graph = FactGraph::new();
        graph
            .add_node(Node::new("a", "shared", NodeKind::Function))
            .expect("insert");
        graph
            .add_node(Node::new("b", "shared", NodeKind::Function))
            .expect("insert");

        graph.remove_node_unsafe("a");

        let ids: Vec<_> = graph
            .find_nodes_by_name("shared")
            .into_iter()
            .map(|n| n.id())
            .collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn duplicate_edge_is_noop() {
        let mut graph = FactGraph::new();
        graph
            .add_edge(Edge::new("a", "b", EdgeKind::Calls))
            .expect("edge");
        let again = graph.add_edge(Edge::new("a", "b", EdgeKind::Calls));

        assert!(matches!(again, Err(FactError::DuplicateEdge { .. })));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges_from_source("a", None).len(), 1);
    }

    #[test]
    fn same_pair_different_kinds_coexist() {
        let mut graph = FactGraph::new();
        graph
            .add_edge(Edge::new("a", "b", EdgeKind::Calls))
            .expect("edge");
        graph
            .add_edge(Edge::new("a", "b", EdgeKind::References))
            .expect("edge");

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(
            graph.edges_from_source("a", Some(EdgeKind::Calls)).len(),
            1
        );
    }

    #[test]
    fn self_containment_rejected_everywhere() {
        let mut graph = FactGraph::new();
        let result = graph.add_edge(contains("a", "a"));
        assert!(matches!(result, Err(FactError::StructuralViolation(_))));

        let trusted = graph.add_edge_trusted(contains("a", "a"));
        assert!(trusted.is_err());

        assert_eq!(graph.edge_count(), 0);
        assert!(graph.edges_from_source("a", None).is_empty());
        assert!(graph.edges_to_dest("a", None).is_empty());
    }

    #[test]
    fn self_call_is_allowed() {
        let mut graph = FactGraph::new();
        graph
            .add_edge(Edge::new("fib", "fib", EdgeKind::Calls))
            .expect("recursion is a legal call edge");
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn new_parent_replaces_old_parent() {
        let mut graph = FactGraph::new();
        graph.add_edge(contains("a", "b")).expect("edge");
        graph.add_edge(contains("c", "b")).expect("edge");

        let parents: Vec<_> = graph
            .edges_to_dest("b", Some(EdgeKind::Contains))
            .into_iter()
            .map(|e| e.source())
            .collect();
        assert_eq!(parents, vec!["c"]);
        assert!(graph.edges_from_source("a", None).is_empty());
    }

    #[test]
    fn single_parent_rule_ignores_other_kinds() {
        let mut graph = FactGraph::new();
        graph
            .add_edge(Edge::new("a", "b", EdgeKind::FileContains))
            .expect("edge");
        graph.add_edge(contains("c", "b")).expect("edge");

        assert_eq!(graph.edges_to_dest("b", None).len(), 2);
    }

    #[test]
    fn remove_edge_updates_both_indices() {
        let mut graph = FactGraph::new();
        graph
            .add_edge(Edge::new("a", "b", EdgeKind::Calls))
            .expect("edge");

        let removed = graph.remove_edge("a", "b", EdgeKind::Calls);
        assert!(removed.is_some());
        assert!(graph.edges_from_source("a", None).is_empty());
        assert!(graph.edges_to_dest("b", None).is_empty());
        assert!(graph.remove_edge("a", "b", EdgeKind::Calls).is_none());
    }

    #[test]
    fn safe_removal_cascades() {
        let mut graph = FactGraph::new();
        for id in ["a", "b", "c"] {
            graph.add_node(function(id)).expect("insert");
        }
        graph
            .add_edge(Edge::new("a", "b", EdgeKind::Calls))
            .expect("edge");
        graph
            .add_edge(Edge::new("b", "c", EdgeKind::Calls))
            .expect("edge");

        let removed = graph.remove_node_safe("b");
        assert!(removed.is_some());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.edges_from_source("a", None).is_empty());
        assert!(graph.edges_to_dest("c", None).is_empty());
    }

    #[test]
    fn unsafe_removal_keeps_edges() {
        let mut graph = FactGraph::new();
        for id in ["a", "b"] {
            graph.add_node(function(id)).expect("insert");
        }
        graph
            .add_edge(Edge::new("a", "b", EdgeKind::Calls))
            .expect("edge");

        graph.remove_node_unsafe("b");
        assert!(!graph.contains_node("b"));
        assert!(graph.find_edge("a", "b", EdgeKind::Calls).is_some());
    }

    #[test]
    fn attribute_on_missing_target_fails() {
        let mut graph = FactGraph::new();
        let node = graph.add_node_attribute("ghost", "k", "v");
        assert!(matches!(node, Err(FactError::MissingTarget(_))));

        let edge = graph.add_edge_attribute("a", "b", EdgeKind::Calls, "k", "v");
        assert!(matches!(edge, Err(FactError::MissingTarget(_))));
    }

    #[test]
    fn attribute_addition_is_idempotent() {
        let mut graph = FactGraph::new();
        graph.add_node(function("f")).expect("insert");
        graph.add_node_attribute("f", "k", "v").expect("first");
        graph.add_node_attribute("f", "k", "v").expect("second");

        let values = graph.find_node("f").map(|n| n.attributes.get("k").len());
        assert_eq!(values, Some(1));
    }

    #[test]
    fn edge_attributes_are_kind_specific() {
        let mut graph = FactGraph::new();
        graph
            .add_edge(Edge::new("a", "b", EdgeKind::Calls))
            .expect("edge");
        graph
            .add_edge_attribute("a", "b", EdgeKind::Calls, "count", "3")
            .expect("attr");
        assert!(graph
            .add_edge_attribute("a", "b", EdgeKind::References, "count", "3")
            .is_err());
    }

    #[test]
    fn resolve_binds_and_drops() {
        let mut graph = FactGraph::new();
        graph.add_node(function("x")).expect("insert");
        graph.add_node(function("z")).expect("insert");
        graph
            .add_edge(Edge::new("x", "y", EdgeKind::Calls))
            .expect("edge");
        graph
            .add_edge(Edge::new("x", "z", EdgeKind::Calls))
            .expect("edge");

        let report = graph.resolve_references();
        assert_eq!(report.unresolved, 1);
        assert_eq!(report.resolved, 1);
        assert!(graph.find_edge("x", "y", EdgeKind::Calls).is_none());
        assert!(graph.edges_to_dest("y", None).is_empty());
        assert_eq!(
            graph
                .find_edge("x", "z", EdgeKind::Calls)
                .map(Edge::is_resolved),
            Some(true)
        );
    }

    #[test]
    fn resolve_skips_already_resolved_edges() {
        let mut graph = FactGraph::new();
        let a = function("a");
        let b = function("b");
        let edge = Edge::between(&a, &b, EdgeKind::Calls);
        graph.add_node(a).expect("insert");
        graph.add_node(b).expect("insert");
        graph.add_edge(edge).expect("edge");

        // A resolved edge survives even after its endpoint goes away.
        graph.remove_node_unsafe("b");
        let report = graph.resolve_references();
        assert_eq!(report, ResolveReport { resolved: 1, unresolved: 0 });
    }

    #[test]
    fn attach_requires_exactly_one_file() {
        let mut graph = FactGraph::new();
        graph
            .add_node(Node::new("src/a.c", "a.c", NodeKind::File))
            .expect("insert");

        let mut single = function("src/a.c[f]");
        single.attributes.insert("filename", "src/a.c");
        let mut double = function("src/a.c[g]");
        double.attributes.insert("filename", "src/a.c");
        double.attributes.insert("filename", "src/b.c");
        let none = function("src/a.c[h]");

        for node in [single, double, none] {
            graph.add_node(node).expect("insert");
        }

        let lookup = |path: &str| Some(path.to_string());
        let added = graph.attach_to_containers(&lookup, "filename");

        assert_eq!(added, 1);
        assert!(graph
            .find_edge("src/a.c", "src/a.c[f]", EdgeKind::FileContains)
            .is_some());
        assert!(graph
            .find_edge("src/a.c", "src/a.c[g]", EdgeKind::FileContains)
            .is_none());
    }

    #[test]
    fn attach_skips_missing_container() {
        let mut graph = FactGraph::new();
        let mut node = function("f");
        node.attributes.insert("filename", "nowhere.c");
        graph.add_node(node).expect("insert");

        let lookup = |path: &str| Some(path.to_string());
        assert_eq!(graph.attach_to_containers(&lookup, "filename"), 0);
    }

    #[test]
    fn clear_leaves_reusable_store() {
        let mut graph = FactGraph::new();
        graph.add_node(function("a")).expect("insert");
        graph
            .add_edge(Edge::new("a", "b", EdgeKind::Calls))
            .expect("edge");

        graph.clear();
        assert!(graph.is_empty());
        assert!(graph.find_nodes_by_name("a").is_empty());

        graph.add_node(function("a")).expect("reinsert after clear");
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn snapshot_roundtrip_rebuilds_indices() {
        let mut graph = FactGraph::new();
        graph.add_node(function("a")).expect("insert");
        graph.add_node(function("b")).expect("insert");
        graph.add_edge(contains("a", "b")).expect("edge");
        graph.add_node_attribute("a", "k", "v").expect("attr");

        let restored = FactGraph::from(SerializableGraph::from(&graph));

        assert_eq!(restored.node_count(), 2);
        assert_eq!(restored.find_nodes_by_name("a").len(), 1);
        assert_eq!(restored.edges_to_dest("b", Some(EdgeKind::Contains)).len(), 1);
        assert_eq!(
            restored.find_node("a").map(|n| n.attributes.get("k").len()),
            Some(1)
        );
    }
}
