//! # Core Type Definitions
//!
//! This module contains all core types for the Factbase fact graph:
//! - Closed kind tables (`NodeKind`, `EdgeKind`) with their TA text tags
//! - Multi-valued attribute storage (`AttributeMap`)
//! - Graph entities (`Node`, `Edge`, `EdgeKey`)
//! - Error types (`FactError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` where they are used as `BTreeMap`/`BTreeSet` keys
//! - Iterate in a stable order (sorted keys, insertion-ordered values)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// NODE KIND
// =============================================================================

/// The closed set of node kinds a fact base can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Subsystem,
    Class,
    Function,
    Variable,
    Enum,
}

impl NodeKind {
    /// Every node kind, in declaration order.
    pub const ALL: [NodeKind; 6] = [
        NodeKind::File,
        NodeKind::Subsystem,
        NodeKind::Class,
        NodeKind::Function,
        NodeKind::Variable,
        NodeKind::Enum,
    ];

    /// The tag written into the entity relation for this kind.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            NodeKind::File => "cFile",
            NodeKind::Subsystem => "cSubSystem",
            NodeKind::Class => "cClass",
            NodeKind::Function => "cFunction",
            NodeKind::Variable => "cObject",
            NodeKind::Enum => "cEnum",
        }
    }

    /// Look up a kind by its tag.
    ///
    /// Accepts the canonical tags plus the plain lowercase aliases other
    /// extractors emit (`file`, `function`, `object`, ...).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "cFile" | "file" => Some(NodeKind::File),
            "cSubSystem" | "subsystem" => Some(NodeKind::Subsystem),
            "cClass" | "class" => Some(NodeKind::Class),
            "cFunction" | "function" => Some(NodeKind::Function),
            "cObject" | "object" | "variable" => Some(NodeKind::Variable),
            "cEnum" | "enum" => Some(NodeKind::Enum),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// =============================================================================
// EDGE KIND
// =============================================================================

/// The closed set of relation kinds between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Structural parent -> child. Subject to the single-parent rule.
    Contains,
    /// Container -> declared entity, produced by hierarchy attachment.
    FileContains,
    Calls,
    References,
    Inherits,
}

impl EdgeKind {
    /// Every edge kind, in declaration order.
    pub const ALL: [EdgeKind; 5] = [
        EdgeKind::Contains,
        EdgeKind::FileContains,
        EdgeKind::Calls,
        EdgeKind::References,
        EdgeKind::Inherits,
    ];

    /// The relation name used for this kind in the TA format.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            EdgeKind::Contains => "contain",
            EdgeKind::FileContains => "fileContain",
            EdgeKind::Calls => "call",
            EdgeKind::References => "reference",
            EdgeKind::Inherits => "inherit",
        }
    }

    /// Look up a kind by its relation name.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        EdgeKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// =============================================================================
// ATTRIBUTE MAP
// =============================================================================

/// Multi-valued key -> values storage for nodes and edges.
///
/// Values under a key are duplicate-free and keep insertion order.
/// Keys iterate in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl AttributeMap {
    /// Create an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value under a key.
    ///
    /// Returns `true` if the value was new. Adding an existing pair is a
    /// no-op and is not an error.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let value = value.into();
        let values = self.entries.entry(key.into()).or_default();
        if values.contains(&value) {
            return false;
        }
        values.push(value);
        true
    }

    /// All values stored under `key`, in insertion order.
    #[must_use]
    pub fn get(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check whether `(key, value)` is present.
    #[must_use]
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.get(key).iter().any(|v| v == value)
    }

    /// Remove every value under `key`, returning them.
    pub fn remove(&mut self, key: &str) -> Vec<String> {
        self.entries.remove(key).unwrap_or_default()
    }

    /// Iterate `(key, values)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A declared entity of the analysed system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    id: String,
    /// Display label. Not unique.
    pub name: String,
    pub kind: NodeKind,
    pub attributes: AttributeMap,
}

impl Node {
    /// Create a node with no attributes.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            attributes: AttributeMap::new(),
        }
    }

    /// The node id. Immutable after creation.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// Identity of an edge: `(source, dest, kind)`.
///
/// Ordered so the writer can iterate pairs lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub source: String,
    pub dest: String,
    pub kind: EdgeKind,
}

impl EdgeKey {
    #[must_use]
    pub fn new(source: impl Into<String>, dest: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            kind,
        }
    }
}

/// A directed, typed relation between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    key: EdgeKey,
    resolved: bool,
    pub attributes: AttributeMap,
}

impl Edge {
    /// Create an edge whose endpoints have not been bound yet.
    ///
    /// Used when re-hydrating from text, where nodes may be declared
    /// after the edges that mention them.
    #[must_use]
    pub fn new(source: impl Into<String>, dest: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            key: EdgeKey::new(source, dest, kind),
            resolved: false,
            attributes: AttributeMap::new(),
        }
    }

    /// Create an edge between two live nodes. Already resolved.
    #[must_use]
    pub fn between(source: &Node, dest: &Node, kind: EdgeKind) -> Self {
        Self {
            key: EdgeKey::new(source.id(), dest.id(), kind),
            resolved: true,
            attributes: AttributeMap::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &EdgeKey {
        &self.key
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.key.source
    }

    #[must_use]
    pub fn dest(&self) -> &str {
        &self.key.dest
    }

    #[must_use]
    pub fn kind(&self) -> EdgeKind {
        self.key.kind
    }

    /// Whether both endpoints have been bound to live nodes.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    /// A self-loop `Contains` edge can never be part of a containment forest.
    #[must_use]
    pub fn is_self_containment(&self) -> bool {
        self.key.kind == EdgeKind::Contains && self.key.source == self.key.dest
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Factbase system.
///
/// `DuplicateId`, `DuplicateEdge`, `StructuralViolation` and `MissingTarget`
/// are recoverable: the rejected operation had no effect and the caller may
/// continue. `Format` and `Io` abort the load or save they came from.
#[derive(Debug, Error)]
pub enum FactError {
    /// A node with this id is already registered.
    #[error("Duplicate node id: {0}")]
    DuplicateId(String),

    /// An identical `(source, dest, kind)` edge already exists.
    #[error("Duplicate edge: {from} -> {to} ({kind})")]
    DuplicateEdge {
        from: String,
        to: String,
        kind: EdgeKind,
    },

    /// The edge would break a structural invariant.
    #[error("Structural violation: {0}")]
    StructuralViolation(String),

    /// An edge endpoint does not name a live node.
    #[error("Unresolved reference: {from} -> {to} ({kind})")]
    UnresolvedReference {
        from: String,
        to: String,
        kind: EdgeKind,
    },

    /// An attribute addition referenced a node or edge that does not exist.
    #[error("Missing target: {0}")]
    MissingTarget(String),

    /// The TA input violates the grammar.
    #[error("Format error on line {line}: {message}")]
    Format { line: usize, message: String },

    /// A file could not be opened, read or written.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// A snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FactError {
    /// Shorthand for a format error at `line`.
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }

    /// Shorthand for an I/O error on `path`.
    pub fn io(path: &std::path::Path, err: impl fmt::Display) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_tags_roundtrip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(NodeKind::from_tag("object"), Some(NodeKind::Variable));
        assert_eq!(NodeKind::from_tag("cWidget"), None);
    }

    #[test]
    fn edge_kind_tags_roundtrip() {
        for kind in EdgeKind::ALL {
            assert_eq!(EdgeKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(EdgeKind::from_tag("includes"), None);
    }

    #[test]
    fn attribute_insert_is_idempotent() {
        let mut attrs = AttributeMap::new();
        assert!(attrs.insert("signature", "int foo()"));
        assert!(!attrs.insert("signature", "int foo()"));
        assert_eq!(attrs.get("signature"), ["int foo()".to_string()]);
    }

    #[test]
    fn attribute_values_keep_insertion_order() {
        let mut attrs = AttributeMap::new();
        attrs.insert("k", "zeta");
        attrs.insert("k", "alpha");
        attrs.insert("k", "mid");
        assert_eq!(attrs.get("k"), ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn attribute_missing_key_is_empty() {
        let attrs = AttributeMap::new();
        assert!(attrs.get("absent").is_empty());
        assert!(!attrs.contains("absent", "x"));
    }

    #[test]
    fn edge_errors_display_endpoints() {
        let err = FactError::UnresolvedReference {
            from: "main".into(),
            to: "printf".into(),
            kind: EdgeKind::Calls,
        };
        assert_eq!(err.to_string(), "Unresolved reference: main -> printf (call)");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn self_containment_detected() {
        assert!(Edge::new("a", "a", EdgeKind::Contains).is_self_containment());
        assert!(!Edge::new("a", "a", EdgeKind::Calls).is_self_containment());
        assert!(!Edge::new("a", "b", EdgeKind::Contains).is_self_containment());
    }

    #[test]
    fn edge_between_live_nodes_is_resolved() {
        let a = Node::new("a", "a", NodeKind::Function);
        let b = Node::new("b", "b", NodeKind::Function);
        assert!(Edge::between(&a, &b, EdgeKind::Calls).is_resolved());
        assert!(!Edge::new("a", "b", EdgeKind::Calls).is_resolved());
    }
}
