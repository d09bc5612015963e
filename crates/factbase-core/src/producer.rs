//! # Fact Producers
//!
//! The seam between an extractor and the store. Extractors emit create and
//! attribute requests through a [`FactSink`]; every request may be refused,
//! and the extractor learns of it from the `bool` result.
//!
//! [`RecordProducer`] replays pre-recorded requests, which is how the CLI
//! ingests extractor output delivered as JSON.

use crate::graph::FactGraph;
use crate::types::{Edge, EdgeKind, FactError, Node, NodeKind};
use serde::{Deserialize, Serialize};

/// What an attribute request is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeTarget {
    Node(String),
    Edge {
        source: String,
        dest: String,
        kind: EdgeKind,
    },
}

/// Receiver of extraction requests.
pub trait FactSink {
    /// Create a node. `false` when the id is already taken.
    fn create_node(&mut self, id: &str, name: &str, kind: NodeKind) -> bool;

    /// Create an edge. `false` for duplicates and self-containment.
    fn create_edge(&mut self, source: &str, dest: &str, kind: EdgeKind) -> bool;

    /// Attach `key = value`. `false` when the target does not exist.
    fn set_attribute(&mut self, target: &AttributeTarget, key: &str, value: &str) -> bool;
}

impl FactSink for FactGraph {
    fn create_node(&mut self, id: &str, name: &str, kind: NodeKind) -> bool {
        self.add_node(Node::new(id, name, kind)).is_ok()
    }

    fn create_edge(&mut self, source: &str, dest: &str, kind: EdgeKind) -> bool {
        let mut edge = Edge::new(source, dest, kind);
        if self.contains_node(source) && self.contains_node(dest) {
            edge.mark_resolved();
        }
        self.add_edge(edge).is_ok()
    }

    fn set_attribute(&mut self, target: &AttributeTarget, key: &str, value: &str) -> bool {
        match target {
            AttributeTarget::Node(id) => self.add_node_attribute(id, key, value).is_ok(),
            AttributeTarget::Edge { source, dest, kind } => self
                .add_edge_attribute(source, dest, *kind, key, value)
                .is_ok(),
        }
    }
}

/// Counts of accepted and refused requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProduceReport {
    pub accepted: usize,
    pub rejected: usize,
}

impl ProduceReport {
    fn record(&mut self, accepted: bool) {
        if accepted {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
    }
}

/// Anything that can feed facts into a sink.
pub trait FactProducer {
    fn produce(&mut self, sink: &mut dyn FactSink) -> Result<ProduceReport, FactError>;
}

// =============================================================================
// RECORD REPLAY
// =============================================================================

/// One recorded extraction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FactRecord {
    Node {
        id: String,
        /// Defaults to the id.
        #[serde(default)]
        name: Option<String>,
        kind: NodeKind,
    },
    Edge {
        source: String,
        dest: String,
        kind: EdgeKind,
    },
    Attribute {
        target: AttributeTarget,
        key: String,
        value: String,
    },
}

impl FactRecord {
    /// Reject records that cannot name anything.
    pub fn validate(&self) -> Result<(), FactError> {
        let empty = match self {
            FactRecord::Node { id, .. } => id.is_empty(),
            FactRecord::Edge { source, dest, .. } => source.is_empty() || dest.is_empty(),
            FactRecord::Attribute { key, .. } => key.is_empty(),
        };
        if empty {
            return Err(FactError::StructuralViolation(format!(
                "record has an empty identifier: {:?}",
                self
            )));
        }
        Ok(())
    }
}

/// Replays a list of [`FactRecord`]s in order.
#[derive(Debug, Clone, Default)]
pub struct RecordProducer {
    records: Vec<FactRecord>,
}

impl RecordProducer {
    #[must_use]
    pub fn new(records: Vec<FactRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FactProducer for RecordProducer {
    /// Every record is validated before the first one is replayed.
    fn produce(&mut self, sink: &mut dyn FactSink) -> Result<ProduceReport, FactError> {
        for record in &self.records {
            record.validate()?;
        }

        let mut report = ProduceReport::default();
        for record in &self.records {
            let accepted = match record {
                FactRecord::Node { id, name, kind } => {
                    sink.create_node(id, name.as_deref().unwrap_or(id), *kind)
                }
                FactRecord::Edge { source, dest, kind } => sink.create_edge(source, dest, *kind),
                FactRecord::Attribute { target, key, value } => {
                    sink.set_attribute(target, key, value)
                }
            };
            if !accepted {
                tracing::debug!(?record, "record refused");
            }
            report.record(accepted);
        }

        tracing::info!(
            accepted = report.accepted,
            rejected = report.rejected,
            "records replayed"
        );
        Ok(report)
    }
}
