//! # factbase-core
//!
//! The fact graph store and Tuple-Attribute codec behind Factbase.
//!
//! A source extractor declares the entities of a software system (files,
//! subsystems, classes, functions, variables, enums) and the typed
//! relations between them. This crate keeps those facts in a deterministic
//! in-memory graph, groups entities under their files and directories, and
//! reads and writes the TA text format used by architecture-recovery tools.
//!
//! ## Layout
//!
//! - `types`: node and edge kinds, attributes, the error enum
//! - `graph`: the store, its indices and reference resolution
//! - `hierarchy`: file and subsystem containers
//! - `producer`: the extractor-facing sink and record replay
//! - `formats`: TA text codec and binary snapshots
//!
//! ## Constraints
//!
//! - BTreeMap/BTreeSet only, so iteration order is reproducible
//! - No async, no network; file I/O is limited to whole-file load and save
//! - Every mutation needs `&mut`; the store assumes exclusive access

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod formats;
pub mod graph;
pub mod hierarchy;
pub mod primitives;
pub mod producer;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{AttributeMap, Edge, EdgeKey, EdgeKind, FactError, Node, NodeKind};

// =============================================================================
// RE-EXPORTS: Store
// =============================================================================

pub use config::FactConfig;
pub use graph::{FactGraph, ResolveReport, SerializableGraph};
pub use hierarchy::{ContainerIndex, ContainerLookup, FileHierarchy};
pub use producer::{
    AttributeTarget, FactProducer, FactRecord, FactSink, ProduceReport, RecordProducer,
};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use formats::{
    LoadReport, SnapshotHeader, TaDocument, from_ta_str, graph_from_bytes, graph_to_bytes,
    load_from_file, load_into, save_to_file, to_ta_string,
};
