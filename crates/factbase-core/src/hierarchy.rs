//! # File Hierarchy
//!
//! Groups source paths into Subsystem (directory) and File containers and
//! answers the file -> container lookup used by
//! [`FactGraph::attach_to_containers`].
//!
//! Paths are normalized before use: `.` segments and empty segments are
//! dropped, `..` pops the previous segment where there is one. Node ids are
//! the normalized paths; node names are the last path segment.

use crate::config::FactConfig;
use crate::graph::FactGraph;
use crate::types::{Edge, EdgeKind, Node, NodeKind};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// CONTAINER LOOKUP
// =============================================================================

/// Maps a source-file attribute value to the id of its container node.
pub trait ContainerLookup {
    fn container_for(&self, path: &str) -> Option<String>;
}

impl<F> ContainerLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn container_for(&self, path: &str) -> Option<String> {
        self(path)
    }
}

/// Lookup table produced by [`FileHierarchy::install`].
#[derive(Debug, Clone, Default)]
pub struct ContainerIndex {
    containers: BTreeMap<String, String>,
}

impl ContainerIndex {
    /// Number of files with a container.
    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl ContainerLookup for ContainerIndex {
    fn container_for(&self, path: &str) -> Option<String> {
        self.containers.get(&normalize_path(path)?).cloned()
    }
}

// =============================================================================
// FILE HIERARCHY
// =============================================================================

/// The set of source files seen during extraction.
#[derive(Debug, Clone, Default)]
pub struct FileHierarchy {
    files: BTreeSet<String>,
}

impl FileHierarchy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hierarchy from a list of paths.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hierarchy = Self::new();
        for path in paths {
            hierarchy.add_path(path.as_ref());
        }
        hierarchy
    }

    /// Collect every value of the configured source-file attribute.
    #[must_use]
    pub fn from_graph(graph: &FactGraph, config: &FactConfig) -> Self {
        Self::from_paths(
            graph
                .nodes()
                .flat_map(|node| node.attributes.get(&config.file_attribute)),
        )
    }

    /// Record a file path. Paths that normalize to nothing are ignored.
    pub fn add_path(&mut self, path: &str) {
        if let Some(normalized) = normalize_path(path) {
            self.files.insert(normalized);
        }
    }

    /// Normalized file paths, sorted.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    /// Every directory above at least one file.
    #[must_use]
    pub fn subsystems(&self) -> BTreeSet<String> {
        let mut dirs = BTreeSet::new();
        for file in &self.files {
            let mut current = parent_dir(file);
            while let Some(dir) = current {
                if !dirs.insert(dir.to_string()) {
                    break;
                }
                current = parent_dir(dir);
            }
        }
        dirs
    }

    /// Insert the container nodes and containment edges into `graph`.
    ///
    /// `include_subsystems` / `include_files` decide which containers are
    /// materialized. With files excluded, a file's entities are attached to
    /// the file's directory instead. Nodes whose id is already taken are
    /// left as they are.
    pub fn install(&self, graph: &mut FactGraph, config: &FactConfig) -> ContainerIndex {
        let subsystems = self.subsystems();
        let mut index = ContainerIndex::default();

        if config.include_subsystems {
            for dir in &subsystems {
                insert_container(graph, dir, NodeKind::Subsystem);
                if let Some(parent) = parent_dir(dir) {
                    insert_containment(graph, parent, dir);
                }
            }
        }

        for file in &self.files {
            let parent = parent_dir(file);
            if config.include_files {
                insert_container(graph, file, NodeKind::File);
                if let (true, Some(parent)) = (config.include_subsystems, parent) {
                    insert_containment(graph, parent, file);
                }
                index.containers.insert(file.clone(), file.clone());
            } else if let (true, Some(parent)) = (config.include_subsystems, parent) {
                index.containers.insert(file.clone(), parent.to_string());
            }
        }

        tracing::info!(
            files = self.files.len(),
            subsystems = subsystems.len(),
            "installed file hierarchy"
        );
        index
    }
}

fn insert_container(graph: &mut FactGraph, path: &str, kind: NodeKind) {
    if let Err(e) = graph.add_node(Node::new(path, last_segment(path), kind)) {
        tracing::debug!(path, error = %e, "container node already present");
    }
}

fn insert_containment(graph: &mut FactGraph, parent: &str, child: &str) {
    let mut edge = Edge::new(parent, child, EdgeKind::Contains);
    edge.mark_resolved();
    if let Err(e) = graph.add_edge(edge) {
        tracing::debug!(parent, child, error = %e, "containment edge skipped");
    }
}

// =============================================================================
// PATH HELPERS
// =============================================================================

/// Normalize a path to `/`-separated segments.
///
/// Returns `None` for paths with no segments left.
#[must_use]
pub fn normalize_path(path: &str) -> Option<String> {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        return None;
    }
    let joined = segments.join("/");
    Some(if absolute { format!("/{}", joined) } else { joined })
}

fn parent_dir(path: &str) -> Option<&str> {
    let (dir, _) = path.rsplit_once('/')?;
    if dir.is_empty() { None } else { Some(dir) }
}

fn last_segment(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(normalize_path("./src//a/../b.c").as_deref(), Some("src/b.c"));
        assert_eq!(normalize_path("/usr/./include/x.h").as_deref(), Some("/usr/include/x.h"));
        assert_eq!(normalize_path("../lib/y.c").as_deref(), Some("../lib/y.c"));
        assert_eq!(normalize_path("src\\win\\z.c").as_deref(), Some("src/win/z.c"));
        assert_eq!(normalize_path("./"), None);
    }

    #[test]
    fn subsystems_cover_every_prefix() {
        let hierarchy = FileHierarchy::from_paths(["src/net/tcp.c", "src/main.c", "README"]);
        let dirs: Vec<_> = hierarchy.subsystems().into_iter().collect();
        assert_eq!(dirs, vec!["src", "src/net"]);
    }

    #[test]
    fn files_are_normalized_and_deduplicated() {
        let hierarchy = FileHierarchy::from_paths(["./src/main.c", "src//main.c", "lib/a.c", "./"]);
        let files: Vec<_> = hierarchy.files().collect();
        assert_eq!(files, ["lib/a.c", "src/main.c"]);
    }

    #[test]
    fn install_builds_containment_tree() {
        let hierarchy = FileHierarchy::from_paths(["src/net/tcp.c"]);
        let mut graph = FactGraph::new();
        let index = hierarchy.install(&mut graph, &FactConfig::default());

        assert_eq!(graph.find_node("src").map(|n| n.kind), Some(NodeKind::Subsystem));
        assert_eq!(graph.find_node("src/net/tcp.c").map(|n| n.name.as_str()), Some("tcp.c"));
        assert!(graph.find_edge("src", "src/net", EdgeKind::Contains).is_some());
        assert!(graph
            .find_edge("src/net", "src/net/tcp.c", EdgeKind::Contains)
            .is_some());
        assert_eq!(index.container_for("./src/net/tcp.c").as_deref(), Some("src/net/tcp.c"));
    }

    #[test]
    fn excluded_files_redirect_to_directory() {
        let hierarchy = FileHierarchy::from_paths(["src/main.c"]);
        let mut graph = FactGraph::new();
        let config = FactConfig {
            include_files: false,
            ..FactConfig::default()
        };
        let index = hierarchy.install(&mut graph, &config);

        assert!(!graph.contains_node("src/main.c"));
        assert_eq!(index.container_for("src/main.c").as_deref(), Some("src"));
    }

    #[test]
    fn excluded_subsystems_keep_files_flat() {
        let hierarchy = FileHierarchy::from_paths(["src/main.c"]);
        let mut graph = FactGraph::new();
        let config = FactConfig {
            include_subsystems: false,
            ..FactConfig::default()
        };
        hierarchy.install(&mut graph, &config);

        assert!(!graph.contains_node("src"));
        assert!(graph.contains_node("src/main.c"));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn closures_are_lookups() {
        let lookup = |path: &str| (path == "a.c").then(|| "dir".to_string());
        assert_eq!(lookup.container_for("a.c").as_deref(), Some("dir"));
        assert_eq!(lookup.container_for("b.c"), None);
    }
}
