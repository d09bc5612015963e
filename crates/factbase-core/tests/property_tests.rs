//! # Property-Based Tests
//!
//! Store invariants and the TA round trip under generated input.

use factbase_core::{
    Edge, EdgeKind, FactConfig, FactGraph, Node, NodeKind, from_ta_str, graph_from_bytes,
    graph_to_bytes, to_ta_string,
};
use proptest::collection::{btree_map, btree_set, vec};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn node_kind() -> impl Strategy<Value = NodeKind> {
    prop::sample::select(NodeKind::ALL.to_vec())
}

fn edge_kind() -> impl Strategy<Value = EdgeKind> {
    prop::sample::select(EdgeKind::ALL.to_vec())
}

/// Tokens that exercise quoting: spaces, brackets, comment markers, escapes.
fn awkward_value() -> impl Strategy<Value = String> {
    r#"[a-z0-9 (){}=/*"\\\n]{0,8}"#
}

fn attributes() -> impl Strategy<Value = Vec<(String, String)>> {
    vec(("k[a-z]{0,3}", awkward_value()), 0..4)
}

/// Order-independent snapshot of ids, kinds, names and attributes.
fn fingerprint(graph: &FactGraph) -> (Vec<String>, Vec<String>) {
    let nodes = graph
        .nodes()
        .map(|n| format!("{}|{}|{}|{:?}", n.id(), n.kind, n.name, n.attributes))
        .collect();
    let edges = graph
        .edges()
        .map(|e| format!("{:?}|{:?}", e.key(), e.attributes))
        .collect();
    (nodes, edges)
}

proptest! {
    /// Inserting unique ids yields exactly that id set, in any order.
    #[test]
    fn node_set_independent_of_insertion_order(
        ids in btree_set("[a-z]{1,6}", 0..40)
            .prop_map(|s| s.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    ) {
        let mut graph = FactGraph::new();
        for id in &ids {
            graph
                .add_node(Node::new(id.as_str(), id.as_str(), NodeKind::Function))
                .expect("insert");
        }

        let stored: BTreeSet<&str> = graph.nodes().map(Node::id).collect();
        let expected: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
        prop_assert_eq!(stored, expected);
    }

    /// Any sequence of Contains insertions leaves at most one parent per node
    /// and no self containment.
    #[test]
    fn containment_stays_a_forest(pairs in vec((0u8..8, 0u8..8), 0..40)) {
        let mut graph = FactGraph::new();
        let mut last_parent: BTreeMap<u8, u8> = BTreeMap::new();

        for (src, dst) in pairs {
            let repeat = last_parent.get(&dst) == Some(&src);
            let result =
                graph.add_edge(Edge::new(src.to_string(), dst.to_string(), EdgeKind::Contains));
            prop_assert_eq!(result.is_ok(), src != dst && !repeat);
            if src != dst {
                last_parent.insert(dst, src);
            }
        }

        for dst in 0u8..8 {
            let parents = graph.edges_to_dest(&dst.to_string(), Some(EdgeKind::Contains));
            prop_assert!(parents.len() <= 1);
            prop_assert!(parents.iter().all(|e| e.source() != e.dest()));
            let expected = last_parent.get(&dst).map(|p| p.to_string());
            prop_assert_eq!(parents.first().map(|e| e.source().to_string()), expected);
        }
    }

    /// Write then parse reproduces the same logical graph.
    #[test]
    fn ta_round_trip(
        nodes in btree_map("[a-z]{1,5}", (node_kind(), "[a-z]{1,5}", attributes()), 1..12),
        edges in btree_map((0usize..12, 0usize..12), (edge_kind(), attributes()), 0..20),
    ) {
        let mut graph = FactGraph::new();
        let ids: Vec<&String> = nodes.keys().collect();

        for (id, (kind, name, attrs)) in &nodes {
            let mut node = Node::new(id.as_str(), name.as_str(), *kind);
            for (k, v) in attrs {
                node.attributes.insert(k.as_str(), v.as_str());
            }
            graph.add_node(node).expect("insert");
        }
        // One edge per (source, dest): pair-keyed attribute blocks apply to
        // every kind between the two ids.
        let mut by_pair = BTreeMap::new();
        for ((s, d), payload) in &edges {
            let pair = (ids[s % ids.len()].as_str(), ids[d % ids.len()].as_str());
            by_pair.entry(pair).or_insert(payload);
        }
        for ((src, dst), (kind, attrs)) in by_pair {
            let mut edge = Edge::new(src, dst, *kind);
            for (k, v) in attrs {
                edge.attributes.insert(k.as_str(), v.as_str());
            }
            // Refusals (self containment) are part of the input.
            let _ = graph.add_edge(edge);
        }
        graph.resolve_references();

        let config = FactConfig::default();
        let text = to_ta_string(&graph, &config);
        let reparsed = from_ta_str(&text, &config).expect("reparse");
        prop_assert_eq!(fingerprint(&reparsed), fingerprint(&graph));
    }

    /// Snapshot encoding is stable across a decode.
    #[test]
    fn snapshot_bytes_stable(
        ids in btree_set("[a-z]{1,5}", 1..20),
        links in vec((0usize..20, 0usize..20, edge_kind()), 0..30),
    ) {
        let mut graph = FactGraph::new();
        let ids: Vec<String> = ids.into_iter().collect();
        for id in &ids {
            graph.add_node(Node::new(id.as_str(), id.as_str(), NodeKind::Class)).expect("insert");
        }
        for (s, d, kind) in links {
            let src = &ids[s % ids.len()];
            let dst = &ids[d % ids.len()];
            let _ = graph.add_edge(Edge::new(src.as_str(), dst.as_str(), kind));
        }

        let bytes = graph_to_bytes(&graph).expect("encode");
        let restored = graph_from_bytes(&bytes).expect("decode");
        prop_assert_eq!(graph_to_bytes(&restored).expect("re-encode"), bytes);
        prop_assert_eq!(fingerprint(&restored), fingerprint(&graph));
    }
}
