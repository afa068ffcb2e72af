//! Behavioural properties of the resource allocation graph.
//!
//! The fixed cases walk through the documented contract (empty graphs,
//! self-loops, the triangle, failed mutations). The proptest block checks
//! detection against `petgraph::algo::is_cyclic_directed` on random graphs and
//! checks that insertion order never changes the verdict.

use deadlock_core::{GraphError, ResourceAllocationGraph};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn graph_with(nodes: &[&str], edges: &[(&str, &str)]) -> ResourceAllocationGraph {
    let mut rag = ResourceAllocationGraph::new();
    for node in nodes {
        rag.add_node(node);
    }
    for (from, to) in edges {
        rag.add_edge(from, to).expect("endpoints registered");
    }
    rag
}

/// Owned copy of the enumeration, for before/after comparisons.
fn dump(rag: &ResourceAllocationGraph) -> Vec<(String, Vec<String>)> {
    rag.entries()
        .map(|(id, targets)| {
            (
                id.to_string(),
                targets.into_iter().map(str::to_string).collect(),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Fixed cases
// ---------------------------------------------------------------------------

#[test]
fn empty_graph_is_deadlock_free() {
    assert!(!ResourceAllocationGraph::new().detect_cycle());
}

#[test]
fn edgeless_graph_is_deadlock_free() {
    let names: Vec<String> = (0..50).map(|i| format!("N{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    assert!(!graph_with(&refs, &[]).detect_cycle());
}

#[test]
fn self_loop_is_deadlock() {
    assert!(graph_with(&["A"], &[("A", "A")]).detect_cycle());
}

#[test]
fn triangle_breaks_when_any_edge_is_removed() {
    let edges = [("A", "B"), ("B", "C"), ("C", "A")];
    assert!(graph_with(&["A", "B", "C"], &edges).detect_cycle());

    for (from, to) in edges {
        let mut rag = graph_with(&["A", "B", "C"], &edges);
        assert_eq!(rag.remove_edge(from, to).expect("registered"), 1);
        assert!(
            !rag.detect_cycle(),
            "removing {from} -> {to} should break the cycle"
        );
    }
}

#[test]
fn edge_between_unregistered_nodes_fails_without_side_effects() {
    let mut rag = graph_with(&["P1", "R1"], &[("P1", "R1")]);
    let before = dump(&rag);

    let err = rag.add_edge("P7", "R7").expect_err("unregistered");
    assert!(matches!(err, GraphError::NodeNotFound { ref missing } if missing.len() == 2));
    assert_eq!(dump(&rag), before);
}

#[test]
fn removing_nonexistent_edge_is_ok_noop() {
    let mut rag = graph_with(&["P1", "R1"], &[("P1", "R1")]);
    let before = dump(&rag);

    assert_eq!(rag.remove_edge("R1", "P1"), Ok(0));
    assert_eq!(dump(&rag), before);
}

#[test]
fn add_node_twice_equals_once() {
    let mut once = graph_with(&["X", "Y"], &[("X", "Y")]);
    let mut twice = graph_with(&["X", "Y"], &[("X", "Y")]);
    once.add_node("X");
    twice.add_node("X");
    twice.add_node("X");
    assert_eq!(once.successors("X"), twice.successors("X"));
    assert_eq!(twice.successors("X"), Ok(vec!["Y"]));
}

#[test]
fn two_process_scenario_deadlocks_and_recovers() {
    let mut rag = graph_with(
        &["P1", "P2", "R1", "R2"],
        &[("P1", "R1"), ("R1", "P2"), ("P2", "R2"), ("R2", "P1")],
    );
    assert!(rag.detect_cycle());
    assert_eq!(
        rag.deadlocked_sets(),
        vec![vec!["P1", "P2", "R1", "R2"]]
    );

    rag.remove_edge("R2", "P1").expect("release");
    assert!(!rag.detect_cycle());
    assert!(rag.deadlocked_sets().is_empty());
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

const MAX_NODES: usize = 12;

fn arb_edges() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1..=MAX_NODES).prop_flat_map(|n| {
        let edges = prop::collection::vec((0..n, 0..n), 0..(n * 3));
        (Just(n), edges)
    })
}

fn build(n: usize, node_order: &[usize], edges: &[(usize, usize)]) -> ResourceAllocationGraph {
    let mut rag = ResourceAllocationGraph::new();
    for &i in node_order {
        rag.add_node(&format!("N{i}"));
    }
    debug_assert_eq!(rag.node_count(), n);
    for &(from, to) in edges {
        rag.add_edge(&format!("N{from}"), &format!("N{to}"))
            .expect("registered");
    }
    rag
}

fn oracle(n: usize, edges: &[(usize, usize)]) -> bool {
    let mut g = petgraph::graph::DiGraph::<(), ()>::new();
    let idx: Vec<_> = (0..n).map(|_| g.add_node(())).collect();
    for &(from, to) in edges {
        g.add_edge(idx[from], idx[to], ());
    }
    petgraph::algo::is_cyclic_directed(&g)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn detection_matches_petgraph((n, edges) in arb_edges()) {
        let order: Vec<usize> = (0..n).collect();
        let rag = build(n, &order, &edges);
        prop_assert_eq!(rag.detect_cycle(), oracle(n, &edges));
    }

    #[test]
    fn verdict_is_order_independent(
        (n, edges, node_order, edge_order) in arb_edges().prop_flat_map(|(n, edges)| {
            let node_order = Just((0..n).collect::<Vec<_>>()).prop_shuffle();
            let edge_order = Just(edges.clone()).prop_shuffle();
            (Just(n), Just(edges), node_order, edge_order)
        })
    ) {
        let baseline = build(n, &(0..n).collect::<Vec<_>>(), &edges);
        let shuffled = build(n, &node_order, &edge_order);
        prop_assert_eq!(baseline.detect_cycle(), shuffled.detect_cycle());
        prop_assert_eq!(baseline.deadlocked_sets(), shuffled.deadlocked_sets());
    }

    #[test]
    fn witness_is_a_real_cycle((n, edges) in arb_edges()) {
        let order: Vec<usize> = (0..n).collect();
        let rag = build(n, &order, &edges);
        let witness = rag.find_cycle();
        prop_assert_eq!(witness.is_some(), rag.detect_cycle());

        if let Some(deadlock) = witness {
            prop_assert_eq!(deadlock.cycle_path.first(), deadlock.cycle_path.last());
            for pair in deadlock.cycle_path.windows(2) {
                let targets = rag.successors(&pair[0]).expect("registered");
                prop_assert!(targets.contains(&pair[1].as_str()));
            }
        }
    }

    #[test]
    fn would_deadlock_predicts_detection((n, edges) in arb_edges(), a in 0..MAX_NODES, b in 0..MAX_NODES) {
        let order: Vec<usize> = (0..n).collect();
        let mut rag = build(n, &order, &edges);
        prop_assume!(!rag.detect_cycle());
        let (from, to) = (format!("N{}", a % n), format!("N{}", b % n));

        let predicted = rag.would_deadlock(&from, &to).expect("registered");
        rag.add_edge(&from, &to).expect("registered");
        prop_assert_eq!(predicted.is_some(), rag.detect_cycle());
    }

    #[test]
    fn failed_edge_leaves_graph_unchanged((n, edges) in arb_edges(), ghost in "[a-z]{1,6}") {
        let order: Vec<usize> = (0..n).collect();
        let mut rag = build(n, &order, &edges);
        let before = dump(&rag);

        prop_assert!(rag.add_edge("N0", &ghost).is_err());
        prop_assert!(rag.add_edge(&ghost, "N0").is_err());
        prop_assert!(rag.remove_edge(&ghost, "N0").is_err());
        prop_assert_eq!(dump(&rag), before);
    }
}
