//! Cycle detection for the resource allocation graph.
//!
//! # Overview
//!
//! With single-instance resources, the system is deadlocked exactly when the
//! allocation graph contains a directed cycle: every process on the loop
//! holds a resource the next one is waiting for. This module answers that
//! question in a few shapes:
//!
//! - [`has_cycle`] — boolean, short-circuits on the first back edge.
//! - [`find_cycle`] — the same traversal, returning the witness loop.
//! - `detect_cycle_on_add` — whether a prospective edge would close a loop
//!   (reached through [`ResourceAllocationGraph::would_deadlock`]).
//! - [`deadlocked_sets`] — every strongly connected component that contains a
//!   cycle, i.e. all nodes involved in any deadlock.
//!
//! # Design
//!
//! - **Iterative DFS**: the traversal keeps an explicit stack of
//!   [`Frame`]s (`{node, next neighbor index}`) instead of recursing, so a
//!   chain of hundreds of thousands of waits cannot overflow the thread stack.
//! - **Two marks per node**: `visited` is set once and never cleared, so no
//!   node is expanded twice. `on_stack` is set while the node's frame is live
//!   and cleared when it pops. An edge into an `on_stack` node is a back edge.
//! - **O(V+E)**: each node is expanded at most once and each edge examined
//!   once during that expansion.
//!
//! Root order changes which cycle is reported first, never whether one exists.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn,
    clippy::doc_markdown,
)]

use std::collections::VecDeque;
use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::node::{NodeId, NodeKind};
use super::rag::ResourceAllocationGraph;

// ---------------------------------------------------------------------------
// Deadlock
// ---------------------------------------------------------------------------

/// A cycle in the allocation graph.
///
/// `cycle_path` starts and ends at the same node. For example, the classic
/// two-process deadlock P1 → R1 → P2 → R2 → P1 is reported as
/// `["P1", "R1", "P2", "R2", "P1"]` (rotated to wherever the search entered
/// the loop).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deadlock {
    /// The ordered list of node identifiers forming the loop.
    pub cycle_path: Vec<String>,

    /// Source of the edge that closes the loop.
    pub edge_from: String,

    /// Target of the edge that closes the loop.
    pub edge_to: String,
}

impl Deadlock {
    /// Number of distinct nodes on the loop.
    pub fn cycle_len(&self) -> usize {
        self.cycle_path.len().saturating_sub(1)
    }

    /// Returns `true` if the loop is a single node pointing at itself.
    pub fn is_self_loop(&self) -> bool {
        self.edge_from == self.edge_to
    }

    /// Distinct nodes on the loop, without the repeated closing node.
    pub fn members(&self) -> &[String] {
        let len = self.cycle_len();
        &self.cycle_path[..len]
    }

    /// Members registered as [`NodeKind::Process`], in loop order.
    pub fn processes<'a>(&'a self, graph: &ResourceAllocationGraph) -> Vec<&'a str> {
        self.members()
            .iter()
            .filter(|id| graph.kind(id) == Some(NodeKind::Process))
            .map(String::as_str)
            .collect()
    }
}

impl fmt::Display for Deadlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_self_loop() {
            write!(f, "deadlock: self-loop on '{}'", self.edge_from)
        } else {
            write!(
                f,
                "deadlock ({} nodes): {}",
                self.cycle_len(),
                self.cycle_path.join(" → ")
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Core detection
// ---------------------------------------------------------------------------

/// Check whether the graph contains any cycle.
///
/// # Complexity
///
/// O(V+E) in the worst case (no cycles). O(1) best case (immediate self-loop).
pub fn has_cycle(graph: &ResourceAllocationGraph) -> bool {
    let found = first_back_edge(graph).is_some();
    tracing::trace!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        found,
        "cycle check"
    );
    found
}

/// Find one cycle, if any, and return it as a [`Deadlock`].
///
/// Returns `Some` exactly when [`has_cycle`] returns `true`.
pub fn find_cycle(graph: &ResourceAllocationGraph) -> Option<Deadlock> {
    let (path, from, to) = first_back_edge(graph)?;
    let deadlock = Deadlock {
        cycle_path: path.into_iter().map(|id| graph.label(id)).collect(),
        edge_from: graph.label(from),
        edge_to: graph.label(to),
    };
    tracing::debug!(cycle = %deadlock, "cycle found");
    Some(deadlock)
}

/// Detect whether adding `from → to` would create a cycle.
///
/// The graph is not modified. A cycle is closed when `from == to`, or when
/// `from` is already reachable from `to`. The returned path is
/// `from → to → … → from`, using the shortest existing route back.
///
/// A handle outside this graph's arena is treated as absent and yields `None`.
pub(crate) fn detect_cycle_on_add(
    graph: &ResourceAllocationGraph,
    from: NodeId,
    to: NodeId,
) -> Option<Deadlock> {
    let n = graph.node_count();
    if from.index() >= n || to.index() >= n {
        return None;
    }

    if from == to {
        let id = graph.label(from);
        return Some(Deadlock {
            cycle_path: vec![id.clone(), id.clone()],
            edge_from: id.clone(),
            edge_to: id,
        });
    }

    // BFS from `to` looking for `from`.
    let mut parent: Vec<Option<NodeId>> = vec![None; graph.node_count()];
    let mut seen = vec![false; graph.node_count()];
    let mut queue: VecDeque<NodeId> = VecDeque::from([to]);
    seen[to.index()] = true;

    while let Some(current) = queue.pop_front() {
        if current == from {
            let mut chain = vec![from];
            let mut cursor = from;
            while let Some(prev) = parent[cursor.index()] {
                chain.push(prev);
                cursor = prev;
            }
            // chain is from ← … ← to; flip it and prepend the new edge's source.
            chain.reverse();
            let mut cycle_path = Vec::with_capacity(chain.len() + 1);
            cycle_path.push(graph.label(from));
            cycle_path.extend(chain.into_iter().map(|id| graph.label(id)));
            return Some(Deadlock {
                cycle_path,
                edge_from: graph.label(from),
                edge_to: graph.label(to),
            });
        }

        for &next in graph.outgoing(current) {
            if let Some(mark) = seen.get_mut(next.index()) {
                if !*mark {
                    *mark = true;
                    parent[next.index()] = Some(current);
                    queue.push_back(next);
                }
            }
        }
    }

    None
}

/// Every strongly connected component that contains a cycle.
///
/// A component qualifies when it has more than one member, or a single member
/// with a self-loop. Each set is sorted by identifier and the list is sorted,
/// so output is deterministic regardless of insertion order.
pub fn deadlocked_sets(graph: &ResourceAllocationGraph) -> Vec<Vec<String>> {
    // Node i of the petgraph mirror is NodeId i.
    let mut mirror: DiGraph<(), ()> = DiGraph::with_capacity(graph.node_count(), graph.edge_count());
    for _ in graph.node_ids() {
        mirror.add_node(());
    }
    for from in graph.node_ids() {
        for &to in graph.outgoing(from) {
            mirror.add_edge(NodeIndex::new(from.index()), NodeIndex::new(to.index()), ());
        }
    }

    let mut sets: Vec<Vec<String>> = tarjan_scc(&mirror)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|&node| mirror.find_edge(node, node).is_some())
        })
        .map(|component| {
            let mut ids: Vec<String> = component
                .into_iter()
                .map(|idx| graph.label(NodeId::from_index(idx.index())))
                .collect();
            ids.sort_unstable();
            ids
        })
        .collect();

    sets.sort_unstable();
    sets
}

// ---------------------------------------------------------------------------
// DFS internals
// ---------------------------------------------------------------------------

/// One suspended expansion on the explicit DFS stack.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    /// Index of the next outgoing edge to examine.
    next: usize,
}

/// Run the DFS from every unvisited root and stop at the first back edge.
///
/// Returns the loop (starting and ending at the back edge's target) and the
/// back edge itself.
fn first_back_edge(graph: &ResourceAllocationGraph) -> Option<(Vec<NodeId>, NodeId, NodeId)> {
    let n = graph.node_count();
    let mut visited = vec![false; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<Frame> = Vec::new();

    for root in graph.node_ids() {
        if visited[root.index()] {
            continue;
        }
        visited[root.index()] = true;
        on_stack[root.index()] = true;
        stack.push(Frame { node: root, next: 0 });

        while let Some(frame) = stack.last_mut() {
            let current = frame.node;
            let Some(&neighbor) = graph.outgoing(current).get(frame.next) else {
                // All edges examined; this node leaves the current path.
                stack.pop();
                on_stack[current.index()] = false;
                continue;
            };
            frame.next += 1;

            let idx = neighbor.index();
            if idx >= n {
                // Target with no entry of its own: nothing to expand.
                continue;
            }
            if on_stack[idx] {
                let start = stack.iter().position(|f| f.node == neighbor).unwrap_or(0);
                let mut path: Vec<NodeId> = stack[start..].iter().map(|f| f.node).collect();
                path.push(neighbor);
                return Some((path, current, neighbor));
            }
            if !visited[idx] {
                visited[idx] = true;
                on_stack[idx] = true;
                stack.push(Frame { node: neighbor, next: 0 });
            }
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
