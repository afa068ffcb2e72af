//! The resource allocation graph.
//!
//! # Data Model
//!
//! Every registered identifier is interned into a [`NodeId`]. The graph keeps
//! one outgoing list per node, in insertion order, duplicates included:
//!
//! - process → resource: the process is waiting for the resource (request).
//! - resource → process: the resource is held by the process (grant).
//!
//! Edges never register nodes implicitly. Both endpoints of `add_edge` must
//! have been registered with one of the `add_*` node methods first.
//!
//! # Usage
//!
//! ```rust
//! use deadlock_core::ResourceAllocationGraph;
//!
//! let mut rag = ResourceAllocationGraph::new();
//! rag.add_process("P1");
//! rag.add_process("P2");
//! rag.add_resource("R1");
//! rag.add_resource("R2");
//!
//! rag.add_edge("R1", "P1")?; // P1 holds R1
//! rag.add_edge("R2", "P2")?; // P2 holds R2
//! rag.add_edge("P2", "R1")?; // P2 waits for R1
//! assert!(!rag.detect_cycle());
//!
//! // P1 asking for R2 would close the loop; refuse it instead of queueing.
//! let deadlock = rag.would_deadlock("P1", "R2")?.expect("loop");
//! assert_eq!(deadlock.cycle_path, ["P1", "R2", "P2", "R1", "P1"]);
//! # Ok::<(), deadlock_core::GraphError>(())
//! ```

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use tracing::{debug, warn};

use super::cycles::{self, Deadlock};
use super::node::{NodeId, NodeKind};
use crate::config::{GraphConfig, RemovalPolicy};
use crate::error::GraphError;

/// Processes and resources linked by request and allocation edges.
///
/// Mutation takes `&mut self` and queries take `&self`. Share it across
/// threads by wrapping it in the embedder's own lock.
#[derive(Debug, Clone, Default)]
pub struct ResourceAllocationGraph {
    /// NodeId → identifier.
    names: Vec<String>,
    /// NodeId → kind given at first registration.
    kinds: Vec<NodeKind>,
    /// NodeId → outgoing targets, in insertion order.
    adjacency: Vec<Vec<NodeId>>,
    /// identifier → NodeId.
    index: HashMap<String, NodeId>,
    config: GraphConfig,
}

impl ResourceAllocationGraph {
    /// Create an empty graph with default behaviour (lenient removal, no kind
    /// enforcement).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with the given behaviour switches.
    #[must_use]
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn config(&self) -> &GraphConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    /// Register `id` with no particular kind.
    ///
    /// Idempotent: an existing node keeps its edges and kind.
    pub fn add_node(&mut self, id: &str) -> NodeId {
        self.add_node_with_kind(id, NodeKind::Unspecified)
    }

    /// Register `id` as a process.
    pub fn add_process(&mut self, id: &str) -> NodeId {
        self.add_node_with_kind(id, NodeKind::Process)
    }

    /// Register `id` as a resource.
    pub fn add_resource(&mut self, id: &str) -> NodeId {
        self.add_node_with_kind(id, NodeKind::Resource)
    }

    /// Register `id` with an explicit kind.
    ///
    /// If `id` is already registered this is a no-op: the first registration
    /// decides the kind.
    pub fn add_node_with_kind(&mut self, id: &str, kind: NodeKind) -> NodeId {
        if let Some(&existing) = self.index.get(id) {
            return existing;
        }

        let node = NodeId::from_index(self.names.len());
        self.names.push(id.to_string());
        self.kinds.push(kind);
        self.adjacency.push(Vec::new());
        self.index.insert(id.to_string(), node);
        debug!(node = id, %kind, "node registered");
        node
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Look up the handle for a registered identifier.
    #[must_use]
    pub fn node_id(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    /// Identifier behind a handle.
    #[must_use]
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.names.get(node.index()).map(String::as_str)
    }

    #[must_use]
    pub fn kind(&self, id: &str) -> Option<NodeKind> {
        let node = self.node_id(id)?;
        self.kinds.get(node.index()).copied()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    /// Number of stored edges, counting duplicates.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    // -----------------------------------------------------------------------
    // Edges
    // -----------------------------------------------------------------------

    /// Append the edge `from → to`.
    ///
    /// Duplicates and self-loops are stored as given.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NodeNotFound`] listing every unregistered endpoint.
    /// - [`GraphError::KindMismatch`] when bipartite enforcement is on and the
    ///   endpoints are not one process and one resource.
    ///
    /// The graph is unchanged on error.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let (from_id, to_id) = self.resolve_pair(from, to).inspect_err(|err| {
            warn!(from, to, %err, "edge rejected");
        })?;

        if self.config.enforce_bipartite {
            let from_kind = self.kinds[from_id.index()];
            let to_kind = self.kinds[to_id.index()];
            if !from_kind.complements(to_kind) {
                let err = GraphError::KindMismatch {
                    from: from.to_string(),
                    from_kind,
                    to: to.to_string(),
                    to_kind,
                };
                warn!(from, to, %err, "edge rejected");
                return Err(err);
            }
        }

        self.adjacency[from_id.index()].push(to_id);
        debug!(from, to, "edge added");
        Ok(())
    }

    /// Remove every stored copy of `from → to`.
    ///
    /// Returns how many copies were removed. Under [`RemovalPolicy::Lenient`]
    /// removing an edge that is not stored (or whose target was never
    /// registered) is a no-op returning `Ok(0)`.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NodeNotFound`] if `from` is not registered.
    /// - [`GraphError::EdgeNotFound`] under [`RemovalPolicy::Strict`] when no
    ///   copy of the edge is stored.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> Result<usize, GraphError> {
        let Some(from_id) = self.node_id(from) else {
            let err = GraphError::node_not_found([from]);
            warn!(from, to, %err, "edge removal rejected");
            return Err(err);
        };

        let removed = match self.node_id(to) {
            Some(to_id) => {
                let targets = &mut self.adjacency[from_id.index()];
                let before = targets.len();
                targets.retain(|&target| target != to_id);
                before - targets.len()
            }
            None => 0,
        };

        if removed == 0 && self.config.removal == RemovalPolicy::Strict {
            let err = GraphError::EdgeNotFound {
                from: from.to_string(),
                to: to.to_string(),
            };
            warn!(from, to, %err, "edge removal rejected");
            return Err(err);
        }

        debug!(from, to, removed, "edge removed");
        Ok(removed)
    }

    /// Outgoing targets of `id`, in insertion order, duplicates included.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if `id` is not registered.
    pub fn successors(&self, id: &str) -> Result<Vec<&str>, GraphError> {
        let node = self
            .node_id(id)
            .ok_or_else(|| GraphError::node_not_found([id]))?;
        Ok(self.target_names(node))
    }

    /// Every node with its outgoing targets, in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Vec<&str>)> + '_ {
        self.node_ids()
            .map(|node| (self.names[node.index()].as_str(), self.target_names(node)))
    }

    // -----------------------------------------------------------------------
    // Deadlock queries
    // -----------------------------------------------------------------------

    /// Returns `true` iff the graph currently contains a cycle, which for
    /// single-instance resources means the system is deadlocked.
    ///
    /// Never fails. The empty graph and any edgeless graph return `false`.
    #[must_use]
    pub fn detect_cycle(&self) -> bool {
        cycles::has_cycle(self)
    }

    /// One deadlock cycle, if any exists.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Deadlock> {
        cycles::find_cycle(self)
    }

    /// Check whether adding `from → to` would close a cycle, without adding it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] listing every unregistered endpoint.
    pub fn would_deadlock(&self, from: &str, to: &str) -> Result<Option<Deadlock>, GraphError> {
        let (from_id, to_id) = self.resolve_pair(from, to)?;
        Ok(cycles::detect_cycle_on_add(self, from_id, to_id))
    }

    /// Every set of nodes caught in a deadlock.
    ///
    /// See [`cycles::deadlocked_sets`] for ordering.
    #[must_use]
    pub fn deadlocked_sets(&self) -> Vec<Vec<String>> {
        cycles::deadlocked_sets(self)
    }

    // -----------------------------------------------------------------------
    // Crate internals
    // -----------------------------------------------------------------------

    /// Handles of all registered nodes, in registration order.
    pub(crate) fn node_ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.names.len()).map(NodeId::from_index)
    }

    /// Outgoing targets of `node`. A handle with no entry has no edges.
    pub(crate) fn outgoing(&self, node: NodeId) -> &[NodeId] {
        self.adjacency.get(node.index()).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn kind_of(&self, node: NodeId) -> NodeKind {
        self.kinds.get(node.index()).copied().unwrap_or_default()
    }

    /// Identifier for `node`, or `#index` for a handle this graph never minted.
    pub(crate) fn label(&self, node: NodeId) -> String {
        self.name(node)
            .map_or_else(|| node.to_string(), ToString::to_string)
    }

    fn target_names(&self, node: NodeId) -> Vec<&str> {
        self.outgoing(node)
            .iter()
            .map(|&target| self.names.get(target.index()).map_or("", String::as_str))
            .collect()
    }

    fn resolve_pair(&self, from: &str, to: &str) -> Result<(NodeId, NodeId), GraphError> {
        match (self.node_id(from), self.node_id(to)) {
            (Some(from_id), Some(to_id)) => Ok((from_id, to_id)),
            (from_id, to_id) => {
                let mut missing = Vec::with_capacity(2);
                if from_id.is_none() {
                    missing.push(from);
                }
                if to_id.is_none() && (to != from || from_id.is_some()) {
                    missing.push(to);
                }
                Err(GraphError::node_not_found(missing))
            }
        }
    }
}
