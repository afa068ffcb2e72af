//! Diagnostic views of the graph.
//!
//! The `Display` text is for operators and has no stable format. JSON
//! consumers should serialize a [`GraphSnapshot`] instead.

use std::fmt;

use serde::Serialize;

use super::node::NodeKind;
use super::rag::ResourceAllocationGraph;

/// One node and its outgoing targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeEntry {
    pub id: String,
    pub kind: NodeKind,
    pub targets: Vec<String>,
}

/// Point-in-time copy of the whole graph, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeEntry>,
    pub edge_count: usize,
}

impl ResourceAllocationGraph {
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .node_ids()
            .zip(self.entries())
            .map(|(node, (id, targets))| NodeEntry {
                id: id.to_string(),
                kind: self.kind_of(node),
                targets: targets.into_iter().map(str::to_string).collect(),
            })
            .collect();

        GraphSnapshot {
            nodes,
            edge_count: self.edge_count(),
        }
    }
}

impl fmt::Display for ResourceAllocationGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resource Allocation Graph:")?;
        for (id, targets) in self.entries() {
            if targets.is_empty() {
                writeln!(f, "{id} ->")?;
            } else {
                writeln!(f, "{id} -> {}", targets.join(" "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResourceAllocationGraph {
        let mut rag = ResourceAllocationGraph::new();
        rag.add_process("P1");
        rag.add_resource("R1");
        rag.add_node("X");
        rag.add_edge("P1", "R1").expect("edge");
        rag.add_edge("R1", "P1").expect("edge");
        rag.add_edge("P1", "X").expect("edge");
        rag
    }

    #[test]
    fn display_lists_every_node() {
        let text = sample().to_string();
        assert_eq!(
            text,
            "Resource Allocation Graph:\nP1 -> R1 X\nR1 -> P1\nX ->\n"
        );
    }

    #[test]
    fn empty_graph_display_is_header_only() {
        assert_eq!(
            ResourceAllocationGraph::new().to_string(),
            "Resource Allocation Graph:\n"
        );
    }

    #[test]
    fn snapshot_carries_kinds_and_targets() {
        let snap = sample().snapshot();
        assert_eq!(snap.edge_count, 3);
        assert_eq!(
            snap.nodes[0],
            NodeEntry {
                id: "P1".into(),
                kind: NodeKind::Process,
                targets: vec!["R1".into(), "X".into()],
            }
        );
        assert_eq!(snap.nodes[2].kind, NodeKind::Unspecified);
    }

    #[test]
    fn snapshot_serializes_kinds_lowercase() {
        let json = serde_json::to_value(sample().snapshot()).expect("serialize");
        assert_eq!(json["nodes"][1]["kind"], "resource");
        assert_eq!(json["nodes"][1]["targets"][0], "P1");
    }
}
