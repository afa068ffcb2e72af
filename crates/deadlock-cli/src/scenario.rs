//! Scenario files: a set of nodes, edges and releases to replay.

use anyhow::{Context, Result, anyhow};
use deadlock_core::{
    Deadlock, ErrorCode, GraphConfig, GraphSnapshot, NodeKind, ResourceAllocationGraph,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(default)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    /// Edges removed after the first check.
    #[serde(default)]
    pub releases: Vec<EdgeSpec>,
}

impl Scenario {
    /// Two processes each holding the resource the other wants, then one
    /// release that breaks the loop.
    pub fn demo() -> Self {
        let node = |id: &str, kind| NodeSpec {
            id: id.to_string(),
            kind,
        };
        let edge = |from: &str, to: &str| EdgeSpec {
            from: from.to_string(),
            to: to.to_string(),
        };
        Self {
            nodes: vec![
                node("P1", NodeKind::Process),
                node("P2", NodeKind::Process),
                node("R1", NodeKind::Resource),
                node("R2", NodeKind::Resource),
            ],
            edges: vec![
                edge("P1", "R1"), // P1 requests R1
                edge("R1", "P2"), // R1 held by P2
                edge("P2", "R2"), // P2 requests R2
                edge("R2", "P1"), // R2 held by P1
            ],
            releases: vec![edge("R2", "P1")],
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str::<Self>(&content).with_context(|| {
            format!(
                "{}: failed to parse scenario {}",
                ErrorCode::ScenarioInvalid.code(),
                path.display()
            )
        })
    }

    /// Register every node and add every edge.
    pub fn build(&self, config: GraphConfig) -> Result<ResourceAllocationGraph> {
        let mut rag = ResourceAllocationGraph::with_config(config);
        for node in &self.nodes {
            rag.add_node_with_kind(&node.id, node.kind);
        }
        for edge in &self.edges {
            rag.add_edge(&edge.from, &edge.to)
                .map_err(|err| anyhow!("{}: {err}", err.code()))
                .with_context(|| format!("Invalid edge {} -> {}", edge.from, edge.to))?;
        }
        Ok(rag)
    }
}

/// Graph state and verdict at one point of the replay.
#[derive(Debug, Clone, Serialize)]
pub struct Phase {
    pub label: String,
    pub graph: GraphSnapshot,
    pub deadlocked: bool,
    pub cycle: Option<Deadlock>,
    pub deadlocked_sets: Vec<Vec<String>>,
    #[serde(skip)]
    pub text: String,
}

impl Phase {
    fn capture(label: impl Into<String>, rag: &ResourceAllocationGraph) -> Self {
        let deadlocked = rag.detect_cycle();
        Self {
            label: label.into(),
            graph: rag.snapshot(),
            deadlocked,
            cycle: rag.find_cycle(),
            deadlocked_sets: rag.deadlocked_sets(),
            text: rag.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub phases: Vec<Phase>,
}

impl Report {
    /// Verdict for the final state of the replay.
    pub fn deadlocked(&self) -> bool {
        self.phases.last().is_some_and(|phase| phase.deadlocked)
    }
}

/// Build the scenario, check it, apply releases, and check again.
pub fn evaluate(scenario: &Scenario, config: GraphConfig) -> Result<Report> {
    let mut rag = scenario.build(config)?;
    let mut phases = vec![Phase::capture("initial", &rag)];
    info!(
        nodes = rag.node_count(),
        edges = rag.edge_count(),
        deadlocked = phases[0].deadlocked,
        "scenario built"
    );

    if !scenario.releases.is_empty() {
        let mut released = Vec::with_capacity(scenario.releases.len());
        for edge in &scenario.releases {
            rag.remove_edge(&edge.from, &edge.to)
                .map_err(|err| anyhow!("{}: {err}", err.code()))
                .with_context(|| format!("Invalid release {} -> {}", edge.from, edge.to))?;
            released.push(format!("{} -> {}", edge.from, edge.to));
        }
        let phase = Phase::capture(format!("after releasing {}", released.join(", ")), &rag);
        info!(deadlocked = phase.deadlocked, "releases applied");
        phases.push(phase);
    }

    Ok(Report { phases })
}
