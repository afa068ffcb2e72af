use std::fmt;

use crate::graph::node::NodeKind;

/// Machine-readable error codes for embedders and operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ScenarioInvalid,
    ConfigEnvInvalid,
    NodeNotFound,
    EdgeNotFound,
    KindMismatch,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::ScenarioInvalid => "E1003",
            Self::ConfigEnvInvalid => "E1004",
            Self::NodeNotFound => "E2001",
            Self::EdgeNotFound => "E2002",
            Self::KindMismatch => "E2003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ScenarioInvalid => "Scenario file is invalid",
            Self::ConfigEnvInvalid => "Config environment override is invalid",
            Self::NodeNotFound => "Node not found",
            Self::EdgeNotFound => "Edge not found",
            Self::KindMismatch => "Edge does not connect a process and a resource",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in deadlock.toml and retry."),
            Self::ScenarioInvalid => {
                Some("Check that every edge and release names a declared node.")
            }
            Self::ConfigEnvInvalid => Some("Set DEADLOCK_REMOVAL to lenient or strict, or unset it."),
            Self::NodeNotFound => Some("Register the node with add_node before linking it."),
            Self::EdgeNotFound => {
                Some("Only release edges that are held, or switch removal to lenient.")
            }
            Self::KindMismatch => {
                Some("Edges must go process -> resource (request) or resource -> process (grant).")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors returned by graph mutations and lookups.
///
/// A call that returns one of these has not changed the graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// One or more endpoints were never registered.
    #[error("node(s) not found in the graph: {}", missing.join(", "))]
    NodeNotFound {
        /// The absent identifiers, in `from`, `to` order.
        missing: Vec<String>,
    },

    /// Strict removal found no stored copy of the edge.
    #[error("edge not found: {from} -> {to}")]
    EdgeNotFound { from: String, to: String },

    /// Bipartite enforcement rejected an edge between incompatible kinds.
    #[error("edge {from} ({from_kind}) -> {to} ({to_kind}) must connect a process and a resource")]
    KindMismatch {
        from: String,
        from_kind: NodeKind,
        to: String,
        to_kind: NodeKind,
    },
}

impl GraphError {
    pub(crate) fn node_not_found(missing: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::NodeNotFound {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NodeNotFound { .. } => ErrorCode::NodeNotFound,
            Self::EdgeNotFound { .. } => ErrorCode::EdgeNotFound,
            Self::KindMismatch { .. } => ErrorCode::KindMismatch,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
