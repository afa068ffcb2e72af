//! Node handles and kinds.
//!
//! Identifiers are interned into [`NodeId`] arena indices when a node is
//! registered. A handle is a plain index and nothing ties it to the graph that
//! minted it, so traversals treat an out-of-range handle as an absent node.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense handle for a registered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        // The arena is bounded by memory long before u32::MAX nodes.
        #[allow(clippy::cast_possible_truncation)]
        Self(index as u32)
    }

    /// Position of this node in registration order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node stands for.
///
/// Cycle detection ignores the kind. It only matters when bipartite
/// enforcement is switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Process,
    Resource,
    #[default]
    Unspecified,
}

impl NodeKind {
    /// `true` when an edge `self -> other` is a request or a grant.
    #[must_use]
    pub const fn complements(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Process, Self::Resource) | (Self::Resource, Self::Process)
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::Resource => "resource",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
