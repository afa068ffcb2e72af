//! deadlock-core library.
//!
//! A resource allocation graph (RAG) that answers "is the system deadlocked
//! right now?" for single-instance resources. Processes and resources are
//! nodes, requests and allocations are directed edges, and a directed cycle
//! is a deadlock.
//!
//! ```rust
//! use deadlock_core::ResourceAllocationGraph;
//!
//! let mut rag = ResourceAllocationGraph::new();
//! for id in ["P1", "P2", "R1", "R2"] {
//!     rag.add_node(id);
//! }
//! rag.add_edge("P1", "R1")?;
//! rag.add_edge("R1", "P2")?;
//! rag.add_edge("P2", "R2")?;
//! rag.add_edge("R2", "P1")?;
//! assert!(rag.detect_cycle());
//!
//! rag.remove_edge("R2", "P1")?;
//! assert!(!rag.detect_cycle());
//! # Ok::<(), deadlock_core::GraphError>(())
//! ```
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums in the library, `anyhow::Result` at the
//!   config-loading edge.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod graph;

pub use config::{GraphConfig, RemovalPolicy};
pub use error::{ErrorCode, GraphError};
pub use graph::cycles::Deadlock;
pub use graph::node::{NodeId, NodeKind};
pub use graph::rag::ResourceAllocationGraph;
pub use graph::render::GraphSnapshot;
