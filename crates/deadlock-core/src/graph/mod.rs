//! Resource allocation graph and the analyses that run over it.
//!
//! ## Submodules
//!
//! - [`node`] — Interned node handles and process/resource kinds.
//! - [`rag`] — [`ResourceAllocationGraph`]: node registration, edge
//!   mutation and the deadlock queries.
//! - [`cycles`] — Iterative DFS cycle detection, witness paths, incremental
//!   checks and deadlocked-set extraction.
//! - [`render`] — Operator text and serializable snapshots.
//!
//! [`ResourceAllocationGraph`]: rag::ResourceAllocationGraph

pub mod cycles;
pub mod node;
pub mod rag;
pub mod render;
