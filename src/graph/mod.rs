//! Call graph module — data model, storage, and the traversal that
//! builds a graph from an entry point.

pub mod builder;
pub mod engine;
pub mod types;

pub use builder::{classify_edge, GraphBuilder};
pub use engine::GraphStore;
pub use types::{
    CallEdge, CallGraph, CallNode, EdgeKind, GraphMetadata, GraphStats, NodeKind, Parameter,
    Visibility,
};
