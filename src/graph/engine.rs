//! Graph store — petgraph-backed node/edge storage with an id index.
//!
//! One store backs one traversal. Nodes are unique by id; edges are kept
//! in creation order, which is what gives edge ids their stable ordinals.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use super::types::{CallEdge, CallNode};

/// Mutable node/edge storage used while a graph is being built.
pub struct GraphStore {
    /// The directed graph storing call relationships.
    graph: DiGraph<CallNode, CallEdge>,
    /// Index: node id -> node index.
    id_index: HashMap<String, NodeIndex>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
        }
    }

    /// Whether a node with this id has been recorded.
    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    /// Add a node to the store. Adding an id twice keeps the first node.
    pub fn add_node(&mut self, node: CallNode) -> NodeIndex {
        if let Some(&idx) = self.id_index.get(&node.id) {
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        idx
    }

    /// Add an edge between two recorded nodes. Both endpoints must already
    /// be in the store; the traversal guarantees this ordering.
    pub fn add_edge(&mut self, edge: CallEdge) {
        let (Some(&source), Some(&target)) = (
            self.id_index.get(&edge.source_id),
            self.id_index.get(&edge.target_id),
        ) else {
            debug_assert!(false, "edge endpoints must be recorded before the edge");
            return;
        };
        self.graph.add_edge(source, target, edge);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Running edge total — the source of the global edge-id ordinal.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Flatten into node and edge lists, both in insertion order.
    pub fn into_parts(self) -> (Vec<CallNode>, Vec<CallEdge>) {
        let edges = self
            .graph
            .edge_references()
            .map(|e| e.weight().clone())
            .collect();
        let nodes = self.graph.into_nodes_edges().0;
        let nodes = nodes.into_iter().map(|n| n.weight).collect();
        (nodes, edges)
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
