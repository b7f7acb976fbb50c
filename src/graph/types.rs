//! Core data types for the call graph.
//!
//! Everything here is plain data: nodes, edges, and the finished
//! [`CallGraph`] value handed to downstream consumers. All types derive
//! serde so formatters can serialize the graph without help from this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of callable a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Function,
    Method,
    /// Arrow functions and anonymous function expressions.
    Closure,
    Constructor,
}

/// How a call site was classified, from its syntactic context alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Sync,
    Async,
    Constructor,
    Callback,
}

/// Member visibility for class methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Type descriptor as written in the source, or "any" when absent.
    #[serde(rename = "type")]
    pub type_descriptor: String,
    #[serde(default)]
    pub optional: bool,
    /// Default value literal, verbatim, when one is declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// A callable declaration discovered during traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallNode {
    /// Stable identity (see [`crate::identity::node_id`]).
    pub id: String,
    pub name: String,
    pub file_path: String,
    /// 1-based line of the declaration.
    pub line: usize,
    /// 1-based column of the declaration.
    pub column: usize,
    pub kind: NodeKind,
    pub is_async: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_static: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    /// Name of the class this method belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owning_type: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: String,
}

/// A directed, classified call relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEdge {
    /// `"{source}->{target}-{ordinal}"` — the ordinal comes from a global
    /// edge counter, so two calls to the same target stay distinct.
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
    /// 1-based line of the call site in the source node.
    pub line: usize,
    /// 1-based column of the call site.
    pub column: usize,
    /// Descriptors of the argument expressions at the call site.
    pub argument_types: Vec<String>,
}

/// Bookkeeping attached to a finished graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub generated_at: DateTime<Utc>,
    /// The entry-point string the analysis was asked for.
    pub entry_point: String,
    /// Effective depth bound for this analysis.
    pub max_depth: usize,
    /// How many files the source model had loaded.
    pub files_scanned: usize,
    /// Wall-clock duration of the analysis in milliseconds.
    pub duration_ms: u64,
}

/// Aggregate counts over a finished graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub async_edge_count: usize,
    pub callback_edge_count: usize,
}

/// The finished call graph. Produced and owned by a single `analyze()`
/// call; immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallGraph {
    pub metadata: GraphMetadata,
    /// Unique by id, in discovery order (entry point first).
    pub nodes: Vec<CallNode>,
    /// In creation order; ids carry the global ordinal.
    pub edges: Vec<CallEdge>,
    pub entry_point_id: String,
}

impl CallGraph {
    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&CallNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes directly called by `id`, in edge order.
    pub fn callees_of(&self, id: &str) -> Vec<&CallNode> {
        self.edges
            .iter()
            .filter(|e| e.source_id == id)
            .filter_map(|e| self.node(&e.target_id))
            .collect()
    }

    /// Nodes that directly call `id`, in edge order.
    pub fn callers_of(&self, id: &str) -> Vec<&CallNode> {
        self.edges
            .iter()
            .filter(|e| e.target_id == id)
            .filter_map(|e| self.node(&e.source_id))
            .collect()
    }

    /// Aggregate counts.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            async_edge_count: self
                .edges
                .iter()
                .filter(|e| e.kind == EdgeKind::Async)
                .count(),
            callback_edge_count: self
                .edges
                .iter()
                .filter(|e| e.kind == EdgeKind::Callback)
                .count(),
        }
    }
}
