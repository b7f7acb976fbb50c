//! # calltrace
//!
//! Bounded, cycle-safe call graph construction from a named entry point.
//!
//! calltrace walks the declarations and call expressions reachable from an
//! entry point (`"file#function"` or `"file#Class.method"`), bounded by a
//! maximum depth, and produces a deterministic [`CallGraph`] of callable
//! declarations (nodes) and classified call relationships (edges) for
//! downstream formatters and validators to consume.
//!
//! ## Key properties
//!
//! - **Terminates on cycles**: revisited declarations are never re-expanded
//! - **Deterministic**: sibling call sites are walked in source-text order
//! - **Scope-aware**: vendored dependencies, test files, and glob patterns
//!   prune traversal before any node is created
//! - **Frontend-agnostic**: all language knowledge sits behind the
//!   [`SourceModel`] trait
//!
//! ## Quick Start
//!
//! ```rust
//! use calltrace::{AnalysisConfig, CallGraphAnalyzer};
//! use calltrace::source::typescript::TypeScriptModel;
//!
//! let mut model = TypeScriptModel::new();
//! model.add_source("a.ts", "function main() { helper(); }\nfunction helper() {}\n").unwrap();
//!
//! let analyzer = CallGraphAnalyzer::new(model, AnalysisConfig::default());
//! let graph = analyzer.analyze("a.ts#main").unwrap();
//! assert_eq!(graph.nodes.len(), 2);
//! assert_eq!(graph.edges.len(), 1);
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod filter;
pub mod graph;
pub mod identity;
pub mod source;

// Re-exports for convenience
pub use config::AnalysisConfig;
pub use entry::EntryPointSpec;
pub use error::{CalltraceError, Result};
pub use filter::FilterPolicy;
pub use graph::{CallEdge, CallGraph, CallNode, EdgeKind, GraphBuilder, NodeKind};
pub use source::SourceModel;

/// The main analysis facade.
///
/// Holds a source model and a configuration, and runs one isolated
/// traversal per [`analyze`](CallGraphAnalyzer::analyze) call. The model is
/// only ever read, so one analyzer can serve many analyses; each call gets
/// its own single-use [`GraphBuilder`].
pub struct CallGraphAnalyzer<M: SourceModel> {
    model: M,
    config: AnalysisConfig,
}

impl<M: SourceModel> CallGraphAnalyzer<M> {
    pub fn new(model: M, config: AnalysisConfig) -> Self {
        Self { model, config }
    }

    /// Build the call graph for one entry point.
    ///
    /// Entry-point parsing and resolution failures are fatal and happen
    /// before any traversal; there are no partial graphs.
    pub fn analyze(&self, entry_point: &str) -> Result<CallGraph> {
        let spec = EntryPointSpec::parse(entry_point)?;
        let entry = spec.resolve(&self.model)?;
        let filter = FilterPolicy::from_config(&self.config)?;
        let builder = GraphBuilder::new(&self.model, &filter, &self.config);
        Ok(builder.analyze(entry, entry_point))
    }

    /// Analyze several entry points. Each entry point is an isolated
    /// failure domain: one fatal failure never aborts its siblings.
    pub fn analyze_batch(&self, entry_points: &[&str]) -> Vec<(String, Result<CallGraph>)> {
        entry_points
            .iter()
            .map(|ep| (ep.to_string(), self.analyze(ep)))
            .collect()
    }

    /// The source model backing this analyzer.
    pub fn model(&self) -> &M {
        &self.model
    }
}
