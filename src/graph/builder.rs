//! Graph builder — the bounded, cycle-safe traversal at the heart of the
//! crate.
//!
//! One [`GraphBuilder`] is a single-use traversal context: it owns the
//! visited set and the node/edge store for exactly one `analyze()` call and
//! is consumed by it. Concurrent analyses each get their own builder; the
//! source model behind `&M` is only ever read.

use chrono::Utc;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

use super::engine::GraphStore;
use super::types::{CallEdge, CallGraph, EdgeKind, GraphMetadata};
use crate::config::AnalysisConfig;
use crate::filter::FilterPolicy;
use crate::source::{CallSite, DeclId, SourceModel};

/// Property-access callees treated as deferred continuations of a promise.
const CONTINUATION_METHODS: &[&str] = &["then", "catch", "finally"];

/// Classify a call site from its syntactic context alone — never from the
/// resolved target's own properties.
pub fn classify_edge(site: &CallSite) -> EdgeKind {
    if site.is_awaited {
        EdgeKind::Async
    } else if site
        .accessed_member
        .as_deref()
        .is_some_and(|m| CONTINUATION_METHODS.contains(&m))
    {
        EdgeKind::Async
    } else if site.is_new_callee {
        EdgeKind::Constructor
    } else {
        EdgeKind::Sync
    }
}

/// Single-use depth-first traversal context.
pub struct GraphBuilder<'a, M: SourceModel> {
    model: &'a M,
    filter: &'a FilterPolicy,
    max_depth: usize,
    analyze_callbacks: bool,
    store: GraphStore,
    visited: HashSet<String>,
}

impl<'a, M: SourceModel> GraphBuilder<'a, M> {
    pub fn new(model: &'a M, filter: &'a FilterPolicy, config: &AnalysisConfig) -> Self {
        Self {
            model,
            filter,
            max_depth: config.max_depth,
            analyze_callbacks: config.analyze_callbacks,
            store: GraphStore::new(),
            visited: HashSet::new(),
        }
    }

    /// Walk the program from `entry` and return the finished graph.
    ///
    /// `entry` has already been resolved; from here on nothing is fatal —
    /// unresolved call sites yield no edge and filtered declarations are
    /// silently pruned.
    pub fn analyze(mut self, entry: DeclId, entry_point: &str) -> CallGraph {
        let started = Instant::now();

        self.traverse(entry, 0);
        let entry_point_id = self.model.identity(entry);

        let (nodes, edges) = self.store.into_parts();
        info!(
            entry = entry_point,
            nodes = nodes.len(),
            edges = edges.len(),
            "analysis complete"
        );

        CallGraph {
            metadata: GraphMetadata {
                generated_at: Utc::now(),
                entry_point: entry_point.to_string(),
                max_depth: self.max_depth,
                files_scanned: self.model.files_scanned(),
                duration_ms: started.elapsed().as_millis() as u64,
            },
            nodes,
            edges,
            entry_point_id,
        }
    }

    fn traverse(&mut self, decl: DeclId, depth: usize) {
        let id = self.model.identity(decl);
        // First discovery fixes a node's place; it is never re-expanded,
        // which is also what terminates cycles.
        if !self.visited.insert(id.clone()) {
            return;
        }
        self.store.add_node(self.model.describe(decl).into_node(id.clone()));

        // Children would land past the depth bound — record the node, but
        // do not expand its body.
        if depth >= self.max_depth {
            return;
        }

        for site in self.model.call_sites(decl) {
            let Some(target) = self.model.resolve_target(&site) else {
                debug!(source = %id, line = site.line, "call target unresolved, no edge");
                continue;
            };
            let target_info = self.model.describe(target);
            if self.filter.should_skip(&target_info.file_path) {
                debug!(path = %target_info.file_path, "declaration out of scope, pruned");
                continue;
            }
            let target_id = self.model.identity(target);
            // The edge references the target, so the target node must be
            // recorded first; the later traverse() is a no-op on it.
            self.store
                .add_node(target_info.into_node(target_id.clone()));
            self.store.add_edge(CallEdge {
                id: format!("{id}->{target_id}-{}", self.store.edge_count()),
                source_id: id.clone(),
                target_id: target_id.clone(),
                kind: classify_edge(&site),
                line: site.line,
                column: site.column,
                argument_types: site.argument_types.clone(),
            });
            self.traverse(target, depth + 1);
        }

        if self.analyze_callbacks {
            for literal in self.model.callback_literals(decl) {
                let literal_info = self.model.describe(literal);
                let literal_id = self.model.identity(literal);
                let (line, column) = (literal_info.line, literal_info.column);
                self.store
                    .add_node(literal_info.into_node(literal_id.clone()));
                self.store.add_edge(CallEdge {
                    id: format!("{id}->{literal_id}-{}", self.store.edge_count()),
                    source_id: id.clone(),
                    target_id: literal_id.clone(),
                    kind: EdgeKind::Callback,
                    line,
                    column,
                    argument_types: Vec::new(),
                });
                self.traverse(literal, depth + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::MemoryModel;

    fn build(model: &MemoryModel, entry: DeclId, config: AnalysisConfig) -> CallGraph {
        let filter = FilterPolicy::from_config(&config).unwrap();
        GraphBuilder::new(model, &filter, &config).analyze(entry, "test")
    }

    fn ids(graph: &CallGraph) -> Vec<&str> {
        graph.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_simple_sync_call() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let helper = model.add_function("a.ts", "helper");
        model.add_call(main, helper);

        let graph = build(&model, main, AnalysisConfig::default());
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].kind, EdgeKind::Sync);
        assert_eq!(graph.entry_point_id, "a.ts#main");
    }

    #[test]
    fn test_awaited_call_is_async() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let helper = model.add_async_function("a.ts", "asyncHelper");
        model.add_awaited_call(main, helper);

        let graph = build(&model, main, AnalysisConfig::default());
        assert_eq!(graph.edges[0].kind, EdgeKind::Async);
    }

    #[test]
    fn test_continuation_member_call_is_async() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let handler = model.add_function("a.ts", "handler");
        model.add_member_call(main, handler, "then");

        let graph = build(&model, main, AnalysisConfig::default());
        assert_eq!(graph.edges[0].kind, EdgeKind::Async);
    }

    #[test]
    fn test_ordinary_member_call_is_sync() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let handler = model.add_function("a.ts", "handler");
        model.add_member_call(main, handler, "map");

        let graph = build(&model, main, AnalysisConfig::default());
        assert_eq!(graph.edges[0].kind, EdgeKind::Sync);
    }

    #[test]
    fn test_new_expression_is_constructor() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let ctor = model.add_constructor("a.ts", "Widget");
        model.add_new_call(main, ctor);

        let graph = build(&model, main, AnalysisConfig::default());
        assert_eq!(graph.edges[0].kind, EdgeKind::Constructor);
        assert_eq!(graph.edges[0].target_id, "a.ts#Widget.constructor");
    }

    #[test]
    fn test_await_wins_over_new() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let ctor = model.add_constructor("a.ts", "Widget");
        let site = model.add_new_call(main, ctor);
        model.mark_awaited(site);

        let graph = build(&model, main, AnalysisConfig::default());
        assert_eq!(graph.edges[0].kind, EdgeKind::Async);
    }

    #[test]
    fn test_depth_zero_records_only_entry() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let helper = model.add_function("a.ts", "helper");
        model.add_call(main, helper);
        model.add_call(main, helper);

        let graph = build(&model, main, AnalysisConfig::default().with_max_depth(0));
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
        assert_eq!(graph.entry_point_id, "a.ts#main");
    }

    #[test]
    fn test_depth_bound_limits_discovery() {
        let mut model = MemoryModel::new();
        let a = model.add_function("a.ts", "a");
        let b = model.add_function("a.ts", "b");
        let c = model.add_function("a.ts", "c");
        let d = model.add_function("a.ts", "d");
        model.add_call(a, b);
        model.add_call(b, c);
        model.add_call(c, d);

        let graph = build(&model, a, AnalysisConfig::default().with_max_depth(2));
        assert_eq!(ids(&graph), vec!["a.ts#a", "a.ts#b", "a.ts#c"]);
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn test_cycle_terminates_with_exact_counts() {
        let mut model = MemoryModel::new();
        let a = model.add_function("a.ts", "funcA");
        let b = model.add_function("a.ts", "funcB");
        let c = model.add_function("a.ts", "funcC");
        model.add_call(a, b);
        model.add_call(b, c);
        model.add_call(c, a);

        let graph = build(&model, a, AnalysisConfig::default().with_max_depth(5));
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 3);
        let pairs: Vec<(&str, &str)> = graph
            .edges
            .iter()
            .map(|e| (e.source_id.as_str(), e.target_id.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a.ts#funcA", "a.ts#funcB"),
                ("a.ts#funcB", "a.ts#funcC"),
                ("a.ts#funcC", "a.ts#funcA"),
            ]
        );
    }

    #[test]
    fn test_self_recursion_yields_one_node_one_edge() {
        let mut model = MemoryModel::new();
        let f = model.add_function("a.ts", "fib");
        model.add_call(f, f);

        let graph = build(&model, f, AnalysisConfig::default());
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn test_repeated_calls_get_distinct_ordinals() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let helper = model.add_function("a.ts", "helper");
        model.add_call(main, helper);
        model.add_call(main, helper);

        let graph = build(&model, main, AnalysisConfig::default());
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edges[0].id, "a.ts#main->a.ts#helper-0");
        assert_eq!(graph.edges[1].id, "a.ts#main->a.ts#helper-1");
    }

    #[test]
    fn test_edge_ordinals_are_global_not_per_pair() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let x = model.add_function("a.ts", "x");
        let y = model.add_function("a.ts", "y");
        model.add_call(main, x);
        model.add_call(main, y);

        let graph = build(&model, main, AnalysisConfig::default());
        // y's first edge gets ordinal 1, not 0: the counter is global.
        assert_eq!(graph.edges[1].id, "a.ts#main->a.ts#y-1");
    }

    #[test]
    fn test_unresolved_call_site_produces_no_edge() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        model.add_unresolved_call(main);

        let graph = build(&model, main, AnalysisConfig::default());
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_filtered_target_is_pruned_with_subtree() {
        let mut model = MemoryModel::new();
        let main = model.add_function("src/a.ts", "main");
        let vendored = model.add_function("node_modules/lib/index.js", "vendored");
        let deep = model.add_function("src/deep.ts", "reachableOnlyThroughVendored");
        model.add_call(main, vendored);
        model.add_call(vendored, deep);

        let graph = build(&model, main, AnalysisConfig::default());
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
        assert!(graph.node("node_modules/lib/index.js#vendored").is_none());
    }

    #[test]
    fn test_exclude_pattern_removes_node_and_edges() {
        let mut model = MemoryModel::new();
        let main = model.add_function("src/a.ts", "main");
        let gen = model.add_function("src/generated/api.ts", "call");
        let kept = model.add_function("src/b.ts", "kept");
        model.add_call(main, gen);
        model.add_call(main, kept);

        let config = AnalysisConfig {
            exclude_patterns: vec!["**/generated/**".to_string()],
            ..Default::default()
        };
        let graph = build(&model, main, config);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.node("src/generated/api.ts#call").is_none());
        assert!(graph
            .edges
            .iter()
            .all(|e| e.target_id != "src/generated/api.ts#call"));
    }

    #[test]
    fn test_callback_literal_gets_callback_edge() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let literal = model.add_closure("a.ts", 57);
        model.add_callback_literal(main, literal);

        let graph = build(&model, main, AnalysisConfig::default());
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].kind, EdgeKind::Callback);
        assert_eq!(graph.edges[0].target_id, "a.ts#57");
    }

    #[test]
    fn test_callback_edges_respect_toggle() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let literal = model.add_closure("a.ts", 57);
        model.add_callback_literal(main, literal);

        let config = AnalysisConfig {
            analyze_callbacks: false,
            ..Default::default()
        };
        let graph = build(&model, main, config);
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_callback_traversal_descends_into_literal() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let literal = model.add_closure("a.ts", 57);
        let inner = model.add_function("a.ts", "inner");
        model.add_callback_literal(main, literal);
        model.add_call(literal, inner);

        let graph = build(&model, main, AnalysisConfig::default());
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edges[1].source_id, "a.ts#57");
        assert_eq!(graph.edges[1].target_id, "a.ts#inner");
    }

    #[test]
    fn test_idempotence() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let helper = model.add_function("a.ts", "helper");
        let other = model.add_function("b.ts", "other");
        model.add_call(main, helper);
        model.add_awaited_call(helper, other);
        model.add_call(other, main);

        let first = build(&model, main, AnalysisConfig::default());
        let second = build(&model, main, AnalysisConfig::default());
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.edges, second.edges);
    }

    #[test]
    fn test_node_never_reexpanded_at_shallower_depth() {
        // main -> a -> shared -> tail; main -> shared (reached later,
        // shallower). shared keeps the expansion from its first discovery.
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let a = model.add_function("a.ts", "a");
        let shared = model.add_function("a.ts", "shared");
        let tail = model.add_function("a.ts", "tail");
        model.add_call(main, a);
        model.add_call(a, shared);
        model.add_call(shared, tail);
        model.add_call(main, shared);

        let graph = build(&model, main, AnalysisConfig::default().with_max_depth(2));
        // shared was first discovered at depth 2, so tail is out of reach
        // even though the later main->shared edge is at depth 1.
        assert!(graph.node("a.ts#tail").is_none());
        assert_eq!(graph.edges.len(), 3);
    }

    #[test]
    fn test_argument_types_flow_onto_edge() {
        let mut model = MemoryModel::new();
        let main = model.add_function("a.ts", "main");
        let helper = model.add_function("a.ts", "helper");
        let site = model.add_call(main, helper);
        model.set_argument_types(site, &["string", "number"]);

        let graph = build(&model, main, AnalysisConfig::default());
        assert_eq!(graph.edges[0].argument_types, vec!["string", "number"]);
    }
}
