//! Analysis configuration.
//!
//! All knobs the graph builder consumes. Loadable from a TOML file,
//! falling back to defaults for anything missing.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration consumed by one call-graph analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum traversal depth from the entry point (entry is depth 0).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Descend into vendored dependencies under node_modules.
    #[serde(default)]
    pub include_node_modules: bool,
    /// Descend into files matching common test conventions.
    #[serde(default)]
    pub include_test_files: bool,
    /// Paths matching any of these globs are pruned.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    /// When non-empty, only paths matching at least one glob are kept.
    #[serde(default)]
    pub include_patterns: Vec<String>,
    /// Emit callback edges for anonymous literals nested in declarations.
    #[serde(default = "default_analyze_callbacks")]
    pub analyze_callbacks: bool,
}

fn default_max_depth() -> usize {
    10
}

fn default_analyze_callbacks() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            include_node_modules: false,
            include_test_files: false,
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
            analyze_callbacks: default_analyze_callbacks(),
        }
    }
}

impl AnalysisConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Builder-style override for the traversal depth bound.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
