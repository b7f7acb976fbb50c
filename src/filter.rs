//! Filter policy — decides which declarations are in scope.
//!
//! Filtering is a traversal-pruning step: a skipped declaration gets no
//! node, no edge, and no descent, which keeps large dependency trees from
//! being explored at all.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path};

use crate::config::AnalysisConfig;
use crate::error::{CalltraceError, Result};

/// Directory components that mark a vendored dependency tree.
const VENDOR_DIRS: &[&str] = &["node_modules"];

/// Directory components that mark test code.
const TEST_DIRS: &[&str] = &["__tests__", "__mocks__", "test", "tests"];

/// Compiled scope policy for one analysis.
pub struct FilterPolicy {
    include_node_modules: bool,
    include_test_files: bool,
    exclude: GlobSet,
    include: GlobSet,
    has_includes: bool,
}

impl FilterPolicy {
    /// Compile a policy from config. Fails on a malformed glob.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            include_node_modules: config.include_node_modules,
            include_test_files: config.include_test_files,
            exclude: compile_globs(&config.exclude_patterns)?,
            include: compile_globs(&config.include_patterns)?,
            has_includes: !config.include_patterns.is_empty(),
        })
    }

    /// True when the declaration at `path` is out of scope and everything
    /// reachable only through it must be pruned.
    pub fn should_skip(&self, path: &str) -> bool {
        if !self.include_node_modules && is_vendored(path) {
            return true;
        }
        if !self.include_test_files && is_test_file(path) {
            return true;
        }
        if self.exclude.is_match(path) {
            return true;
        }
        if self.has_includes && !self.include.is_match(path) {
            return true;
        }
        false
    }
}

fn compile_globs(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| CalltraceError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| CalltraceError::InvalidPattern {
        pattern: patterns.join(","),
        reason: e.to_string(),
    })
}

/// Check if a path contains a vendored-dependency directory component.
fn is_vendored(path: &str) -> bool {
    has_component(path, VENDOR_DIRS)
}

/// Check if a path matches common test-file conventions.
fn is_test_file(path: &str) -> bool {
    if has_component(path, TEST_DIRS) {
        return true;
    }
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    file_name.contains(".test.")
        || file_name.contains(".spec.")
        || file_name.starts_with("test_")
        || file_name
            .rsplit_once('.')
            .is_some_and(|(stem, _)| stem.ends_with("_test") || stem.ends_with(".test"))
}

fn has_component(path: &str, names: &[&str]) -> bool {
    Path::new(path).components().any(|c| {
        if let Component::Normal(name) = c {
            names.contains(&name.to_str().unwrap_or(""))
        } else {
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(config: AnalysisConfig) -> FilterPolicy {
        FilterPolicy::from_config(&config).unwrap()
    }

    #[test]
    fn test_default_skips_node_modules() {
        let p = policy(AnalysisConfig::default());
        assert!(p.should_skip("node_modules/lodash/index.js"));
        assert!(p.should_skip("packages/app/node_modules/left-pad/index.js"));
        assert!(!p.should_skip("src/app.ts"));
    }

    #[test]
    fn test_include_node_modules_toggle() {
        let config = AnalysisConfig {
            include_node_modules: true,
            ..Default::default()
        };
        assert!(!policy(config).should_skip("node_modules/lodash/index.js"));
    }

    #[test]
    fn test_default_skips_test_files() {
        let p = policy(AnalysisConfig::default());
        assert!(p.should_skip("src/app.test.ts"));
        assert!(p.should_skip("src/app.spec.ts"));
        assert!(p.should_skip("src/__tests__/app.ts"));
        assert!(p.should_skip("tests/integration.ts"));
        assert!(p.should_skip("src/util_test.ts"));
        assert!(p.should_skip("src/test_util.py"));
        assert!(!p.should_skip("src/contest.ts"));
        assert!(!p.should_skip("src/latest.ts"));
    }

    #[test]
    fn test_include_test_files_toggle() {
        let config = AnalysisConfig {
            include_test_files: true,
            ..Default::default()
        };
        assert!(!policy(config).should_skip("src/app.test.ts"));
    }

    #[test]
    fn test_exclude_patterns() {
        let config = AnalysisConfig {
            exclude_patterns: vec!["**/generated/**".to_string(), "**/*.d.ts".to_string()],
            ..Default::default()
        };
        let p = policy(config);
        assert!(p.should_skip("src/generated/api.ts"));
        assert!(p.should_skip("src/types.d.ts"));
        assert!(!p.should_skip("src/api.ts"));
    }

    #[test]
    fn test_include_patterns_restrict_scope() {
        let config = AnalysisConfig {
            include_patterns: vec!["src/core/**".to_string()],
            ..Default::default()
        };
        let p = policy(config);
        assert!(!p.should_skip("src/core/engine.ts"));
        assert!(p.should_skip("src/ui/view.ts"));
    }

    #[test]
    fn test_empty_includes_mean_no_restriction() {
        let p = policy(AnalysisConfig::default());
        assert!(!p.should_skip("anything/goes/here.ts"));
    }

    #[test]
    fn test_bad_pattern_is_fatal() {
        let config = AnalysisConfig {
            exclude_patterns: vec!["src/{unclosed".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            FilterPolicy::from_config(&config),
            Err(CalltraceError::InvalidPattern { .. })
        ));
    }
}
