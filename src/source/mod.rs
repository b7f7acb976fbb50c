//! Source Model — the semantic-resolution capability the engine consumes.
//!
//! The graph builder never parses source text itself. Everything it knows
//! about a program comes through the [`SourceModel`] trait: which files
//! exist, which declarations a file contains, where the call sites are, and
//! what each call site's target is. Implementations range from a real
//! compiler frontend down to the in-memory test double in
//! [`memory::MemoryModel`]; the heuristic tree-sitter model in
//! [`typescript::TypeScriptModel`] sits in between.

pub mod memory;
pub mod typescript;

use crate::error::Result;
use crate::graph::types::{CallNode, NodeKind, Parameter, Visibility};
use crate::identity;

/// Opaque handle to a file known to a source model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub usize);

/// Opaque handle to a callable declaration known to a source model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(pub usize);

/// One syntactic invocation expression inside a declaration's body.
///
/// Carries the syntactic classification the builder needs (`is_awaited`,
/// `is_new_callee`, `accessed_member`) as plain data; target resolution
/// stays with the model because it needs program-wide knowledge.
#[derive(Debug, Clone)]
pub struct CallSite {
    /// The declaration whose body contains this call.
    pub caller: DeclId,
    /// Index of this site within the caller's call-site list.
    pub ordinal: usize,
    /// 1-based line of the call expression.
    pub line: usize,
    /// 1-based column of the call expression.
    pub column: usize,
    /// The call is the operand of an await expression.
    pub is_awaited: bool,
    /// The call is the callee of a `new` expression.
    pub is_new_callee: bool,
    /// Member name when the callee is a property access (`promise.then(...)`).
    pub accessed_member: Option<String>,
    /// Descriptors of the argument expressions.
    pub argument_types: Vec<String>,
}

/// Metadata describing a declaration — a [`CallNode`] minus its id, plus
/// the byte offset that feeds the anonymous-identity rule.
#[derive(Debug, Clone)]
pub struct DeclInfo {
    /// `None` for anonymous closures and unnamed function expressions.
    pub name: Option<String>,
    pub file_path: String,
    pub line: usize,
    pub column: usize,
    /// Byte offset of the declaration start in its file.
    pub start_offset: usize,
    pub kind: NodeKind,
    pub is_async: bool,
    pub is_static: Option<bool>,
    pub visibility: Option<Visibility>,
    pub owning_type: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: String,
}

impl DeclInfo {
    /// Materialize a graph node from this description.
    pub fn into_node(self, id: String) -> CallNode {
        CallNode {
            id,
            name: self.name.unwrap_or_else(|| "<anonymous>".to_string()),
            file_path: self.file_path,
            line: self.line,
            column: self.column,
            kind: self.kind,
            is_async: self.is_async,
            is_static: self.is_static,
            visibility: self.visibility,
            owning_type: self.owning_type,
            parameters: self.parameters,
            return_type: self.return_type,
        }
    }
}

/// The capability contract between the engine and a language frontend.
///
/// All methods take `&self`: a model may be shared read-only across
/// concurrent analyses as long as it does not mutate the underlying
/// program representation during reads.
pub trait SourceModel {
    /// Look up a file by the path used in entry-point strings.
    ///
    /// Fails with [`crate::CalltraceError::SourceFileNotFound`].
    fn file(&self, path: &str) -> Result<FileId>;

    /// All call sites in a declaration's body, in source-text order.
    /// Calls inside nested function literals belong to the literal.
    fn call_sites(&self, decl: DeclId) -> Vec<CallSite>;

    /// Resolve a call site to its target declaration. `None` means the
    /// target cannot be statically determined — not an error.
    fn resolve_target(&self, site: &CallSite) -> Option<DeclId>;

    /// Anonymous function literals lexically nested directly inside the
    /// declaration, whether or not they are ever invoked.
    fn callback_literals(&self, decl: DeclId) -> Vec<DeclId>;

    /// Describe a declaration's metadata.
    fn describe(&self, decl: DeclId) -> DeclInfo;

    /// Stable node key for a declaration. The default applies the crate's
    /// identity scheme to `describe()`.
    fn identity(&self, decl: DeclId) -> String {
        identity::node_id(&self.describe(decl))
    }

    /// Number of files this model has loaded, for graph metadata.
    fn files_scanned(&self) -> usize;

    // ─── Lookups consumed by the entry-point resolver ───────────────

    /// A top-level `function name(...)` declaration in the file.
    fn top_level_function(&self, file: FileId, name: &str) -> Option<DeclId>;

    /// An exported declaration with that name that is function-like.
    fn exported_function_like(&self, file: FileId, name: &str) -> Option<DeclId>;

    /// A variable binding whose initializer is function-like
    /// (`const f = () => ...`).
    fn function_valued_binding(&self, file: FileId, name: &str) -> Option<DeclId>;

    /// A method, get-accessor, set-accessor, or (when `name` is
    /// `"constructor"`) the primary constructor of `class` in the file.
    fn class_member(&self, file: FileId, class: &str, name: &str) -> Option<DeclId>;
}
