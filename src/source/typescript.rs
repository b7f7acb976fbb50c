//! Heuristic TypeScript/JavaScript source model.
//!
//! Backs the [`SourceModel`] contract with tree-sitter parsing and
//! name-based target matching. This is deliberately not a type checker:
//! a call resolves when its callee name matches a known declaration
//! (same file preferred), and anything else — dynamic dispatch, computed
//! keys, re-exported aliases — resolves to nothing and yields no edge.
//!
//! Files are parsed once when added; every trait operation afterwards is a
//! lookup over the extracted declarations.

use std::collections::HashMap;
use std::path::Path;

use tree_sitter::{Language, Node, Parser};

use super::{CallSite, DeclId, DeclInfo, FileId, SourceModel};
use crate::error::{CalltraceError, Result};
use crate::graph::types::{NodeKind, Parameter, Visibility};

/// Grammar to parse a file with, picked by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    TypeScript,
    Tsx,
    JavaScript,
}

impl Dialect {
    fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("tsx") => Dialect::Tsx,
            Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Dialect::JavaScript,
            _ => Dialect::TypeScript,
        }
    }

    fn language(self) -> Language {
        match self {
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Dialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

/// How a call site's callee is written in the source.
#[derive(Debug, Clone)]
enum CalleeShape {
    /// `name(...)`
    Ident(String),
    /// `object.property(...)`
    Member { object: String, property: String },
    /// `new ClassName(...)`
    New(String),
    /// Anything else — computed access, immediately-invoked results, etc.
    Opaque,
}

#[derive(Debug, Clone)]
struct TsSite {
    shape: CalleeShape,
    line: usize,
    column: usize,
    awaited: bool,
    argument_types: Vec<String>,
}

#[derive(Debug, Clone)]
struct TsDecl {
    file: FileId,
    info: DeclInfo,
    exported: bool,
    top_level_function: bool,
    binding: bool,
    sites: Vec<TsSite>,
    literals: Vec<DeclId>,
}

/// tree-sitter backed source model for TypeScript and JavaScript files.
#[derive(Default)]
pub struct TypeScriptModel {
    file_paths: Vec<String>,
    file_index: HashMap<String, FileId>,
    decls: Vec<TsDecl>,
    /// Top-level function-like declarations by name.
    name_index: HashMap<String, Vec<DeclId>>,
    /// Class methods and accessors by method name.
    method_index: HashMap<String, Vec<DeclId>>,
    /// Constructors by class name.
    ctor_index: HashMap<String, Vec<DeclId>>,
}

impl TypeScriptModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a source string under the given path and index its
    /// declarations. The path doubles as the key used by entry-point
    /// strings and node identities.
    pub fn add_source(&mut self, path: &str, source: &str) -> Result<FileId> {
        if self.file_index.contains_key(path) {
            return Ok(self.file_index[path]);
        }

        let dialect = Dialect::from_path(path);
        let mut parser = Parser::new();
        parser
            .set_language(&dialect.language())
            .map_err(|e| CalltraceError::ParserInit(e.to_string()))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| CalltraceError::ParseFailed(Path::new(path).to_path_buf()))?;

        let file = FileId(self.file_paths.len());
        self.file_paths.push(path.to_string());
        self.file_index.insert(path.to_string(), file);

        let mut extractor = Extractor {
            model: self,
            file,
            path,
            source: source.as_bytes(),
        };
        extractor.extract_root(tree.root_node());
        Ok(file)
    }

    /// Read a file from disk and add it.
    pub fn load_file(&mut self, path: &Path) -> Result<FileId> {
        let source = std::fs::read_to_string(path)?;
        self.add_source(&path.to_string_lossy(), &source)
    }

    fn decl(&self, id: DeclId) -> &TsDecl {
        &self.decls[id.0]
    }

    /// Prefer a candidate in the caller's file, falling back to the first
    /// declaration seen project-wide.
    fn pick(&self, candidates: &[DeclId], caller_file: FileId) -> Option<DeclId> {
        candidates
            .iter()
            .find(|&&id| self.decl(id).file == caller_file)
            .or_else(|| candidates.first())
            .copied()
    }
}

/// Per-file extraction pass. Borrows the model mutably for the duration of
/// one `add_source` call.
struct Extractor<'m, 's> {
    model: &'m mut TypeScriptModel,
    file: FileId,
    path: &'s str,
    source: &'s [u8],
}

impl Extractor<'_, '_> {
    fn text(&self, node: Node) -> String {
        node.utf8_text(self.source).unwrap_or("").to_string()
    }

    fn extract_root(&mut self, root: Node) {
        let mut cursor = root.walk();
        let children: Vec<Node> = root.named_children(&mut cursor).collect();
        for child in children {
            self.extract_top_level(child, false);
        }
    }

    fn extract_top_level(&mut self, node: Node, exported: bool) {
        match node.kind() {
            "export_statement" => {
                if let Some(decl) = node.child_by_field_name("declaration") {
                    self.extract_top_level(decl, true);
                }
            }
            "function_declaration" | "generator_function_declaration" => {
                self.extract_function(node, exported);
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut cursor = node.walk();
                let declarators: Vec<Node> = node
                    .named_children(&mut cursor)
                    .filter(|c| c.kind() == "variable_declarator")
                    .collect();
                for declarator in declarators {
                    self.extract_binding(declarator, exported);
                }
            }
            "class_declaration" => {
                self.extract_class(node);
            }
            _ => {}
        }
    }

    fn extract_function(&mut self, node: Node, exported: bool) {
        let name = node.child_by_field_name("name").map(|n| self.text(n));
        let info = self.decl_info(node, name, NodeKind::Function, None);
        self.finish_decl(node.child_by_field_name("body"), info, exported, true, false);
    }

    fn extract_binding(&mut self, declarator: Node, exported: bool) {
        let Some(value) = declarator.child_by_field_name("value") else {
            return;
        };
        if !is_function_literal(value.kind()) {
            return;
        }
        let name = declarator.child_by_field_name("name").map(|n| self.text(n));
        let mut info = self.decl_info(value, name, NodeKind::Function, None);
        // Report the binding's position from the declarator, not the literal.
        info.line = declarator.start_position().row + 1;
        info.column = declarator.start_position().column + 1;
        self.finish_decl(value.child_by_field_name("body"), info, exported, false, true);
    }

    fn extract_class(&mut self, node: Node) {
        let Some(class_name) = node.child_by_field_name("name").map(|n| self.text(n)) else {
            return;
        };
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let mut cursor = body.walk();
        let members: Vec<Node> = body.named_children(&mut cursor).collect();
        for member in members {
            match member.kind() {
                "method_definition" => self.extract_method(member, &class_name),
                // Class property holding an arrow function: `tick = () => ...`
                "public_field_definition" | "field_definition" => {
                    if let Some(value) = member.child_by_field_name("value") {
                        if is_function_literal(value.kind()) {
                            let name = member
                                .child_by_field_name("property")
                                .or_else(|| member.child_by_field_name("name"))
                                .map(|n| self.text(n));
                            let mut info =
                                self.decl_info(value, name, NodeKind::Method, Some(&class_name));
                            info.line = member.start_position().row + 1;
                            info.column = member.start_position().column + 1;
                            let id = self.finish_decl(
                                value.child_by_field_name("body"),
                                info,
                                false,
                                false,
                                false,
                            );
                            self.index_method(id);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn extract_method(&mut self, node: Node, class_name: &str) {
        let Some(name) = node.child_by_field_name("name").map(|n| self.text(n)) else {
            return;
        };
        let kind = if name == "constructor" {
            NodeKind::Constructor
        } else {
            NodeKind::Method
        };
        let info = self.decl_info(node, Some(name), kind, Some(class_name));
        let id = self.finish_decl(node.child_by_field_name("body"), info, false, false, false);
        self.index_method(id);
    }

    fn index_method(&mut self, id: DeclId) {
        let decl = &self.model.decls[id.0];
        let (Some(name), Some(owner)) = (decl.info.name.clone(), decl.info.owning_type.clone())
        else {
            return;
        };
        if decl.info.kind == NodeKind::Constructor {
            self.model.ctor_index.entry(owner).or_default().push(id);
        } else {
            self.model.method_index.entry(name).or_default().push(id);
        }
    }

    /// Build the DeclInfo shared by every declaration shape.
    fn decl_info(
        &self,
        node: Node,
        name: Option<String>,
        kind: NodeKind,
        owning_type: Option<&str>,
    ) -> DeclInfo {
        let is_method = owning_type.is_some();
        DeclInfo {
            name,
            file_path: self.path.to_string(),
            line: node.start_position().row + 1,
            column: node.start_position().column + 1,
            start_offset: node.start_byte(),
            kind,
            is_async: has_keyword_child(node, "async"),
            is_static: is_method.then(|| has_keyword_child(node, "static")),
            visibility: visibility_of(node, self.source),
            owning_type: owning_type.map(str::to_string),
            parameters: self.parameters_of(node),
            return_type: self.return_type_of(node),
        }
    }

    fn parameters_of(&self, node: Node) -> Vec<Parameter> {
        // Single-identifier arrow shorthand: `item => ...`
        if let Some(single) = node.child_by_field_name("parameter") {
            return vec![Parameter {
                name: self.text(single),
                type_descriptor: "any".to_string(),
                optional: false,
                default_value: None,
            }];
        }
        let Some(params) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "required_parameter" | "optional_parameter" => {
                    let name = param
                        .child_by_field_name("pattern")
                        .map(|n| self.text(n))
                        .unwrap_or_default();
                    let type_descriptor = param
                        .child_by_field_name("type")
                        .and_then(|t| t.named_child(0))
                        .map(|t| self.text(t))
                        .unwrap_or_else(|| "any".to_string());
                    let default_value = param.child_by_field_name("value").map(|n| self.text(n));
                    out.push(Parameter {
                        name,
                        type_descriptor,
                        optional: param.kind() == "optional_parameter",
                        default_value,
                    });
                }
                "identifier" => out.push(Parameter {
                    name: self.text(param),
                    type_descriptor: "any".to_string(),
                    optional: false,
                    default_value: None,
                }),
                "assignment_pattern" => {
                    let name = param
                        .child_by_field_name("left")
                        .map(|n| self.text(n))
                        .unwrap_or_default();
                    let default_value = param.child_by_field_name("right").map(|n| self.text(n));
                    out.push(Parameter {
                        name,
                        type_descriptor: "any".to_string(),
                        optional: false,
                        default_value,
                    });
                }
                // Rest/object/array patterns keep their full text as a name.
                _ => out.push(Parameter {
                    name: self.text(param),
                    type_descriptor: "any".to_string(),
                    optional: false,
                    default_value: None,
                }),
            }
        }
        out
    }

    fn return_type_of(&self, node: Node) -> String {
        node.child_by_field_name("return_type")
            .and_then(|t| t.named_child(0))
            .map(|t| self.text(t))
            .unwrap_or_else(|| "any".to_string())
    }

    /// Scan a body, record the declaration, then recurse into its nested
    /// anonymous literals. Returns the new declaration's id.
    fn finish_decl(
        &mut self,
        body: Option<Node>,
        info: DeclInfo,
        exported: bool,
        top_level_function: bool,
        binding: bool,
    ) -> DeclId {
        let mut sites = Vec::new();
        let mut literal_nodes = Vec::new();
        if let Some(body) = body {
            self.scan_body(body, &mut sites, &mut literal_nodes);
        }

        let id = DeclId(self.model.decls.len());
        let name = info.name.clone();
        self.model.decls.push(TsDecl {
            file: self.file,
            info,
            exported,
            top_level_function,
            binding,
            sites,
            literals: Vec::new(),
        });
        if let Some(name) = name {
            if top_level_function || binding || exported {
                self.model.name_index.entry(name).or_default().push(id);
            }
        }

        let literal_ids: Vec<DeclId> = literal_nodes
            .into_iter()
            .map(|node| self.extract_literal(node))
            .collect();
        self.model.decls[id.0].literals = literal_ids;
        id
    }

    /// An anonymous function literal becomes its own declaration, keyed by
    /// byte offset.
    fn extract_literal(&mut self, node: Node) -> DeclId {
        let info = self.decl_info(node, None, NodeKind::Closure, None);
        self.finish_decl(node.child_by_field_name("body"), info, false, false, false)
    }

    /// Collect call sites and directly nested literals. Stops at function
    /// boundaries: whatever sits inside a nested literal belongs to it.
    fn scan_body<'t>(&self, node: Node<'t>, sites: &mut Vec<TsSite>, literals: &mut Vec<Node<'t>>) {
        match node.kind() {
            "arrow_function" | "function_expression" | "generator_function" => {
                literals.push(node);
                return;
            }
            "function_declaration" | "generator_function_declaration" | "class_declaration"
            | "method_definition" => return,
            "call_expression" => self.record_call(node, sites),
            "new_expression" => self.record_new(node, sites),
            _ => {}
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.scan_body(child, sites, literals);
        }
    }

    fn record_call(&self, node: Node, sites: &mut Vec<TsSite>) {
        let shape = match node.child_by_field_name("function") {
            Some(callee) => match callee.kind() {
                "identifier" => CalleeShape::Ident(self.text(callee)),
                "member_expression" => {
                    let object = callee
                        .child_by_field_name("object")
                        .map(|n| self.text(n))
                        .unwrap_or_default();
                    match callee.child_by_field_name("property") {
                        Some(prop) if prop.kind() == "property_identifier" => {
                            CalleeShape::Member {
                                object,
                                property: self.text(prop),
                            }
                        }
                        _ => CalleeShape::Opaque,
                    }
                }
                _ => CalleeShape::Opaque,
            },
            None => CalleeShape::Opaque,
        };
        sites.push(self.site(node, shape));
    }

    fn record_new(&self, node: Node, sites: &mut Vec<TsSite>) {
        let shape = match node.child_by_field_name("constructor") {
            Some(callee) if callee.kind() == "identifier" => CalleeShape::New(self.text(callee)),
            _ => CalleeShape::Opaque,
        };
        sites.push(self.site(node, shape));
    }

    fn site(&self, node: Node, shape: CalleeShape) -> TsSite {
        TsSite {
            shape,
            line: node.start_position().row + 1,
            column: node.start_position().column + 1,
            awaited: is_awaited(node),
            argument_types: self.argument_types_of(node),
        }
    }

    fn argument_types_of(&self, node: Node) -> Vec<String> {
        let Some(args) = node.child_by_field_name("arguments") else {
            return Vec::new();
        };
        let mut cursor = args.walk();
        args.named_children(&mut cursor)
            .map(|arg| argument_descriptor(arg.kind()).to_string())
            .collect()
    }
}

/// Whether a node kind is an anonymous function literal.
fn is_function_literal(kind: &str) -> bool {
    matches!(kind, "arrow_function" | "function_expression" | "generator_function")
}

/// Check the call's ancestors (through parentheses) for an await operator.
fn is_awaited(node: Node) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "parenthesized_expression" => current = parent.parent(),
            "await_expression" => return true,
            _ => return false,
        }
    }
    false
}

/// Token-level modifiers (`async`, `static`, `get`, `set`) are anonymous
/// children of the declaration node.
fn has_keyword_child(node: Node, keyword: &str) -> bool {
    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .any(|c| c.kind() == keyword)
}

fn visibility_of(node: Node, source: &[u8]) -> Option<Visibility> {
    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .find(|c| c.kind() == "accessibility_modifier")
        .and_then(|c| match c.utf8_text(source).unwrap_or("") {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        })
}

/// Coarse descriptor for an argument expression, by node kind.
fn argument_descriptor(kind: &str) -> &'static str {
    match kind {
        "string" | "template_string" => "string",
        "number" => "number",
        "true" | "false" => "boolean",
        "null" => "null",
        "undefined" => "undefined",
        "arrow_function" | "function_expression" => "function",
        "object" => "object",
        "array" => "array",
        _ => "unknown",
    }
}

impl SourceModel for TypeScriptModel {
    fn file(&self, path: &str) -> Result<FileId> {
        self.file_index
            .get(path)
            .copied()
            .ok_or_else(|| CalltraceError::SourceFileNotFound(path.to_string()))
    }

    fn call_sites(&self, decl: DeclId) -> Vec<CallSite> {
        self.decl(decl)
            .sites
            .iter()
            .enumerate()
            .map(|(ordinal, s)| CallSite {
                caller: decl,
                ordinal,
                line: s.line,
                column: s.column,
                is_awaited: s.awaited,
                is_new_callee: matches!(s.shape, CalleeShape::New(_)),
                accessed_member: match &s.shape {
                    CalleeShape::Member { property, .. } => Some(property.clone()),
                    _ => None,
                },
                argument_types: s.argument_types.clone(),
            })
            .collect()
    }

    fn resolve_target(&self, site: &CallSite) -> Option<DeclId> {
        let caller = self.decl(site.caller);
        let ts_site = &caller.sites[site.ordinal];
        match &ts_site.shape {
            CalleeShape::Ident(name) => {
                self.pick(self.name_index.get(name)?, caller.file)
            }
            CalleeShape::Member { object, property } => {
                let candidates = self.method_index.get(property)?;
                // Static call through the class name.
                if let Some(&id) = candidates.iter().find(|&&id| {
                    self.decl(id).info.owning_type.as_deref() == Some(object)
                        && self.decl(id).info.is_static == Some(true)
                }) {
                    return Some(id);
                }
                // `this.method()` prefers the caller's own class.
                if object == "this" {
                    if let Some(owner) = &caller.info.owning_type {
                        if let Some(&id) = candidates.iter().find(|&&id| {
                            self.decl(id).info.owning_type.as_deref() == Some(owner)
                        }) {
                            return Some(id);
                        }
                    }
                }
                self.pick(candidates, caller.file)
            }
            CalleeShape::New(name) => self.pick(self.ctor_index.get(name)?, caller.file),
            CalleeShape::Opaque => None,
        }
    }

    fn callback_literals(&self, decl: DeclId) -> Vec<DeclId> {
        self.decl(decl).literals.clone()
    }

    fn describe(&self, decl: DeclId) -> DeclInfo {
        self.decl(decl).info.clone()
    }

    fn files_scanned(&self) -> usize {
        self.file_paths.len()
    }

    fn top_level_function(&self, file: FileId, name: &str) -> Option<DeclId> {
        self.decls.iter().enumerate().find_map(|(i, d)| {
            (d.file == file && d.top_level_function && d.info.name.as_deref() == Some(name))
                .then_some(DeclId(i))
        })
    }

    fn exported_function_like(&self, file: FileId, name: &str) -> Option<DeclId> {
        self.decls.iter().enumerate().find_map(|(i, d)| {
            (d.file == file && d.exported && d.info.name.as_deref() == Some(name))
                .then_some(DeclId(i))
        })
    }

    fn function_valued_binding(&self, file: FileId, name: &str) -> Option<DeclId> {
        self.decls.iter().enumerate().find_map(|(i, d)| {
            (d.file == file && d.binding && d.info.name.as_deref() == Some(name))
                .then_some(DeclId(i))
        })
    }

    fn class_member(&self, file: FileId, class: &str, name: &str) -> Option<DeclId> {
        self.decls.iter().enumerate().find_map(|(i, d)| {
            (d.file == file
                && d.info.owning_type.as_deref() == Some(class)
                && d.info.name.as_deref() == Some(name))
            .then_some(DeclId(i))
        })
    }
}
