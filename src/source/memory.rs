//! In-memory source model.
//!
//! A programmatic [`SourceModel`] for building fixture programs by hand:
//! the test double used throughout this crate's test suite, and a starting
//! point for any producer that already has declarations and call
//! relationships in hand (hand-authored diagrams, precomputed indexes).

use std::collections::HashMap;

use super::{CallSite, DeclId, DeclInfo, FileId, SourceModel};
use crate::error::{CalltraceError, Result};
use crate::graph::types::{NodeKind, Visibility};

/// Handle to one registered call site: `(caller, ordinal)`.
pub type SiteRef = (DeclId, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    TopLevelFunction,
    ExportedFunctionLike,
    FunctionBinding,
    ClassMember,
    Closure,
}

#[derive(Debug, Clone)]
struct MemorySite {
    target: Option<DeclId>,
    awaited: bool,
    new_callee: bool,
    member: Option<String>,
    argument_types: Vec<String>,
    line: usize,
    column: usize,
}

#[derive(Debug, Clone)]
struct MemoryDecl {
    file: FileId,
    category: Category,
    info: DeclInfo,
    sites: Vec<MemorySite>,
    callbacks: Vec<DeclId>,
}

/// A hand-assembled program: files, declarations, and call relationships.
#[derive(Default)]
pub struct MemoryModel {
    file_paths: Vec<String>,
    file_index: HashMap<String, FileId>,
    decls: Vec<MemoryDecl>,
}

impl MemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file (idempotent). Declarations register their file
    /// automatically; this exists for files that stay empty.
    pub fn add_file(&mut self, path: &str) -> FileId {
        if let Some(&id) = self.file_index.get(path) {
            return id;
        }
        let id = FileId(self.file_paths.len());
        self.file_paths.push(path.to_string());
        self.file_index.insert(path.to_string(), id);
        id
    }

    fn push_decl(&mut self, path: &str, category: Category, info: DeclInfo) -> DeclId {
        let file = self.add_file(path);
        let id = DeclId(self.decls.len());
        self.decls.push(MemoryDecl {
            file,
            category,
            info,
            sites: Vec::new(),
            callbacks: Vec::new(),
        });
        id
    }

    fn base_info(&self, path: &str, name: Option<&str>, kind: NodeKind) -> DeclInfo {
        let ordinal = self.decls.len();
        DeclInfo {
            name: name.map(str::to_string),
            file_path: path.to_string(),
            line: ordinal * 10 + 1,
            column: 1,
            start_offset: ordinal * 100,
            kind,
            is_async: false,
            is_static: None,
            visibility: None,
            owning_type: None,
            parameters: Vec::new(),
            return_type: "void".to_string(),
        }
    }

    /// A top-level `function name(...)`.
    pub fn add_function(&mut self, path: &str, name: &str) -> DeclId {
        let info = self.base_info(path, Some(name), NodeKind::Function);
        self.push_decl(path, Category::TopLevelFunction, info)
    }

    /// A top-level `async function name(...)`.
    pub fn add_async_function(&mut self, path: &str, name: &str) -> DeclId {
        let mut info = self.base_info(path, Some(name), NodeKind::Function);
        info.is_async = true;
        self.push_decl(path, Category::TopLevelFunction, info)
    }

    /// An exported function-like declaration.
    pub fn add_exported_function(&mut self, path: &str, name: &str) -> DeclId {
        let info = self.base_info(path, Some(name), NodeKind::Function);
        self.push_decl(path, Category::ExportedFunctionLike, info)
    }

    /// A variable binding with a function-valued initializer.
    pub fn add_function_binding(&mut self, path: &str, name: &str) -> DeclId {
        let info = self.base_info(path, Some(name), NodeKind::Function);
        self.push_decl(path, Category::FunctionBinding, info)
    }

    /// A class method.
    pub fn add_method(&mut self, path: &str, class: &str, name: &str) -> DeclId {
        let mut info = self.base_info(path, Some(name), NodeKind::Method);
        info.owning_type = Some(class.to_string());
        info.visibility = Some(Visibility::Public);
        self.push_decl(path, Category::ClassMember, info)
    }

    /// The primary constructor of a class.
    pub fn add_constructor(&mut self, path: &str, class: &str) -> DeclId {
        let mut info = self.base_info(path, Some("constructor"), NodeKind::Constructor);
        info.owning_type = Some(class.to_string());
        self.push_decl(path, Category::ClassMember, info)
    }

    /// An anonymous closure at the given byte offset.
    pub fn add_closure(&mut self, path: &str, offset: usize) -> DeclId {
        let mut info = self.base_info(path, None, NodeKind::Closure);
        info.start_offset = offset;
        self.push_decl(path, Category::Closure, info)
    }

    fn push_site(&mut self, caller: DeclId, site: MemorySite) -> SiteRef {
        let decl = &mut self.decls[caller.0];
        decl.sites.push(site);
        (caller, decl.sites.len() - 1)
    }

    fn plain_site(&self, caller: DeclId, target: Option<DeclId>) -> MemorySite {
        let caller_decl = &self.decls[caller.0];
        MemorySite {
            target,
            awaited: false,
            new_callee: false,
            member: None,
            argument_types: Vec::new(),
            line: caller_decl.info.line + caller_decl.sites.len() + 1,
            column: 5,
        }
    }

    /// A direct call `target()` inside `caller`.
    pub fn add_call(&mut self, caller: DeclId, target: DeclId) -> SiteRef {
        let site = self.plain_site(caller, Some(target));
        self.push_site(caller, site)
    }

    /// An awaited call `await target()`.
    pub fn add_awaited_call(&mut self, caller: DeclId, target: DeclId) -> SiteRef {
        let mut site = self.plain_site(caller, Some(target));
        site.awaited = true;
        self.push_site(caller, site)
    }

    /// A property-access call `receiver.member(...)` resolving to `target`.
    pub fn add_member_call(&mut self, caller: DeclId, target: DeclId, member: &str) -> SiteRef {
        let mut site = self.plain_site(caller, Some(target));
        site.member = Some(member.to_string());
        self.push_site(caller, site)
    }

    /// A construction `new Target(...)`.
    pub fn add_new_call(&mut self, caller: DeclId, target: DeclId) -> SiteRef {
        let mut site = self.plain_site(caller, Some(target));
        site.new_callee = true;
        self.push_site(caller, site)
    }

    /// A call whose target cannot be determined.
    pub fn add_unresolved_call(&mut self, caller: DeclId) -> SiteRef {
        let site = self.plain_site(caller, None);
        self.push_site(caller, site)
    }

    /// Register an anonymous literal as lexically nested inside `parent`.
    pub fn add_callback_literal(&mut self, parent: DeclId, literal: DeclId) {
        self.decls[parent.0].callbacks.push(literal);
    }

    pub fn mark_awaited(&mut self, site: SiteRef) {
        self.decls[site.0 .0].sites[site.1].awaited = true;
    }

    pub fn set_argument_types(&mut self, site: SiteRef, types: &[&str]) {
        self.decls[site.0 .0].sites[site.1].argument_types =
            types.iter().map(|t| t.to_string()).collect();
    }

    fn find_in_file(
        &self,
        file: FileId,
        category: Category,
        name: &str,
    ) -> Option<DeclId> {
        self.decls.iter().enumerate().find_map(|(i, d)| {
            (d.file == file
                && d.category == category
                && d.info.owning_type.is_none()
                && d.info.name.as_deref() == Some(name))
            .then_some(DeclId(i))
        })
    }
}

impl SourceModel for MemoryModel {
    fn file(&self, path: &str) -> Result<FileId> {
        self.file_index
            .get(path)
            .copied()
            .ok_or_else(|| CalltraceError::SourceFileNotFound(path.to_string()))
    }

    fn call_sites(&self, decl: DeclId) -> Vec<CallSite> {
        self.decls[decl.0]
            .sites
            .iter()
            .enumerate()
            .map(|(ordinal, s)| CallSite {
                caller: decl,
                ordinal,
                line: s.line,
                column: s.column,
                is_awaited: s.awaited,
                is_new_callee: s.new_callee,
                accessed_member: s.member.clone(),
                argument_types: s.argument_types.clone(),
            })
            .collect()
    }

    fn resolve_target(&self, site: &CallSite) -> Option<DeclId> {
        self.decls[site.caller.0].sites[site.ordinal].target
    }

    fn callback_literals(&self, decl: DeclId) -> Vec<DeclId> {
        self.decls[decl.0].callbacks.clone()
    }

    fn describe(&self, decl: DeclId) -> DeclInfo {
        self.decls[decl.0].info.clone()
    }

    fn files_scanned(&self) -> usize {
        self.file_paths.len()
    }

    fn top_level_function(&self, file: FileId, name: &str) -> Option<DeclId> {
        self.find_in_file(file, Category::TopLevelFunction, name)
    }

    fn exported_function_like(&self, file: FileId, name: &str) -> Option<DeclId> {
        self.find_in_file(file, Category::ExportedFunctionLike, name)
    }

    fn function_valued_binding(&self, file: FileId, name: &str) -> Option<DeclId> {
        self.find_in_file(file, Category::FunctionBinding, name)
    }

    fn class_member(&self, file: FileId, class: &str, name: &str) -> Option<DeclId> {
        self.decls.iter().enumerate().find_map(|(i, d)| {
            (d.file == file
                && d.category == Category::ClassMember
                && d.info.owning_type.as_deref() == Some(class)
                && d.info.name.as_deref() == Some(name))
            .then_some(DeclId(i))
        })
    }
}
