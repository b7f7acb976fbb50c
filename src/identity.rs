//! Identity scheme — the deterministic rule mapping a declaration to its
//! unique node key.

use crate::source::DeclInfo;

/// Compute the stable node id for a declaration.
///
/// Named functions, methods, and constructors get a qualified name id:
/// `"{file}#{Owner.}{name}"`. Anything without a stable qualified name
/// (arrow functions, unnamed function expressions) falls back to its byte
/// offset: `"{file}#{start_offset}"` — so two structurally identical
/// closures at different sites stay distinct nodes.
pub fn node_id(info: &DeclInfo) -> String {
    match &info.name {
        Some(name) => match &info.owning_type {
            Some(owner) => format!("{}#{}.{}", info.file_path, owner, name),
            None => format!("{}#{}", info.file_path, name),
        },
        None => format!("{}#{}", info.file_path, info.start_offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::NodeKind;

    fn info(name: Option<&str>, owner: Option<&str>, offset: usize) -> DeclInfo {
        DeclInfo {
            name: name.map(str::to_string),
            file_path: "src/a.ts".to_string(),
            line: 1,
            column: 1,
            start_offset: offset,
            kind: NodeKind::Function,
            is_async: false,
            is_static: None,
            visibility: None,
            owning_type: owner.map(str::to_string),
            parameters: vec![],
            return_type: "void".to_string(),
        }
    }

    #[test]
    fn test_named_function() {
        assert_eq!(node_id(&info(Some("main"), None, 0)), "src/a.ts#main");
    }

    #[test]
    fn test_method_is_qualified_by_owner() {
        assert_eq!(
            node_id(&info(Some("run"), Some("Worker"), 40)),
            "src/a.ts#Worker.run"
        );
    }

    #[test]
    fn test_constructor_uses_owner_qualification() {
        assert_eq!(
            node_id(&info(Some("constructor"), Some("Worker"), 12)),
            "src/a.ts#Worker.constructor"
        );
    }

    #[test]
    fn test_anonymous_falls_back_to_offset() {
        assert_eq!(node_id(&info(None, None, 123)), "src/a.ts#123");
        // Distinct offsets mean distinct identities.
        assert_ne!(node_id(&info(None, None, 123)), node_id(&info(None, None, 456)));
    }
}
