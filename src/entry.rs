//! Entry point resolver.
//!
//! Turns a `"file#function"` / `"file#Class.method"` string into the
//! declaration where traversal starts. Parsing and resolution failures are
//! the only fatal errors in an analysis, and both happen before any
//! traversal state exists.

use crate::error::{CalltraceError, Result};
use crate::source::{DeclId, SourceModel};

/// A parsed entry-point string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPointSpec {
    pub file_path: String,
    /// Present for `file#Class.method` form.
    pub class_name: Option<String>,
    pub function_name: String,
}

impl EntryPointSpec {
    /// Parse an entry-point string.
    ///
    /// Accepted shapes: `<filePath>#<functionName>` and
    /// `<filePath>#<ClassName>.<functionName>`.
    pub fn parse(raw: &str) -> Result<Self> {
        let Some((file_path, reference)) = raw.split_once('#') else {
            return Err(CalltraceError::InvalidEntryPointFormat(raw.to_string()));
        };
        if file_path.is_empty() || reference.is_empty() {
            return Err(CalltraceError::InvalidEntryPointFormat(raw.to_string()));
        }

        let parts: Vec<&str> = reference.split('.').collect();
        if parts.len() > 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(CalltraceError::InvalidFunctionReference(
                reference.to_string(),
            ));
        }

        let (class_name, function_name) = match parts.as_slice() {
            [function] => (None, (*function).to_string()),
            [class, function] => (Some((*class).to_string()), (*function).to_string()),
            _ => unreachable!("length checked above"),
        };

        Ok(Self {
            file_path: file_path.to_string(),
            class_name,
            function_name,
        })
    }

    /// The function reference as written after the `#`.
    pub fn reference(&self) -> String {
        match &self.class_name {
            Some(class) => format!("{}.{}", class, self.function_name),
            None => self.function_name.clone(),
        }
    }

    /// Locate the declaration this spec names.
    ///
    /// Without a class name the search order is: top-level function, then
    /// exported function-like declaration, then a variable binding with a
    /// function-valued initializer. With a class name, the class's methods
    /// and accessors are searched (`constructor` names the primary
    /// constructor).
    pub fn resolve<M: SourceModel>(&self, model: &M) -> Result<DeclId> {
        let file = model.file(&self.file_path)?;

        let found = match &self.class_name {
            Some(class) => model.class_member(file, class, &self.function_name),
            None => model
                .top_level_function(file, &self.function_name)
                .or_else(|| model.exported_function_like(file, &self.function_name))
                .or_else(|| model.function_valued_binding(file, &self.function_name)),
        };

        found.ok_or_else(|| CalltraceError::EntryPointNotFound {
            file: self.file_path.clone(),
            reference: self.reference(),
        })
    }
}
