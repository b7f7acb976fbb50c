//! Error types for calltrace.

use std::path::PathBuf;
use thiserror::Error;

/// All errors that can cross the crate boundary.
#[derive(Debug, Error)]
pub enum CalltraceError {
    /// Entry-point string is missing the `#` separator or has an empty side.
    #[error("invalid entry point format: {0:?} (expected \"file#function\" or \"file#Class.method\")")]
    InvalidEntryPointFormat(String),

    /// The function reference after `#` has more than two dot-separated parts.
    #[error("invalid function reference: {0:?} (expected \"function\" or \"Class.method\")")]
    InvalidFunctionReference(String),

    /// The entry point names a file the source model does not know about.
    #[error("source file not found: {0}")]
    SourceFileNotFound(String),

    /// The file exists but contains no matching declaration.
    #[error("entry point not found: {reference} in {file}")]
    EntryPointNotFound { file: String, reference: String },

    /// An include/exclude pattern failed to compile.
    #[error("invalid filter pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A tree-sitter grammar could not be loaded.
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// tree-sitter returned no tree for a source file.
    #[error("failed to parse source file: {0}")]
    ParseFailed(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CalltraceError>;
