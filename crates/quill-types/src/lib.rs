//! Shared types for the Quill expression language.
//!
//! This crate defines the AST node types, the [`Kind`] lattice used by the
//! checker, source spans and the diagnostic types shared by every stage.

mod error;
mod span;
pub mod ast;
pub mod kind;

pub use error::{CompileErrors, Diagnostic, ErrorCategory, ErrorCode, MAX_ERRORS};
pub use kind::{Kind, Signature};
pub use span::{SourceFile, Span};

/// Result type used by the compile-time stages.
pub type Result<T> = std::result::Result<T, Diagnostic>;
