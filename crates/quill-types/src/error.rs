use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of diagnostics kept before fail-fast.
pub const MAX_ERRORS: usize = 20;

/// Diagnostic category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Lexical and syntactic errors.
    Parse,
    /// Name resolution, arity and kind errors.
    Check,
}

/// Numeric error code (E100–E299).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Parse errors (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNEXPECTED_CHARACTER: Self = Self(101);
    pub const UNTERMINATED_STRING: Self = Self(102);
    pub const INVALID_ESCAPE: Self = Self(103);
    pub const INVALID_NUMBER: Self = Self(104);
    pub const UNTERMINATED_COMMENT: Self = Self(105);
    pub const PIPES_DISABLED: Self = Self(106);
    pub const INVALID_PIPE_TARGET: Self = Self(107);
    pub const NESTING_TOO_DEEP: Self = Self(108);

    // ── Check errors (E200–E299) ──
    pub const UNKNOWN_NAME: Self = Self(200);
    pub const TYPE_MISMATCH: Self = Self(201);
    pub const WRONG_ARG_COUNT: Self = Self(202);
    pub const INVALID_ARGUMENT: Self = Self(203);
    pub const NOT_INDEXABLE: Self = Self(204);
    pub const NOT_CALLABLE: Self = Self(205);
    pub const UNKNOWN_MEMBER: Self = Self(206);
    pub const PLACEHOLDER_OUTSIDE_PREDICATE: Self = Self(207);
    pub const UNEXPECTED_RESULT_KIND: Self = Self(208);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Parse,
            _ => ErrorCategory::Check,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::Check => write!(f, "check"),
        }
    }
}

/// A structured compile-time diagnostic.
///
/// Hosts can render these directly or serialize them; the message text
/// is stable and never needs to be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Source name given to the compiler.
    pub file: String,
    /// Error code (e.g., E203).
    pub code: ErrorCode,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// Source location.
    pub span: Span,
    /// The source line the error starts on.
    pub source_line: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
        }
    }

    /// Byte offset of the error in the source.
    pub fn offset(&self) -> usize {
        self.span.start as usize
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}: {} [{}])",
            self.message, self.span, self.code, self.category
        )
    }
}

impl std::error::Error for Diagnostic {}

/// Diagnostics collected by one compile-time stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<Diagnostic>,
    pub total_errors: usize,
}

impl CompileErrors {
    /// Create an empty collection.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: Diagnostic) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Append everything collected by another stage.
    pub fn extend(&mut self, other: CompileErrors) {
        let dropped = other.total_errors.saturating_sub(other.errors.len());
        for err in other.errors {
            self.push_error(err);
        }
        self.total_errors += dropped;
    }

    /// The first error in source order of discovery.
    pub fn first(&self) -> Option<&Diagnostic> {
        self.errors.first()
    }

    /// Consume the collection, returning the first error.
    pub fn into_first(self) -> Option<Diagnostic> {
        self.errors.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(code: ErrorCode, message: &str) -> Diagnostic {
        Diagnostic::new("expr", code, message, Span::new(4, 9, 1, 5), "1 + abs(\"x\")")
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::UNEXPECTED_TOKEN.category(), ErrorCategory::Parse);
        assert_eq!(ErrorCode::NESTING_TOO_DEEP.category(), ErrorCategory::Parse);
        assert_eq!(ErrorCode::TYPE_MISMATCH.category(), ErrorCategory::Check);
        assert_eq!(ErrorCode::INVALID_ARGUMENT.category(), ErrorCategory::Check);
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(format!("{}", ErrorCode::TYPE_MISMATCH), "E201");
        assert_eq!(format!("{}", ErrorCode::UNEXPECTED_TOKEN), "E100");
    }

    #[test]
    fn test_diagnostic_display_starts_with_message() {
        let err = diag(
            ErrorCode::INVALID_ARGUMENT,
            "invalid argument for abs (type string)",
        );
        let text = err.to_string();
        assert!(text.starts_with("invalid argument for abs (type string)"));
        assert!(text.contains("1:5"));
        assert!(text.contains("E203"));
        assert_eq!(err.offset(), 4);
    }

    #[test]
    fn test_diagnostic_json_serialization() {
        let err = diag(ErrorCode::UNKNOWN_NAME, "unknown name foo");
        let json = serde_json::to_string_pretty(&err).unwrap();
        assert!(json.contains("\"code\""));
        assert!(json.contains("\"category\": \"check\""));
        assert!(json.contains("\"source_line\""));

        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_compile_errors_max_limit() {
        let mut errs = CompileErrors::empty();
        for i in 0..25 {
            errs.push_error(diag(ErrorCode::UNEXPECTED_TOKEN, &format!("error {i}")));
        }
        assert_eq!(errs.errors.len(), 20);
        assert_eq!(errs.total_errors, 25);
        assert_eq!(errs.first().map(|e| e.message.as_str()), Some("error 0"));
    }

    #[test]
    fn test_compile_errors_extend_keeps_totals() {
        let mut a = CompileErrors::empty();
        a.push_error(diag(ErrorCode::UNEXPECTED_TOKEN, "first"));
        let mut b = CompileErrors::empty();
        for _ in 0..22 {
            b.push_error(diag(ErrorCode::TYPE_MISMATCH, "later"));
        }
        a.extend(b);
        assert_eq!(a.total_errors, 23);
        assert_eq!(a.errors.len(), 20);
        assert_eq!(a.into_first().map(|e| e.message), Some("first".to_string()));
    }

    #[test]
    fn test_compile_errors_empty() {
        let errs = CompileErrors::empty();
        assert!(!errs.has_errors());
        assert!(errs.first().is_none());
    }
}
