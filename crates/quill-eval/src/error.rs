//! Runtime error types for the Quill evaluator.

use quill_stdlib::StdlibError;
use thiserror::Error;

/// Evaluation error: anything that can go wrong after a program compiled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Raised by a built-in, a host function or a method.
    #[error(transparent)]
    Stdlib(#[from] StdlibError),

    /// Operands whose run-time kinds do not support the operator.
    #[error("invalid operation: {op} (mismatched types {left} and {right})")]
    Mismatch {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("invalid operation: {op} (mismatched type {operand})")]
    UnaryMismatch { op: &'static str, operand: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {0}")]
    IntegerOverflow(&'static str),

    #[error("unknown name {0}")]
    UnknownName(String),

    #[error("{name} is not callable (type {type_name})")]
    NotCallable { name: String, type_name: String },

    #[error("cannot use # outside of map or filter")]
    PlaceholderOutsidePredicate,

    #[error("range bounds must be int (got {0})")]
    RangeBounds(String),

    /// A range or other allocation larger than the run may make.
    #[error("memory budget exceeded")]
    MemoryBudget,
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdlib_errors_keep_their_message() {
        let err = EvalError::from(StdlibError::InvalidDuration);
        assert_eq!(err.to_string(), "invalid duration");
    }

    #[test]
    fn test_mismatch_message() {
        let err = EvalError::Mismatch {
            op: "+",
            left: "string".into(),
            right: "int".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid operation: + (mismatched types string and int)"
        );
    }
}
