//! Errors raised by built-in functions and host objects.

use thiserror::Error;

/// Error returned by a built-in or a host callable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StdlibError {
    /// Wrong number of arguments; the message is already in its final form.
    #[error("{0}")]
    Arity(String),

    #[error("invalid argument for {name} (type {type_name})")]
    InvalidArgument { name: String, type_name: String },

    #[error("type {0} does not support indexing")]
    NotIndexable(String),

    #[error("type {type_name} has no method {method}")]
    UnknownMethod { type_name: String, method: String },

    #[error("invalid duration")]
    InvalidDuration,

    #[error("invalid date")]
    InvalidDate,

    #[error("json: {0}")]
    Json(String),

    #[error("base64: {0}")]
    Base64(String),

    /// A built-in would allocate more than the evaluation budget allows.
    #[error("memory budget exceeded")]
    MemoryBudget,

    /// Any other failure inside a built-in or host function.
    #[error("{0}")]
    RuntimeError(String),
}

impl StdlibError {
    pub fn invalid_argument(name: &str, type_name: &str) -> Self {
        StdlibError::InvalidArgument {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        StdlibError::RuntimeError(message.into())
    }
}

/// Result alias for built-in operations.
pub type StdlibResult<T> = Result<T, StdlibError>;
