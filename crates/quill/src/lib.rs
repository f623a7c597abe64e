//! Quill: an embeddable expression language.
//!
//! Hosts compile a short expression once against a declared environment,
//! then run the resulting [`Program`] against concrete environments.
//!
//! ```
//! use quill::{compile, run, Env, Options, Value};
//!
//! let env = Env::new().with("age", 42);
//! let program = compile("age >= 18 && age < 65", Options::new().env(&env)).unwrap();
//! assert_eq!(run(&program, &env).unwrap(), Value::Bool(true));
//! ```

use thiserror::Error;

pub use quill_compiler::reference::builtin_table;
pub use quill_compiler::{Descriptor, Options, Program};
pub use quill_eval::EvalError;
pub use quill_stdlib::{Env, Function, HostObject, StdlibError, StdlibResult, Value};
pub use quill_types::{CompileErrors, Diagnostic, ErrorCategory, ErrorCode, Kind, Signature};

/// Any error a host can get back from Quill.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Parse or check failure, reported by [`compile`].
    #[error(transparent)]
    Compile(#[from] Diagnostic),

    /// Failure while running, reported by [`run`].
    #[error(transparent)]
    Runtime(#[from] EvalError),
}

impl Error {
    /// The diagnostic, for compile errors.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Error::Compile(diag) => Some(diag),
            Error::Runtime(_) => None,
        }
    }
}

/// Parse and check `source`.
pub fn compile(source: &str, options: Options) -> Result<Program, Error> {
    Ok(quill_compiler::compile(source, &options)?)
}

/// Evaluate a compiled program against `env`.
pub fn run(program: &Program, env: &Env) -> Result<Value, Error> {
    Ok(quill_eval::run(program, env)?)
}

/// Compile without a descriptor and run once. Names resolve at run time.
pub fn eval(source: &str, env: &Env) -> Result<Value, Error> {
    tracing::trace!(len = source.len(), "eval");
    let program = compile(source, Options::new())?;
    run(&program, env)
}
