//! Quill tree-walking evaluator.
//!
//! Executes a checked [`Program`] against a runtime [`Env`]. Evaluation
//! never writes to the environment, so one program may run on many
//! threads at once.

pub mod env;
pub mod error;
pub mod evaluator;

pub use error::{EvalError, EvalResult};
pub use evaluator::Evaluator;

use quill_compiler::Program;
use quill_stdlib::{Env, Value};

/// Run a compiled program.
pub fn run(program: &Program, env: &Env) -> EvalResult<Value> {
    tracing::debug!(fingerprint = program.fingerprint(), vars = env.len(), "run started");
    let result = Evaluator::new(env).eval_expr(program.expr());
    match &result {
        Ok(value) => tracing::debug!(result = value.type_name(), "run finished"),
        Err(err) => tracing::debug!(error = %err, "run failed"),
    }
    result
}
