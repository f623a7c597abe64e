//! Quill built-in library.
//!
//! Holds the runtime [`Value`] model, the host-object protocol, the runtime
//! [`Env`], and the [`BuiltinRegistry`]: one table that gives both the
//! checker (arity + kind rule) and the evaluator (native behavior) what they
//! need to know about every built-in function.

pub mod env;
pub mod error;
pub mod layout;
pub mod methods;
pub mod modules;
pub mod registry;
pub mod value;

pub use env::Env;
pub use error::{StdlibError, StdlibResult};
pub use registry::{builtins, ArgError, ArgInfo, Arity, Builtin, BuiltinRegistry, StdlibModule};
pub use value::{Function, HostObject, Value};
