//! Built-in function registry.
//!
//! Every built-in is described once: its arity, a kind rule the checker uses
//! to validate arguments and infer the result, and the native behavior the
//! evaluator calls. Modules contribute their built-ins through
//! [`StdlibModule`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use quill_types::Kind;

use crate::error::{StdlibError, StdlibResult};
use crate::modules;
use crate::value::Value;

// ══════════════════════════════════════════════════════════════════════════════
// Arity
// ══════════════════════════════════════════════════════════════════════════════

/// Number of arguments a built-in accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive bounds, for built-ins with optional trailing arguments.
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exact(k) => n == k,
            Arity::Between(min, max) => (min..=max).contains(&n),
            Arity::AtLeast(min) => n >= min,
        }
    }

    /// Error message for a call of `name` with `got` arguments, or `None`
    /// if the count is accepted.
    pub fn mismatch(&self, name: &str, got: usize) -> Option<String> {
        if self.accepts(got) {
            return None;
        }
        Some(match *self {
            Arity::Exact(expected) => {
                format!("invalid number of arguments (expected {expected}, got {got})")
            }
            Arity::Between(min, _) | Arity::AtLeast(min) if got < min => {
                format!("not enough arguments to call {name}")
            }
            _ => format!("too many arguments to call {name}"),
        })
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::Between(min, max) => write!(f, "{min}..{max}"),
            Arity::AtLeast(min) => write!(f, "{min}+"),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Kind rules
// ══════════════════════════════════════════════════════════════════════════════

/// What the checker knows about one argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgInfo {
    pub kind: Kind,
    /// The literal value, when the argument is a literal.
    pub constant: Option<Value>,
}

impl ArgInfo {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            constant: None,
        }
    }

    pub fn constant(value: Value) -> Self {
        Self {
            kind: value.kind(),
            constant: Some(value),
        }
    }
}

/// Rejection from a kind rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgError {
    /// The argument at this position has an unacceptable kind; reported as
    /// `invalid argument for <name> (type <kind>)`.
    Invalid(usize),
    /// A fully formed message.
    Message(String),
}

/// Validates argument kinds and computes the result kind.
pub type KindRule = fn(&[ArgInfo]) -> Result<Kind, ArgError>;

/// Native behavior of a built-in.
pub type NativeFn = fn(&[Value]) -> StdlibResult<Value>;

// ══════════════════════════════════════════════════════════════════════════════
// Builtin
// ══════════════════════════════════════════════════════════════════════════════

/// One built-in function.
#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub module: &'static str,
    pub arity: Arity,
    pub description: &'static str,
    pub kind_rule: KindRule,
    /// `None` for built-ins whose arguments the evaluator handles itself
    /// (`map`, `filter`).
    pub native: Option<NativeFn>,
}

impl Builtin {
    pub fn new(
        name: &'static str,
        module: &'static str,
        arity: Arity,
        description: &'static str,
        kind_rule: KindRule,
        native: NativeFn,
    ) -> Self {
        Self {
            name,
            module,
            arity,
            description,
            kind_rule,
            native: Some(native),
        }
    }

    /// A built-in that takes a predicate evaluated per element.
    pub fn higher_order(
        name: &'static str,
        module: &'static str,
        description: &'static str,
        kind_rule: KindRule,
    ) -> Self {
        Self {
            name,
            module,
            arity: Arity::Exact(2),
            description,
            kind_rule,
            native: None,
        }
    }

    pub fn is_higher_order(&self) -> bool {
        self.native.is_none()
    }

    /// Check the argument count.
    pub fn check_arity(&self, got: usize) -> Result<(), String> {
        match self.arity.mismatch(self.name, got) {
            Some(message) => Err(message),
            None => Ok(()),
        }
    }

    /// Validate argument kinds and compute the result kind, with the
    /// final error message.
    pub fn kind_of_call(&self, args: &[ArgInfo]) -> Result<Kind, String> {
        self.check_arity(args.len())?;
        (self.kind_rule)(args).map_err(|err| match err {
            ArgError::Invalid(i) => {
                let kind = args.get(i).map(|a| a.kind.to_string()).unwrap_or_default();
                StdlibError::invalid_argument(self.name, &kind).to_string()
            }
            ArgError::Message(message) => message,
        })
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("arity", &self.arity)
            .finish()
    }
}

/// A group of related built-ins.
pub trait StdlibModule {
    fn name(&self) -> &'static str;
    fn builtins(&self) -> Vec<Builtin>;
}

// ══════════════════════════════════════════════════════════════════════════════
// Registry
// ══════════════════════════════════════════════════════════════════════════════

/// Name → built-in table shared by the checker and the evaluator.
#[derive(Debug)]
pub struct BuiltinRegistry {
    builtins: BTreeMap<&'static str, Builtin>,
}

impl BuiltinRegistry {
    /// Registry with every standard module.
    pub fn new() -> Self {
        let mut reg = Self {
            builtins: BTreeMap::new(),
        };
        reg.register(&modules::core::CoreModule);
        reg.register(&modules::math::MathModule);
        reg.register(&modules::convert::ConvertModule);
        reg.register(&modules::strings::StringModule);
        reg.register(&modules::json::JsonModule);
        reg.register(&modules::encoding::EncodingModule);
        reg.register(&modules::time::TimeModule);
        reg
    }

    /// Add every built-in of `module`; later registrations replace earlier ones.
    pub fn register(&mut self, module: &dyn StdlibModule) {
        for builtin in module.builtins() {
            self.builtins.insert(builtin.name, builtin);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.builtins.get(name)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Built-ins in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Builtin> {
        self.builtins.values()
    }

    pub fn len(&self) -> usize {
        self.builtins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builtins.is_empty()
    }

    /// Call a first-order built-in by name.
    pub fn call(&self, name: &str, args: &[Value]) -> StdlibResult<Value> {
        let builtin = self
            .get(name)
            .ok_or_else(|| StdlibError::runtime(format!("unknown function {name}")))?;
        builtin.check_arity(args.len()).map_err(StdlibError::Arity)?;
        let native = builtin.native.ok_or_else(|| {
            StdlibError::runtime(format!("{name} requires a predicate argument"))
        })?;
        tracing::trace!(builtin = name, args = args.len(), "calling built-in");
        native(args)
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide registry, built on first use.
pub fn builtins() -> &'static BuiltinRegistry {
    static REGISTRY: OnceLock<BuiltinRegistry> = OnceLock::new();
    REGISTRY.get_or_init(BuiltinRegistry::new)
}

// ── Shared argument helpers ──────────────────────────────────────────────────

/// Accept the argument at `i` if its kind may be used as `expected`.
pub(crate) fn expect_kind(args: &[ArgInfo], i: usize, expected: &Kind) -> Result<(), ArgError> {
    match args.get(i) {
        Some(arg) if arg.kind.is_assignable_to(expected) => Ok(()),
        Some(_) => Err(ArgError::Invalid(i)),
        None => Ok(()),
    }
}

/// Accept every argument if each may be used as `expected`.
pub(crate) fn expect_all(args: &[ArgInfo], expected: &Kind) -> Result<(), ArgError> {
    (0..args.len()).try_for_each(|i| expect_kind(args, i, expected))
}

/// Runtime counterpart of [`expect_kind`] for string arguments.
pub(crate) fn string_arg<'a>(name: &str, args: &'a [Value], i: usize) -> StdlibResult<&'a str> {
    match args.get(i) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(StdlibError::invalid_argument(name, other.type_name())),
        None => Err(StdlibError::Arity(format!("not enough arguments to call {name}"))),
    }
}

/// Runtime integer argument.
pub(crate) fn int_arg(name: &str, args: &[Value], i: usize) -> StdlibResult<i64> {
    match args.get(i) {
        Some(Value::Int(n)) => Ok(*n),
        Some(other) => Err(StdlibError::invalid_argument(name, other.type_name())),
        None => Err(StdlibError::Arity(format!("not enough arguments to call {name}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_messages() {
        assert_eq!(
            Arity::Exact(1).mismatch("len", 2).as_deref(),
            Some("invalid number of arguments (expected 1, got 2)")
        );
        assert_eq!(
            Arity::Between(1, 2).mismatch("trim", 0).as_deref(),
            Some("not enough arguments to call trim")
        );
        assert_eq!(
            Arity::Between(1, 2).mismatch("trim", 3).as_deref(),
            Some("too many arguments to call trim")
        );
        assert_eq!(
            Arity::AtLeast(1).mismatch("max", 0).as_deref(),
            Some("not enough arguments to call max")
        );
        assert_eq!(Arity::AtLeast(1).mismatch("max", 5), None);
    }

    #[test]
    fn test_registry_has_every_module() {
        let reg = builtins();
        for name in [
            "len", "get", "map", "filter", "abs", "max", "int", "trim", "join", "toJSON",
            "toBase64", "now", "duration", "date",
        ] {
            assert!(reg.is_builtin(name), "missing built-in {name}");
        }
        assert!(!reg.is_builtin("sprintf"));
        assert!(reg.get("map").is_some_and(Builtin::is_higher_order));
    }

    #[test]
    fn test_registry_call_checks_arity() {
        let err = builtins().call("len", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid number of arguments (expected 1, got 0)"
        );
        assert_eq!(
            builtins().call("len", &[Value::from("héllo")]),
            Ok(Value::Int(5))
        );
    }

    #[test]
    fn test_invalid_argument_message() {
        let abs = builtins().get("abs").expect("abs");
        let err = abs
            .kind_of_call(&[ArgInfo::new(Kind::String)])
            .unwrap_err();
        assert_eq!(err, "invalid argument for abs (type string)");
    }
}
