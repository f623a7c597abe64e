//! Numeric built-ins: `abs`, `max`, `min`, `ceil`, `floor`, `round`.

use std::cmp::Ordering;

use quill_types::Kind;

use crate::error::{StdlibError, StdlibResult};
use crate::registry::{ArgError, ArgInfo, Arity, Builtin, StdlibModule};
use crate::value::Value;

pub struct MathModule;

impl StdlibModule for MathModule {
    fn name(&self) -> &'static str {
        "math"
    }

    fn builtins(&self) -> Vec<Builtin> {
        vec![
            Builtin::new(
                "abs",
                "math",
                Arity::Exact(1),
                "Absolute value.",
                same_numeric_kind,
                abs,
            ),
            Builtin::new(
                "max",
                "math",
                Arity::AtLeast(1),
                "Largest of the arguments.",
                unified_numeric_kind,
                max,
            ),
            Builtin::new(
                "min",
                "math",
                Arity::AtLeast(1),
                "Smallest of the arguments.",
                unified_numeric_kind,
                min,
            ),
            Builtin::new(
                "ceil",
                "math",
                Arity::Exact(1),
                "Smallest integral float not less than the argument.",
                float_kind,
                |args| rounding("ceil", &args[0], f64::ceil),
            ),
            Builtin::new(
                "floor",
                "math",
                Arity::Exact(1),
                "Largest integral float not greater than the argument.",
                float_kind,
                |args| rounding("floor", &args[0], f64::floor),
            ),
            Builtin::new(
                "round",
                "math",
                Arity::Exact(1),
                "Nearest integral float, halves away from zero.",
                float_kind,
                |args| rounding("round", &args[0], f64::round),
            ),
        ]
    }
}

// ── Kind rules ───────────────────────────────────────────────────────────────

fn same_numeric_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    match &args[0].kind {
        Kind::Int => Ok(Kind::Int),
        Kind::Float => Ok(Kind::Float),
        k if k.is_dynamic() => Ok(Kind::Any),
        _ => Err(ArgError::Invalid(0)),
    }
}

fn unified_numeric_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    let mut result = Kind::Unknown;
    for (i, arg) in args.iter().enumerate() {
        if !arg.kind.is_numeric() {
            return Err(ArgError::Invalid(i));
        }
        result = result.unify(&arg.kind);
    }
    Ok(match result {
        Kind::Int | Kind::Float => result,
        _ => Kind::Any,
    })
}

fn float_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    if args[0].kind.is_numeric() {
        Ok(Kind::Float)
    } else {
        Err(ArgError::Invalid(0))
    }
}

// ── Behavior ─────────────────────────────────────────────────────────────────

fn abs(args: &[Value]) -> StdlibResult<Value> {
    match &args[0] {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| StdlibError::runtime("integer overflow in abs")),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(StdlibError::invalid_argument("abs", other.type_name())),
    }
}

fn max(args: &[Value]) -> StdlibResult<Value> {
    extreme("max", args, Ordering::Greater)
}

fn min(args: &[Value]) -> StdlibResult<Value> {
    extreme("min", args, Ordering::Less)
}

/// Pick the argument that compares as `wanted` against every other one; the
/// result is a float if any argument is a float.
fn extreme(name: &str, args: &[Value], wanted: Ordering) -> StdlibResult<Value> {
    let mut best: Option<&Value> = None;
    let mut any_float = false;
    for arg in args {
        if arg.as_f64().is_none() {
            return Err(StdlibError::invalid_argument(name, arg.type_name()));
        }
        any_float |= matches!(arg, Value::Float(_));
        if best.map_or(true, |b| compare_numbers(arg, b) == Some(wanted)) {
            best = Some(arg);
        }
    }
    match best {
        Some(Value::Int(n)) if any_float => Ok(Value::Float(*n as f64)),
        Some(v) => Ok(v.clone()),
        None => Err(StdlibError::Arity(format!("not enough arguments to call {name}"))),
    }
}

/// Ints compare exactly; anything involving a float compares as f64.
fn compare_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn rounding(name: &str, value: &Value, op: fn(f64) -> f64) -> StdlibResult<Value> {
    value
        .as_f64()
        .map(|n| Value::Float(op(n)))
        .ok_or_else(|| StdlibError::invalid_argument(name, value.type_name()))
}
