//! Collection access: `len`, `get`, `first`, `last`, `keys`, `values`, and
//! the higher-order `map` / `filter`.

use quill_types::Kind;

use crate::error::{StdlibError, StdlibResult};
use crate::registry::{ArgError, ArgInfo, Arity, Builtin, StdlibModule};
use crate::value::{resolve_index, Value};

pub struct CoreModule;

impl StdlibModule for CoreModule {
    fn name(&self) -> &'static str {
        "core"
    }

    fn builtins(&self) -> Vec<Builtin> {
        vec![
            Builtin::new(
                "len",
                "core",
                Arity::Exact(1),
                "Number of elements in an array or map, or characters in a string.",
                len_kind,
                len,
            ),
            Builtin::new(
                "get",
                "core",
                Arity::Exact(2),
                "Element at an index or key; nil when absent.",
                get_kind,
                get,
            ),
            Builtin::new(
                "first",
                "core",
                Arity::Exact(1),
                "First element of an array; nil when empty.",
                element_kind,
                first,
            ),
            Builtin::new(
                "last",
                "core",
                Arity::Exact(1),
                "Last element of an array; nil when empty.",
                element_kind,
                last,
            ),
            Builtin::new(
                "keys",
                "core",
                Arity::Exact(1),
                "Keys of a map.",
                keys_kind,
                keys,
            ),
            Builtin::new(
                "values",
                "core",
                Arity::Exact(1),
                "Values of a map.",
                values_kind,
                values,
            ),
            Builtin::higher_order(
                "map",
                "core",
                "Apply the predicate to every element; `#` is the element.",
                map_kind,
            ),
            Builtin::higher_order(
                "filter",
                "core",
                "Keep elements for which the predicate is truthy; `#` is the element.",
                filter_kind,
            ),
        ]
    }
}

// ── Kind rules ───────────────────────────────────────────────────────────────

fn len_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    let kind = &args[0].kind;
    if kind.is_array() || kind.is_map() || kind.is_string() {
        Ok(Kind::Int)
    } else {
        Err(ArgError::Invalid(0))
    }
}

fn get_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    let (target, key) = (&args[0], &args[1]);
    match &target.kind {
        Kind::Array(elem) if key.kind.is_integer() => Ok((**elem).clone()),
        Kind::Map(value) if key.kind.is_string() => Ok((**value).clone()),
        Kind::Record(fields) if key.kind.is_string() => {
            let field = match &key.constant {
                Some(Value::String(name)) => fields.get(name).cloned(),
                _ => None,
            };
            Ok(field.unwrap_or_else(|| target.kind.element()))
        }
        Kind::Array(_) | Kind::Map(_) | Kind::Record(_) => Err(ArgError::Invalid(1)),
        k if k.is_dynamic() => Ok(Kind::Any),
        other => Err(ArgError::Message(
            StdlibError::NotIndexable(other.to_string()).to_string(),
        )),
    }
}

fn element_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    match &args[0].kind {
        Kind::Array(elem) => Ok((**elem).clone()),
        k if k.is_dynamic() => Ok(Kind::Any),
        _ => Err(ArgError::Invalid(0)),
    }
}

fn keys_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    if args[0].kind.is_map() {
        Ok(Kind::array(Kind::String))
    } else {
        Err(ArgError::Invalid(0))
    }
}

fn values_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    if args[0].kind.is_map() {
        Ok(Kind::array(args[0].kind.element()))
    } else {
        Err(ArgError::Invalid(0))
    }
}

/// `args[1]` is the predicate, already checked with `#` bound.
fn map_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    if args[0].kind.is_array() {
        Ok(Kind::array(args[1].kind.clone()))
    } else {
        Err(ArgError::Invalid(0))
    }
}

fn filter_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    match &args[0].kind {
        Kind::Array(_) => Ok(args[0].kind.clone()),
        k if k.is_dynamic() => Ok(Kind::array(Kind::Any)),
        _ => Err(ArgError::Invalid(0)),
    }
}

// ── Behavior ─────────────────────────────────────────────────────────────────

fn len(args: &[Value]) -> StdlibResult<Value> {
    let n = args[0]
        .len()
        .ok_or_else(|| StdlibError::invalid_argument("len", args[0].type_name()))?;
    i64::try_from(n)
        .map(Value::Int)
        .map_err(|_| StdlibError::runtime("length overflows int"))
}

fn get(args: &[Value]) -> StdlibResult<Value> {
    match (&args[0], &args[1]) {
        (Value::Array(items), Value::Int(i)) => Ok(resolve_index(*i, items.len())
            .map(|i| items[i].clone())
            .unwrap_or(Value::Nil)),
        (Value::Map(entries), Value::String(k)) => {
            Ok(entries.get(k).cloned().unwrap_or(Value::Nil))
        }
        (Value::Array(_) | Value::Map(_), key) => {
            Err(StdlibError::invalid_argument("get", key.type_name()))
        }
        (Value::Object(obj), key) => obj.index(key),
        (other, _) => Err(StdlibError::NotIndexable(other.type_name().to_string())),
    }
}

fn array_arg<'a>(name: &str, value: &'a Value) -> StdlibResult<&'a [Value]> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(StdlibError::invalid_argument(name, other.type_name())),
    }
}

fn first(args: &[Value]) -> StdlibResult<Value> {
    let items = array_arg("first", &args[0])?;
    Ok(items.first().cloned().unwrap_or(Value::Nil))
}

fn last(args: &[Value]) -> StdlibResult<Value> {
    let items = array_arg("last", &args[0])?;
    Ok(items.last().cloned().unwrap_or(Value::Nil))
}

fn keys(args: &[Value]) -> StdlibResult<Value> {
    match &args[0] {
        Value::Map(entries) => Ok(Value::Array(
            entries.keys().map(|k| Value::String(k.clone())).collect(),
        )),
        other => Err(StdlibError::invalid_argument("keys", other.type_name())),
    }
}

fn values(args: &[Value]) -> StdlibResult<Value> {
    match &args[0] {
        Value::Map(entries) => Ok(Value::Array(entries.values().cloned().collect())),
        other => Err(StdlibError::invalid_argument("values", other.type_name())),
    }
}
