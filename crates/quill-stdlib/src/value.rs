//! Runtime values.
//!
//! [`Value`] is the single representation every expression evaluates to.
//! Host data enters either as plain values or as [`HostObject`]s reached
//! through a small reflective protocol.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use indexmap::IndexMap;
use quill_types::{Kind, Signature};

use crate::error::{StdlibError, StdlibResult};
use crate::modules::time::format_duration;

// ══════════════════════════════════════════════════════════════════════════════
// Value
// ══════════════════════════════════════════════════════════════════════════════

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// String-keyed map; insertion order is kept for display only.
    Map(IndexMap<String, Value>),
    /// An instant with a fixed UTC offset.
    Time(DateTime<FixedOffset>),
    /// A signed span of time with nanosecond resolution.
    Duration(TimeDelta),
    /// A host callable.
    Func(Function),
    /// A host value reached through [`HostObject`].
    Object(Arc<dyn HostObject>),
}

impl Value {
    /// Runtime type name, as used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Time(_) => "time",
            Value::Duration(_) => "duration",
            Value::Func(_) => "func",
            Value::Object(obj) => obj.type_name(),
        }
    }

    /// Static kind inferred from this value.
    ///
    /// Heterogeneous or empty arrays infer `array<any>`; nil and host
    /// objects infer `any`.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil | Value::Object(_) => Kind::Any,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Time(_) => Kind::Time,
            Value::Duration(_) => Kind::Duration,
            Value::Func(f) => Kind::func(f.signature().clone()),
            Value::Array(items) => Kind::array(common_kind(items.iter())),
            Value::Map(entries) => Kind::map(common_kind(entries.values())),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// `false`, `nil`, `0`, `0.0` and `""` are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Numeric value as a float, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Structural equality used by `==`; `1 == 1.0` holds.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.loose_eq(w)))
            }
            _ => self == other,
        }
    }

    /// Number of elements, for values that have a length.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            Value::Object(obj) => obj.len(),
            _ => None,
        }
    }

    /// Member access `value.name`. Missing map keys read as nil.
    pub fn get_field(&self, name: &str) -> StdlibResult<Value> {
        match self {
            Value::Map(entries) => Ok(entries.get(name).cloned().unwrap_or(Value::Nil)),
            Value::Object(obj) => obj.get_field(name).ok_or_else(|| {
                StdlibError::runtime(format!("type {} has no field {name}", obj.type_name()))
            }),
            Value::Nil => Err(StdlibError::runtime(format!(
                "cannot fetch {name} from nil"
            ))),
            other => Err(StdlibError::runtime(format!(
                "type {} has no field {name}",
                other.type_name()
            ))),
        }
    }

    /// Index access `value[key]`.
    ///
    /// Arrays accept negative indices counted from the end; out-of-range
    /// indices are errors. Missing map keys read as nil.
    pub fn index(&self, key: &Value) -> StdlibResult<Value> {
        match (self, key) {
            (Value::Array(items), Value::Int(i)) => match resolve_index(*i, items.len()) {
                Some(i) => Ok(items[i].clone()),
                None => Err(StdlibError::runtime(format!(
                    "index out of range: {i} (array of length {})",
                    items.len()
                ))),
            },
            (Value::Map(entries), Value::String(k)) => {
                Ok(entries.get(k).cloned().unwrap_or(Value::Nil))
            }
            (Value::Array(_), other) | (Value::Map(_), other) => Err(StdlibError::runtime(
                format!("cannot use {} as index to {}", other.type_name(), self.type_name()),
            )),
            (Value::Object(obj), key) => obj.index(key),
            (other, _) => Err(StdlibError::NotIndexable(other.type_name().to_string())),
        }
    }
}

/// Resolve a possibly negative index against a length.
pub fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let i = if index < 0 { len + index } else { index };
    if (0..len).contains(&i) {
        usize::try_from(i).ok()
    } else {
        None
    }
}

fn common_kind<'a>(mut values: impl Iterator<Item = &'a Value>) -> Kind {
    let Some(first) = values.next() else {
        return Kind::Any;
    };
    values.fold(first.kind(), |acc, v| acc.unify(&v.kind()))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            // IndexMap equality ignores insertion order.
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Display
// ══════════════════════════════════════════════════════════════════════════════

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{}", format_float(*n)),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_nested(f, item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: ")?;
                    write_nested(f, v)?;
                }
                write!(f, "}}")
            }
            Value::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Duration(d) => write!(f, "{}", format_duration(*d)),
            Value::Func(func) => write!(f, "<func {}>", func.name()),
            Value::Object(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

/// Strings inside containers are quoted.
fn write_nested(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "{s:?}"),
        other => write!(f, "{other}"),
    }
}

/// Shortest natural form: `5.5`, `5`, `0.1`. Magnitudes below `1e-4` or
/// from `1e21` up use exponent form (`1e+21`, `1.5e-07`).
pub fn format_float(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "+Inf" } else { "-Inf" }.to_string()
    } else if n != 0.0 && !(1e-4..1e21).contains(&n.abs()) {
        exponent_form(n)
    } else {
        format!("{n}")
    }
}

/// `1.5e-7` becomes `1.5e-07`: signed exponent, at least two digits.
fn exponent_form(n: f64) -> String {
    let sci = format!("{n:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exp),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Float(n) => write!(f, "{n:?}"),
            other => write!(f, "{other}"),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Host callables
// ══════════════════════════════════════════════════════════════════════════════

type HostFn = dyn Fn(&[Value]) -> StdlibResult<Value> + Send + Sync;

/// A host function exposed to expressions, with its declared signature.
#[derive(Clone)]
pub struct Function {
    name: String,
    signature: Signature,
    func: Arc<HostFn>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        signature: Signature,
        func: impl Fn(&[Value]) -> StdlibResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            signature,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Invoke the host function after checking the argument count.
    pub fn call(&self, args: &[Value]) -> StdlibResult<Value> {
        let min = self.signature.params.len();
        if args.len() < min {
            return Err(StdlibError::Arity(format!(
                "not enough arguments to call {}",
                self.name
            )));
        }
        if self.signature.variadic.is_none() && args.len() > min {
            return Err(StdlibError::Arity(format!(
                "too many arguments to call {}",
                self.name
            )));
        }
        (self.func)(args)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Host objects
// ══════════════════════════════════════════════════════════════════════════════

/// Reflective protocol for host values.
///
/// Only `type_name` is required; every other capability defaults to
/// "not supported".
pub trait HostObject: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    /// `object.name`
    fn get_field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// `object.name(args...)`
    fn call_method(&self, name: &str, _args: &[Value]) -> StdlibResult<Value> {
        Err(StdlibError::UnknownMethod {
            type_name: self.type_name().to_string(),
            method: name.to_string(),
        })
    }

    /// `object[key]`
    fn index(&self, _key: &Value) -> StdlibResult<Value> {
        Err(StdlibError::NotIndexable(self.type_name().to_string()))
    }

    /// `len(object)`
    fn len(&self) -> Option<usize> {
        None
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Conversions
// ══════════════════════════════════════════════════════════════════════════════

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Value::Time(t)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t.fixed_offset())
    }
}

impl From<TimeDelta> for Value {
    fn from(d: TimeDelta) -> Self {
        Value::Duration(d)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Func(f)
    }
}

impl From<Arc<dyn HostObject>> for Value {
    fn from(obj: Arc<dyn HostObject>) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Point {
        x: i64,
    }

    impl HostObject for Point {
        fn type_name(&self) -> &str {
            "Point"
        }

        fn get_field(&self, name: &str) -> Option<Value> {
            (name == "X").then(|| Value::Int(self.x))
        }
    }

    #[test]
    fn test_truthiness() {
        for falsy in [
            Value::Nil,
            Value::Bool(false),
            Value::Int(0),
            Value::Float(0.0),
            Value::from(""),
        ] {
            assert!(!falsy.is_truthy(), "{falsy:?} should be falsy");
        }
        for truthy in [
            Value::Bool(true),
            Value::Int(-1),
            Value::from("0"),
            Value::Array(vec![]),
        ] {
            assert!(truthy.is_truthy(), "{truthy:?} should be truthy");
        }
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Int(1).loose_eq(&Value::Float(1.0)));
        assert!(Value::from(vec![1, 2]).loose_eq(&Value::from(vec![1.0, 2.0])));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert!(!Value::Nil.loose_eq(&Value::Bool(false)));
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let mut a = IndexMap::new();
        a.insert("x".to_string(), Value::Int(1));
        a.insert("y".to_string(), Value::Int(2));
        let mut b = IndexMap::new();
        b.insert("y".to_string(), Value::Int(2));
        b.insert("x".to_string(), Value::Int(1));
        assert_eq!(Value::Map(a.clone()), Value::Map(b.clone()));
        assert_eq!(Value::Map(a).to_string(), "{\"x\": 1, \"y\": 2}");
        assert_eq!(Value::Map(b).to_string(), "{\"y\": 2, \"x\": 1}");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(5.5).to_string(), "5.5");
        assert_eq!(Value::Float(5.0).to_string(), "5");
        assert_eq!(Value::Float(0.0).to_string(), "0");
        assert_eq!(Value::Float(0.0001).to_string(), "0.0001");
        assert_eq!(Value::Float(123456789.0).to_string(), "123456789");
        assert_eq!(Value::Float(1e21).to_string(), "1e+21");
        assert_eq!(Value::Float(-2.5e300).to_string(), "-2.5e+300");
        assert_eq!(Value::Float(1e-7).to_string(), "1e-07");
        assert_eq!(Value::Float(1.5e-5).to_string(), "1.5e-05");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "[\"a\", \"b\"]");
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(
            Value::Duration(TimeDelta::minutes(90)).to_string(),
            "1h30m0s"
        );
    }

    #[test]
    fn test_kind_inference() {
        assert_eq!(Value::from(vec![1, 2]).kind(), Kind::array(Kind::Int));
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::from("2")]).kind(),
            Kind::array(Kind::Any)
        );
        assert_eq!(Value::Array(vec![]).kind(), Kind::array(Kind::Any));
        assert_eq!(Value::Nil.kind(), Kind::Any);
    }

    #[test]
    fn test_index_and_fields() {
        let arr = Value::from(vec![1, 2, 3]);
        assert_eq!(arr.index(&Value::Int(-1)), Ok(Value::Int(3)));
        assert!(arr.index(&Value::Int(3)).is_err());
        assert_eq!(
            Value::Int(1).index(&Value::Int(0)),
            Err(StdlibError::NotIndexable("int".into()))
        );

        let point: Arc<dyn HostObject> = Arc::new(Point { x: 4 });
        let point = Value::from(point);
        assert_eq!(point.type_name(), "Point");
        assert_eq!(point.get_field("X"), Ok(Value::Int(4)));
        assert!(point.get_field("Y").is_err());
        assert_eq!(
            point.index(&Value::Int(0)),
            Err(StdlibError::NotIndexable("Point".into()))
        );
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(0, 3), Some(0));
        assert_eq!(resolve_index(-1, 3), Some(2));
        assert_eq!(resolve_index(-4, 3), None);
        assert_eq!(resolve_index(3, 3), None);
        assert_eq!(resolve_index(0, 0), None);
    }

    #[test]
    fn test_function_arity() {
        let f = Function::new(
            "twice",
            Signature::new(vec![Kind::Int], Kind::Int),
            |args| match args {
                [Value::Int(n)] => Ok(Value::Int(n * 2)),
                _ => Err(StdlibError::runtime("bad")),
            },
        );
        assert_eq!(f.call(&[Value::Int(2)]), Ok(Value::Int(4)));
        assert_eq!(
            f.call(&[]).unwrap_err().to_string(),
            "not enough arguments to call twice"
        );
        assert_eq!(
            f.call(&[Value::Int(1), Value::Int(2)]).unwrap_err().to_string(),
            "too many arguments to call twice"
        );
    }
}
