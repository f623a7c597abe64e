//! The kind lattice used by the checker.
//!
//! A [`Kind`] is the static classification of a value. `Any` is the top of
//! the lattice and is checked at run time; `Unknown` only exists before
//! checking and during error recovery.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Kind
// ══════════════════════════════════════════════════════════════════════════════

/// Static kind of an expression.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Not yet checked, or could not be determined (error recovery).
    #[default]
    Unknown,
    Nil,
    Bool,
    Int,
    Float,
    String,
    Time,
    Duration,
    /// Resolved at run time.
    Any,

    // ── Composites ──
    /// `array<K>`
    Array(Box<Kind>),
    /// `map<K>` with string keys.
    Map(Box<Kind>),
    /// A map with statically known keys (map literals, `$env`).
    Record(BTreeMap<String, Kind>),
    /// A host callable.
    Func(Box<Signature>),
}

/// Declared signature of a host callable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Kind>,
    /// Kind of every argument past `params`, if the callable is variadic.
    pub variadic: Option<Kind>,
    pub ret: Kind,
}

impl Signature {
    pub fn new(params: Vec<Kind>, ret: Kind) -> Self {
        Self {
            params,
            variadic: None,
            ret,
        }
    }

    pub fn variadic(params: Vec<Kind>, rest: Kind, ret: Kind) -> Self {
        Self {
            params,
            variadic: Some(rest),
            ret,
        }
    }

    /// A signature that accepts anything and returns `any`.
    pub fn any() -> Self {
        Self::variadic(Vec::new(), Kind::Any, Kind::Any)
    }

    /// Kind expected for the argument at `index`, or `None` past the end.
    pub fn param(&self, index: usize) -> Option<&Kind> {
        self.params.get(index).or(self.variadic.as_ref())
    }
}

impl Kind {
    pub fn array(elem: Kind) -> Self {
        Kind::Array(Box::new(elem))
    }

    pub fn map(value: Kind) -> Self {
        Kind::Map(Box::new(value))
    }

    pub fn func(sig: Signature) -> Self {
        Kind::Func(Box::new(sig))
    }

    /// Check if a value of this kind may be used where `target` is expected.
    ///
    /// Rules:
    /// - Same kind → yes
    /// - `Any`/`Unknown` on either side → yes (checked at run time)
    /// - `nil` is accepted wherever a container or a time is expected
    /// - `int` is accepted where `float` is expected
    /// - Arrays and maps are covariant in their element kind
    /// - A record is a map whose field kinds all fit the map's value kind
    pub fn is_assignable_to(&self, target: &Kind) -> bool {
        if self == target {
            return true;
        }
        if self.is_dynamic() || target.is_dynamic() {
            return true;
        }
        match (self, target) {
            (Kind::Int, Kind::Float) => true,
            (
                Kind::Nil,
                Kind::Array(_) | Kind::Map(_) | Kind::Record(_) | Kind::Time | Kind::Func(_),
            ) => true,
            (Kind::Array(a), Kind::Array(b)) => a.is_assignable_to(b),
            (Kind::Map(a), Kind::Map(b)) => a.is_assignable_to(b),
            (Kind::Record(fields), Kind::Map(value)) => {
                fields.values().all(|k| k.is_assignable_to(value))
            }
            (Kind::Record(src), Kind::Record(tgt)) => tgt
                .iter()
                .all(|(name, k)| src.get(name).is_some_and(|s| s.is_assignable_to(k))),
            (Kind::Func(_), Kind::Func(_)) => true,
            _ => false,
        }
    }

    /// Least upper bound of two kinds.
    ///
    /// `int` and `float` unify to `float`; unrelated kinds unify to `any`.
    pub fn unify(&self, other: &Kind) -> Kind {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (Kind::Unknown, k) | (k, Kind::Unknown) => k.clone(),
            (Kind::Int, Kind::Float) | (Kind::Float, Kind::Int) => Kind::Float,
            (Kind::Array(a), Kind::Array(b)) => Kind::array(a.unify(b)),
            (Kind::Map(a), Kind::Map(b)) => Kind::map(a.unify(b)),
            (Kind::Record(r), Kind::Map(v)) | (Kind::Map(v), Kind::Record(r)) => {
                Kind::map(r.values().fold((**v).clone(), |acc, k| acc.unify(k)))
            }
            (Kind::Record(_), Kind::Record(_)) => {
                Kind::map(self.element().unify(&other.element()))
            }
            _ => Kind::Any,
        }
    }

    /// Kind of the elements produced by iterating or indexing this kind.
    pub fn element(&self) -> Kind {
        match self {
            Kind::Array(elem) | Kind::Map(elem) => (**elem).clone(),
            Kind::Record(fields) => {
                let mut values = fields.values();
                match values.next() {
                    Some(first) => values.fold(first.clone(), |acc, k| acc.unify(k)),
                    None => Kind::Any,
                }
            }
            _ => Kind::Any,
        }
    }

    /// `Any` or `Unknown`: the kind is only known at run time.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Kind::Any | Kind::Unknown)
    }

    /// Returns true if this kind may hold a number.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Kind::Int | Kind::Float) || self.is_dynamic()
    }

    /// Returns true if this kind may hold a string.
    pub fn is_string(&self) -> bool {
        matches!(self, Kind::String) || self.is_dynamic()
    }

    /// Returns true if this kind may hold an integer.
    pub fn is_integer(&self) -> bool {
        matches!(self, Kind::Int) || self.is_dynamic()
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Kind::Array(_)) || self.is_dynamic()
    }

    /// Maps and records.
    pub fn is_map(&self) -> bool {
        matches!(self, Kind::Map(_) | Kind::Record(_)) || self.is_dynamic()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Display
// ══════════════════════════════════════════════════════════════════════════════

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Unknown => write!(f, "unknown"),
            Kind::Nil => write!(f, "nil"),
            Kind::Bool => write!(f, "bool"),
            Kind::Int => write!(f, "int"),
            Kind::Float => write!(f, "float"),
            Kind::String => write!(f, "string"),
            Kind::Time => write!(f, "time"),
            Kind::Duration => write!(f, "duration"),
            Kind::Any => write!(f, "any"),
            Kind::Array(_) => write!(f, "array"),
            Kind::Map(_) | Kind::Record(_) => write!(f, "map"),
            Kind::Func(_) => write!(f, "func"),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        if let Some(rest) = &self.variadic {
            if !self.params.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "...{rest}")?;
        }
        write!(f, ") {}", self.ret)
    }
}
