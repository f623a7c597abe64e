//! String built-ins.

use quill_types::Kind;

use crate::error::{StdlibError, StdlibResult};
use crate::registry::{
    expect_all, expect_kind, int_arg, string_arg, ArgError, ArgInfo, Arity, Builtin,
    StdlibModule,
};
use crate::value::Value;

/// Largest string, in bytes, a built-in may build.
pub const MAX_STRING_LEN: usize = 1_000_000;

pub struct StringModule;

impl StdlibModule for StringModule {
    fn name(&self) -> &'static str {
        "strings"
    }

    fn builtins(&self) -> Vec<Builtin> {
        vec![
            Builtin::new(
                "trim",
                "strings",
                Arity::Between(1, 2),
                "Strip leading and trailing whitespace, or characters in the cutset.",
                strings_to_string,
                trim,
            ),
            Builtin::new(
                "trimPrefix",
                "strings",
                Arity::Exact(2),
                "Remove a leading prefix if present.",
                strings_to_string,
                |args| {
                    let (s, prefix) = two_strings("trimPrefix", args)?;
                    Ok(Value::from(s.strip_prefix(prefix).unwrap_or(s)))
                },
            ),
            Builtin::new(
                "trimSuffix",
                "strings",
                Arity::Exact(2),
                "Remove a trailing suffix if present.",
                strings_to_string,
                |args| {
                    let (s, suffix) = two_strings("trimSuffix", args)?;
                    Ok(Value::from(s.strip_suffix(suffix).unwrap_or(s)))
                },
            ),
            Builtin::new(
                "upper",
                "strings",
                Arity::Exact(1),
                "Upper-case.",
                strings_to_string,
                |args| Ok(Value::String(string_arg("upper", args, 0)?.to_uppercase())),
            ),
            Builtin::new(
                "lower",
                "strings",
                Arity::Exact(1),
                "Lower-case.",
                strings_to_string,
                |args| Ok(Value::String(string_arg("lower", args, 0)?.to_lowercase())),
            ),
            Builtin::new(
                "split",
                "strings",
                Arity::Exact(2),
                "Split around every separator.",
                split_kind,
                |args| split_builtin("split", args, false, -1),
            ),
            Builtin::new(
                "splitN",
                "strings",
                Arity::Exact(3),
                "Split into at most n parts.",
                split_kind,
                |args| split_builtin("splitN", args, false, int_arg("splitN", args, 2)?),
            ),
            Builtin::new(
                "splitAfter",
                "strings",
                Arity::Exact(2),
                "Split after every separator, keeping it.",
                split_kind,
                |args| split_builtin("splitAfter", args, true, -1),
            ),
            Builtin::new(
                "splitAfterN",
                "strings",
                Arity::Exact(3),
                "Split after separators into at most n parts, keeping them.",
                split_kind,
                |args| {
                    split_builtin("splitAfterN", args, true, int_arg("splitAfterN", args, 2)?)
                },
            ),
            Builtin::new(
                "replace",
                "strings",
                Arity::Between(3, 4),
                "Replace occurrences of old with new; the optional n limits replacements.",
                replace_kind,
                replace,
            ),
            Builtin::new(
                "repeat",
                "strings",
                Arity::Exact(2),
                "Concatenate n copies.",
                string_int_to_string,
                repeat,
            ),
            Builtin::new(
                "join",
                "strings",
                Arity::Between(1, 2),
                "Concatenate an array of strings with an optional separator.",
                join_kind,
                join,
            ),
            Builtin::new(
                "indexOf",
                "strings",
                Arity::Exact(2),
                "Byte offset of the first occurrence, or -1.",
                strings_to_int,
                |args| {
                    let (s, sub) = two_strings("indexOf", args)?;
                    Ok(byte_offset(s.find(sub)))
                },
            ),
            Builtin::new(
                "lastIndexOf",
                "strings",
                Arity::Exact(2),
                "Byte offset of the last occurrence, or -1.",
                strings_to_int,
                |args| {
                    let (s, sub) = two_strings("lastIndexOf", args)?;
                    Ok(byte_offset(s.rfind(sub)))
                },
            ),
            Builtin::new(
                "hasPrefix",
                "strings",
                Arity::Exact(2),
                "Whether the string starts with the prefix.",
                strings_to_bool,
                |args| {
                    let (s, prefix) = two_strings("hasPrefix", args)?;
                    Ok(Value::Bool(s.starts_with(prefix)))
                },
            ),
            Builtin::new(
                "hasSuffix",
                "strings",
                Arity::Exact(2),
                "Whether the string ends with the suffix.",
                strings_to_bool,
                |args| {
                    let (s, suffix) = two_strings("hasSuffix", args)?;
                    Ok(Value::Bool(s.ends_with(suffix)))
                },
            ),
        ]
    }
}

// ── Kind rules ───────────────────────────────────────────────────────────────

fn strings_to_string(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    expect_all(args, &Kind::String)?;
    Ok(Kind::String)
}

fn strings_to_int(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    expect_all(args, &Kind::String)?;
    Ok(Kind::Int)
}

fn strings_to_bool(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    expect_all(args, &Kind::String)?;
    Ok(Kind::Bool)
}

fn string_int_to_string(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    expect_kind(args, 0, &Kind::String)?;
    expect_kind(args, 1, &Kind::Int)?;
    Ok(Kind::String)
}

fn split_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    expect_kind(args, 0, &Kind::String)?;
    expect_kind(args, 1, &Kind::String)?;
    expect_kind(args, 2, &Kind::Int)?;
    Ok(Kind::array(Kind::String))
}

fn replace_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    (0..3).try_for_each(|i| expect_kind(args, i, &Kind::String))?;
    expect_kind(args, 3, &Kind::Int)?;
    Ok(Kind::String)
}

fn join_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    match &args[0].kind {
        Kind::Array(elem) if elem.is_string() => {}
        k if k.is_dynamic() => {}
        _ => return Err(ArgError::Invalid(0)),
    }
    expect_kind(args, 1, &Kind::String)?;
    Ok(Kind::String)
}

// ── Behavior ─────────────────────────────────────────────────────────────────

fn trim(args: &[Value]) -> StdlibResult<Value> {
    let s = string_arg("trim", args, 0)?;
    let trimmed = match args.get(1) {
        None => s.trim(),
        Some(_) => {
            let cutset = string_arg("trim", args, 1)?;
            s.trim_matches(|c: char| cutset.contains(c))
        }
    };
    Ok(Value::from(trimmed))
}

fn replace(args: &[Value]) -> StdlibResult<Value> {
    let s = string_arg("replace", args, 0)?;
    let old = string_arg("replace", args, 1)?;
    let new = string_arg("replace", args, 2)?;
    let n = match args.get(3) {
        Some(_) => int_arg("replace", args, 3)?,
        None => -1,
    };
    let replaced = match usize::try_from(n) {
        Ok(n) => s.replacen(old, new, n),
        Err(_) => s.replace(old, new),
    };
    Ok(Value::String(replaced))
}

fn repeat(args: &[Value]) -> StdlibResult<Value> {
    let s = string_arg("repeat", args, 0)?;
    let n = int_arg("repeat", args, 1)?;
    let count = usize::try_from(n)
        .map_err(|_| StdlibError::runtime("negative repeat count"))?;
    let within_budget = s
        .len()
        .checked_mul(count)
        .is_some_and(|total| total <= MAX_STRING_LEN);
    if !within_budget {
        return Err(StdlibError::MemoryBudget);
    }
    Ok(Value::String(s.repeat(count)))
}

fn join(args: &[Value]) -> StdlibResult<Value> {
    let items = match &args[0] {
        Value::Array(items) => items,
        other => return Err(StdlibError::invalid_argument("join", other.type_name())),
    };
    let sep = match args.get(1) {
        Some(_) => string_arg("join", args, 1)?,
        None => "",
    };
    let parts = items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.as_str()),
            other => Err(StdlibError::invalid_argument("join", other.type_name())),
        })
        .collect::<StdlibResult<Vec<_>>>()?;
    Ok(Value::String(parts.join(sep)))
}

fn two_strings<'a>(name: &str, args: &'a [Value]) -> StdlibResult<(&'a str, &'a str)> {
    Ok((string_arg(name, args, 0)?, string_arg(name, args, 1)?))
}

fn byte_offset(pos: Option<usize>) -> Value {
    Value::Int(pos.and_then(|p| i64::try_from(p).ok()).unwrap_or(-1))
}

fn split_builtin(name: &str, args: &[Value], keep_sep: bool, n: i64) -> StdlibResult<Value> {
    let s = string_arg(name, args, 0)?;
    let sep = string_arg(name, args, 1)?;
    Ok(Value::Array(
        split(s, sep, keep_sep, n)
            .into_iter()
            .map(Value::from)
            .collect(),
    ))
}

/// Split `s` around `sep` into at most `n` parts (`n <= 0` means all).
///
/// An empty separator splits into characters. With `keep_sep` every part
/// but the last keeps its trailing separator.
pub fn split<'a>(s: &'a str, sep: &str, keep_sep: bool, n: i64) -> Vec<&'a str> {
    if sep.is_empty() {
        return explode(s, n);
    }
    let limit = part_limit(n).unwrap_or(usize::MAX);
    let mut parts = Vec::new();
    let mut rest = s;
    while parts.len() + 1 < limit {
        let Some(m) = rest.find(sep) else {
            break;
        };
        let end = if keep_sep { m + sep.len() } else { m };
        parts.push(&rest[..end]);
        rest = &rest[m + sep.len()..];
    }
    parts.push(rest);
    parts
}

/// One part per character; with a limit the last part holds the remainder.
fn explode(s: &str, n: i64) -> Vec<&str> {
    let count = s.chars().count();
    let limit = part_limit(n).map_or(count, |n| n.min(count));
    let mut parts = Vec::with_capacity(limit);
    let mut rest = s;
    while parts.len() + 1 < limit {
        let Some(c) = rest.chars().next() else {
            break;
        };
        let (head, tail) = rest.split_at(c.len_utf8());
        parts.push(head);
        rest = tail;
    }
    if limit > 0 {
        parts.push(rest);
    }
    parts
}

/// A positive part count, or `None` for no limit.
fn part_limit(n: i64) -> Option<usize> {
    usize::try_from(n).ok().filter(|&n| n > 0)
}
