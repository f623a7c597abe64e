//! JSON codec: `toJSON`, `fromJSON`.

use quill_types::Kind;

use crate::error::{StdlibError, StdlibResult};
use crate::registry::{expect_kind, string_arg, ArgError, ArgInfo, Arity, Builtin, StdlibModule};
use crate::value::Value;

pub struct JsonModule;

impl StdlibModule for JsonModule {
    fn name(&self) -> &'static str {
        "json"
    }

    fn builtins(&self) -> Vec<Builtin> {
        vec![
            Builtin::new(
                "toJSON",
                "json",
                Arity::Exact(1),
                "Pretty-printed JSON with two-space indent and sorted keys.",
                |_| Ok(Kind::String),
                |args| to_json_string(&args[0]).map(Value::String),
            ),
            Builtin::new(
                "fromJSON",
                "json",
                Arity::Exact(1),
                "Parse JSON; numbers become floats.",
                from_json_kind,
                |args| {
                    let text = string_arg("fromJSON", args, 0)?;
                    let parsed: serde_json::Value = serde_json::from_str(text)
                        .map_err(|e| StdlibError::Json(e.to_string()))?;
                    Ok(Value::from(parsed))
                },
            ),
        ]
    }
}

fn from_json_kind(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    expect_kind(args, 0, &Kind::String)?;
    Ok(Kind::Any)
}

/// Serialize a value as pretty JSON.
pub fn to_json_string(value: &Value) -> StdlibResult<String> {
    let json = to_json(value)?;
    serde_json::to_string_pretty(&json).map_err(|e| StdlibError::Json(e.to_string()))
}

/// Convert a value to a JSON tree. `serde_json::Map` keeps keys sorted.
pub fn to_json(value: &Value) -> StdlibResult<serde_json::Value> {
    Ok(match value {
        Value::Nil => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Float(f) => float_to_json(*f)?,
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(items) => serde_json::Value::Array(
            items.iter().map(to_json).collect::<StdlibResult<_>>()?,
        ),
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), to_json(v)?)))
                .collect::<StdlibResult<_>>()?,
        ),
        other => {
            return Err(StdlibError::Json(format!(
                "unsupported type: {}",
                other.type_name()
            )))
        }
    })
}

/// Integral floats are written without a fraction (`2`, not `2.0`).
fn float_to_json(f: f64) -> StdlibResult<serde_json::Value> {
    const EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    if !f.is_finite() {
        return Err(StdlibError::Json(format!("unsupported value: {f}")));
    }
    if f.fract() == 0.0 && f.abs() < EXACT {
        return Ok(serde_json::Value::from(f as i64));
    }
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .ok_or_else(|| StdlibError::Json(format!("unsupported value: {f}")))
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn test_to_json_sorts_keys() {
        let mut entries = IndexMap::new();
        entries.insert("foo".to_string(), Value::Int(1));
        entries.insert("bar".to_string(), Value::Int(2));
        assert_eq!(
            to_json_string(&Value::Map(entries)).as_deref(),
            Ok("{\n  \"bar\": 2,\n  \"foo\": 1\n}")
        );
    }

    #[test]
    fn test_to_json_floats() {
        assert_eq!(to_json_string(&Value::Float(2.0)).as_deref(), Ok("2"));
        assert_eq!(to_json_string(&Value::Float(2.5)).as_deref(), Ok("2.5"));
        assert!(to_json_string(&Value::Float(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_to_json_rejects_durations() {
        let d = Value::Duration(chrono::TimeDelta::seconds(1));
        assert_eq!(
            to_json_string(&d),
            Err(StdlibError::Json("unsupported type: duration".to_string()))
        );
    }

    #[test]
    fn test_from_json_numbers_are_floats() {
        let parsed: serde_json::Value = serde_json::from_str("[1, 2, 3]").expect("json");
        assert_eq!(
            Value::from(parsed),
            Value::Array(vec![Value::Float(1.0), Value::Float(2.0), Value::Float(3.0)])
        );
    }
}
