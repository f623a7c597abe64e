//! Conversions: `int`, `float`, `string`.

use quill_types::Kind;

use crate::error::{StdlibError, StdlibResult};
use crate::registry::{ArgError, ArgInfo, Arity, Builtin, StdlibModule};
use crate::value::Value;

pub struct ConvertModule;

impl StdlibModule for ConvertModule {
    fn name(&self) -> &'static str {
        "convert"
    }

    fn builtins(&self) -> Vec<Builtin> {
        vec![
            Builtin::new(
                "int",
                "convert",
                Arity::Exact(1),
                "Convert a number or numeric string to int; floats truncate.",
                |args| scalar_kind(args, Kind::Int),
                to_int,
            ),
            Builtin::new(
                "float",
                "convert",
                Arity::Exact(1),
                "Convert a number or numeric string to float.",
                |args| scalar_kind(args, Kind::Float),
                to_float,
            ),
            Builtin::new(
                "string",
                "convert",
                Arity::Between(1, 1),
                "Display form of any value.",
                |_| Ok(Kind::String),
                |args| Ok(Value::String(args[0].to_string())),
            ),
        ]
    }
}

fn scalar_kind(args: &[ArgInfo], result: Kind) -> Result<Kind, ArgError> {
    match &args[0].kind {
        Kind::Int | Kind::Float | Kind::String => Ok(result),
        k if k.is_dynamic() => Ok(result),
        _ => Err(ArgError::Invalid(0)),
    }
}

fn to_int(args: &[Value]) -> StdlibResult<Value> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(f) => {
            let t = f.trunc();
            // i64::MAX as f64 rounds up to 2^63, which is out of range.
            if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
                Ok(Value::Int(t as i64))
            } else {
                Err(StdlibError::runtime(format!("cannot convert {f} to int")))
            }
        }
        Value::String(s) => s
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| StdlibError::runtime(format!("cannot parse {s:?} as int"))),
        other => Err(StdlibError::invalid_argument("int", other.type_name())),
    }
}

fn to_float(args: &[Value]) -> StdlibResult<Value> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::String(s) => s
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| StdlibError::runtime(format!("cannot parse {s:?} as float"))),
        other => Err(StdlibError::invalid_argument("float", other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_conversion() {
        assert_eq!(to_int(&[Value::Float(5.5)]), Ok(Value::Int(5)));
        assert_eq!(to_int(&[Value::Float(-5.5)]), Ok(Value::Int(-5)));
        assert_eq!(to_int(&[Value::from("5")]), Ok(Value::Int(5)));
        assert!(to_int(&[Value::from("5.5")]).is_err());
        assert!(to_int(&[Value::Float(f64::NAN)]).is_err());
        assert!(to_int(&[Value::Float(1e19)]).is_err());
    }

    #[test]
    fn test_float_conversion() {
        assert_eq!(to_float(&[Value::Int(5)]), Ok(Value::Float(5.0)));
        assert_eq!(to_float(&[Value::from("5.5")]), Ok(Value::Float(5.5)));
        assert!(to_float(&[Value::Bool(true)]).is_err());
    }

    #[test]
    fn test_scalar_kind_rejects_containers() {
        assert_eq!(
            scalar_kind(&[ArgInfo::new(Kind::array(Kind::Int))], Kind::Int),
            Err(ArgError::Invalid(0))
        );
    }
}
