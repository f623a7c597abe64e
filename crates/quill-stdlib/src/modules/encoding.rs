//! Base64: `toBase64`, `fromBase64`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use quill_types::Kind;

use crate::error::StdlibError;
use crate::registry::{expect_kind, string_arg, ArgError, ArgInfo, Arity, Builtin, StdlibModule};
use crate::value::Value;

pub struct EncodingModule;

impl StdlibModule for EncodingModule {
    fn name(&self) -> &'static str {
        "encoding"
    }

    fn builtins(&self) -> Vec<Builtin> {
        vec![
            Builtin::new(
                "toBase64",
                "encoding",
                Arity::Exact(1),
                "Standard Base64 with padding.",
                string_to_string,
                |args| Ok(Value::String(STANDARD.encode(string_arg("toBase64", args, 0)?))),
            ),
            Builtin::new(
                "fromBase64",
                "encoding",
                Arity::Exact(1),
                "Decode standard Base64 into a UTF-8 string.",
                string_to_string,
                |args| {
                    let bytes = STANDARD
                        .decode(string_arg("fromBase64", args, 0)?)
                        .map_err(|e| StdlibError::Base64(e.to_string()))?;
                    String::from_utf8(bytes)
                        .map(Value::String)
                        .map_err(|e| StdlibError::Base64(e.to_string()))
                },
            ),
        ]
    }
}

fn string_to_string(args: &[ArgInfo]) -> Result<Kind, ArgError> {
    expect_kind(args, 0, &Kind::String)?;
    Ok(Kind::String)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::builtins;

    #[test]
    fn test_base64() {
        assert_eq!(
            builtins().call("toBase64", &[Value::from("hello")]),
            Ok(Value::from("aGVsbG8="))
        );
        assert_eq!(
            builtins().call("fromBase64", &[Value::from("aGVsbG8=")]),
            Ok(Value::from("hello"))
        );
        assert!(matches!(
            builtins().call("fromBase64", &[Value::from("***")]),
            Err(StdlibError::Base64(_))
        ));
    }
}
