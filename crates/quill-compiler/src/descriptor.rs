//! Environment descriptors: the names an expression may use, with kinds.

use std::collections::BTreeMap;

use quill_stdlib::Env;
use quill_types::{Kind, Signature};
use serde::{Deserialize, Serialize};

/// Declared kinds of the names visible to an expression.
///
/// Only used while checking; the runtime counterpart is [`Env`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    names: BTreeMap<String, Kind>,
}

impl Descriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style declaration.
    pub fn with(mut self, name: impl Into<String>, kind: Kind) -> Self {
        self.insert(name, kind);
        self
    }

    /// Declare a host function.
    pub fn with_func(self, name: impl Into<String>, signature: Signature) -> Self {
        self.with(name, Kind::func(signature))
    }

    pub fn insert(&mut self, name: impl Into<String>, kind: Kind) {
        self.names.insert(name.into(), kind);
    }

    pub fn get(&self, name: &str) -> Option<&Kind> {
        self.names.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Kind)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Infer a descriptor from sample runtime values.
    pub fn from_env(env: &Env) -> Self {
        Self {
            names: env
                .iter()
                .map(|(name, value)| (name.to_string(), value.kind()))
                .collect(),
        }
    }

    /// Kind of `$env`: a record of every declared name.
    pub fn record_kind(&self) -> Kind {
        Kind::Record(self.names.clone())
    }
}

impl<K: Into<String>> FromIterator<(K, Kind)> for Descriptor {
    fn from_iter<I: IntoIterator<Item = (K, Kind)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_stdlib::Value;

    #[test]
    fn test_from_env_infers_kinds() {
        let env = Env::new()
            .with("num", 42)
            .with("str", "foo")
            .with("ArrayOfInt", vec![1, 2, 3])
            .with(
                "ArrayOfAny",
                Value::Array(vec![Value::Int(1), Value::from("2"), Value::Bool(true)]),
            );
        let desc = Descriptor::from_env(&env);
        assert_eq!(desc.get("num"), Some(&Kind::Int));
        assert_eq!(desc.get("str"), Some(&Kind::String));
        assert_eq!(desc.get("ArrayOfInt"), Some(&Kind::array(Kind::Int)));
        assert_eq!(desc.get("ArrayOfAny"), Some(&Kind::array(Kind::Any)));
        assert_eq!(desc.len(), 4);
    }

    #[test]
    fn test_record_kind() {
        let desc = Descriptor::new().with("a", Kind::Int);
        let Kind::Record(fields) = desc.record_kind() else {
            panic!("expected a record");
        };
        assert_eq!(fields.get("a"), Some(&Kind::Int));
    }
}
