//! Compile options.

use quill_parser::{ParseOptions, DEFAULT_MAX_DEPTH};
use quill_stdlib::Env;
use quill_types::Kind;
use serde::Serialize;

use crate::descriptor::Descriptor;

/// Settings for one compilation, built with chained calls:
///
/// ```
/// use quill_compiler::{Descriptor, Options};
/// use quill_types::Kind;
///
/// let options = Options::new()
///     .descriptor(Descriptor::new().with("age", Kind::Int))
///     .as_kind(Kind::Bool);
/// assert_eq!(options.expected, Some(Kind::Bool));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Options {
    pub descriptor: Option<Descriptor>,
    pub pipes: bool,
    /// Kind the result must be assignable to.
    pub expected: Option<Kind>,
    pub max_depth: u32,
    pub file_name: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            descriptor: None,
            pipes: false,
            expected: None,
            max_depth: DEFAULT_MAX_DEPTH,
            file_name: "expr".to_string(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare names from sample runtime values.
    pub fn env(self, env: &Env) -> Self {
        self.descriptor(Descriptor::from_env(env))
    }

    /// Declare names explicitly. Unknown names become check errors.
    pub fn descriptor(mut self, descriptor: Descriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Accept `x | f(args)`.
    pub fn experimental_pipes(mut self) -> Self {
        self.pipes = true;
        self
    }

    /// Require the whole expression to be assignable to `kind`.
    pub fn as_kind(mut self, kind: Kind) -> Self {
        self.expected = Some(kind);
        self
    }

    /// Bound expression nesting.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = u32::try_from(depth).unwrap_or(u32::MAX);
        self
    }

    /// Name used in diagnostics.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub(crate) fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            pipes: self.pipes,
            max_depth: self.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(!options.pipes);
        assert!(options.descriptor.is_none());
        assert_eq!(options.parse_options().max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(options.file_name, "expr");
    }

    #[test]
    fn test_env_builds_descriptor() {
        let env = Env::new().with("x", 1);
        let options = Options::new().env(&env).experimental_pipes().max_depth(10);
        assert_eq!(
            options.descriptor.as_ref().and_then(|d| d.get("x")),
            Some(&Kind::Int)
        );
        assert!(options.parse_options().pipes);
        assert_eq!(options.parse_options().max_depth, 10);
    }
}
