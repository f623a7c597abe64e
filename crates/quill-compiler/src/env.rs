//! Type environment for the checker.
//!
//! [`TypeEnv`] resolves names against the descriptor and keeps a stack of
//! `#` bindings, one per enclosing `map`/`filter`.

use quill_types::Kind;

use crate::descriptor::Descriptor;

/// The sigil name for the whole environment.
pub const ENV_NAME: &str = "$env";

// ══════════════════════════════════════════════════════════════════════════════
// TypeEnv
// ══════════════════════════════════════════════════════════════════════════════

/// Name and placeholder resolution during checking.
#[derive(Debug)]
pub struct TypeEnv<'a> {
    descriptor: Option<&'a Descriptor>,
    /// Kind of `#` per enclosing predicate, innermost last.
    placeholders: Vec<Kind>,
}

impl<'a> TypeEnv<'a> {
    pub fn new(descriptor: Option<&'a Descriptor>) -> Self {
        Self {
            descriptor,
            placeholders: Vec::new(),
        }
    }

    /// Kind of a name. Without a descriptor every name is `any`.
    pub fn lookup(&self, name: &str) -> Option<Kind> {
        if name == ENV_NAME {
            return Some(self.env_kind());
        }
        match self.descriptor {
            Some(desc) => desc.get(name).cloned(),
            None => Some(Kind::Any),
        }
    }

    /// Kind of `$env`.
    pub fn env_kind(&self) -> Kind {
        match self.descriptor {
            Some(desc) => desc.record_kind(),
            None => Kind::map(Kind::Any),
        }
    }

    /// Enter a predicate, binding `#` to `element`.
    pub fn push_predicate(&mut self, element: Kind) {
        self.placeholders.push(element);
    }

    pub fn pop_predicate(&mut self) {
        self.placeholders.pop();
    }

    /// Kind of `#` in the innermost predicate, or `None` outside predicates.
    pub fn placeholder(&self) -> Option<&Kind> {
        self.placeholders.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_without_descriptor_is_any() {
        let env = TypeEnv::new(None);
        assert_eq!(env.lookup("whatever"), Some(Kind::Any));
        assert_eq!(env.lookup(ENV_NAME), Some(Kind::map(Kind::Any)));
    }

    #[test]
    fn test_lookup_with_descriptor() {
        let desc = Descriptor::new().with("a", Kind::Int);
        let env = TypeEnv::new(Some(&desc));
        assert_eq!(env.lookup("a"), Some(Kind::Int));
        assert_eq!(env.lookup("b"), None);
        assert!(matches!(env.lookup(ENV_NAME), Some(Kind::Record(_))));
    }

    #[test]
    fn test_predicate_scopes_shadow() {
        let mut env = TypeEnv::new(None);
        assert!(env.placeholder().is_none());
        env.push_predicate(Kind::Int);
        env.push_predicate(Kind::String);
        assert_eq!(env.placeholder(), Some(&Kind::String));
        env.pop_predicate();
        assert_eq!(env.placeholder(), Some(&Kind::Int));
        env.pop_predicate();
        assert!(env.placeholder().is_none());
    }
}
