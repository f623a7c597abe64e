//! Name lookup for the evaluator.

use quill_stdlib::{Env, Value};

/// Runtime bindings: the caller's [`Env`] plus a stack of `#` bindings,
/// one per enclosing predicate. The caller's environment is never written.
#[derive(Debug)]
pub struct Environment<'a> {
    globals: &'a Env,
    placeholders: Vec<Value>,
}

impl<'a> Environment<'a> {
    pub fn new(globals: &'a Env) -> Self {
        Self {
            globals,
            placeholders: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// `$env`: the whole environment as a map.
    pub fn as_value(&self) -> Value {
        self.globals.to_value()
    }

    /// Bind `#` for one predicate evaluation.
    pub fn push_placeholder(&mut self, value: Value) {
        self.placeholders.push(value);
    }

    pub fn pop_placeholder(&mut self) {
        self.placeholders.pop();
    }

    /// Innermost `#` binding.
    pub fn placeholder(&self) -> Option<&Value> {
        self.placeholders.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_stack() {
        let globals = Env::new().with("a", 1);
        let mut env = Environment::new(&globals);
        assert_eq!(env.get("a"), Some(&Value::Int(1)));
        assert!(env.placeholder().is_none());

        env.push_placeholder(Value::Int(1));
        env.push_placeholder(Value::Int(2));
        assert_eq!(env.placeholder(), Some(&Value::Int(2)));
        env.pop_placeholder();
        assert_eq!(env.placeholder(), Some(&Value::Int(1)));
        env.pop_placeholder();
        assert!(env.placeholder().is_none());
    }
}
