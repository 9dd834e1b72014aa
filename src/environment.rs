use crate::error::{LoxError, Result};
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.  Closures and child scopes hold clones of it.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: its own bindings plus a link to the enclosing scope.
/// Links only point outward, toward longer‑lived scopes, so `Rc` never forms
/// a cycle through them.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn enclosing(&self) -> Option<&EnvRef> {
        self.enclosing.as_ref()
    }

    /// Always binds in *this* scope; redefining a name simply shadows or
    /// replaces it.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(undefined(name, line))
        }
    }

    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Walks exactly `distance` links outward from `env`.
    pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next: Option<EnvRef> = current.borrow().enclosing.clone();
            match next {
                Some(parent) => current = parent,
                None => break,
            }
        }

        current
    }

    /// Reads `name` from the scope exactly `distance` links up, without
    /// searching any other scope.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str, line: usize) -> Result<Value> {
        let target: EnvRef = Self::ancestor(env, distance);
        let value: Option<Value> = target.borrow().values.get(name).cloned();

        value.ok_or_else(|| undefined(name, line))
    }

    pub fn assign_at(
        env: &EnvRef,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let target: EnvRef = Self::ancestor(env, distance);
        let mut scope = target.borrow_mut();

        match scope.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name, line)),
        }
    }
}

fn undefined(name: &str, line: usize) -> LoxError {
    LoxError::runtime(line, format!("Undefined variable '{}'.", name))
}
