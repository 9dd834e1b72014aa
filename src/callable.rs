//! The uniform call contract shared by functions, natives and arrays.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::value::{LoxArray, LoxFunction, NativeFunction, Value};

/// Anything that can appear as the callee of a call expression.
///
/// The interpreter checks `arity()` against the argument count before calling
/// `call()`, so implementations may index `args` freely.
pub trait Callable {
    fn name(&self) -> &str;

    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>, line: usize) -> Result<Value>;
}

impl Callable for LoxFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.params.len()
    }

    /// Runs the body in a fresh scope parented to the closure.  A `Return`
    /// flow becomes the call's value; falling off the end yields `nil`.
    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>, _line: usize) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name);

        let mut scope = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, arg) in self.params.iter().zip(args) {
            scope.define(&param.lexeme, arg);
        }

        let flow: Flow = interpreter.execute_block(&self.body, Rc::new(RefCell::new(scope)))?;

        let value: Value = match flow {
            Flow::Return(value) => value,
            Flow::Normal | Flow::Break => Value::Nil,
        };

        info!("Function '{}' returned: {}", self.name, value);
        Ok(value)
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, args: Vec<Value>, line: usize) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&args).map_err(|msg| LoxError::runtime(line, msg))
    }
}

/// `xs(i)` reads element `i`; writes go through [`LoxArray::store`].
impl Callable for RefCell<LoxArray> {
    fn name(&self) -> &str {
        "array"
    }

    fn arity(&self) -> usize {
        1
    }

    fn call(&self, _interpreter: &mut Interpreter, args: Vec<Value>, line: usize) -> Result<Value> {
        let index: &Value = args.first().ok_or_else(|| {
            LoxError::runtime(line, "Expected 1 arguments but got 0.")
        })?;

        self.borrow().get(index, line)
    }
}
