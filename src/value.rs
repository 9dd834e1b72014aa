use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::Stmt;
use crate::environment::EnvRef;
use crate::error::{LoxError, Result};
use crate::token::Token;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Rc<LoxFunction>),
    NativeFunction(Rc<NativeFunction>),
    Array(Rc<RefCell<LoxArray>>),
}

/// Type tag of a [`Value`], used for array type locking and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Nil,
    Bool,
    Number,
    String,
    Function,
    Array,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Nil => "nil",
            ValueType::Bool => "boolean",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Function => "function",
            ValueType::Array => "array",
        };

        f.write_str(name)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Nil => ValueType::Nil,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Function(_) | Value::NativeFunction(_) => ValueType::Function,
            Value::Array(_) => ValueType::Array,
        }
    }

    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

impl PartialEq for Value {
    /// Structural for plain data, identity for functions and arrays.  Values of
    /// different types are never equal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Function(func) => write!(f, "<fn {}>", func.name),

            Value::NativeFunction(native) => write!(f, "<native fn {}>", native.name),

            Value::Array(array) => write!(f, "<array {}>", array.borrow().name),
        }
    }
}

/// A user‑defined function together with the scope it closed over.
pub struct LoxFunction {
    pub name: String,
    pub params: Vec<Token>,
    pub body: Rc<Vec<Stmt>>,
    pub closure: EnvRef,
}

impl LoxFunction {
    pub fn new(name: &str, params: &[Token], body: &Rc<Vec<Stmt>>, closure: EnvRef) -> Self {
        Self {
            name: name.to_string(),
            params: params.to_vec(),
            body: Rc::clone(body),
            closure,
        }
    }
}

// The closure usually contains this very function, so printing it would recurse.
impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name)
            .field("arity", &self.params.len())
            .finish()
    }
}

/// Signature of a host function exposed to scripts.
pub type NativeFn = fn(&[Value]) -> std::result::Result<Value, String>;

/// A built‑in function implemented in Rust.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Largest length an `arr` declaration may ask for.
pub const MAX_ARRAY_LENGTH: usize = u32::MAX as usize;

/// Fixed‑length, homogeneously typed array.
///
/// `element_type` starts unset and locks to the type of the first non‑`nil`
/// element written (or of the initializer list).  `nil` marks an empty slot:
/// it can always be stored and never sets the lock.
#[derive(Debug)]
pub struct LoxArray {
    pub name: String,
    elements: Vec<Value>,
    element_type: Option<ValueType>,
}

impl LoxArray {
    /// An array of `length` `nil` slots with no type lock yet.  Running out of
    /// memory for the slots is a runtime error, not an abort.
    pub fn new(name: &str, length: usize, line: usize) -> Result<Self> {
        let mut elements: Vec<Value> = Vec::new();

        elements.try_reserve_exact(length).map_err(|e| {
            debug!("Allocation for array '{}' failed: {}", name, e);
            LoxError::runtime(line, "Array size too large.")
        })?;
        elements.resize(length, Value::Nil);

        Ok(Self {
            name: name.to_string(),
            elements,
            element_type: None,
        })
    }

    /// An array filled from an initializer list.  Every non‑`nil` element must
    /// share one type, which becomes the lock.
    pub fn from_elements(name: &str, elements: Vec<Value>, line: usize) -> Result<Self> {
        let mut element_type: Option<ValueType> = None;

        for incoming in elements.iter().map(Value::value_type) {
            match element_type {
                _ if incoming == ValueType::Nil => {}
                Some(locked) if locked != incoming => {
                    return Err(LoxError::runtime(
                        line,
                        "Array elements must all be of the same type.",
                    ));
                }
                Some(_) => {}
                None => element_type = Some(incoming),
            }
        }

        Ok(Self {
            name: name.to_string(),
            elements,
            element_type,
        })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element_type(&self) -> Option<ValueType> {
        self.element_type
    }

    /// Converts a script value into a slot index: a non‑negative number,
    /// truncated toward zero, below the length.
    pub fn index(&self, index: &Value, line: usize) -> Result<usize> {
        let n: f64 = match index {
            Value::Number(n) => *n,
            other => {
                return Err(LoxError::runtime(
                    line,
                    format!("Array index must be a number, got {}.", other.value_type()),
                ))
            }
        };

        if n.is_nan() || n < 0.0 || n.trunc() >= self.len() as f64 {
            return Err(LoxError::runtime(
                line,
                format!(
                    "Array index {} out of bounds for length {}.",
                    Value::Number(n),
                    self.len()
                ),
            ));
        }

        Ok(n.trunc() as usize)
    }

    pub fn get(&self, index: &Value, line: usize) -> Result<Value> {
        let i: usize = self.index(index, line)?;
        Ok(self.elements[i].clone())
    }

    /// The mutating path: writes `value` at `index`, locking the element type
    /// on the first non‑`nil` write.  Storing `nil` empties the slot.
    pub fn store(&mut self, index: &Value, value: Value, line: usize) -> Result<()> {
        let i: usize = self.index(index, line)?;
        let incoming: ValueType = value.value_type();

        match self.element_type {
            _ if incoming == ValueType::Nil => {}
            Some(locked) if locked != incoming => {
                return Err(LoxError::runtime(
                    line,
                    format!(
                        "Array '{}' holds {} values, cannot store {}.",
                        self.name, locked, incoming
                    ),
                ));
            }
            Some(_) => {}
            None => {
                debug!("Array '{}' locked to {}", self.name, incoming);
                self.element_type = Some(incoming);
            }
        }

        self.elements[i] = value;
        Ok(())
    }
}
