use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::callable::Callable;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::{LoxArray, LoxFunction, NativeFunction, Value, MAX_ARRAY_LENGTH};

/// Resolver output: scope distance for every local variable reference.
/// References missing from the map are globals.
pub type Locals = HashMap<ExprId, usize>;

/// How a statement finished.  `Return` and `Break` propagate outward through
/// every enclosing statement list until a call or loop consumes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
    Break,
}

/// Where `print` output goes.
pub trait OutputSink {
    fn print_line(&mut self, text: &str) -> io::Result<()>;
}

impl OutputSink for io::Stdout {
    fn print_line(&mut self, text: &str) -> io::Result<()> {
        let mut handle = self.lock();
        writeln!(handle, "{}", text)?;
        handle.flush()
    }
}

/// Capturing sink: every printed line is pushed onto the shared vector.
impl OutputSink for Rc<RefCell<Vec<String>>> {
    fn print_line(&mut self, text: &str) -> io::Result<()> {
        self.borrow_mut().push(text.to_string());
        Ok(())
    }
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: Locals,
    output: Box<dyn OutputSink>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an interpreter with the given output sink and defines the
    /// native functions (`clock`).
    pub fn with_output(output: Box<dyn OutputSink>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args: &[Value]| {
                    let timestamp: f64 = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
                        .as_secs_f64();
                    Ok(Value::Number(timestamp))
                },
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// Executes a program.  `locals` are merged into the distances recorded by
    /// earlier runs so closures from those runs keep resolving correctly.
    ///
    /// A runtime error stops the run; bindings made by statements that already
    /// completed stay in the global scope.
    pub fn interpret(&mut self, statements: &[Stmt], locals: Locals) -> Result<()> {
        debug!(
            "Interpreting {} statements with {} resolved locals",
            statements.len(),
            locals.len()
        );

        self.locals.extend(locals);

        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                self.environment = Rc::clone(&self.globals);
                return Err(e);
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ───────────────────────────── statements ─────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let text: String = match expr {
                    Some(expr) => self.evaluate(expr)?.to_string(),
                    None => String::new(),
                };
                self.output.print_line(&text)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Variable '{}' defined with value: {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Array {
                name,
                length,
                initializer,
            } => {
                let array: LoxArray = self.build_array(name, length, initializer.as_deref())?;
                info!("Array '{}' defined with length {}", name.lexeme, array.len());
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Array(Rc::new(RefCell::new(array))));
                Ok(Flow::Normal)
            }

            Stmt::Function { name, params, body } => {
                let function = LoxFunction::new(
                    &name.lexeme,
                    params,
                    body,
                    Rc::clone(&self.environment),
                );
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Function(Rc::new(function)));
                info!(
                    "Function '{}' defined with {} parameters",
                    name.lexeme,
                    params.len()
                );
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, Rc::new(RefCell::new(scope)))
            }
        }
    }

    /// Runs `statements` with `environment` as the current scope, stopping at
    /// the first non‑`Normal` flow.  The previous scope is restored on every
    /// exit path, errors included.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, environment);

        let mut result: Result<Flow> = Ok(Flow::Normal);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn build_array(
        &mut self,
        name: &Token,
        length: &Expr,
        initializer: Option<&[Expr]>,
    ) -> Result<LoxArray> {
        let length: usize = match self.evaluate(length)? {
            Value::Number(n) if n.fract() != 0.0 || n.is_nan() => {
                return Err(LoxError::runtime(name.line, "Array size must be an integer."))
            }
            Value::Number(n) if n <= 0.0 => {
                return Err(LoxError::runtime(name.line, "Array size must be positive."))
            }
            Value::Number(n) if n > MAX_ARRAY_LENGTH as f64 => {
                return Err(LoxError::runtime(name.line, "Array size too large."))
            }
            Value::Number(n) => n as usize,
            _ => return Err(LoxError::runtime(name.line, "Array size must be a number.")),
        };

        match initializer {
            None => LoxArray::new(&name.lexeme, length, name.line),
            Some(exprs) => {
                let mut elements: Vec<Value> = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    elements.push(self.evaluate(expr)?);
                }

                if elements.len() != length {
                    return Err(LoxError::runtime(
                        name.line,
                        format!(
                            "Expected {} elements but got {}.",
                            length,
                            elements.len()
                        ),
                    ));
                }

                LoxArray::from_elements(&name.lexeme, elements, name.line)
            }
        }
    }

    // ───────────────────────────── expressions ────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                let decided: bool = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if decided {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                    None => self.globals.borrow_mut().assign(
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                }

                debug!("Assigned value {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                match &callee_val {
                    Value::Function(function) => self.call(&**function, args, paren.line),
                    Value::NativeFunction(native) => self.call(&**native, args, paren.line),
                    Value::Array(array) => self.call(&**array, args, paren.line),
                    _ => Err(LoxError::runtime(
                        paren.line,
                        "Can only call functions and arrays.",
                    )),
                }
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Array(array) => {
                    if name.lexeme == "length" {
                        Ok(Value::Number(array.borrow().len() as f64))
                    } else {
                        Err(LoxError::runtime(
                            name.line,
                            format!("Undefined property '{}'.", name.lexeme),
                        ))
                    }
                }
                _ => Err(LoxError::runtime(name.line, "Only arrays have properties.")),
            },

            Expr::SetIndex {
                callee,
                paren,
                arguments,
                value,
            } => {
                let array = match self.evaluate(callee)? {
                    Value::Array(array) => array,
                    _ => {
                        return Err(LoxError::runtime(
                            paren.line,
                            "Only array elements can be assigned to.",
                        ))
                    }
                };

                if arguments.len() != 1 {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!("Expected 1 arguments but got {}.", arguments.len()),
                    ));
                }

                let index: Value = self.evaluate(&arguments[0])?;
                let value: Value = self.evaluate(value)?;

                array
                    .borrow_mut()
                    .store(&index, value.clone(), paren.line)?;

                Ok(value)
            }
        }
    }

    fn call(&mut self, callee: &dyn Callable, args: Vec<Value>, line: usize) -> Result<Value> {
        if args.len() != callee.arity() {
            return Err(LoxError::runtime(
                line,
                format!(
                    "Expected {} arguments but got {}.",
                    callee.arity(),
                    args.len()
                ),
            ));
        }

        debug!("Invoking '{}' with {} argument(s)", callee.name(), args.len());
        callee.call(self, args, line)
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::get_at(&self.environment, distance, &name.lexeme, name.line)
            }
            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, right: &Expr) -> Result<Value> {
        let right_val: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(op.line, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(
                op.line,
                format!("Invalid unary operator '{}'.", op.lexeme),
            )),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                (Value::String(a), n @ Value::Number(_)) => Ok(Value::String(format!("{}{}", a, n))),
                (n @ Value::Number(_), Value::String(b)) => Ok(Value::String(format!("{}{}", n, b))),
                _ => Err(LoxError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;

                match op.token_type {
                    TokenType::MINUS => Ok(Value::Number(a - b)),
                    TokenType::STAR => Ok(Value::Number(a * b)),
                    TokenType::SLASH => Ok(Value::Number(a / b)),
                    TokenType::PERCENT => Ok(Value::Number(a % b)),
                    TokenType::CARET => Ok(Value::Number(a.powf(b))),
                    TokenType::GREATER => Ok(Value::Bool(a > b)),
                    TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
                    TokenType::LESS => Ok(Value::Bool(a < b)),
                    TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
                    _ => Err(LoxError::runtime(
                        op.line,
                        format!("Invalid binary operator '{}'.", op.lexeme),
                    )),
                }
            }
        }
    }
}

fn number_operands(op: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
    }
}
