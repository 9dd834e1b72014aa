//! Static resolver pass.
//!
//! One AST walk that does three things:
//! 1. Build lexical scopes (stack of `HashMap<String, bool>` tracking
//!    declared/defined) mirroring exactly the environments the interpreter will
//!    create: one per `Block`, one per function call.
//! 2. Report static errors (redeclaration, read in own initializer, misplaced
//!    `return` / `break`).  Errors are collected; the walk always finishes.
//! 3. Record, for every local variable occurrence, how many scopes separate it
//!    from its declaration.  Anything not found is a global and is left out of
//!    the map.

use crate::ast::{Expr, ExprId, Stmt};
use crate::error::LoxError;
use crate::interpreter::Locals;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

/// Are we inside a loop body?  Used to validate `break`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LoopType {
    None,
    Loop,
}

pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    locals: Locals,
    errors: Vec<LoxError>,
    current_function: FunctionType,
    current_loop: LoopType,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");
        Resolver {
            scopes: Vec::new(),
            locals: Locals::new(),
            errors: Vec::new(),
            current_function: FunctionType::None,
            current_loop: LoopType::None,
        }
    }

    /// Walk all top‑level statements, returning the distance map and every
    /// static error found.
    ///
    /// Globals have no scope frame, so the own‑initializer check only covers
    /// blocks and function bodies: a global `var a = a;` reads whatever `a`
    /// holds at runtime (or fails with `Undefined variable`).
    pub fn resolve(mut self, statements: &[Stmt]) -> (Locals, Vec<LoxError>) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        info!(
            "Resolved {} local reference(s) with {} error(s)",
            self.locals.len(),
            self.errors.len()
        );

        (self.locals, self.errors)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Array {
                name,
                length,
                initializer,
            } => {
                self.declare(name);
                self.resolve_expr(length);
                for element in initializer.iter().flatten() {
                    self.resolve_expr(element);
                }
                self.define(name);
            }

            Stmt::Function { name, params, body } => {
                // name is visible *inside* its own body, so recursion works
                self.declare(name);
                self.define(name);
                self.resolve_function(params, body);
            }

            Stmt::Expression(expr) => self.resolve_expr(expr),

            Stmt::Print(expr) => {
                if let Some(expr) = expr {
                    self.resolve_expr(expr);
                }
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);

                let enclosing = self.current_loop;
                self.current_loop = LoopType::Loop;
                self.resolve_stmt(body);
                self.current_loop = enclosing;
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }
                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }

            Stmt::Break(keyword) => {
                if self.current_loop == LoopType::None {
                    self.error(keyword, "Can't break outside of a loop.");
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                let uninitialized: bool = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(&name.lexeme) == Some(&false));

                if uninitialized {
                    self.error(name, "Can't read local variable in its own initializer.");
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::SetIndex {
                callee,
                arguments,
                value,
                ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
                self.resolve_expr(value);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Parameters and the body's top‑level declarations share one scope, just
    /// like the single environment the interpreter creates per call.  A loop
    /// around the declaration does not make `break` legal inside the body.
    fn resolve_function(&mut self, params: &[Token], body: &[Stmt]) {
        let enclosing_function = self.current_function;
        let enclosing_loop = self.current_loop;
        self.current_function = FunctionType::Function;
        self.current_loop = LoopType::None;

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        for stmt in body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing_function;
        self.current_loop = enclosing_loop;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Globals are not tracked, so redeclaring at top level is allowed.
    fn declare(&mut self, name: &Token) {
        let duplicate: bool = match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.lexeme.clone(), false).is_some(),
            None => false,
        };

        if duplicate {
            self.error(name, "Already a variable with this name in this scope.");
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        debug!("Resolve error at line {}: {}", token.line, message);
        self.errors.push(LoxError::resolve(
            token.line,
            &format!(" at '{}'", token.lexeme),
            message,
        ));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at `depth`, or leave it out of the
    /// map (global) if no scope declares it.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' {} at depth {}", name.lexeme, id, depth);
                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' {} as global", name.lexeme, id);
    }
}
