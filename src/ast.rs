//! Abstract syntax tree produced by the parser and consumed by the resolver and
//! interpreter.
//!
//! Both families are closed enums; every phase matches on them exhaustively so
//! adding a variant is a compile error until each phase handles it.

use std::fmt;
use std::rc::Rc;

use crate::token::Token;

/// Stable identity of an expression node that reads or writes a variable.
///
/// Allocated by the parser from a counter that a session keeps monotonic across
/// runs, so resolver distances recorded for a closure body stay valid after the
/// run that produced it has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub usize);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, always an IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    Bool(bool),

    Nil,
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    /// Prefix operator: `!ready`, `-x`.
    Unary { operator: Token, right: Box<Expr> },

    /// Infix arithmetic, comparison or equality operator.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// `name = value`, also the target of desugared `+=`, `-=`, `++`, `--`.
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Call or index: `f(a, b)`, `xs[i]`, `xs(i)`.
    Call {
        callee: Box<Expr>,
        /// The closing `)` or `]` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `object.name` (only `length` on arrays is defined).
    Get { object: Box<Expr>, name: Token },

    /// Element assignment through an index/call target: `xs[i] = value`.
    SetIndex {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
        value: Box<Expr>,
    },
}

/// Statement nodes.  A program is a `Vec<Stmt>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print expr;` or a bare `print;` for an empty line.
    Print(Option<Expr>),

    /// `var name (= initializer)?;`
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// `arr name[length] (= { e, ... })?;`
    Array {
        name: Token,
        length: Expr,
        initializer: Option<Vec<Expr>>,
    },

    /// `fn name(params) { body }`.  The body is shared with every function value
    /// created from this declaration.
    Function {
        name: Token,
        params: Vec<Token>,
        body: Rc<Vec<Stmt>>,
    },

    /// `return expr?;`
    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    /// `break;`
    Break(Token),

    /// `if cond: then (else otherwise)?`
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while (cond) body`; `for` loops are desugared into this.
    While { condition: Expr, body: Box<Stmt> },

    /// Braced scope.
    Block(Vec<Stmt>),
}
