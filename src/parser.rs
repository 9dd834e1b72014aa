/*!
Recursive‑descent parser: tokens → [`Stmt`] list.

Complexity
----------
* **n** = number of tokens (including the sole EOF).

Every token is consumed once via `advance()`; error recovery (`synchronize`)
discards at most the tokens up to the next statement boundary, so the whole
parse is **Θ(n)**.  Call‑stack depth grows with syntactic nesting only.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
| Error paths (`error`, sync)  | `debug`| Context before recording a diagnostic.    |

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------

```text
program     → declaration* EOF ;
declaration → fnDecl | varDecl | arrDecl | statement ;
fnDecl      → "fn" IDENT "(" parameters? ")" block ;
varDecl     → "var" IDENT ( "=" expression )? ";" ;
arrDecl     → "arr" IDENT "[" expression "]"
              ( "=" "{" expression ( "," expression )* "}" )? ";" ;
statement   → exprStmt | printStmt | ifStmt | whileStmt | forStmt
            | returnStmt | breakStmt | block ;
ifStmt      → "if" expression ":" statement ( "else" statement )? ;
whileStmt   → "while" "(" expression ")" statement ;
forStmt     → "for" "(" ( varDecl | exprStmt | ";" )
              expression? ";" expression? ")" statement ;
printStmt   → "print" expression? ";" ;
returnStmt  → "return" expression? ";" ;
breakStmt   → "break" ";" ;
block       → "{" declaration* "}" ;
expression  → assignment ;
assignment  → call ( "=" | "+=" | "-=" ) assignment
            | call ( "++" | "--" )
            | logic_or ;
logic_or    → logic_and ( "or" logic_and )* ;
logic_and   → equality ( "and" equality )* ;
equality    → comparison ( ( "!=" | "==" ) comparison )* ;
comparison  → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term        → factor ( ( "-" | "+" ) factor )* ;
factor      → exponent ( ( "/" | "*" | "%" ) exponent )* ;
exponent    → unary ( "^" exponent )? ;
unary       → ( "!" | "-" ) unary | call ;
call        → primary ( "(" arguments? ")" | "[" expression "]" | "." IDENT )* ;
primary     → NUMBER | STRING | "true" | "false" | "nil"
            | IDENT | "(" expression ")" ;
```

`for` loops and compound assignments have no AST node of their own; they are
desugared here into `While`/`Block` and `Assign`/`SetIndex` over a `Binary`.
*/

use std::rc::Rc;

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

use log::{debug, info};

const MAX_ARGS: usize = 255;

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    next_id: usize,
    block_depth: usize,
    errors: Vec<LoxError>,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.  `tokens` must end with an `EOF` token.
    pub fn new(tokens: &'a [Token]) -> Self {
        Self::with_first_id(tokens, 0)
    }

    /// Construct a parser whose expression ids start at `first_id`, so ids stay
    /// unique across several runs sharing one interpreter.
    pub fn with_first_id(tokens: &'a [Token], first_id: usize) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            next_id: first_id,
            block_depth: 0,
            errors: Vec::new(),
        }
    }

    /// The id the next allocated expression would receive.
    pub fn next_id(&self) -> usize {
        self.next_id
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program, returning every statement that parsed cleanly
    /// along with every syntax error encountered.
    pub fn parse(&mut self) -> (Vec<Stmt>, Vec<LoxError>) {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!(
            "Parsed {} statement(s) with {} error(s)",
            statements.len(),
            self.errors.len()
        );

        (statements, std::mem::take(&mut self.errors))
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration at {:?}", self.peek().token_type);

        let result = if self.matches(TokenType::FN) {
            self.function()
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else if self.matches(TokenType::ARR) {
            self.array_declaration()
        } else if self.matches(TokenType::CLASS) {
            self.class_declaration();
            return None;
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    /// Classes are reserved syntax only: report once and skip the whole body so
    /// its methods do not surface as stray declarations.  Parsing resumes right
    /// after the closing `}`.
    fn class_declaration(&mut self) {
        let keyword: &Token = self.previous();
        let err = self.error(keyword, "Classes are not supported.");
        self.errors.push(err);

        self.matches(TokenType::IDENTIFIER);

        if self.matches(TokenType::LEFT_BRACE) {
            let mut depth: usize = 1;

            while depth > 0 && !self.is_at_end() {
                match self.advance().token_type {
                    TokenType::LEFT_BRACE => depth += 1,
                    TokenType::RIGHT_BRACE => depth -= 1,
                    _ => {}
                }
            }
        } else {
            self.synchronize();
        }
    }

    fn function(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expect function name.")?
            .clone();

        self.consume(TokenType::LEFT_PAREN, "Expect '(' after function name.")?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGS {
                    let err = self.error(self.peek(), "Can't have more than 255 parameters.");
                    self.errors.push(err);
                }

                params.push(
                    self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?
                        .clone(),
                );

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;
        self.consume(TokenType::LEFT_BRACE, "Expect '{' before function body.")?;

        let body: Vec<Stmt> = self.block()?;

        Ok(Stmt::Function {
            name,
            params,
            body: Rc::new(body),
        })
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expect variable name.")?
            .clone();

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn array_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expect array name.")?
            .clone();

        self.consume(TokenType::LEFT_BRACKET, "Expect '[' after array name.")?;
        let length: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_BRACKET, "Expect ']' after array size.")?;

        let initializer: Option<Vec<Expr>> = if self.matches(TokenType::EQUAL) {
            self.consume(TokenType::LEFT_BRACE, "Expect '{' before array elements.")?;

            let mut elements: Vec<Expr> = Vec::new();

            if !self.check(TokenType::RIGHT_BRACE) {
                loop {
                    elements.push(self.expression()?);

                    if !self.matches(TokenType::COMMA) {
                        break;
                    }
                }
            }

            self.consume(TokenType::RIGHT_BRACE, "Expect '}' after array elements.")?;

            Some(elements)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after array declaration.")?;

        Ok(Stmt::Array {
            name,
            length,
            initializer,
        })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement at {:?}", self.peek().token_type);

        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::BREAK) {
            self.break_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else {
            self.expression_statement()
        }
    }

    /// `for (init; cond; incr) body` becomes
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body: Stmt = self.statement()?;

        if let Some(incr) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(incr)]);
        }

        body = Stmt::While {
            condition: condition.unwrap_or(Expr::Literal(LiteralValue::Bool(true))),
            body: Box::new(body),
        };

        if let Some(init) = initializer {
            body = Stmt::Block(vec![init, body]);
        }

        Ok(body)
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Option<Expr> = if self.check(TokenType::SEMICOLON) {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    /// `if` takes a `:` after its condition instead of parenthesising it, so
    /// `if a == 1 and b: ...` cannot swallow the branch into the condition.
    fn if_statement(&mut self) -> Result<Stmt> {
        let condition: Expr = self.expression()?;
        self.consume(TokenType::COLON, "Expect ':' after if condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.branch("if")?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.branch("else")?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn branch(&mut self, keyword: &str) -> Result<Stmt> {
        if self.check(TokenType::VAR) || self.check(TokenType::ARR) {
            return Err(self.error(
                self.peek(),
                format!("Declaration not allowed as '{}' branch.", keyword),
            ));
        }

        self.statement()
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn break_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        self.consume(TokenType::SEMICOLON, "Expect ';' after 'break'.")?;
        Ok(Stmt::Break(keyword))
    }

    /// Parses declarations up to the closing `}`.  The `is_at_end` guard keeps a
    /// recovering parse from running past EOF inside an unclosed block.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        self.block_depth += 1;

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.block_depth -= 1;

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;
        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.matches(TokenType::EQUAL) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            return Ok(self.assignment_target(expr, &equals, value));
        }

        if self.matches(TokenType::PLUS_EQUAL) || self.matches(TokenType::MINUS_EQUAL) {
            let op: Token = self.previous().clone();
            let rhs: Expr = self.assignment()?;

            return Ok(self.compound_assignment(expr, &op, rhs));
        }

        if self.matches(TokenType::PLUS_PLUS) || self.matches(TokenType::MINUS_MINUS) {
            let op: Token = self.previous().clone();
            let one: Expr = Expr::Literal(LiteralValue::Number(1.0));

            return Ok(self.compound_assignment(expr, &op, one));
        }

        Ok(expr)
    }

    /// `target op= rhs` → `target = target op rhs`.
    fn compound_assignment(&mut self, target: Expr, op: &Token, rhs: Expr) -> Expr {
        let (tt, lexeme) = match op.token_type {
            TokenType::PLUS_EQUAL | TokenType::PLUS_PLUS => (TokenType::PLUS, "+"),
            _ => (TokenType::MINUS, "-"),
        };

        let value: Expr = Expr::Binary {
            left: Box::new(target.clone()),
            operator: Token::new(tt, lexeme, op.line),
            right: Box::new(rhs),
        };

        self.assignment_target(target, op, value)
    }

    /// Turns a parsed left‑hand side into an assignment node.  An invalid
    /// target is reported without entering panic mode; the value is kept so
    /// parsing continues normally.
    fn assignment_target(&mut self, target: Expr, op: &Token, value: Expr) -> Expr {
        match target {
            Expr::Variable { name, .. } => Expr::Assign {
                id: self.new_id(),
                name,
                value: Box::new(value),
            },

            Expr::Call {
                callee,
                paren,
                arguments,
            } => Expr::SetIndex {
                callee,
                paren,
                arguments,
                value: Box::new(value),
            },

            other => {
                debug!("Invalid assignment target: {:?}", other);
                let err = self.error(op, "Invalid assignment target.");
                self.errors.push(err);
                value
            }
        }
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.comparison()?;

        while self.matches(TokenType::BANG_EQUAL) || self.matches(TokenType::EQUAL_EQUAL) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.comparison()?;

            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.term()?;

        while self.matches(TokenType::GREATER)
            || self.matches(TokenType::GREATER_EQUAL)
            || self.matches(TokenType::LESS)
            || self.matches(TokenType::LESS_EQUAL)
        {
            let operator: Token = self.previous().clone();
            let right: Expr = self.term()?;

            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.factor()?;

        while self.matches(TokenType::MINUS) || self.matches(TokenType::PLUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.factor()?;

            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.exponent()?;

        while self.matches(TokenType::STAR)
            || self.matches(TokenType::SLASH)
            || self.matches(TokenType::PERCENT)
        {
            let operator: Token = self.previous().clone();
            let right: Expr = self.exponent()?;

            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    /// Right‑associative: `2 ^ 3 ^ 2` is `2 ^ (3 ^ 2)`.
    fn exponent(&mut self) -> Result<Expr> {
        let expr: Expr = self.unary()?;

        if self.matches(TokenType::CARET) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.exponent()?;

            return Ok(binary(expr, operator, right));
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::LEFT_BRACKET) {
                let index: Expr = self.expression()?;
                let paren: Token = self
                    .consume(TokenType::RIGHT_BRACKET, "Expect ']' after index.")?
                    .clone();

                expr = Expr::Call {
                    callee: Box::new(expr),
                    paren,
                    arguments: vec![index],
                };
            } else if self.matches(TokenType::DOT) {
                let name: Token = self
                    .consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?
                    .clone();

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    let err = self.error(self.peek(), "Can't have more than 255 arguments.");
                    self.errors.push(err);
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self
            .consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?
            .clone();

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::Bool(false)));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::Bool(true)));
        }
        if self.matches(TokenType::NIL) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if let TokenType::NUMBER(n) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Number(n)));
        }

        if let TokenType::STRING(ref s) = self.peek().token_type {
            let s: String = s.clone();
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Str(s)));
        }

        if self.matches(TokenType::IDENTIFIER) {
            let name: Token = self.previous().clone();
            return Ok(Expr::Variable {
                id: self.new_id(),
                name,
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(self.error(self.peek(), "Expect expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    fn new_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        id
    }

    fn error<S: Into<String>>(&self, token: &Token, message: S) -> LoxError {
        let location: String = if token.token_type == TokenType::EOF {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };

        let message: String = message.into();
        debug!("Parse error at line {}{}: {}", token.line, location, message);

        LoxError::parse(token.line, &location, message)
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(self.error(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.  Inside a
    /// block a `}` is left for the enclosing `block()` to consume.
    fn synchronize(&mut self) {
        debug!("Synchronizing after parse error at line {}", self.peek().line);

        let in_block: bool = self.block_depth > 0;

        if in_block && self.check(TokenType::RIGHT_BRACE) {
            return;
        }

        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::ARR
                | TokenType::BREAK
                | TokenType::CLASS
                | TokenType::FN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                TokenType::RIGHT_BRACE if in_block => return,
                _ => {}
            }

            self.advance();
        }
    }
}

fn binary(left: Expr, operator: Token, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}
