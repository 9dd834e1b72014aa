//! A `Lox` session drives one source string at a time through every phase and
//! keeps interpreter state (globals, resolved locals, expression ids) alive
//! between runs, which is what a REPL needs.

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::{Interpreter, OutputSink};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan;

pub struct Lox {
    interpreter: Interpreter,
    next_id: usize,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// A session printing to stdout.
    pub fn new() -> Self {
        Self::from_interpreter(Interpreter::new())
    }

    pub fn with_output(output: Box<dyn OutputSink>) -> Self {
        Self::from_interpreter(Interpreter::with_output(output))
    }

    fn from_interpreter(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            next_id: 0,
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Scans, parses, resolves and executes `source`.
    ///
    /// Lexer and parser diagnostics are reported together; if there are any,
    /// resolution is skipped.  Resolver diagnostics stop the run before
    /// execution.  A runtime error is returned alone.
    pub fn run(&mut self, source: &str) -> Result<(), Vec<LoxError>> {
        info!("Running {} bytes of source", source.len());

        let (tokens, mut errors) = scan(source);

        let mut parser = Parser::with_first_id(&tokens, self.next_id);
        let (statements, parse_errors) = parser.parse();
        self.next_id = parser.next_id();
        errors.extend(parse_errors);

        if !errors.is_empty() {
            debug!("Stopping before resolution: {} error(s)", errors.len());
            return Err(errors);
        }

        let (locals, resolve_errors) = Resolver::new().resolve(&statements);

        if !resolve_errors.is_empty() {
            debug!(
                "Stopping before execution: {} resolve error(s)",
                resolve_errors.len()
            );
            return Err(resolve_errors);
        }

        self.interpreter
            .interpret(&statements, locals)
            .map_err(|e| vec![e])
    }
}
