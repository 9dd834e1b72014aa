//! Centralised error hierarchy for the **rox interpreter**.
//!
//! Every phase (scanner, parser, resolver, interpreter) reports its failures as
//! one of the variants defined here.  The first three phases *accumulate*
//! diagnostics and hand them back as a `Vec<LoxError>`; only the interpreter
//! short‑circuits with `?`, and it does so with a single `Runtime` error.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

/// Which process‑level category an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Lexer, parser or resolver diagnostic.
    Compile,

    /// Fatal error raised while executing statements.
    Runtime,

    /// Failure reading input or writing output.
    Io,
}

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  The message already names the offending lexeme.
    #[error("[line {line}] Error{message}")]
    Parse { message: String, line: usize },

    /// Static‑analysis failure (redeclaration, misplaced `return`/`break`, ...).
    /// Like `Parse`, the message starts with the offending lexeme.
    #[error("[line {line}] Error{message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.  `location` is either `" at end"`
    /// or `" at 'lexeme'"`.
    pub fn parse<S: Into<String>>(line: usize, location: &str, msg: S) -> Self {
        let message: String = format!("{}: {}", location, msg.into());

        info!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**; `location` as for [`LoxError::parse`].
    pub fn resolve<S: Into<String>>(line: usize, location: &str, msg: S) -> Self {
        let message: String = format!("{}: {}", location, msg.into());

        info!("Creating Resolve error: line={}, msg={}", line, message);

        LoxError::Resolve { message, line }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. } => {
                ErrorKind::Compile
            }
            LoxError::Runtime { .. } => ErrorKind::Runtime,
            LoxError::Io(_) | LoxError::Utf8(_) => ErrorKind::Io,
        }
    }

    /// Source line the error points at, if it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. }
            | LoxError::Runtime { line, .. } => Some(*line),
            LoxError::Io(_) | LoxError::Utf8(_) => None,
        }
    }

    /// Conventional `sysexits.h` status for this error: 65 for bad input,
    /// 70 for an internal (runtime) failure, 74 for I/O.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Compile => 65,
            ErrorKind::Runtime => 70,
            ErrorKind::Io => 74,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
