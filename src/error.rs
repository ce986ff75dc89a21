//! Error Handling for the minibasic Interpreter
//!
//! This module defines the error type shared by the tokenizer, expression
//! evaluator, statement executor, program driver, and REPL/file-I/O shim.
//! Every fallible operation in the interpreter returns `Result<T>` from this
//! module so that a syntax error deep inside an expression and an I/O error
//! from `load`/`save` can be handled identically by the caller.
//!
//! ## Error Categories
//!
//! - **`LexError`** — malformed tokens: unclosed string literals.
//! - **`ParseError`** — malformed syntax: missing keywords/operators,
//!   `if` without `then`, a bare `loop`, an unknown statement keyword.
//! - **`RuntimeError`** — everything semantic: undefined variables,
//!   `goto`/`gosub` to a line that doesn't exist, `return` with an empty
//!   control stack, a zero `for`-step, an unparsable `input` field,
//!   division/mod by zero, running `goto`/`gosub` with no program active.
//! - **`IOError`** — wraps `std::io::Error` from `load`/`save`.
//!
//! Errors carry the offending fragment as a `String` so the driver can print
//! it verbatim next to the line/column annotation (spec section 7).
use std::error::Error;
use std::fmt;

/// Errors produced anywhere in the minibasic interpreter.
#[derive(Debug, Clone)]
pub enum BasicError {
    /// Malformed token: currently just an unclosed string literal.
    LexError(String),
    /// Malformed statement or expression syntax.
    ParseError(String),
    /// Semantic or control-flow failure during execution.
    RuntimeError(String),
    /// Wraps a `std::io::Error` from file load/save.
    IOError(String),
}

impl fmt::Display for BasicError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BasicError::LexError(msg) => write!(f, "Lexical error: {}", msg),
            BasicError::ParseError(msg) => write!(f, "Syntax error: {}", msg),
            BasicError::RuntimeError(msg) => write!(f, "Runtime error: {}", msg),
            BasicError::IOError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl Error for BasicError {}

impl From<std::io::Error> for BasicError {
    fn from(err: std::io::Error) -> Self {
        BasicError::IOError(err.to_string())
    }
}

/// Convenience alias used throughout the interpreter.
pub type Result<T> = std::result::Result<T, BasicError>;
