//! Error types for stencil-script.

use thiserror::Error;

/// All errors that can arise while parsing or executing a generated
/// program. Every variant carries the 1-based program line it occurred on;
/// the engine maps that back to a template line where one exists.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The program text does not parse under the closed grammar.
    #[error("parse error at script line {line}: {message}")]
    Parse { line: usize, message: String },

    /// An identifier that is bound nowhere in the environment.
    #[error("name '{name}' is not defined (script line {line})")]
    Undefined { line: usize, name: String },

    /// A call to a function outside the fixed registry.
    #[error("unknown function '{name}' (script line {line})")]
    UnknownFunction { line: usize, name: String },

    /// Any other execution failure: type mismatch, bad arity, index out of
    /// range, division by zero.
    #[error("runtime error at script line {line}: {message}")]
    Runtime { line: usize, message: String },
}

impl ScriptError {
    /// The 1-based program line the error occurred on.
    pub fn line(&self) -> usize {
        match self {
            ScriptError::Parse { line, .. }
            | ScriptError::Undefined { line, .. }
            | ScriptError::UnknownFunction { line, .. }
            | ScriptError::Runtime { line, .. } => *line,
        }
    }
}
