//! # stencil-script
//!
//! The closed, indentation-structured language that templates compile
//! into: a logos lexer, a recursive-descent parser and a tree-walking
//! interpreter over [`stencil_core::Value`]. Directive and raw-block
//! content executes under this grammar — assignments, `if`/`elif`/`else`,
//! `for`, `while`, expression statements — with a fixed function registry
//! plus the interpreter intrinsics (`emit`, `emitted`, `params`, `merge`,
//! `export`, `dump`). There is no escape into the host process.

pub mod ast;
pub mod builtins;
pub mod error;
pub mod interp;
pub mod parser;
pub mod token;

pub use error::ScriptError;
pub use interp::Interpreter;
pub use parser::parse_program;

/// Parse and execute a program, returning the interpreter for inspection.
pub fn run(source: &str) -> Result<Interpreter, ScriptError> {
    let stmts = parse_program(source)?;
    let mut interp = Interpreter::new();
    interp.run(&stmts)?;
    Ok(interp)
}
