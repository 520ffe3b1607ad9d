//! # stencil-compiler
//!
//! Translates a template document — literal text, `% ` directive lines,
//! `${…}` expression slots and `<%`/`%>` raw blocks, all configurable —
//! into a stencil-script [`Program`]. The program's prologue constructs the
//! parameter namespace and merges the caller's overrides, its payload
//! carries one annotated statement per template line, and its epilogue
//! joins the emitted output and exports the namespace.
//!
//! Compilation never executes anything; see `stencil-engine` for the
//! execute/recover contract.

pub mod error;
pub mod escape;
pub mod program;
pub mod translate;

pub use error::CompileError;
pub use escape::escape_line;
pub use program::{Program, ProgramLine};
pub use translate::translate;
