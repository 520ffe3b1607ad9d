//! Error types for stencil-compiler.

use thiserror::Error;

/// All errors that can arise while translating a template document.
///
/// Compile errors abort translation before any execution is attempted.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A second opening delimiter inside an already-open expression slot.
    #[error("{}", unexpected_delimiter_message(.line_no, .column, .line, .delimiter))]
    UnexpectedDelimiter {
        /// 1-based template line.
        line_no: usize,
        /// 1-based character column of the offending delimiter.
        column: usize,
        line: String,
        delimiter: String,
    },

    /// A line ended while an expression slot was still open.
    #[error("unterminated expression at line {line_no}\nLINE: {line}")]
    UnterminatedExpression { line_no: usize, line: String },

    /// A line begins with a partial form of the directive marker.
    #[error("directive must start with '{expected}'; found '{line}' on line {line_no}")]
    MalformedDirective {
        line_no: usize,
        line: String,
        expected: String,
    },

    /// A raw-block start marker inside an already-open raw block.
    #[error("raw block reopened at line {line_no} before the block from line {open_line} was closed")]
    NestedRawBlock { line_no: usize, open_line: usize },

    /// A raw block still open at end of document.
    #[error("raw block opened at line {open_line} is never closed")]
    UnterminatedRawBlock { open_line: usize },
}

fn unexpected_delimiter_message(
    line_no: &usize,
    column: &usize,
    line: &str,
    delimiter: &str,
) -> String {
    format!(
        "unexpected delimiter '{delimiter}' at line {line_no}, column {column}\nLINE: {line}\n      {}^",
        "-".repeat(column.saturating_sub(1)),
    )
}
