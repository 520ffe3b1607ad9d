//! Expression-slot escaping for literal lines.
//!
//! Rewrites a literal template line so it can be wrapped in an
//! `emit(f'…')` statement: configured `${…}` spans become `{…}`
//! interpolation slots, literal braces are doubled so they survive
//! formatting, and single quotes are escaped so they survive the
//! surrounding string literal.

use stencil_core::Options;

use crate::error::CompileError;

/// Escape one literal line. `line_no` is the 1-based template line, used
/// only for diagnostics.
///
/// Delimiters are matched as literal substrings, left to right, with no
/// backtracking. The closing delimiter is tested before the opening one so
/// configurations where both are equal still toggle correctly.
pub fn escape_line(line: &str, line_no: usize, opts: &Options) -> Result<String, CompileError> {
    let open = opts.expr_open.as_str();
    let close = opts.expr_close.as_str();
    debug_assert!(!open.is_empty() && !close.is_empty());

    let mut out = String::with_capacity(line.len() + 8);
    let mut inside = false;
    let mut column = 0usize; // characters consumed so far
    let mut rest = line;

    while let Some(ch) = rest.chars().next() {
        if inside {
            if rest.starts_with(close) {
                inside = false;
                out.push('}');
                column += close.chars().count();
                rest = &rest[close.len()..];
            } else if rest.starts_with(open) {
                return Err(CompileError::UnexpectedDelimiter {
                    line_no,
                    column: column + 1,
                    line: line.to_owned(),
                    delimiter: open.to_owned(),
                });
            } else {
                out.push(ch);
                column += 1;
                rest = &rest[ch.len_utf8()..];
            }
        } else if rest.starts_with(open) {
            inside = true;
            out.push('{');
            column += open.chars().count();
            rest = &rest[open.len()..];
        } else {
            match ch {
                '{' => out.push_str("{{"),
                '}' => out.push_str("}}"),
                '\'' => out.push_str("\\'"),
                _ => out.push(ch),
            }
            column += 1;
            rest = &rest[ch.len_utf8()..];
        }
    }

    if inside {
        return Err(CompileError::UnterminatedExpression {
            line_no,
            line: line.to_owned(),
        });
    }
    Ok(out)
}
