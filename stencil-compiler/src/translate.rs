//! Line-mode translation of a template document into a stencil-script
//! program.
//!
//! Each template line is classified as a raw-block marker, a directive or a
//! literal. Literal lines become buffered `emit(f'…')` statements whose
//! program indentation cannot be known until the *next* directive is seen
//! (it depends on whether the previous directive opened a block and on how
//! the two directives' indentations compare), so the buffer is flushed —
//! and indented — on the next directive, on a raw-block start, and once at
//! end of document.

use std::path::Path;

use stencil_core::{Options, Params, Value};

use crate::error::CompileError;
use crate::escape::escape_line;
use crate::program::Program;

/// Translation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Literal,
    RawBlock,
}

/// Translate a template into a runnable program.
///
/// `param_file` lands in the prologue as a `params('…')` call, and
/// `overrides` as a map literal merged over it, so the generated program is
/// self-contained: persisting it yields a directly re-runnable artifact.
/// `line_offset` shifts the template-line numbering for templates embedded
/// in a larger file.
pub fn translate(
    template: &str,
    param_file: Option<&Path>,
    overrides: &Params,
    opts: &Options,
    line_offset: usize,
) -> Result<Program, CompileError> {
    let mut tr = Translator::new(opts, line_offset);
    tr.prologue(param_file, overrides);
    for (idx, line) in template.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        tr.line(idx + 1, line)?;
    }
    tr.finish()
}

struct Translator<'a> {
    opts: &'a Options,
    line_offset: usize,
    mode: Mode,
    /// Template line of the currently open raw block.
    raw_open_line: usize,
    /// Indentation of the directive before the current one.
    prev_indent: String,
    /// Indentation of the most recent directive.
    indent: String,
    /// Whether the most recent directive opened a block (ended with `:`).
    opens_block: bool,
    /// Pending emission statements, un-indented, with their template lines.
    buf: Vec<(String, usize)>,
    out: Program,
}

impl<'a> Translator<'a> {
    fn new(opts: &'a Options, line_offset: usize) -> Self {
        Translator {
            opts,
            line_offset,
            mode: Mode::Literal,
            raw_open_line: 0,
            prev_indent: String::new(),
            indent: String::new(),
            opens_block: false,
            buf: Vec::new(),
            out: Program::default(),
        }
    }

    fn prologue(&mut self, param_file: Option<&Path>, overrides: &Params) {
        let path = param_file
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.out
            .push(format!("param = params({})", script_str(&path)), None);
        self.out.push(
            format!("param = merge(param, {})", script_map(overrides)),
            None,
        );
        // Bare `end`/`endfor`/`endif` directives must stay no-ops.
        self.out.push("end = none", None);
        self.out.push("endfor = none", None);
        self.out.push("endif = none", None);
        self.out.push("# --- payload begins ---", None);
    }

    fn line(&mut self, line_no: usize, line: &str) -> Result<(), CompileError> {
        let src = Some(line_no + self.line_offset);
        match self.mode {
            Mode::RawBlock => {
                if line == self.opts.raw_close {
                    self.mode = Mode::Literal;
                    self.out.push("# raw ends", src);
                } else if line == self.opts.raw_open {
                    return Err(CompileError::NestedRawBlock {
                        line_no: line_no + self.line_offset,
                        open_line: self.raw_open_line,
                    });
                } else {
                    self.out.push(line, src);
                }
            }
            Mode::Literal => {
                if line == self.opts.raw_open {
                    self.flush();
                    self.mode = Mode::RawBlock;
                    self.raw_open_line = line_no + self.line_offset;
                    self.out.push("# raw begins", src);
                } else if let Some(stripped) = line.strip_prefix(self.opts.leading.as_str()) {
                    self.directive(stripped, src);
                } else if line.starts_with(self.opts.leading.trim_end()) {
                    return Err(CompileError::MalformedDirective {
                        line_no: line_no + self.line_offset,
                        line: line.to_owned(),
                        expected: self.opts.leading.clone(),
                    });
                } else {
                    let escaped = escape_line(line, line_no + self.line_offset, self.opts)?;
                    self.buf
                        .push((format!("emit(f'{escaped}')"), line_no + self.line_offset));
                }
            }
        }
        Ok(())
    }

    fn directive(&mut self, stripped: &str, src: Option<usize>) {
        // Indentation is the leading run of spaces and dots; dots collapse
        // 1:1 to spaces.
        let indent_len = stripped
            .bytes()
            .take_while(|&b| b == b' ' || b == b'.')
            .count();
        self.prev_indent = std::mem::replace(&mut self.indent, " ".repeat(indent_len));
        let content = &stripped[indent_len..];
        self.flush();
        self.out.push(format!("{}{content}", self.indent), src);
        self.opens_block = content.trim_end().ends_with(':');
    }

    /// Flush pending emissions. The buffer follows the *previous* directive:
    /// one unit inside it when it opened a block, at its level otherwise.
    /// When the previous directive opened a block and the flushing
    /// directive is indented deeper, the buffer aligns with the flushing
    /// directive instead; at the same or a shallower level it lands one
    /// unit deeper than the previous directive — including the same-level
    /// case, which keeps continuation lines under a same-level directive
    /// inside the block.
    fn flush(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let prefix = if self.opens_block {
            if self.indent.len() > self.prev_indent.len() {
                self.indent.clone()
            } else {
                format!("{}{}", self.prev_indent, self.opts.indent_unit)
            }
        } else {
            self.prev_indent.clone()
        };
        for (stmt, line_no) in self.buf.drain(..) {
            self.out.push(format!("{prefix}{stmt}"), Some(line_no));
        }
    }

    fn finish(mut self) -> Result<Program, CompileError> {
        if self.mode == Mode::RawBlock {
            return Err(CompileError::UnterminatedRawBlock {
                open_line: self.raw_open_line,
            });
        }
        // The final flush behaves like a directive with empty indentation.
        self.prev_indent = std::mem::take(&mut self.indent);
        self.flush();
        self.out.push("# --- payload ends ---", None);
        self.out.push("_render = emitted()", None);
        self.out.push("export(param)", None);
        Ok(self.out)
    }
}

// ---------------------------------------------------------------------------
// Value → script-literal rendering (prologue generation)
// ---------------------------------------------------------------------------

fn script_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

fn script_map(params: &Params) -> String {
    let items: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}: {}", script_str(k), script_value(v)))
        .collect();
    format!("{{{}}}", items.join(", "))
}

/// Render a value as a stencil-script literal that evaluates back to it.
fn script_value(value: &Value) -> String {
    match value {
        Value::None => "none".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_finite() => {
            let repr = f.to_string();
            if repr.contains(['.', 'e', 'E']) {
                repr
            } else {
                format!("{repr}.0")
            }
        }
        Value::Float(_) => "none".to_string(),
        Value::Str(s) => script_str(s),
        Value::List(l) => {
            let items: Vec<String> = l.iter().map(script_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Map(m) => {
            let items: Vec<String> = m
                .iter()
                .map(|(k, v)| format!("{}: {}", script_str(k), script_value(v)))
                .collect();
            format!("{{{}}}", items.join(", "))
        }
    }
}
