//! Generated-program model with template-line attribution.
//!
//! A [`Program`] is the text of a stencil-script program plus an explicit
//! program-line → template-line map. The rendered text carries the same
//! mapping as right-aligned `# template line N` comments, so a persisted
//! program stays self-describing; the in-memory map is what the engine uses
//! to attribute runtime failures, so attribution never depends on
//! re-parsing comments.

use std::fmt;

/// Column at which source annotations are aligned.
const ANNOTATION_COLUMN: usize = 100;

/// One line of a generated program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramLine {
    /// Statement text, without the source annotation.
    pub text: String,
    /// 1-based template line this statement came from; `None` for
    /// prologue/epilogue lines.
    pub source: Option<usize>,
}

/// A translated template: prologue + payload + epilogue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    lines: Vec<ProgramLine>,
}

impl Program {
    pub(crate) fn push(&mut self, text: impl Into<String>, source: Option<usize>) {
        self.lines.push(ProgramLine {
            text: text.into(),
            source,
        });
    }

    pub fn lines(&self) -> &[ProgramLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Template line for a 1-based program line, if it has one.
    pub fn source_line(&self, program_line: usize) -> Option<usize> {
        self.lines
            .get(program_line.checked_sub(1)?)
            .and_then(|l| l.source)
    }

    /// The program text, with annotations.
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match line.source {
                Some(n) => write!(
                    f,
                    "{:<width$} # template line {}",
                    line.text,
                    n,
                    width = ANNOTATION_COLUMN
                )?,
                None => write!(f, "{}", line.text)?,
            }
        }
        Ok(())
    }
}
