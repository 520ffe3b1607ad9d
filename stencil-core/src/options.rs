//! Per-call template configuration.
//!
//! An [`Options`] value is immutable and threaded explicitly into every
//! compile/render call — there is no shared global configuration, so
//! concurrent callers with different settings cannot interfere.

/// Markers and delimiters recognised by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Leading marker identifying a directive line, e.g. `"% "`.
    pub leading: String,
    /// Opening delimiter of an expression slot inside a literal line.
    pub expr_open: String,
    /// Closing delimiter of an expression slot.
    pub expr_close: String,
    /// A line exactly equal to this opens a raw block.
    pub raw_open: String,
    /// A line exactly equal to this closes a raw block.
    pub raw_close: String,
    /// One unit of generated-program indentation.
    pub indent_unit: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            leading: "% ".to_string(),
            expr_open: "${".to_string(),
            expr_close: "}".to_string(),
            raw_open: "<%".to_string(),
            raw_close: "%>".to_string(),
            indent_unit: "    ".to_string(),
        }
    }
}
