//! Error types for stencil-engine.

use std::path::PathBuf;

use thiserror::Error;

use stencil_compiler::CompileError;
use stencil_script::ScriptError;

/// All errors that can arise from a render call.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Translation failed; nothing was executed.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A script failure outside the render flow (`--exec` of an artifact).
    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    /// Execution of the generated program failed. No output was produced;
    /// the program was persisted for diagnosis.
    #[error("{}", runtime_message(.message, .template_line, .artifact))]
    Runtime {
        message: String,
        /// Template line attributed through the program's line map.
        template_line: Option<usize>,
        /// Recovery artifact, when persisting it succeeded.
        artifact: Option<PathBuf>,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`RenderError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}

fn runtime_message(
    message: &str,
    template_line: &Option<usize>,
    artifact: &Option<PathBuf>,
) -> String {
    let mut out = String::from("template execution failed");
    if let Some(line) = template_line {
        out.push_str(&format!(" at template line {line}"));
    }
    out.push_str(&format!(": {message}"));
    if let Some(path) = artifact {
        out.push_str(&format!(
            "\nrun 'stencil --exec {}' to debug",
            path.display()
        ));
    }
    out
}
