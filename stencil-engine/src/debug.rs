//! Recovery-artifact persistence.
//!
//! A persisted program carries a `dump(_render)` trailer so running it
//! standalone (`stencil --exec <path>`) prints whatever it rendered — the
//! fastest way to diagnose a failing template. Writes are scoped
//! open-write-close; the artifact is diagnostic output, so there is no
//! partial-write recovery.

use std::path::Path;

use stencil_compiler::Program;

use crate::error::{io_err, RenderError};

/// Default artifact path for string templates with no backing file.
pub const DEFAULT_ARTIFACT: &str = "__from_string__.debug.stn";

/// Suffix appended to a template path to name its artifact.
pub const ARTIFACT_SUFFIX: &str = ".debug.stn";

/// Persist `program` (plus the debug trailer) to `path`.
pub(crate) fn persist_program(path: &Path, program: &Program) -> Result<(), RenderError> {
    let mut text = program.text();
    text.push_str("\ndump(_render)\n");
    std::fs::write(path, text).map_err(|e| io_err(path, e))
}

/// Persist, downgrading failure to a warning. Used on the error path so a
/// failed artifact write can never mask the original runtime error.
pub(crate) fn persist_best_effort(path: &Path, program: &Program) -> Option<std::path::PathBuf> {
    match persist_program(path, program) {
        Ok(()) => Some(path.to_path_buf()),
        Err(err) => {
            log::warn!("could not persist recovery artifact: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use stencil_core::{Options, Params};
    use stencil_compiler::translate;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn artifact_ends_with_the_dump_trailer() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("t.debug.stn");
        let program =
            translate("hi", None, &Params::new(), &Options::default(), 0).expect("translate");
        persist_program(&path, &program).expect("persist");
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.ends_with("dump(_render)\n"), "{text}");
        assert!(text.contains("emit(f'hi')"), "{text}");
    }

    #[test]
    fn best_effort_persist_swallows_unwritable_paths() {
        let program =
            translate("hi", None, &Params::new(), &Options::default(), 0).expect("translate");
        let path = Path::new("/no/such/dir/t.debug.stn");
        assert!(persist_best_effort(path, &program).is_none());
    }
}
