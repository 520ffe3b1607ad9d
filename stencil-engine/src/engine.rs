//! Compile-then-execute render engine.
//!
//! A render call is synchronous and single-threaded: translate the
//! template, execute the generated program in a fresh interpreter, return
//! the rendered text plus the updated override map. Compile errors abort
//! before execution; runtime failures persist the program to a recovery
//! artifact and re-signal — a call yields either the complete rendered
//! text or nothing.

use std::path::{Path, PathBuf};

use stencil_compiler::{translate, Program};
use stencil_core::{Options, Params};
use stencil_script::{parse_program, Interpreter, ScriptError};

use crate::debug::{persist_best_effort, persist_program, ARTIFACT_SUFFIX, DEFAULT_ARTIFACT};
use crate::error::{io_err, RenderError};

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// Per-call inputs beyond the template itself.
#[derive(Debug, Clone, Default)]
pub struct RenderParams {
    /// JSON parameter file backing the namespace; `None` for none.
    pub param_file: Option<PathBuf>,
    /// Caller overrides, merged over the parameter file (override wins).
    pub overrides: Params,
    /// Persist the generated program even on success.
    pub keep_script: bool,
    /// Where to persist the program; defaults to `<template>.debug.stn`
    /// next to the template, or `__from_string__.debug.stn` for string
    /// templates.
    pub artifact_path: Option<PathBuf>,
    /// Shift for template-line numbering of embedded templates.
    pub line_offset: usize,
}

/// A successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Newline-joined emissions, in emission order.
    pub text: String,
    /// Post-execution namespace export — feed it to the next pass when
    /// chaining renders.
    pub overrides: Params,
    /// Artifact path when keep-intermediate mode persisted one.
    pub artifact: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Template render engine for one [`Options`] configuration.
///
/// Cheap to construct; each render call builds its own program and
/// interpreter, so one engine may serve many sequential calls.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    opts: Options,
}

impl Engine {
    pub fn new(opts: Options) -> Self {
        Engine { opts }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Render a template given as a string.
    pub fn render_str(&self, template: &str, req: &RenderParams) -> Result<Rendered, RenderError> {
        let artifact_path = req
            .artifact_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT));
        self.render_inner(template, req, &artifact_path)
    }

    /// Render a template file. The artifact defaults to sitting next to
    /// the template as `<template>.debug.stn`.
    pub fn render_file(&self, path: &Path, req: &RenderParams) -> Result<Rendered, RenderError> {
        let raw = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let template = raw.replace("\r\n", "\n");
        let artifact_path = req.artifact_path.clone().unwrap_or_else(|| {
            let mut name = path.as_os_str().to_owned();
            name.push(ARTIFACT_SUFFIX);
            PathBuf::from(name)
        });
        self.render_inner(template.trim_end(), req, &artifact_path)
    }

    fn render_inner(
        &self,
        template: &str,
        req: &RenderParams,
        artifact_path: &Path,
    ) -> Result<Rendered, RenderError> {
        let program = translate(
            template,
            req.param_file.as_deref(),
            &req.overrides,
            &self.opts,
            req.line_offset,
        )?;
        log::debug!(
            "translated {} template line(s) into {} program line(s)",
            template.lines().count(),
            program.line_count()
        );

        match execute(&program) {
            Ok((text, overrides)) => {
                let artifact = if req.keep_script {
                    persist_program(artifact_path, &program)?;
                    Some(artifact_path.to_path_buf())
                } else {
                    None
                };
                Ok(Rendered {
                    text,
                    overrides,
                    artifact,
                })
            }
            Err(err) => {
                let artifact = persist_best_effort(artifact_path, &program);
                Err(RenderError::Runtime {
                    message: err.to_string(),
                    template_line: program.source_line(err.line()),
                    artifact,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Run a generated program in a fresh, isolated interpreter.
///
/// Returns the rendered text (the program's `_render`) and the updated
/// override map (its `export(…)`).
pub fn execute(program: &Program) -> Result<(String, Params), ScriptError> {
    let stmts = parse_program(&program.text())?;
    let mut interp = Interpreter::new();
    interp.run(&stmts)?;
    let text = interp
        .rendered()
        .map(str::to_owned)
        .ok_or_else(|| ScriptError::Runtime {
            line: program.line_count(),
            message: "program finished without assigning _render".to_string(),
        })?;
    let overrides = interp.exported().cloned().unwrap_or_default();
    Ok((text, overrides))
}

/// Run an already-generated script (a recovery artifact) standalone. Its
/// `dump(_render)` trailer prints the render to stdout.
pub fn run_script(source: &str) -> Result<(), ScriptError> {
    stencil_script::run(source).map(|_| ())
}

/// [`run_script`] for a script file on disk.
pub fn run_script_file(path: &Path) -> Result<(), RenderError> {
    let source = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    run_script(&source)?;
    Ok(())
}
