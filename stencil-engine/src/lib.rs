//! # stencil-engine
//!
//! Execution engine for stencil templates: compile with `stencil-compiler`,
//! execute with `stencil-script`, and honor the execute/recover contract —
//! on any runtime failure the generated program is persisted as a directly
//! re-runnable recovery artifact before the error is re-signalled, and no
//! partial output is ever returned.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stencil_core::{Options, Params, Value};
//! use stencil_engine::{Engine, RenderParams};
//!
//! fn render_report() {
//!     let engine = Engine::new(Options::default());
//!     let mut overrides = Params::new();
//!     overrides.set("rows", Value::Int(3));
//!     let req = RenderParams { overrides, ..RenderParams::default() };
//!     match engine.render_str("% for i in range(param.rows):\nRow ${i}\n% end", &req) {
//!         Ok(rendered) => println!("{}", rendered.text),
//!         Err(err) => eprintln!("{err}"),
//!     }
//! }
//! ```

pub mod debug;
pub mod engine;
pub mod error;

pub use debug::{ARTIFACT_SUFFIX, DEFAULT_ARTIFACT};
pub use engine::{execute, run_script, run_script_file, Engine, RenderParams, Rendered};
pub use error::RenderError;
