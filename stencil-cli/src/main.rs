//! stencil — expand a template file into rendered text.
//!
//! # Usage
//!
//! ```text
//! stencil <TEMPLATE> [-p <params.json>] [-o <out>] [-k key=value ...]
//!         [--keep-script] [-v]
//! stencil --exec <artifact.debug.stn>
//! ```
//!
//! A failing render writes a diagnostic to stderr, persists the generated
//! program next to the template as `<template>.debug.stn`, and exits
//! non-zero; stdout (or `-o`) receives either the complete rendered text
//! or nothing.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use stencil_core::{Options, Params, Value};
use stencil_engine::{run_script_file, Engine, RenderParams};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stencil",
    version,
    about = "Expand stencil template files",
    long_about = None,
)]
struct Cli {
    /// Template file to expand (a generated script when --exec is set).
    template: PathBuf,

    /// JSON parameter file backing the namespace.
    #[arg(short, long)]
    param_file: Option<PathBuf>,

    /// Output file; defaults to stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// key=value overrides; values coerce int → float → string.
    #[arg(short = 'k', long = "key-values", num_args = 1..)]
    key_values: Vec<String>,

    /// Keep the generated intermediate script even on success.
    #[arg(long)]
    keep_script: bool,

    /// Run TEMPLATE as an already-generated script (a recovery artifact).
    #[arg(long)]
    exec: bool,

    /// Print the post-execution override map to stderr as JSON.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.exec {
        run_script_file(&cli.template)
            .with_context(|| format!("failed to run script '{}'", cli.template.display()))?;
        return Ok(());
    }

    let overrides = parse_key_values(&cli.key_values)?;
    let req = RenderParams {
        param_file: cli.param_file,
        overrides,
        keep_script: cli.keep_script,
        ..RenderParams::default()
    };

    let engine = Engine::new(Options::default());
    let rendered = engine.render_file(&cli.template, &req)?;

    match &cli.out {
        Some(path) => std::fs::write(path, &rendered.text)
            .with_context(|| format!("failed to write output to '{}'", path.display()))?,
        None => print!("{}", rendered.text),
    }

    if cli.verbose {
        let json = serde_json::to_string(&rendered.overrides)
            .context("failed to serialize override map")?;
        eprintln!("{json}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// key=value overrides
// ---------------------------------------------------------------------------

/// Parse `-k key=value` pairs into a [`Params`] map; later keys win.
fn parse_key_values(pairs: &[String]) -> Result<Params> {
    let mut params = Params::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected key=value, found '{pair}'");
        };
        if key.is_empty() {
            bail!("empty key in '{pair}'");
        }
        params.set(key, coerce(value));
    }
    Ok(params)
}

/// Coerce a raw override value: int, then float, then string — first
/// successful form wins.
fn coerce(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return Value::Float(f);
        }
    }
    Value::Str(raw.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_prefers_int_then_float_then_string() {
        assert_eq!(coerce("3"), Value::Int(3));
        assert_eq!(coerce("1.5"), Value::Float(1.5));
        assert_eq!(coerce("-2"), Value::Int(-2));
        assert_eq!(coerce("8x"), Value::Str("8x".into()));
        assert_eq!(coerce(""), Value::Str(String::new()));
        // Non-finite floats stay strings so they survive the prologue.
        assert_eq!(coerce("nan"), Value::Str("nan".into()));
    }

    #[test]
    fn pairs_split_on_the_first_equals() {
        let params = parse_key_values(&["expr=a=b".to_string()]).expect("parse");
        assert_eq!(*params.get("expr"), Value::Str("a=b".into()));
    }

    #[test]
    fn later_pairs_win() {
        let params =
            parse_key_values(&["x=1".to_string(), "x=2".to_string()]).expect("parse");
        assert_eq!(*params.get("x"), Value::Int(2));
    }

    #[test]
    fn missing_equals_is_rejected() {
        assert!(parse_key_values(&["oops".to_string()]).is_err());
    }
}
