//! End-to-end render contract: compile, execute, recover.

use std::io::Write;

use stencil_core::{Options, Params, Value};
use stencil_engine::{run_script, Engine, RenderError, RenderParams};
use tempfile::{NamedTempFile, TempDir};

fn engine() -> Engine {
    Engine::new(Options::default())
}

fn render(template: &str) -> String {
    engine()
        .render_str(template, &params_with_artifact_in_temp().1)
        .unwrap_or_else(|e| panic!("render failed: {e}"))
        .text
}

/// Keep stray artifacts out of the working directory.
fn params_with_artifact_in_temp() -> (TempDir, RenderParams) {
    let dir = TempDir::new().expect("tempdir");
    let req = RenderParams {
        artifact_path: Some(dir.path().join("test.debug.stn")),
        ..RenderParams::default()
    };
    (dir, req)
}

#[test]
fn for_loop_scenario_renders_three_rows() {
    let text = render("% for i in range(3):\nRow ${i}\n% end");
    assert_eq!(text, "Row 0\nRow 1\nRow 2");
}

#[test]
fn plain_literal_lines_render_byte_for_byte() {
    let text = render("first line\n  indented line\nlast");
    assert_eq!(text, "first line\n  indented line\nlast");
}

#[test]
fn braces_and_quotes_survive_as_literals() {
    let text = render("a {b} 'c' \"d\"");
    assert_eq!(text, "a {b} 'c' \"d\"");
}

#[test]
fn override_wins_over_parameter_file_and_round_trips() {
    let mut file = NamedTempFile::new().expect("tempfile");
    write!(file, r#"{{"x": 1, "keep": "from-file"}}"#).expect("write");

    let (_dir, mut req) = params_with_artifact_in_temp();
    req.param_file = Some(file.path().to_path_buf());
    req.overrides.set("x", Value::Int(2));

    let rendered = engine()
        .render_str("x=${param.x} keep=${param.keep}", &req)
        .expect("render");
    assert_eq!(rendered.text, "x=2 keep=from-file");
    assert_eq!(*rendered.overrides.get("x"), Value::Int(2));
    assert_eq!(
        *rendered.overrides.get("keep"),
        Value::Str("from-file".into())
    );
}

#[test]
fn raw_block_statement_mutates_the_namespace() {
    let template = "<%\nif param.mode == none:\n    param.mode = 'fast'\n%>\nmode=${param.mode}";
    let (_dir, req) = params_with_artifact_in_temp();
    let rendered = engine().render_str(template, &req).expect("render");
    assert_eq!(rendered.text, "mode=fast");
    assert_eq!(*rendered.overrides.get("mode"), Value::Str("fast".into()));
}

#[test]
fn directive_assignment_feeds_the_next_pass() {
    let (_dir, req) = params_with_artifact_in_temp();
    let pass1 = engine()
        .render_str("% param.count = 3\nseeded", &req)
        .expect("pass 1");
    assert_eq!(pass1.text, "seeded");
    assert_eq!(*pass1.overrides.get("count"), Value::Int(3));

    let (_dir2, mut req2) = params_with_artifact_in_temp();
    req2.overrides = pass1.overrides;
    let pass2 = engine()
        .render_str("count=${param.count}", &req2)
        .expect("pass 2");
    assert_eq!(pass2.text, "count=3");
}

#[test]
fn runtime_failure_yields_no_text_and_persists_an_artifact() {
    let (dir, req) = params_with_artifact_in_temp();
    let err = engine()
        .render_str("good line\n${param.missing + 1}", &req)
        .expect_err("must fail");

    let RenderError::Runtime {
        template_line,
        artifact,
        ..
    } = &err
    else {
        panic!("expected Runtime, got {err:?}");
    };
    assert_eq!(*template_line, Some(2));

    let artifact = artifact.as_ref().expect("artifact persisted");
    assert_eq!(artifact, &dir.path().join("test.debug.stn"));
    let text = std::fs::read_to_string(artifact).expect("artifact readable");
    assert!(text.ends_with("dump(_render)\n"), "{text}");
    assert!(text.contains("# template line 2"), "{text}");

    // The artifact reproduces the failure when run standalone.
    run_script(&text).expect_err("artifact must fail the same way");
}

#[test]
fn keep_script_persists_a_re_runnable_artifact_on_success() {
    let (_dir, mut req) = params_with_artifact_in_temp();
    req.keep_script = true;
    req.overrides.set("n", Value::Int(2));

    let rendered = engine()
        .render_str("% for i in range(param.n):\nv${i}\n% end", &req)
        .expect("render");
    assert_eq!(rendered.text, "v0\nv1");

    let artifact = rendered.artifact.expect("keep mode persists");
    let script = std::fs::read_to_string(&artifact).expect("read artifact");
    let interp = stencil_script::run(&script).expect("artifact re-runs");
    assert_eq!(interp.rendered(), Some("v0\nv1"));
}

#[test]
fn compile_error_aborts_before_execution_and_writes_nothing() {
    let (dir, req) = params_with_artifact_in_temp();
    let err = engine()
        .render_str("fine\n${param.x\nmore", &req)
        .expect_err("must fail");
    assert!(matches!(err, RenderError::Compile(_)), "got {err:?}");
    assert!(
        !dir.path().join("test.debug.stn").exists(),
        "compile errors must not persist artifacts"
    );
}

#[test]
fn render_file_defaults_artifact_next_to_the_template() {
    let dir = TempDir::new().expect("tempdir");
    let template_path = dir.path().join("report.stn");
    std::fs::write(&template_path, "${param.missing + 1}\n").expect("write template");

    let err = engine()
        .render_file(&template_path, &RenderParams::default())
        .expect_err("must fail");
    let RenderError::Runtime { artifact, .. } = &err else {
        panic!("expected Runtime, got {err:?}");
    };
    assert_eq!(
        artifact.as_deref(),
        Some(dir.path().join("report.stn.debug.stn").as_path())
    );
}

#[test]
fn render_file_trims_trailing_whitespace_like_a_document() {
    let dir = TempDir::new().expect("tempdir");
    let template_path = dir.path().join("t.stn");
    std::fs::write(&template_path, "alpha\nbeta\n\n").expect("write template");

    let rendered = engine()
        .render_file(&template_path, &RenderParams::default())
        .expect("render");
    assert_eq!(rendered.text, "alpha\nbeta");
}

#[test]
fn custom_delimiters_render_end_to_end() {
    let opts = Options {
        leading: ":: ".to_string(),
        expr_open: "[[".to_string(),
        expr_close: "]]".to_string(),
        ..Options::default()
    };
    let (_dir, req) = params_with_artifact_in_temp();
    let rendered = Engine::new(opts)
        .render_str(":: for i in range(2):\n- [[i]]\n:: end", &req)
        .expect("render");
    assert_eq!(rendered.text, "- 0\n- 1");
}

#[test]
fn same_level_directive_after_opener_keeps_buffer_in_the_block() {
    // Continuation behavior: the literal between `for … :` and the
    // same-level `x = i` executes inside the loop body.
    let (_dir, req) = params_with_artifact_in_temp();
    let rendered = engine()
        .render_str("% for i in range(2):\ntick ${i}\n% x = i\n% end", &req)
        .expect("render");
    assert_eq!(rendered.text, "tick 0\ntick 1");
}
