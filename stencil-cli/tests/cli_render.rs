//! Black-box tests for the `stencil` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn stencil() -> Command {
    Command::cargo_bin("stencil").expect("stencil binary")
}

fn write_template(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).expect("write template");
    path
}

#[test]
fn renders_a_loop_template_to_stdout() {
    let dir = TempDir::new().unwrap();
    let template = write_template(&dir, "rows.stn", "% for i in range(3):\nRow ${i}\n% end\n");

    stencil()
        .arg(&template)
        .assert()
        .success()
        .stdout("Row 0\nRow 1\nRow 2");
}

#[test]
fn key_value_overrides_beat_the_parameter_file() {
    let dir = TempDir::new().unwrap();
    let template = write_template(&dir, "t.stn", "x=${param.x}\n");
    let params = dir.path().join("params.json");
    std::fs::write(&params, r#"{"x": 1}"#).unwrap();

    stencil()
        .arg(&template)
        .args(["--param-file"])
        .arg(&params)
        .args(["-k", "x=2"])
        .assert()
        .success()
        .stdout("x=2");
}

#[test]
fn out_flag_writes_the_file_and_keeps_stdout_quiet() {
    let dir = TempDir::new().unwrap();
    let template = write_template(&dir, "t.stn", "hello ${param.who}\n");
    let out = dir.path().join("out.txt");

    stencil()
        .arg(&template)
        .args(["-k", "who=world"])
        .args(["-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout("");

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "hello world");
}

#[test]
fn verbose_prints_the_override_map_as_json_on_stderr() {
    let dir = TempDir::new().unwrap();
    let template = write_template(&dir, "t.stn", "% param.extra = 'set'\nok\n");

    stencil()
        .arg(&template)
        .args(["-k", "n=3", "-v"])
        .assert()
        .success()
        .stdout("ok")
        .stderr(predicate::str::contains(r#""extra":"set""#))
        .stderr(predicate::str::contains(r#""n":3"#));
}

#[test]
fn malformed_directive_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let template = write_template(&dir, "t.stn", "fine\n%broken\n");

    stencil()
        .arg(&template)
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("directive must start with"));
}

#[test]
fn runtime_failure_persists_an_artifact_and_names_it() {
    let dir = TempDir::new().unwrap();
    let template = write_template(&dir, "t.stn", "${param.missing + 1}\n");
    let artifact = dir.path().join("t.stn.debug.stn");

    stencil()
        .arg(&template)
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("template line 1"))
        .stderr(predicate::str::contains("--exec"));

    let script = std::fs::read_to_string(&artifact).expect("artifact persisted");
    assert!(script.ends_with("dump(_render)\n"), "{script}");
}

#[test]
fn exec_reruns_a_failing_artifact_with_the_same_error() {
    let dir = TempDir::new().unwrap();
    let template = write_template(&dir, "t.stn", "${param.missing + 1}\n");
    let artifact = dir.path().join("t.stn.debug.stn");

    stencil().arg(&template).assert().failure();

    stencil()
        .arg("--exec")
        .arg(&artifact)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported operand types"));
}

#[test]
fn keep_script_persists_the_program_on_success() {
    let dir = TempDir::new().unwrap();
    let template = write_template(&dir, "t.stn", "plain\n");
    let artifact = dir.path().join("t.stn.debug.stn");

    stencil()
        .arg(&template)
        .arg("--keep-script")
        .assert()
        .success()
        .stdout("plain");

    let script = std::fs::read_to_string(&artifact).expect("artifact persisted");
    assert!(script.contains("emit(f'plain')"), "{script}");

    // The kept script re-runs standalone and prints the same render.
    stencil()
        .arg("--exec")
        .arg(&artifact)
        .assert()
        .success()
        .stdout("plain");
}

#[test]
fn missing_template_file_reports_the_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.stn");

    stencil()
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.stn"));
}
