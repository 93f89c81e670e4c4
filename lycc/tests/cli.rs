use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn output_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name)
}

fn lycc() -> Command {
    Command::cargo_bin("lycc").expect("lycc binary")
}

#[test]
fn compile_produces_the_expected_css() -> Result<(), Box<dyn std::error::Error>> {
    let output = output_path("site.css");

    lycc()
        .arg("compile")
        .arg("--source")
        .arg(fixture("site.lyc"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled"));

    let expected = std::fs::read_to_string(fixture("site.css.expected"))?;
    let compiled = std::fs::read_to_string(&output)?;
    assert_eq!(compiled.trim(), expected.trim());
    Ok(())
}

#[test]
fn compile_creates_missing_output_directories() {
    let output = output_path("nested/deep/site.css");

    lycc()
        .arg("compile")
        .arg("--source")
        .arg(fixture("site.lyc"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    assert!(output.exists());
}

#[test]
fn pretty_output_keeps_its_newlines() -> Result<(), Box<dyn std::error::Error>> {
    let output = output_path("site.pretty.css");

    lycc()
        .arg("compile")
        .arg("--source")
        .arg(fixture("site.lyc"))
        .arg("--output")
        .arg(&output)
        .arg("--pretty")
        .assert()
        .success();

    let compiled = std::fs::read_to_string(&output)?;
    assert!(compiled.contains(":root {\n"));
    assert!(compiled.contains("  color: #336699;\n"));
    Ok(())
}

#[test]
fn check_accepts_a_valid_file() {
    lycc()
        .arg("check")
        .arg("--source")
        .arg(fixture("site.lyc"))
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn strict_check_rejects_an_undefined_variable() {
    lycc()
        .arg("check")
        .arg("--source")
        .arg(fixture("undefined.lyc"))
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("undefined variable `--missing`"));
}

#[test]
fn lax_check_accepts_an_undefined_variable() {
    lycc()
        .arg("check")
        .arg("--source")
        .arg(fixture("undefined.lyc"))
        .assert()
        .success();
}

#[test]
fn syntax_errors_exit_nonzero() {
    lycc()
        .arg("compile")
        .arg("--source")
        .arg(fixture("broken.lyc"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected"));
}

#[test]
fn missing_files_exit_nonzero() {
    lycc()
        .arg("compile")
        .arg("--source")
        .arg(fixture("does-not-exist.lyc"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("couldn't read"));
}
