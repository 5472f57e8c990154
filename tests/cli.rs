// tests/cli.rs
//! Integration tests for the kiln binary.
//!
//! These tests write manifests into temporary directories and shell out to
//! the compiled binary.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

const SHAPES: &str = r#"
[[module]]
path = "geo"

[[module]]
path = "geo/shapes.k"
kind = "file"

[[module]]
path = "app"

[[decl]]
module = "geo/shapes.k"
kind = "struct"
name = "Point"
fields = [{ name = "x", type = "i32" }, { name = "y", type = "i32" }]

[[decl]]
module = "geo"
kind = "generic"
body = "struct"
name = "Grid"
generic_params = [{ name = "T" }, { name = "N", kind = "int", default = "4" }]
constraint = "N > 0"
fields = [{ name = "cells", type = "[T; N]" }]

[[decl]]
module = "app"
kind = "function"
name = "main"
params = [{ name = "grid", type = "geo::Grid<geo::Point>" }]
"#;

const CYCLE: &str = r#"
[[module]]
path = "geo"

[[decl]]
module = "geo"
kind = "alias"
name = "A"
target = "B"

[[decl]]
module = "geo"
kind = "alias"
name = "B"
target = "A"
"#;

const TWO_ERRORS: &str = r#"
[[module]]
path = "geo"

[[decl]]
module = "geo"
kind = "struct"
name = "Line"
fields = [{ name = "start", type = "Missing" }]

[[decl]]
module = "geo"
kind = "global"
name = "ORIGIN"
type = "Nowhere"
"#;

fn write_manifest(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn kiln(args: &[&str], manifests: &[&PathBuf]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kiln"))
        .args(args)
        .args(manifests)
        .env_remove("KILN_LOG")
        .output()
        .expect("failed to run kiln")
}

#[test]
fn check_succeeds_on_a_clean_project() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(&dir, "kiln.toml", SHAPES);

    let output = kiln(&["check"], &[&manifest]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {stderr}");
    assert!(stderr.is_empty(), "unexpected output: {stderr}");
}

#[test]
fn check_reports_a_deadlock_once() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(&dir, "kiln.toml", CYCLE);

    let output = kiln(&["check"], &[&manifest]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("E3020"), "stderr: {stderr}");
    assert!(stderr.contains("geo::A -> geo::B -> geo::A"), "stderr: {stderr}");
    assert!(stderr.contains("due to 1 previous error"), "stderr: {stderr}");
}

#[test]
fn check_batches_errors_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(&dir, "kiln.toml", TWO_ERRORS);

    let output = kiln(&["check"], &[&manifest]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("due to 2 previous errors"), "stderr: {stderr}");
}

#[test]
fn fail_fast_flag_stops_at_the_first_error() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(&dir, "kiln.toml", TWO_ERRORS);

    let output = kiln(&["check", "--fail-fast"], &[&manifest]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("due to 1 previous error"), "stderr: {stderr}");
}

#[test]
fn check_keeps_going_across_manifests() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write_manifest(&dir, "broken.toml", CYCLE);
    let clean = write_manifest(&dir, "clean.toml", SHAPES);

    let output = kiln(&["check"], &[&broken, &clean]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.toml"), "stderr: {stderr}");
    assert!(!stderr.contains("clean.toml"), "stderr: {stderr}");
}

#[test]
fn check_rejects_a_missing_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let output = kiln(&["check"], &[&missing]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("E0001"), "stderr: {stderr}");
}

#[test]
fn check_renders_manifest_syntax_errors() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(
        &dir,
        "kiln.toml",
        "[[module]]\npath = \"geo\"\n\n[[decl]]\nmodule = \"geo\"\nkind = \"alias\"\nname = \"A\"\ntarget = \"[i32 4]\"\n",
    );

    let output = kiln(&["check"], &[&manifest]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("E0006"), "stderr: {stderr}");
}

#[test]
fn max_passes_flag_limits_the_scheduler() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(&dir, "kiln.toml", SHAPES);

    let output = kiln(&["check", "--max-passes", "1"], &[&manifest]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("E3021"), "stderr: {stderr}");
}

#[test]
fn inspect_prints_modules_and_variants() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(&dir, "kiln.toml", SHAPES);

    let output = kiln(&["inspect", "--modules", "--variants"], &[&manifest]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("  geo [library] geo\n"), "stdout: {stdout}");
    assert!(stdout.contains("    shapes.k [file] geo\n"), "stdout: {stdout}");
    assert!(
        stdout.contains("  geo::Grid -> geo::Grid<geo::Point,4>\n"),
        "stdout: {stdout}"
    );
    assert!(!stdout.contains("emitted:"), "stdout: {stdout}");
}

#[test]
fn inspect_prints_emitted_items() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(&dir, "kiln.toml", SHAPES);

    let output = kiln(&["inspect", "--emitted"], &[&manifest]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("  layout geo::Grid<geo::Point,4> { cells: [geo::Point; 4] }\n"),
        "stdout: {stdout}"
    );
    assert!(
        stdout.contains("  signature app::main (geo::Grid<geo::Point,4>)\n"),
        "stdout: {stdout}"
    );
    assert!(stdout.contains("  module complete app\n"), "stdout: {stdout}");
}
