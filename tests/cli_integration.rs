//! CLI integration tests for Anvil.
//!
//! These tests run the real binary against throwaway projects. None of them
//! needs CMake or a GPU SDK installed: every command under test stops before
//! the build tool would run.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const MANIFEST: &str = r#"[package]
name = "triton"
version = "1.0.0"
packages = ["triton"]

[extension]
name = "triton"
path = "triton/_C"
"#;

/// Get the anvil binary command, isolated from the user's global config.
fn anvil_default_color(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("anvil").unwrap();
    cmd.env("HOME", home).env("USERPROFILE", home);
    cmd
}

/// Same, with colour turned off explicitly.
fn anvil(home: &Path) -> Command {
    let mut cmd = anvil_default_color(home);
    cmd.arg("--no-color");
    cmd
}

/// Write a project with `Anvil.toml` and a project config.
fn project(config: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Anvil.toml"), MANIFEST).unwrap();
    fs::create_dir_all(tmp.path().join("triton")).unwrap();
    fs::write(tmp.path().join("triton/__init__.py"), "").unwrap();

    let anvil_dir = tmp.path().join(".anvil");
    fs::create_dir_all(&anvil_dir).unwrap();
    fs::write(anvil_dir.join("config.toml"), config).unwrap();
    tmp
}

fn missing_cmake_config(tmp: &Path) -> String {
    format!(
        "[toolchain]\ncmake = '{}'\n",
        tmp.join("no-such-dir").join("cmake").display()
    )
}

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();

    anvil(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("doctor"))
        .stdout(predicate::str::contains("clean"));
}

#[test]
fn test_build_help_shows_base_dir() {
    let tmp = TempDir::new().unwrap();

    anvil(tmp.path())
        .args(["build", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--base-dir"));
}

#[test]
fn test_build_without_manifest_fails() {
    let tmp = TempDir::new().unwrap();

    anvil(tmp.path())
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `Anvil.toml`"))
        .stderr(predicate::str::contains(
            "Run anvil from a directory containing Anvil.toml",
        ));
}

#[test]
fn test_build_with_missing_cmake_fails_before_configure() {
    let tmp = TempDir::new().unwrap();
    let proj = project(&missing_cmake_config(tmp.path()));

    anvil(tmp.path())
        .arg("build")
        .current_dir(proj.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: `cmake` not found"))
        .stderr(predicate::str::contains("Install CMake"));

    assert!(!proj.path().join("build").exists());
}

#[test]
fn test_verbose_output_has_no_color_codes_when_piped() {
    let tmp = TempDir::new().unwrap();
    let proj = project(&missing_cmake_config(tmp.path()));

    anvil_default_color(tmp.path())
        .args(["-v", "build"])
        .current_dir(proj.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not be executed"))
        .stderr(predicate::str::contains("\x1b[").not());
}

#[test]
fn test_no_color_reaches_log_output() {
    let tmp = TempDir::new().unwrap();
    let proj = project(&missing_cmake_config(tmp.path()));

    anvil(tmp.path())
        .args(["-v", "build"])
        .current_dir(proj.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("DEBUG"))
        .stderr(predicate::str::contains("\x1b[").not());
}

#[test]
fn test_plan_with_missing_cmake_fails() {
    let tmp = TempDir::new().unwrap();
    let proj = project(&missing_cmake_config(tmp.path()));

    anvil(tmp.path())
        .arg("plan")
        .current_dir(proj.path())
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("`cmake` not found"));
}

#[test]
fn test_invalid_manifest_reports_path() {
    let tmp = TempDir::new().unwrap();
    let proj = project("");
    fs::write(proj.path().join("Anvil.toml"), "[package]\nname = \"x\"\n").unwrap();

    anvil(tmp.path())
        .arg("plan")
        .current_dir(proj.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid manifest"));
}

#[test]
fn test_doctor_reports_missing_cmake() {
    let tmp = TempDir::new().unwrap();
    let proj = project(&missing_cmake_config(tmp.path()));

    anvil(tmp.path())
        .arg("doctor")
        .current_dir(proj.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("[!!] CMake"))
        .stdout(predicate::str::contains("Summary:"));
}

#[test]
fn test_clean_removes_build_dirs() {
    let tmp = TempDir::new().unwrap();
    let cache_root = tmp.path().join("cache");
    let proj = project(&format!(
        "[build]\nbuild_temp = 'scratch'\n\n[cache]\nroot = '{}'\n",
        cache_root.display()
    ));

    fs::create_dir_all(proj.path().join("scratch/CMakeFiles")).unwrap();
    fs::create_dir_all(cache_root.join("llvm-release")).unwrap();

    anvil(tmp.path())
        .arg("clean")
        .current_dir(proj.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed"));

    assert!(!proj.path().join("scratch").exists());
    assert!(cache_root.join("llvm-release").is_dir());

    anvil(tmp.path())
        .args(["clean", "--all"])
        .current_dir(proj.path())
        .assert()
        .success();

    assert!(!cache_root.join("llvm-release").exists());
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();

    anvil(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("anvil"));
}
