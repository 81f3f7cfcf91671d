//! CLI integration tests for Slipway.
//!
//! These tests cover the commands that work without a network connection or
//! an installed Meson toolchain: manifest inspection, option validation,
//! clean, and completions.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the slipway binary command.
fn slipway() -> Command {
    Command::cargo_bin("slipway").unwrap()
}

/// Create a temporary directory for work dirs and recipe files.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

// ============================================================================
// slipway manifest
// ============================================================================

#[test]
fn test_manifest_static_build_on_linux() {
    slipway()
        .args(["manifest", "--target-os", "linux"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gst-plugins-good 1.16.2"))
        .stdout(predicate::str::contains("GST_PLUGINS_BASE_STATIC"))
        .stdout(predicate::str::contains("gstvolume"))
        .stdout(predicate::str::contains("gstopengl").not());
}

#[test]
fn test_manifest_includes_gl_off_linux() {
    slipway()
        .args(["manifest", "--target-os", "macos"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gstopengl"))
        .stdout(predicate::str::contains("gstgl-1.0"));
}

#[test]
fn test_manifest_shared_build() {
    slipway()
        .args(["manifest", "--target-os", "linux", "--shared"])
        .assert()
        .success()
        .stdout(predicate::str::contains("plugin path"))
        .stdout(predicate::str::contains("gstreamer-1.0"))
        .stdout(predicate::str::contains("GST_PLUGINS_BASE_STATIC").not())
        // Plugins are not link libraries in a shared build
        .stdout(predicate::str::contains("gstvolume").not());
}

#[test]
fn test_manifest_json_output() {
    let output = slipway()
        .args(["manifest", "--target-os", "linux", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["package"], "gst-plugins-good");
    assert_eq!(json["version"], "1.16.2");
    assert!(json["libs"].as_array().unwrap().len() > 10);
}

#[test]
fn test_manifest_from_recipe_file() {
    let tmp = temp_dir();
    let recipe_path = tmp.path().join("Recipe.toml");

    fs::write(
        &recipe_path,
        r#"
[package]
name = "mylib"
version = "2.0.0"

[source]
url = "https://example.com/{name}-{version}.tar.gz"
sha256 = "00"

[manifest]
static_define = "MYLIB_STATIC"
plugin_subdir = "mylib-2.0"
plugin_libs = ["plugin-a"]
runtime_libs = ["mylib-2.0"]
include_dirs = ["include"]
"#,
    )
    .unwrap();

    slipway()
        .args(["manifest", "--recipe"])
        .arg(&recipe_path)
        .args(["--target-os", "linux"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mylib 2.0.0"))
        .stdout(predicate::str::contains("MYLIB_STATIC"))
        .stdout(predicate::str::contains("plugin-a"));
}

#[test]
fn test_manifest_rejects_missing_recipe_file() {
    slipway()
        .args(["manifest", "--recipe", "/nonexistent/Recipe.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read recipe"));
}

// ============================================================================
// Option validation
// ============================================================================

#[test]
fn test_out_of_domain_feature_value_fails() {
    slipway()
        .args(["manifest", "--feature", "multifile=maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"))
        .stderr(predicate::str::contains("multifile"));
}

#[test]
fn test_unknown_feature_fails() {
    slipway()
        .args(["manifest", "--feature", "vulkan=enabled"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"))
        .stderr(predicate::str::contains("vulkan"));
}

#[test]
fn test_feature_without_value_fails() {
    slipway()
        .args(["manifest", "--feature", "multifile"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("multifile"));
}

#[test]
fn test_in_domain_feature_values_accepted() {
    for state in ["disabled", "enabled", "auto"] {
        slipway()
            .args(["manifest", "--feature", &format!("multifile={}", state)])
            .assert()
            .success();
    }
}

#[test]
fn test_no_fpic_rejected_on_windows() {
    slipway()
        .args(["manifest", "--target-os", "windows", "--no-fpic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fPIC"));
}

#[test]
fn test_no_fpic_accepted_on_linux() {
    slipway()
        .args(["manifest", "--target-os", "linux", "--no-fpic"])
        .assert()
        .success();
}

#[test]
fn test_unknown_target_os_fails() {
    slipway()
        .args(["manifest", "--target-os", "beos"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("beos"));
}

// ============================================================================
// slipway clean
// ============================================================================

#[test]
fn test_clean_removes_work_directory() {
    let tmp = temp_dir();
    let work_dir = tmp.path().join("work");
    fs::create_dir_all(work_dir.join("build")).unwrap();
    fs::write(work_dir.join("build/stamp"), "x").unwrap();

    slipway()
        .args(["clean", "--work-dir"])
        .arg(&work_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("removed"));

    assert!(!work_dir.exists());
}

#[test]
fn test_clean_with_nothing_to_remove() {
    let tmp = temp_dir();
    let work_dir = tmp.path().join("never-created");

    slipway()
        .args(["clean", "--work-dir"])
        .arg(&work_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to clean"));
}

// ============================================================================
// slipway doctor
// ============================================================================

#[test]
fn test_doctor_reports_every_tool() {
    // Doctor's exit code depends on what is installed; only check the report.
    let output = slipway().args(["doctor"]).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    for tool in ["meson", "ninja", "pkg-config", "bison", "flex"] {
        assert!(stdout.contains(tool), "doctor output missing {}", tool);
    }
}

// ============================================================================
// slipway completions
// ============================================================================

#[test]
fn test_completions_bash() {
    slipway()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("slipway"));
}

// ============================================================================
// Argument parsing
// ============================================================================

#[test]
fn test_no_subcommand_shows_usage() {
    slipway()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_lists_subcommands() {
    slipway()
        .args(["--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("manifest"))
        .stdout(predicate::str::contains("doctor"));
}
