//! End-to-end run of the binary against stand-in tool scripts.
#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

const XCODEBUILD: &str = r#"#!/bin/sh
echo "xcodebuild $*"
for arg in "$@"; do
  case "$arg" in
    CONFIGURATION_BUILD_DIR=*) out="${arg#CONFIGURATION_BUILD_DIR=}" ;;
  esac
done
mkdir -p "$out/MyApp.app" "$out/MyApp.app.dSYM/Contents/Resources/DWARF"
printf dwarf > "$out/MyApp.app.dSYM/Contents/Resources/DWARF/MyApp"
exit "${FAKE_XCODEBUILD_STATUS:-0}"
"#;

const XCRUN: &str = r#"#!/bin/sh
for arg in "$@"; do last="$arg"; done
printf ipa > "$last"
"#;

const POD: &str = r#"#!/bin/sh
echo "pod $*" >&2
"#;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn settings(tools: &Path) -> String {
    format!(
        r#"
build_directory = "build"

[tools]
pod = "{pod}"
xcodebuild = "{xcodebuild}"
xcrun = "{xcrun}"

[pods]
enabled = true

[build]
xcodeproj = "MyApp.xcodeproj"
scheme = "MyApp"

[artifacts]
ipa_name_template = "dist/$APP_NAME-${{BUILD_NUMBER}}"
dsym_name_template = "dist/$APP_NAME-${{BUILD_NUMBER}}"
"#,
        pod = tools.join("pod").display(),
        xcodebuild = tools.join("xcodebuild").display(),
        xcrun = tools.join("xcrun").display(),
    )
}

#[test]
fn pipeline_runs_with_stand_in_tools() {
    let tools = tempfile::tempdir().unwrap();
    script(tools.path(), "pod", POD);
    script(tools.path(), "xcodebuild", XCODEBUILD);
    script(tools.path(), "xcrun", XCRUN);

    let workspace = tempfile::tempdir().unwrap();
    let config = workspace.path().join("ios-build.toml");
    fs::write(&config, settings(tools.path())).unwrap();
    let report = workspace.path().join("report.json");

    Command::cargo_bin("kodegen_bundler_ios")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("--workspace")
        .arg(workspace.path())
        .arg("--report")
        .arg(&report)
        .env("BUILD_NUMBER", "12")
        .env("RUST_LOG", "info")
        .assert()
        .success();

    let ipa = workspace.path().join("dist/MyApp-12.app.ipa");
    let dsym = workspace.path().join("dist/MyApp-12.app.dSYM.zip");
    assert_eq!(fs::read(&ipa).unwrap(), b"ipa");
    assert!(dsym.is_file());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    let stages: Vec<&str> = json["stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["stage"].as_str().unwrap())
        .collect();
    assert_eq!(stages, ["dependencies", "compile", "package", "debug_symbols"]);
    assert_eq!(json["artifacts"].as_array().unwrap().len(), 2);

    // A failing build propagates its exit code and produces no new artifacts.
    fs::remove_dir_all(workspace.path().join("dist")).unwrap();
    Command::cargo_bin("kodegen_bundler_ios")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("--workspace")
        .arg(workspace.path())
        .arg("--skip-pods")
        .env("BUILD_NUMBER", "12")
        .env("FAKE_XCODEBUILD_STATUS", "65")
        .env("RUST_LOG", "info")
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Stage compile failed with status 65"));
    assert!(!workspace.path().join("dist").exists());
}
