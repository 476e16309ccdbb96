//! Full pipeline runs.

mod common;

use common::{FakeArchive, Fixture, RecordingRunner, dev_certificate, dev_identity, profile_with};
use kodegen_bundler_ios::pipeline::{
    PipelineSettings, SettingsBuilder, SigningMaterial, Stage, StageRecord,
};
use std::{io, path::Path};

/// Emulates the build tools: `xcodebuild` produces a bundle and its debug
/// symbols, `xcrun` writes the requested `.ipa`.
fn build_tools(args: &[String]) -> io::Result<i32> {
    match args[0].as_str() {
        "xcodebuild" => {
            let build_dir = args
                .iter()
                .find_map(|a| a.strip_prefix("CONFIGURATION_BUILD_DIR="))
                .expect("build dir argument");
            let build_dir = Path::new(build_dir);
            std::fs::create_dir_all(build_dir.join("MyApp.app"))?;
            let dwarf = build_dir.join("MyApp.app.dSYM/Contents/Resources/DWARF");
            std::fs::create_dir_all(&dwarf)?;
            std::fs::write(dwarf.join("MyApp"), b"dwarf")?;
            Ok(0)
        }
        "xcrun" => {
            let output = args.last().expect("output argument");
            std::fs::write(output, b"ipa")?;
            Ok(0)
        }
        _ => Ok(0),
    }
}

fn release_settings(fx: &Fixture) -> PipelineSettings {
    SettingsBuilder::new()
        .workspace(fx.ws())
        .pods(".")
        .xcworkspace("MyApp.xcworkspace")
        .scheme("MyApp")
        .configuration("Release")
        .code_sign(true)
        .ipa_name_template("$APP_NAME-${BUILD_NUMBER}")
        .dsym_name_template("$APP_NAME-${BUILD_NUMBER}")
        .build()
}

fn statuses(stages: &[StageRecord]) -> Vec<(Stage, i32)> {
    stages.iter().map(|r| (r.stage, r.status)).collect()
}

#[tokio::test]
async fn signed_release_runs_every_stage() {
    let fx = Fixture::new();
    let mut pipeline = fx.pipeline(RecordingRunner::responding(build_tools));
    let archive = FakeArchive::with(dev_identity());
    let profile = profile_with(vec![dev_certificate()]);

    let report = pipeline
        .run(
            &release_settings(&fx),
            Some(SigningMaterial {
                archive: &archive,
                profile: &profile,
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        statuses(&report.stages),
        vec![
            (Stage::Dependencies, 0),
            (Stage::Signing, 0),
            (Stage::Compile, 0),
            (Stage::Package, 0),
            (Stage::DebugSymbols, 0),
            (Stage::Cleanup, 0),
        ]
    );
    assert_eq!(report.status(), 0);
    assert!(report.finished_at.is_some());

    let paths: Vec<_> = report.artifacts.iter().map(|a| a.path.clone()).collect();
    assert_eq!(
        paths,
        vec![fx.ws().join("MyApp-7.app.ipa"), fx.ws().join("MyApp-7.app.dSYM.zip")]
    );
    for artifact in &report.artifacts {
        assert_eq!(artifact.sha256.len(), 64);
        assert!(artifact.sha256.chars().all(|c| c.is_ascii_hexdigit()));
    }
    assert_eq!(
        report.artifacts[0].sha256,
        "78324857e8d9bfa749dc301271df54a6572de9f4c3df8a9507cfa7b7d2b25f8e"
    );

    let programs: Vec<String> = pipeline
        .runner()
        .calls()
        .iter()
        .map(|c| c.program().to_string())
        .collect();
    assert_eq!(programs.first().map(String::as_str), Some("pod"));
    let deletes = pipeline
        .runner()
        .calls()
        .into_iter()
        .filter(|c| c.subcommand() == Some("delete-keychain"))
        .count();
    assert_eq!(deletes, 1);
    assert_eq!(pipeline.pending_keychains(), 0);
    assert!(fx.leftover_identity_files().is_empty());
}

#[tokio::test]
async fn failed_compile_skips_packaging_but_cleans_up() {
    let fx = Fixture::new();
    let mut pipeline = fx.pipeline(RecordingRunner::responding(|args| {
        Ok(if args[0] == "xcodebuild" { 65 } else { 0 })
    }));
    let archive = FakeArchive::with(dev_identity());
    let profile = profile_with(vec![dev_certificate()]);

    let report = pipeline
        .run(
            &release_settings(&fx),
            Some(SigningMaterial {
                archive: &archive,
                profile: &profile,
            }),
        )
        .await
        .unwrap();

    assert_eq!(report.status_of(Stage::Compile), Some(65));
    assert_eq!(report.status_of(Stage::Package), None);
    assert_eq!(report.status_of(Stage::DebugSymbols), None);
    assert_eq!(report.status_of(Stage::Cleanup), Some(0));
    assert_eq!(report.status(), 65);
    assert!(report.artifacts.is_empty());
    assert!(pipeline.runner().calls_to("xcrun").is_empty());
    assert_eq!(pipeline.pending_keychains(), 0);
}

#[tokio::test]
async fn failed_signing_skips_the_build() {
    let fx = Fixture::new();
    let mut pipeline = fx.pipeline(RecordingRunner::responding(|args| {
        Ok(if args.get(1).map(String::as_str) == Some("import") { 1 } else { 0 })
    }));
    let archive = FakeArchive::with(dev_identity());
    let profile = profile_with(vec![dev_certificate()]);

    let report = pipeline
        .run(
            &release_settings(&fx),
            Some(SigningMaterial {
                archive: &archive,
                profile: &profile,
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        statuses(&report.stages),
        vec![(Stage::Dependencies, 0), (Stage::Signing, 1), (Stage::Cleanup, 0)]
    );
    assert!(pipeline.runner().calls_to("xcodebuild").is_empty());
    let deletes = pipeline
        .runner()
        .calls()
        .into_iter()
        .filter(|c| c.subcommand() == Some("delete-keychain"))
        .count();
    assert_eq!(deletes, 1);
}

#[tokio::test]
async fn failed_dependencies_stop_the_run() {
    let fx = Fixture::new();
    let mut pipeline = fx.pipeline(RecordingRunner::responding(|args| {
        Ok(if args[0] == "pod" { 1 } else { 0 })
    }));

    let report = pipeline.run(&release_settings(&fx), None).await.unwrap();

    assert_eq!(statuses(&report.stages), vec![(Stage::Dependencies, 1)]);
    assert_eq!(pipeline.runner().calls().len(), 1);
}

#[tokio::test]
async fn missing_pods_root_is_an_error() {
    let fx = Fixture::new();
    let mut pipeline = fx.pipeline(RecordingRunner::succeeding());
    let settings = SettingsBuilder::new().pods("ios").build();

    assert!(pipeline.run(&settings, None).await.is_err());
    assert!(pipeline.runner().calls().is_empty());
}

#[tokio::test]
async fn unsigned_build_has_no_signing_or_cleanup_stage() {
    let fx = Fixture::new();
    let mut pipeline = fx.pipeline(RecordingRunner::responding(build_tools));
    let archive = FakeArchive::with(dev_identity());
    let profile = profile_with(vec![dev_certificate()]);
    let settings = SettingsBuilder::new()
        .xcodeproj("MyApp.xcodeproj")
        .ipa_name_template("$APP_NAME")
        .build();

    let report = pipeline
        .run(
            &settings,
            Some(SigningMaterial {
                archive: &archive,
                profile: &profile,
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        statuses(&report.stages),
        vec![(Stage::Compile, 0), (Stage::Package, 0)]
    );
    assert!(pipeline.runner().calls_to("security").is_empty());
    assert_eq!(report.artifacts.len(), 1);
}

#[tokio::test]
async fn code_sign_without_material_builds_unsigned() {
    let fx = Fixture::new();
    let mut pipeline = fx.pipeline(RecordingRunner::responding(build_tools));
    let settings = SettingsBuilder::new()
        .xcworkspace("MyApp.xcworkspace")
        .code_sign(true)
        .build();

    let report = pipeline.run(&settings, None).await.unwrap();

    assert_eq!(statuses(&report.stages), vec![(Stage::Compile, 0)]);
    let build = pipeline.runner().calls_to("xcodebuild");
    assert!(
        build[0]
            .args
            .iter()
            .all(|a| !a.starts_with("PROVISIONING_PROFILE=") && !a.starts_with("CODE_SIGN_IDENTITY="))
    );
}

#[tokio::test]
async fn report_serializes_stage_names() {
    let fx = Fixture::new();
    let mut pipeline = fx.pipeline(RecordingRunner::responding(build_tools));
    let settings = SettingsBuilder::new()
        .xcworkspace("MyApp.xcworkspace")
        .dsym_name_template("$APP_NAME")
        .build();

    let report = pipeline.run(&settings, None).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(json["stages"][0]["stage"], "compile");
    assert_eq!(json["stages"][1]["stage"], "debug_symbols");
    assert_eq!(json["stages"][1]["status"], 0);
    assert!(json["artifacts"][0]["path"]
        .as_str()
        .unwrap()
        .ends_with("MyApp.app.dSYM.zip"));
}
