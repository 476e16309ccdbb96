//! Command line argument parsing and validation.

use crate::{error::CliError, pipeline::PipelineSettings};
use clap::Parser;
use std::path::PathBuf;

/// iOS build pipeline for CI agents
#[derive(Parser, Debug, Default)]
#[command(
    name = "kodegen_bundler_ios",
    version,
    about = "iOS build pipeline: pods, xcodebuild, .ipa packaging, dSYM archiving",
    long_about = "Runs an iOS build on a build agent from a TOML settings file.

Stages: pod install/update, xcodebuild, xcrun PackageApplication for every .app,
zip for every .app.dSYM. Output names come from templates using $APP_NAME.

Usage:
  kodegen_bundler_ios --config ios-build.toml
  kodegen_bundler_ios --config ios-build.toml --scheme MyApp --configuration Release
  kodegen_bundler_ios --config ios-build.toml --report build/report.json

Exit code 0 = every stage that ran succeeded."
)]
pub struct Args {
    /// TOML settings file
    #[arg(short, long, value_name = "FILE", env = "KODEGEN_IOS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Workspace root (overrides settings)
    #[arg(short, long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Build output directory relative to the workspace (overrides settings)
    #[arg(long, value_name = "DIR")]
    pub build_directory: Option<String>,

    /// .xcworkspace to build (overrides settings)
    #[arg(long, value_name = "PATH")]
    pub xcworkspace: Option<String>,

    /// .xcodeproj to build (overrides settings)
    #[arg(long, value_name = "PATH")]
    pub xcodeproj: Option<String>,

    /// Scheme (overrides settings)
    #[arg(long, value_name = "NAME")]
    pub scheme: Option<String>,

    /// Target (overrides settings)
    #[arg(long, value_name = "NAME")]
    pub target: Option<String>,

    /// Build configuration (overrides settings)
    #[arg(long, value_name = "NAME")]
    pub configuration: Option<String>,

    /// SDK identifier (overrides settings)
    #[arg(long, value_name = "SDK")]
    pub sdk: Option<String>,

    /// Template for .ipa names, e.g. "dist/$APP_NAME-${BUILD_NUMBER}"
    #[arg(long, value_name = "TEMPLATE")]
    pub ipa_name: Option<String>,

    /// Template for zipped .dSYM names
    #[arg(long, value_name = "TEMPLATE")]
    pub dsym_name: Option<String>,

    /// Skip CocoaPods even if enabled in settings
    #[arg(long)]
    pub skip_pods: bool,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), CliError> {
        if non_blank(&self.xcworkspace).is_some() && non_blank(&self.xcodeproj).is_some() {
            return Err(CliError::ConflictingArguments {
                arguments: vec!["--xcworkspace".to_string(), "--xcodeproj".to_string()],
            });
        }

        if matches!(&self.sdk, Some(sdk) if sdk.trim().is_empty()) {
            return Err(CliError::InvalidArguments {
                reason: "SDK cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Applies overrides on top of loaded settings.
    ///
    /// Selecting a workspace or project clears the other one from settings.
    pub fn apply(&self, settings: &mut PipelineSettings) {
        if let Some(workspace) = &self.workspace {
            settings.workspace = Some(workspace.clone());
        }
        if let Some(dir) = &self.build_directory {
            settings.build_directory = dir.clone();
        }

        let build = &mut settings.build;
        if let Some(xcworkspace) = non_blank(&self.xcworkspace) {
            build.xcworkspace = Some(xcworkspace);
            build.xcodeproj = None;
        }
        if let Some(xcodeproj) = non_blank(&self.xcodeproj) {
            build.xcodeproj = Some(xcodeproj);
            build.xcworkspace = None;
        }
        if let Some(scheme) = non_blank(&self.scheme) {
            build.scheme = Some(scheme);
        }
        if let Some(target) = non_blank(&self.target) {
            build.target = Some(target);
        }
        if let Some(configuration) = non_blank(&self.configuration) {
            build.configuration = Some(configuration);
        }
        if let Some(sdk) = non_blank(&self.sdk) {
            build.sdk = sdk;
        }

        if let Some(template) = non_blank(&self.ipa_name) {
            settings.artifacts.ipa_name_template = Some(template);
        }
        if let Some(template) = non_blank(&self.dsym_name) {
            settings.artifacts.dsym_name_template = Some(template);
        }

        if self.skip_pods {
            settings.pods.enabled = false;
        }
    }
}
