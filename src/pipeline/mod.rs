//! iOS build pipeline.
//!
//! This module provides the [`Pipeline`] orchestrator that drives an iOS
//! build on a build agent through external tools.
//!
//! # Overview
//!
//! A run:
//! 1. Installs CocoaPods dependencies
//! 2. Imports a signing identity into a temporary keychain and installs the
//!    provisioning profile
//! 3. Compiles with `xcodebuild`
//! 4. Packages each `.app` into an `.ipa`
//! 5. Zips each `.app.dSYM`
//! 6. Deletes the temporary keychain
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_ios::pipeline::{
//!     BuildContext, BuildEnvironment, Pipeline, SettingsBuilder, TokioProcessRunner, ToolPaths,
//! };
//!
//! # async fn example() -> kodegen_bundler_ios::pipeline::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .workspace("/builds/myapp")
//!     .xcworkspace("MyApp.xcworkspace")
//!     .scheme("MyApp")
//!     .ipa_name_template("$APP_NAME")
//!     .build();
//!
//! let env = BuildEnvironment::from_process();
//! let tools = ToolPaths::resolve(&settings.tools, &env);
//! let context = BuildContext::new("/builds/myapp", env, tools, &settings.build_directory)?;
//!
//! let mut pipeline = Pipeline::new(context, TokioProcessRunner::default())?;
//! let report = pipeline.run(&settings, None).await?;
//! println!("status {}", report.status());
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`command`] - Command lines for every external tool
//! - [`naming`] - Output names from `$APP_NAME` templates
//! - [`signing`] - Identities, profiles, temporary keychains
//! - [`process`] - Process execution seam
//! - [`settings`] - Run configuration

mod archive;
mod checksum;
pub mod command;
mod context;
mod environment;
mod error;
pub mod naming;
mod orchestrator;
pub mod process;
mod report;
pub mod settings;
pub mod signing;
mod tool_detection;

pub use archive::zip_directory;
pub use checksum::calculate_sha256;
pub use command::{BuildCommand, SigningArgs, XcodebuildParams};
pub use context::BuildContext;
pub use environment::BuildEnvironment;
pub use error::{Context, Error, ErrorExt, Result};
pub use naming::NamingTemplate;
pub use orchestrator::{FAILURE, PACKAGE_SDK, PODFILE_LOCK, Pipeline, SUCCESS, SigningMaterial};
pub use process::{LogSink, OutputSink, ProcessRunner, Stream, TokioProcessRunner};
pub use report::{ArtifactRecord, RunReport, Stage, StageRecord};
pub use settings::{PipelineSettings, SettingsBuilder};
pub use signing::{
    Certificate, CredentialArchive, HomeProfileRegistry, ProfileRegistry, ProvisioningProfile,
    SigningIdentity,
};
pub use tool_detection::{ConfiguredTools, ToolPaths};
