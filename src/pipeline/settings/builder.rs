//! Builder for constructing PipelineSettings.

use super::{ArtifactSettings, BuildSettings, PipelineSettings, PodSettings};
use crate::pipeline::tool_detection::ConfiguredTools;
use std::path::{Path, PathBuf};

/// Builder for constructing [`PipelineSettings`] in code.
///
/// Empty strings passed to the optional setters are stored as absent, the
/// same way the TOML loader treats them.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_ios::pipeline::SettingsBuilder;
///
/// let settings = SettingsBuilder::new()
///     .workspace("/builds/myapp")
///     .xcworkspace("MyApp.xcworkspace")
///     .scheme("MyApp")
///     .configuration("Release")
///     .code_sign(true)
///     .ipa_name_template("$APP_NAME-${BUILD_NUMBER}")
///     .build();
///
/// assert!(settings.build.code_sign);
/// assert_eq!(settings.build.xcodeproj, None);
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    settings: PipelineSettings,
}

fn present(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

impl SettingsBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the workspace root.
    pub fn workspace<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.settings.workspace = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the build output directory, relative to the workspace.
    ///
    /// Default: "build"
    pub fn build_directory(mut self, dir: &str) -> Self {
        self.settings.build_directory = dir.to_string();
        self
    }

    /// Sets explicit tool locations.
    pub fn tools(mut self, tools: ConfiguredTools) -> Self {
        self.settings.tools = tools;
        self
    }

    /// Sets the `security` tool location.
    pub fn security_tool(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.tools.security = Some(path.into());
        self
    }

    /// Enables CocoaPods for the project at `project_root`.
    pub fn pods(mut self, project_root: &str) -> Self {
        self.settings.pods = PodSettings {
            enabled: true,
            project_root: project_root.to_string(),
        };
        self
    }

    /// Replaces all build settings.
    pub fn build_settings(mut self, build: BuildSettings) -> Self {
        self.settings.build = build;
        self
    }

    /// Sets the `.xcworkspace` path.
    pub fn xcworkspace(mut self, path: &str) -> Self {
        self.settings.build.xcworkspace = present(path);
        self
    }

    /// Sets the `.xcodeproj` path.
    pub fn xcodeproj(mut self, path: &str) -> Self {
        self.settings.build.xcodeproj = present(path);
        self
    }

    /// Sets the target.
    pub fn target(mut self, target: &str) -> Self {
        self.settings.build.target = present(target);
        self
    }

    /// Sets the scheme.
    pub fn scheme(mut self, scheme: &str) -> Self {
        self.settings.build.scheme = present(scheme);
        self
    }

    /// Sets the configuration.
    pub fn configuration(mut self, configuration: &str) -> Self {
        self.settings.build.configuration = present(configuration);
        self
    }

    /// Sets the SDK.
    ///
    /// Default: "iphoneos"
    pub fn sdk(mut self, sdk: &str) -> Self {
        self.settings.build.sdk = sdk.to_string();
        self
    }

    /// Sets extra `xcodebuild` parameters.
    pub fn additional_parameters(mut self, params: &str) -> Self {
        self.settings.build.additional_parameters = present(params);
        self
    }

    /// Enables or disables code signing.
    pub fn code_sign(mut self, enabled: bool) -> Self {
        self.settings.build.code_sign = enabled;
        self
    }

    /// Replaces all artifact settings.
    pub fn artifacts(mut self, artifacts: ArtifactSettings) -> Self {
        self.settings.artifacts = artifacts;
        self
    }

    /// Enables IPA packaging with `template`.
    pub fn ipa_name_template(mut self, template: &str) -> Self {
        self.settings.artifacts.ipa_name_template = present(template);
        self
    }

    /// Enables dSYM archiving with `template`.
    pub fn dsym_name_template(mut self, template: &str) -> Self {
        self.settings.artifacts.dsym_name_template = present(template);
        self
    }

    /// Builds the settings.
    pub fn build(self) -> PipelineSettings {
        self.settings
    }
}
