//! Top-level pipeline settings.

use super::{ArtifactSettings, BuildSettings, PodSettings};
use crate::pipeline::tool_detection::ConfiguredTools;
use std::path::{Path, PathBuf};

fn default_build_directory() -> String {
    "build".to_string()
}

/// Settings for one pipeline run.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_ios::pipeline::PipelineSettings;
///
/// let settings = PipelineSettings::from_toml_str(r#"
///     build_directory = "build/${CONFIGURATION}"
///
///     [build]
///     xcworkspace = "MyApp.xcworkspace"
///     scheme = "MyApp"
///     target = ""
///
///     [artifacts]
///     ipa_name_template = "dist/$APP_NAME"
/// "#).unwrap();
///
/// assert_eq!(settings.build.scheme.as_deref(), Some("MyApp"));
/// assert_eq!(settings.build.target, None);
/// assert_eq!(settings.build.sdk, "iphoneos");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSettings {
    /// Workspace root. Relative paths resolve against the current directory.
    ///
    /// Default: None (the current directory)
    #[serde(default)]
    pub workspace: Option<PathBuf>,

    /// Build output directory, relative to the workspace.
    ///
    /// Default: "build"
    #[serde(default = "default_build_directory")]
    pub build_directory: String,

    /// Tool locations.
    #[serde(default)]
    pub tools: ConfiguredTools,

    /// Dependency installation.
    #[serde(default)]
    pub pods: PodSettings,

    /// Compilation.
    #[serde(default)]
    pub build: BuildSettings,

    /// Output naming.
    #[serde(default)]
    pub artifacts: ArtifactSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workspace: None,
            build_directory: default_build_directory(),
            tools: ConfiguredTools::default(),
            pods: PodSettings::default(),
            build: BuildSettings::default(),
            artifacts: ArtifactSettings::default(),
        }
    }
}

impl PipelineSettings {
    /// Parses settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads and parses a settings file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        use anyhow::Context as _;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Ok(Self::from_toml_str(&text)?)
    }

    /// Workspace root, defaulting to the current directory.
    pub fn workspace_root(&self) -> PathBuf {
        match &self.workspace {
            Some(path) => path.clone(),
            None => PathBuf::from("."),
        }
    }
}
