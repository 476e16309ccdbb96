//! Settings sections.

use super::non_blank;
use crate::pipeline::{command::XcodebuildParams, naming::NamingTemplate};

fn default_project_root() -> String {
    ".".to_string()
}

fn default_sdk() -> String {
    "iphoneos".to_string()
}

/// CocoaPods dependency installation.
///
/// ```toml
/// [pods]
/// enabled = true
/// project_root = "ios"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PodSettings {
    /// Run `pod install`/`pod update` before building.
    ///
    /// Default: false
    #[serde(default)]
    pub enabled: bool,

    /// Directory holding the `Podfile`, relative to the workspace.
    ///
    /// Default: "."
    #[serde(default = "default_project_root")]
    pub project_root: String,
}

impl Default for PodSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            project_root: default_project_root(),
        }
    }
}

/// `xcodebuild` inputs.
///
/// ```toml
/// [build]
/// xcworkspace = "MyApp.xcworkspace"
/// scheme = "MyApp"
/// configuration = "Release"
/// additional_parameters = "ONLY_ACTIVE_ARCH=NO"
/// code_sign = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSettings {
    /// `.xcworkspace` to build.
    #[serde(default, deserialize_with = "non_blank")]
    pub xcworkspace: Option<String>,

    /// `.xcodeproj` to build.
    #[serde(default, deserialize_with = "non_blank")]
    pub xcodeproj: Option<String>,

    /// Target name.
    #[serde(default, deserialize_with = "non_blank")]
    pub target: Option<String>,

    /// Scheme name.
    #[serde(default, deserialize_with = "non_blank")]
    pub scheme: Option<String>,

    /// Build configuration.
    #[serde(default, deserialize_with = "non_blank")]
    pub configuration: Option<String>,

    /// SDK identifier.
    ///
    /// Default: "iphoneos"
    #[serde(default = "default_sdk")]
    pub sdk: String,

    /// Extra `xcodebuild` arguments, split with shell quoting rules.
    #[serde(default, deserialize_with = "non_blank")]
    pub additional_parameters: Option<String>,

    /// Pass signing settings to the build.
    ///
    /// Default: false
    #[serde(default)]
    pub code_sign: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            xcworkspace: None,
            xcodeproj: None,
            target: None,
            scheme: None,
            configuration: None,
            sdk: default_sdk(),
            additional_parameters: None,
            code_sign: false,
        }
    }
}

impl BuildSettings {
    /// Converts into command builder input.
    pub fn to_params(&self) -> XcodebuildParams {
        XcodebuildParams {
            workspace: self.xcworkspace.clone(),
            project: self.xcodeproj.clone(),
            target: self.target.clone(),
            scheme: self.scheme.clone(),
            configuration: self.configuration.clone(),
            sdk: self.sdk.clone(),
            additional_parameters: self.additional_parameters.clone(),
            code_sign: self.code_sign,
        }
    }
}

/// Output naming.
///
/// Each template uses `$APP_NAME` for the product's base name. A missing
/// template skips that stage.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSettings {
    /// Template for `.ipa` files.
    #[serde(default, deserialize_with = "non_blank")]
    pub ipa_name_template: Option<String>,

    /// Template for zipped `.dSYM` bundles.
    #[serde(default, deserialize_with = "non_blank")]
    pub dsym_name_template: Option<String>,
}

impl ArtifactSettings {
    /// IPA template, if packaging is enabled.
    pub fn ipa_template(&self) -> Option<NamingTemplate> {
        self.ipa_name_template.as_deref().map(NamingTemplate::from)
    }

    /// dSYM template, if debug-symbol archiving is enabled.
    pub fn dsym_template(&self) -> Option<NamingTemplate> {
        self.dsym_name_template.as_deref().map(NamingTemplate::from)
    }
}
