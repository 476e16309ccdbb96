//! External tool location.
//!
//! Configured paths win. Otherwise the tool is looked up on the `PATH` of the
//! build environment; if that fails the bare name is kept so the failure
//! surfaces when the stage actually launches it.

use super::environment::BuildEnvironment;
use std::path::{Path, PathBuf};

/// Locations of the four tools the pipeline drives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolPaths {
    /// Dependency manager (`pod`).
    pub pod: PathBuf,
    /// Keychain tool (`security`).
    pub security: PathBuf,
    /// Build tool (`xcodebuild`).
    pub xcodebuild: PathBuf,
    /// Packaging tool (`xcrun`).
    pub xcrun: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            pod: PathBuf::from("pod"),
            security: PathBuf::from("security"),
            xcodebuild: PathBuf::from("xcodebuild"),
            xcrun: PathBuf::from("xcrun"),
        }
    }
}

impl ToolPaths {
    /// Resolves each tool, preferring the configured path.
    pub fn resolve(configured: &ConfiguredTools, env: &BuildEnvironment) -> Self {
        Self {
            pod: locate("pod", configured.pod.as_deref(), env),
            security: locate("security", configured.security.as_deref(), env),
            xcodebuild: locate("xcodebuild", configured.xcodebuild.as_deref(), env),
            xcrun: locate("xcrun", configured.xcrun.as_deref(), env),
        }
    }
}

/// Tool paths as written in settings; `None` means "find it".
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfiguredTools {
    /// Path to `pod`.
    #[serde(default)]
    pub pod: Option<PathBuf>,
    /// Path to `security`.
    #[serde(default)]
    pub security: Option<PathBuf>,
    /// Path to `xcodebuild`.
    #[serde(default)]
    pub xcodebuild: Option<PathBuf>,
    /// Path to `xcrun`.
    #[serde(default)]
    pub xcrun: Option<PathBuf>,
}

fn locate(name: &str, configured: Option<&Path>, env: &BuildEnvironment) -> PathBuf {
    if let Some(path) = configured {
        let expanded = PathBuf::from(env.expand(&path.to_string_lossy()));
        log::debug!("Using configured {} at: {}", name, expanded.display());
        return expanded;
    }

    let cwd = std::env::current_dir().unwrap_or_default();
    match which::which_in(name, env.get("PATH"), cwd) {
        Ok(path) => {
            log::debug!("Found {} at: {}", name, path.display());
            path
        }
        Err(e) => {
            log::warn!(
                "{} not found in PATH: {}. Stages that need it will fail to launch.",
                name,
                e
            );
            PathBuf::from(name)
        }
    }
}
