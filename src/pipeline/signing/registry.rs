//! Provisioning profile installation.
//!
//! Profiles live in an agent-wide directory shared by every run. Two runs
//! installing the same UUID at the same time race on one file; nothing here
//! locks it and the last writer wins. The UUID becomes the file name, so
//! values that could leave the directory are rejected.

use super::ProvisioningProfile;
use crate::pipeline::{
    environment::BuildEnvironment,
    error::{Context, Error, ErrorExt, Result},
};
use std::path::{Path, PathBuf};

/// Directory below the home directory that Xcode reads profiles from.
pub const PROFILES_SUBPATH: &str = "Library/MobileDevice/Provisioning Profiles";

/// Extension of installed profiles.
pub const PROFILE_EXTENSION: &str = "mobileprovision";

/// Where provisioning profiles get installed on the agent.
#[allow(async_fn_in_trait)]
pub trait ProfileRegistry {
    /// Writes `profile` and returns the installed path.
    async fn install(&self, profile: &ProvisioningProfile) -> Result<PathBuf>;
}

/// Installs into `<home>/Library/MobileDevice/Provisioning Profiles`.
#[derive(Clone, Debug)]
pub struct HomeProfileRegistry {
    home: PathBuf,
}

impl HomeProfileRegistry {
    /// Registry rooted at an explicit home directory.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Registry for `HOME` from the build environment, falling back to the
    /// current user's home directory.
    pub fn from_env(env: &BuildEnvironment) -> Result<Self> {
        let home = match env.get("HOME") {
            Some(home) if !home.is_empty() => {
                let trimmed = home.trim_end_matches('/');
                PathBuf::from(if trimmed.is_empty() { "/" } else { trimmed })
            }
            _ => dirs::home_dir().context("cannot determine home directory")?,
        };
        Ok(Self::new(home))
    }

    /// Profile directory.
    pub fn profiles_dir(&self) -> PathBuf {
        self.home.join(PROFILES_SUBPATH)
    }

    /// Installed path for a profile UUID.
    pub fn profile_path(&self, uuid: &str) -> PathBuf {
        self.profiles_dir().join(format!("{uuid}.{PROFILE_EXTENSION}"))
    }

    /// Home directory the registry is rooted at.
    pub fn home(&self) -> &Path {
        &self.home
    }
}

impl ProfileRegistry for HomeProfileRegistry {
    async fn install(&self, profile: &ProvisioningProfile) -> Result<PathBuf> {
        check_uuid(profile.uuid())?;
        let dir = self.profiles_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .fs_context("creating provisioning profile directory", &dir)?;

        let path = self.profile_path(profile.uuid());
        tokio::fs::write(&path, profile.bytes())
            .await
            .fs_context("installing provisioning profile", &path)?;

        log::info!("Installed provisioning profile {}", path.display());
        Ok(path)
    }
}

fn check_uuid(uuid: &str) -> Result<()> {
    let usable = !uuid.is_empty()
        && uuid != "."
        && uuid != ".."
        && !uuid.contains(['/', '\\', '\0']);
    if usable {
        Ok(())
    } else {
        Err(Error::Signing(format!(
            "provisioning profile UUID {uuid:?} is not a valid file name"
        )))
    }
}
