//! Ephemeral keychain management.

use crate::pipeline::{
    command::security,
    environment::BuildEnvironment,
    error::{Error, Result},
    process::ProcessRunner,
};
use std::path::{Path, PathBuf};

/// A keychain created for a single run.
///
/// The name is random so concurrent runs on one agent never collide. The
/// value is consumed by [`TempKeychain::delete`], so a keychain can be
/// deleted at most once.
#[derive(Debug)]
pub struct TempKeychain {
    name: String,
    security: PathBuf,
}

impl TempKeychain {
    /// A keychain with a fresh random name. Nothing is created yet.
    pub fn new(security_tool: &Path) -> Self {
        Self {
            name: format!("{}.keychain", uuid::Uuid::new_v4()),
            security: security_tool.to_path_buf(),
        }
    }

    /// Runs `security create-keychain` with `password`.
    pub async fn create<R: ProcessRunner>(
        &self,
        runner: &R,
        env: &BuildEnvironment,
        password: &str,
    ) -> Result<()> {
        let command = security::create_keychain(&self.security, &self.name, password);
        let code = runner.run(&command, None, env.vars()).await?;
        if code != 0 {
            return Err(Error::ToolFailed {
                command: command.to_string(),
                code,
            });
        }

        log::info!("Created temporary keychain {}", self.name);
        Ok(())
    }

    /// Keychain file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Imports a PKCS#12 file, unlocks the keychain and turns off auto-lock.
    pub async fn import_identity<R: ProcessRunner>(
        &self,
        runner: &R,
        env: &BuildEnvironment,
        keychain_password: &str,
        identity_file: &Path,
        identity_password: &str,
    ) -> Result<()> {
        let steps = [
            security::import(&self.security, identity_file, &self.name, identity_password),
            security::unlock_keychain(&self.security, &self.name, keychain_password),
            security::disable_auto_lock(&self.security, &self.name),
        ];

        for command in &steps {
            let code = runner.run(command, None, env.vars()).await?;
            if code != 0 {
                return Err(Error::ToolFailed {
                    command: command.to_string(),
                    code,
                });
            }
        }

        log::info!("✓ Identity imported into keychain {}", self.name);
        Ok(())
    }

    /// Deletes the keychain. Best-effort: failures are logged, never returned.
    pub async fn delete<R: ProcessRunner>(self, runner: &R, env: &BuildEnvironment) {
        let command = security::delete_keychain(&self.security, &self.name);
        match runner.run(&command, None, env.vars()).await {
            Ok(0) => log::info!("Deleted temporary keychain {}", self.name),
            Ok(code) => log::warn!(
                "Failed to delete keychain {} (exit code {}); it may need manual removal",
                self.name,
                code
            ),
            Err(e) => log::warn!("Failed to delete keychain {}: {}", self.name, e),
        }
    }
}
