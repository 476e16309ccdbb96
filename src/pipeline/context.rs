//! Per-run build context.

use super::{
    environment::BuildEnvironment,
    error::{ErrorExt, Result},
    tool_detection::ToolPaths,
};
use crate::bail;
use std::path::{Path, PathBuf};

/// Immutable configuration of one pipeline run.
///
/// Created once when the orchestrator is constructed and only read after
/// that.
#[derive(Clone, Debug)]
pub struct BuildContext {
    workspace: PathBuf,
    env: BuildEnvironment,
    tools: ToolPaths,
    build_dir: PathBuf,
}

impl BuildContext {
    /// Validates the workspace and resolves the build output directory.
    ///
    /// `build_directory` is expanded against `env` and taken relative to the
    /// workspace. The build directory itself need not exist yet.
    ///
    /// # Errors
    ///
    /// Fails when the workspace is missing or not a directory.
    pub fn new(
        workspace: impl Into<PathBuf>,
        env: BuildEnvironment,
        tools: ToolPaths,
        build_directory: &str,
    ) -> Result<Self> {
        let workspace = workspace.into();
        let metadata = std::fs::metadata(&workspace).fs_context("accessing workspace", &workspace)?;
        if !metadata.is_dir() {
            bail!("workspace {} is not a directory", workspace.display());
        }

        let build_dir = workspace.join(env.expand(build_directory));
        Ok(Self {
            workspace,
            env,
            tools,
            build_dir,
        })
    }

    /// Workspace root; the build tool runs here.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Resolved environment passed to every tool.
    pub fn env(&self) -> &BuildEnvironment {
        &self.env
    }

    /// Tool locations.
    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Directory the build tool writes products into.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// `path` expanded and resolved against the workspace.
    pub fn workspace_path(&self, path: &str) -> PathBuf {
        self.workspace.join(self.env.expand(path))
    }
}
