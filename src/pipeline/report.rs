//! Run report written at the end of a pipeline run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Pipeline stages, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// `pod install` / `pod update`.
    Dependencies,
    /// Keychain and provisioning profile setup.
    Signing,
    /// `xcodebuild`.
    Compile,
    /// `.ipa` creation.
    Package,
    /// `.dSYM` zipping.
    DebugSymbols,
    /// Keychain deletion.
    Cleanup,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Dependencies => "dependencies",
            Stage::Signing => "signing",
            Stage::Compile => "compile",
            Stage::Package => "package",
            Stage::DebugSymbols => "debug-symbols",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Outcome of one stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    /// Which stage ran.
    pub stage: Stage,
    /// 0 on success.
    pub status: i32,
}

/// A file the run produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    /// Absolute path of the artifact.
    pub path: PathBuf,
    /// Hex SHA-256 of its contents.
    pub sha256: String,
}

/// Summary of a pipeline run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Stages that ran, in order.
    pub stages: Vec<StageRecord>,
    /// Produced artifacts.
    pub artifacts: Vec<ArtifactRecord>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::start()
    }
}

impl RunReport {
    /// Starts a report timestamped now.
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            stages: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Records a stage outcome.
    pub fn record(&mut self, stage: Stage, status: i32) {
        if status == 0 {
            log::info!("✓ Stage {} succeeded", stage);
        } else {
            log::error!("Stage {} failed with status {}", stage, status);
        }
        self.stages.push(StageRecord { stage, status });
    }

    /// Status of `stage`, if it ran.
    pub fn status_of(&self, stage: Stage) -> Option<i32> {
        self.stages.iter().find(|r| r.stage == stage).map(|r| r.status)
    }

    /// First nonzero stage status, or 0.
    pub fn status(&self) -> i32 {
        self.stages
            .iter()
            .map(|r| r.status)
            .find(|&s| s != 0)
            .unwrap_or(0)
    }

    /// Stamps the finish time.
    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
