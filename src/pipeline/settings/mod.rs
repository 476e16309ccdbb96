//! Configuration for a pipeline run.
//!
//! Settings are read from a TOML file or assembled with
//! [`SettingsBuilder`]. Blank strings in the file are treated as absent, so
//! `target = ""` and a missing `target` key mean the same thing.

mod builder;
mod core;
mod sections;

pub use builder::SettingsBuilder;
pub use self::core::PipelineSettings;
pub use sections::{ArtifactSettings, BuildSettings, PodSettings};

use serde::{Deserialize, Deserializer};

/// Deserializes an optional string, mapping blank values to `None`.
pub(crate) fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}
