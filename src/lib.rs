//! iOS build pipeline library for build agents.
//!
//! This library drives a complete iOS build through the platform tools:
//! - CocoaPods dependency installation
//! - Ephemeral keychain signing with automatic teardown
//! - `xcodebuild` compilation
//! - `.ipa` packaging and `.dSYM` archiving
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod pipeline;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
