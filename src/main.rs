//! Kodegen Bundler iOS - build pipeline for iOS apps on CI agents.
//!
//! This binary installs pods, compiles with xcodebuild, packages .ipa files
//! and archives dSYMs, driven by a TOML settings file.

use kodegen_bundler_ios::cli;
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
