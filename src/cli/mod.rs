//! Command line interface for the iOS build pipeline.
//!
//! Loads settings, applies command line overrides, runs the pipeline and
//! optionally writes a JSON run report. The process exit code is the run's
//! status.

mod args;

pub use args::Args;

use crate::{
    error::Result,
    pipeline::{BuildContext, BuildEnvironment, Pipeline, PipelineSettings, TokioProcessRunner, ToolPaths},
};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    run_with(&args).await
}

/// Runs the pipeline for already parsed arguments.
pub async fn run_with(args: &Args) -> Result<i32> {
    args.validate()?;

    let settings = resolve_settings(args)?;
    if settings.build.code_sign {
        log::warn!(
            "Code signing needs a credential archive; the command line builds unsigned. \
             Embed the library to supply signing material."
        );
    }

    let env = BuildEnvironment::from_process();
    let tools = ToolPaths::resolve(&settings.tools, &env);
    let context = BuildContext::new(settings.workspace_root(), env, tools, &settings.build_directory)?;

    let mut pipeline = Pipeline::new(context, TokioProcessRunner::default())?;
    let report = pipeline.run(&settings, None).await?;

    if let Some(path) = &args.report {
        tokio::fs::write(path, report.to_json()?).await?;
        log::info!("Wrote run report to {}", path.display());
    }

    Ok(report.status())
}

/// Loads the settings file (if any) and applies argument overrides.
pub fn resolve_settings(args: &Args) -> Result<PipelineSettings> {
    let mut settings = match &args.config {
        Some(path) => PipelineSettings::load(path)?,
        None => PipelineSettings::default(),
    };
    args.apply(&mut settings);
    Ok(settings)
}

/// Parse arguments without executing (for testing)
pub fn parse_args() -> Args {
    Args::parse_args()
}
