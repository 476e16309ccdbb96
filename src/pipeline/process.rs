//! External process execution.
//!
//! The orchestrator talks to tools only through [`ProcessRunner`], so tests
//! can substitute a recording runner. [`TokioProcessRunner`] is the real one:
//! it spawns the tool, streams stdout and stderr line by line into an
//! [`OutputSink`] and waits for the exit status without a timeout.

use super::{
    command::BuildCommand,
    error::{Error, Result},
};
use std::{collections::BTreeMap, path::Path, process::Stdio, sync::Arc};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
};

/// Which stream a line of tool output came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// Receives tool output as it is produced.
pub trait OutputSink: Send + Sync {
    /// Called once per line, without the trailing newline.
    fn line(&self, stream: Stream, line: &str);
}

/// Forwards tool output to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn line(&self, stream: Stream, line: &str) {
        match stream {
            Stream::Stdout => log::info!(target: "tool", "{line}"),
            Stream::Stderr => log::warn!(target: "tool", "{line}"),
        }
    }
}

/// Executes external commands.
#[allow(async_fn_in_trait)]
pub trait ProcessRunner {
    /// Runs `command` to completion and returns its exit code.
    ///
    /// `Err` means the command could not be started at all; a tool that ran
    /// and failed is reported through a nonzero code.
    async fn run(
        &self,
        command: &BuildCommand,
        working_dir: Option<&Path>,
        env: &BTreeMap<String, String>,
    ) -> Result<i32>;
}

/// Spawns commands with `tokio::process`.
#[derive(Clone)]
pub struct TokioProcessRunner {
    sink: Arc<dyn OutputSink>,
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new(Arc::new(LogSink))
    }
}

impl std::fmt::Debug for TokioProcessRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioProcessRunner").finish_non_exhaustive()
    }
}

impl TokioProcessRunner {
    /// Creates a runner that streams output into `sink`.
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self { sink }
    }
}

impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        command: &BuildCommand,
        working_dir: Option<&Path>,
        env: &BTreeMap<String, String>,
    ) -> Result<i32> {
        log::debug!("$ {command}");

        let mut cmd = Command::new(command.program());
        cmd.args(command.arguments())
            .env_clear()
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|error| Error::Launch {
            program: command.program().to_string(),
            error,
        })?;

        // Drain both pipes together so neither can fill up and stall the tool.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        tokio::join!(
            drain(stdout, Stream::Stdout, self.sink.as_ref()),
            drain(stderr, Stream::Stderr, self.sink.as_ref())
        );

        let status = child.wait().await.map_err(|error| Error::Launch {
            program: command.program().to_string(),
            error,
        })?;

        // Killed by a signal: no code, report a generic failure.
        Ok(status.code().unwrap_or(1))
    }
}

/// Forwards `pipe` to `sink` line by line until EOF.
///
/// Lines are decoded lossily. After a read error the rest of the pipe is
/// discarded rather than closed, so the tool never dies of a broken pipe.
async fn drain<P>(pipe: Option<P>, stream: Stream, sink: &dyn OutputSink)
where
    P: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else {
        return;
    };
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if buf.ends_with(b"\n") {
                    buf.pop();
                    if buf.ends_with(b"\r") {
                        buf.pop();
                    }
                }
                sink.line(stream, &String::from_utf8_lossy(&buf));
            }
            Err(e) => {
                log::warn!("Stopped forwarding {:?} output: {}", stream, e);
                let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
                break;
            }
        }
    }
}
