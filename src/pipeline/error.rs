//! Error types for pipeline stages.
//!
//! Stage operations convert these into integer statuses at their boundary;
//! setup operations propagate them to the caller.

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while running pipeline stages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Free-form error with a message.
    #[error("{0}")]
    GenericError(String),

    /// Plain IO error.
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// IO error annotated with the operation and path involved.
    #[error("{context} `{}`: {error}", path.display())]
    Fs {
        /// What was being done.
        context: &'static str,
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying error.
        #[source]
        error: io::Error,
    },

    /// An external tool could not be started.
    #[error("failed to launch `{program}`: {error}")]
    Launch {
        /// Program that failed to start.
        program: String,
        /// Underlying error.
        #[source]
        error: io::Error,
    },

    /// An external tool exited with a nonzero status.
    #[error("`{command}` exited with status {code}")]
    ToolFailed {
        /// Redacted command line.
        command: String,
        /// Exit code reported by the tool.
        code: i32,
    },

    /// Additional build parameters could not be split into arguments.
    #[error("cannot tokenize parameters `{input}`: {reason}")]
    Tokenize {
        /// Raw parameter string.
        input: String,
        /// What went wrong.
        reason: &'static str,
    },

    /// Signing material could not be selected or exported.
    #[error("signing material error: {0}")]
    Signing(String),

    /// Zip archive could not be written.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory walk failed.
    #[error("directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix could not be stripped during traversal.
    #[error("path prefix error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),
}

/// Adds a message to errors and missing values.
pub trait Context<T> {
    /// Wraps the error (or `None`) with `msg`.
    fn context<C: Display + Send + Sync + 'static>(self, msg: C) -> Result<T>;

    /// Lazily wraps the error (or `None`) with the message returned by `f`.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: Display> Context<T> for std::result::Result<T, E> {
    fn context<C: Display + Send + Sync + 'static>(self, msg: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{msg}: {e}")))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::GenericError(format!("{}: {e}", f())))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display + Send + Sync + 'static>(self, msg: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Attaches filesystem context to IO results.
pub trait ErrorExt<T> {
    /// Maps an IO error into [`Error::Fs`] naming `context` and `path`.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Returns early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::pipeline::Error::GenericError(format!($($arg)*)))
    };
}
