//! Shared error types for the application.

use std::path::PathBuf;

use thiserror::Error;

use crate::logging::MsgCode;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    RunArgError = 1,
    GitError = 2,
    ParseError = 3,
    InternalError = 4,
}

/// Main error type for copylint operations.
///
/// Configuration-time kinds are fatal and abort the run; per-file kinds are
/// caught by the dispatcher, logged with the file path, and skipped.
#[derive(Debug, Error)]
pub enum Error {
    /// Non-integer `--max-blame-authors-to-start-update` value.
    #[error("{0} should be a positive number (0 or -1 mean 'unlimited' and used by default)")]
    BadMaxBlameAuthors(String),

    /// No usable target paths on the command line.
    #[error("'file_or_dir' should not be empty string")]
    BadTargetPaths,

    /// `--static-config` given with an empty value.
    #[error("--static-config should not be empty string")]
    BadStaticConfigPath,

    /// Static config file missing, unreadable, or structurally wrong.
    #[error("Error parsing static config '{path}': {reason}")]
    BadStaticConfigFormat { path: PathBuf, reason: String },

    /// File could not be read or written.
    #[error("Error accessing file {path}: {source}")]
    FileReadWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A header line did not match the field grammar.
    #[error("Error matching header for {0}.")]
    BadHeaderFormat(PathBuf),

    /// Spawning or waiting for an external tool failed.
    #[error("Failed to run external tool: {0}")]
    ExternalTool(String),

    /// Git-level failures (repository discovery, revision walk).
    #[error("Git. {0}")]
    Git(String),

    /// Catch-all for unexpected per-file failures.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Error {
    pub fn file_read_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileReadWrite {
            path: path.into(),
            source,
        }
    }

    /// Exit code the process reports when this error aborts the run.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::BadMaxBlameAuthors(_)
            | Error::BadTargetPaths
            | Error::BadStaticConfigPath
            | Error::BadStaticConfigFormat { .. } => ExitCode::RunArgError,
            Error::Git(_) | Error::ExternalTool(_) => ExitCode::GitError,
            Error::BadHeaderFormat(_) => ExitCode::ParseError,
            Error::FileReadWrite { .. } | Error::Internal(_) => ExitCode::InternalError,
        }
    }

    /// Message code used when logging this error.
    pub fn msg_code(&self) -> MsgCode {
        match self {
            Error::BadMaxBlameAuthors(_) => MsgCode::BadMaxBlameAuthors,
            Error::BadTargetPaths => MsgCode::BadTargetPaths,
            Error::BadStaticConfigPath => MsgCode::BadStaticConfigPath,
            Error::BadStaticConfigFormat { .. } => MsgCode::BadStaticConfigFormat,
            Error::FileReadWrite { .. } => MsgCode::FileReadWriteError,
            Error::BadHeaderFormat(_) => MsgCode::BadHeaderFormat,
            Error::ExternalTool(_) => MsgCode::RunningExternalToolError,
            Error::Git(_) => MsgCode::GitError,
            Error::Internal(_) => MsgCode::InternalError,
        }
    }
}

/// Result type alias using our error type.
pub type Result<T> = std::result::Result<T, Error>;
