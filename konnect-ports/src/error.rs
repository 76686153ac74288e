//! Error types for konnect-ports.

use std::path::PathBuf;

use konnect_core::Cancelled;
use thiserror::Error;

/// Failure of a remote-API or code-hosting call.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The ambient token was cancelled before or during the call.
    #[error("operation cancelled")]
    Cancelled,

    /// The server answered with a non-success status.
    #[error("{op}: HTTP {status}: {body}")]
    Status {
        op: String,
        status: u16,
        body: String,
    },

    /// Connection, TLS or timeout failure.
    #[error("{op}: transport error: {detail}")]
    Transport { op: String, detail: String },

    /// The response body did not have the expected shape.
    #[error("{op}: invalid response: {detail}")]
    Decode { op: String, detail: String },

    /// The call completed but its result violates the port contract.
    #[error("{op}: {detail}")]
    Rejected { op: String, detail: String },
}

impl From<Cancelled> for RemoteError {
    fn from(_: Cancelled) -> Self {
        RemoteError::Cancelled
    }
}

/// Failure of a git working-copy operation.
#[derive(Debug, Error)]
pub enum GitError {
    /// The ambient token was cancelled; any running git process was killed.
    #[error("operation cancelled")]
    Cancelled,

    /// The git executable could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// git exited unsuccessfully.
    #[error("`git {args}` exited with {status}: {stderr}")]
    Command {
        args: String,
        status: String,
        stderr: String,
    },

    /// Filesystem failure on the scratch directory or a key file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file path that is absolute or climbs out of the working copy.
    #[error("{path}: not a relative path inside {remote}")]
    UnsafePath { remote: String, path: String },

    /// A file expected in the working copy does not exist.
    #[error("{path} not found in {remote}@{branch}")]
    MissingFile {
        remote: String,
        branch: String,
        path: String,
    },
}

impl From<Cancelled> for GitError {
    fn from(_: Cancelled) -> Self {
        GitError::Cancelled
    }
}

pub(crate) fn git_io(path: impl Into<PathBuf>, source: std::io::Error) -> GitError {
    GitError::Io {
        path: path.into(),
        source,
    }
}
