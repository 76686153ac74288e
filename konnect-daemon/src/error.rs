use std::path::PathBuf;

use thiserror::Error;

/// Error surface of the control loop.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A reconciliation pass failed; the loop stops.
    #[error(transparent)]
    Sync(#[from] konnect_sync::SyncError),

    #[error("ctrl-c handler failed: {0}")]
    Signal(String),

    #[error("{task} task join failure: {detail}")]
    Join { task: &'static str, detail: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
