//! Error types for konnect-sync.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use konnect_core::{Cancelled, ConfigError};
use konnect_ports::{GitError, RemoteError};
use konnect_renderer::RenderError;

/// The `(org, env, team, service?)` tuple a failure happened in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub org: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl Scope {
    pub fn org(org: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            ..Self::default()
        }
    }

    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "org={}", self.org)?;
        if let Some(env) = &self.env {
            write!(f, " env={env}")?;
        }
        if let Some(team) = &self.team {
            write!(f, " team={team}")?;
        }
        if let Some(service) = &self.service {
            write!(f, " service={service}")?;
        }
        Ok(())
    }
}

/// All errors a reconciliation pass can end with.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid manifest, dangling reference or unresolvable secret.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A Konnect port call failed.
    #[error("remote API error: {0}")]
    Remote(#[source] RemoteError),

    /// Clone, checkout, commit or push failed.
    #[error("git error: {0}")]
    Git(#[source] GitError),

    /// The code-hosting provider rejected a pull-request call.
    #[error("pull request error: {0}")]
    PullRequest(#[source] RemoteError),

    /// The ambient token was cancelled. Never wrapped in [`SyncError::Scoped`].
    #[error("operation cancelled")]
    Cancelled,

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// A failure annotated with the unit it happened in.
    #[error("{scope}: {source}")]
    Scoped {
        scope: Scope,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// Attach `scope`, unless the error is a cancellation or already scoped.
    pub fn in_scope(self, scope: &Scope) -> SyncError {
        match self {
            SyncError::Cancelled | SyncError::Scoped { .. } => self,
            other => SyncError::Scoped {
                scope: scope.clone(),
                source: Box::new(other),
            },
        }
    }

    /// The error with every [`SyncError::Scoped`] layer removed.
    pub fn root(&self) -> &SyncError {
        let mut err = self;
        while let SyncError::Scoped { source, .. } = err {
            err = &**source;
        }
        err
    }

    /// Innermost scope, if any.
    pub fn scope(&self) -> Option<&Scope> {
        let mut found = None;
        let mut err = self;
        while let SyncError::Scoped { scope, source } = err {
            found = Some(scope);
            err = &**source;
        }
        found
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), SyncError::Cancelled)
    }

    /// Map a hosting-provider failure.
    pub(crate) fn pull_request(err: RemoteError) -> SyncError {
        match err {
            RemoteError::Cancelled => SyncError::Cancelled,
            other => SyncError::PullRequest(other),
        }
    }
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Cancelled => SyncError::Cancelled,
            other => SyncError::Remote(other),
        }
    }
}

impl From<GitError> for SyncError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::Cancelled => SyncError::Cancelled,
            other => SyncError::Git(other),
        }
    }
}

impl From<Cancelled> for SyncError {
    fn from(_: Cancelled) -> Self {
        SyncError::Cancelled
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
