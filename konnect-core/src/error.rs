//! Error types for konnect-core.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration problems: unreadable or invalid manifests, dangling
/// references, and secrets that cannot be resolved.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading the manifest.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest did not parse as YAML (nor as JSON).
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest file did not exist.
    #[error("manifest not found at {path}")]
    ManifestNotFound { path: PathBuf },

    /// An environment lists a team that is not declared under `teams`.
    #[error("organizations.{org}.environments.{env}.teams.{team}: unknown team '{team}'")]
    UnknownTeam {
        org: String,
        env: String,
        team: String,
    },

    /// An environment activates a service the team does not declare.
    #[error(
        "organizations.{org}.environments.{env}.teams.{team}.services.{service}: \
         team '{team}' has no service '{service}'"
    )]
    UnknownService {
        org: String,
        env: String,
        team: String,
        service: String,
    },

    /// A required manifest field is absent.
    #[error("{path}: missing required field")]
    MissingField { path: String },

    /// A git remote could not be split into owner and repository.
    #[error("cannot derive owner/repo from git remote '{remote}'")]
    InvalidRemote { remote: String },

    /// `env` secret whose variable is unset or empty.
    #[error("environment variable '{name}' is unset or empty")]
    MissingEnvVar { name: String },

    /// `file` secret that could not be read.
    #[error("cannot read secret file {path}: {source}")]
    SecretFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Secret kind other than `file`, `env` or `literal`.
    #[error("unsupported secret type '{kind}'")]
    UnsupportedSecret { kind: String },

    /// Git auth kind the driver does not implement.
    #[error("unsupported git auth type '{kind}'")]
    UnsupportedAuth { kind: String },

    /// Code-hosting provider other than GitHub.
    #[error("unsupported hosting type '{kind}'")]
    UnsupportedHosting { kind: String },

    /// A file path that is absolute or climbs out of its repository.
    #[error("{path}: '{value}' must be a relative path inside the repository")]
    UnsafePath { path: String, value: String },

    /// A map key that cannot be used as a single directory name.
    #[error("{path}: '{key}' is not a valid name (no '/', '\\', '.' or '..')")]
    InvalidName { path: String, key: String },
}
