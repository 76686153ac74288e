//! Konnect orchestrator core library: manifest model, loading, secrets, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes and manifest structs
//! - [`error`]: [`ConfigError`]
//! - [`manifest`]: load / validate
//! - [`secret`]: resolve [`SecretRef`]s to plaintext
//! - [`layout`]: naming rules for branches, control planes and on-disk paths
//! - [`cancel`]: the ambient [`CancelToken`]

pub mod cancel;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod secret;
pub mod types;

pub use cancel::{CancelToken, Cancelled};
pub use error::ConfigError;
pub use secret::{ProcessSecrets, Secrets};
pub use types::{
    AuthKind, AuthRef, EnvDef, EnvName, EnvServiceDef, EnvTeamDef, EnvType, GitAuthor, GitRef,
    HostingKind, HostingRef, Manifest, OrgDef, OrgName, PlatformRef, SecretKind, SecretRef,
    ServiceDef, ServiceName, TeamDef, TeamName,
};
