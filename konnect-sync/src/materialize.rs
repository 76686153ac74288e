//! Service-spec materializer.
//!
//! Copies a service's OpenAPI document from its own repository into the
//! platform working copy at
//! `konnect/{org}/envs/{env}/teams/{team}/services/{service}/openapi.yaml`.

use std::path::Path;

use konnect_core::layout::service_spec_path;
use konnect_core::manifest::check_auth;
use konnect_core::{
    AuthKind, AuthRef, CancelToken, ConfigError, EnvName, EnvServiceDef, OrgName, Secrets,
    ServiceDef, ServiceName, TeamName,
};
use konnect_ports::{CloneOptions, Credentials, Git};

use crate::error::SyncError;
use crate::writer::{atomic_write, WriteResult};

/// Resolve the git credentials `auth` describes. `at` names the manifest path
/// for error messages.
pub fn credentials(
    secrets: &dyn Secrets,
    auth: &AuthRef,
    at: &str,
) -> Result<Credentials, ConfigError> {
    check_auth(auth, at)?;
    match (&auth.kind, &auth.value) {
        (AuthKind::SshKey, Some(secret)) => Ok(Credentials::SshKey {
            private_key: secrets.resolve(secret)?,
        }),
        _ => Ok(Credentials::None),
    }
}

/// Bytes of `def.spec_path` on `branch` of the service repository.
///
/// The scratch clone is closed on every path.
pub fn fetch_spec(
    git: &dyn Git,
    secrets: &dyn Secrets,
    service: &ServiceName,
    def: &ServiceDef,
    branch: &str,
    cx: &CancelToken,
) -> Result<Vec<u8>, SyncError> {
    let creds = credentials(secrets, &def.git.auth, &format!("services.{service}.git"))?;
    let wc = git.clone_repo(&def.git.remote, &creds, &CloneOptions::shallow(branch), cx)?;
    let read = wc.read_file(&def.spec_path);
    let closed = wc.close();
    let bytes = read?;
    closed?;
    tracing::debug!(
        "fetched {} ({} bytes) from {}@{branch}",
        def.spec_path,
        bytes.len(),
        def.git.remote
    );
    Ok(bytes)
}

/// One `(org, env, team, service)` to materialize.
#[derive(Debug, Clone, Copy)]
pub struct ServiceTarget<'a> {
    pub org: &'a OrgName,
    pub env: &'a EnvName,
    pub team: &'a TeamName,
    pub service: &'a ServiceName,
}

/// Fetch the service's spec and write it under `platform_root`.
pub fn materialize(
    git: &dyn Git,
    secrets: &dyn Secrets,
    platform_root: &Path,
    target: ServiceTarget<'_>,
    def: &ServiceDef,
    env_service: &EnvServiceDef,
    cx: &CancelToken,
) -> Result<WriteResult, SyncError> {
    let bytes = fetch_spec(git, secrets, target.service, def, &env_service.branch, cx)?;
    let path = platform_root.join(service_spec_path(
        target.org,
        target.env,
        target.team,
        target.service,
    ));
    atomic_write(&path, &bytes)
}
