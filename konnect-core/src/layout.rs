//! Naming rules shared by the reconciler, the materializer and the CLI.
//!
//! ```text
//! <platform working copy>/
//!   konnect/<org>/envs/<env>/teams/<team>/services/<service>/openapi.yaml
//! ```

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::ConfigError;
use crate::types::{EnvName, OrgName, ServiceName, TeamName};

/// Base branch every pull request targets.
pub const PR_BASE_BRANCH: &str = "main";

/// File name every materialized spec is written to, whatever its format.
pub const SPEC_FILE_NAME: &str = "openapi.yaml";

/// Role entity type for control planes.
pub const CONTROL_PLANE_ENTITY_TYPE: &str = "Control Planes";

/// Cluster type used when creating control planes.
pub const CONTROL_PLANE_CLUSTER_TYPE: &str = "CLUSTER_TYPE_CONTROL_PLANE";

/// `{env}-konnect-orchestrator-apply`
pub fn apply_branch(env: &EnvName) -> String {
    format!("{env}-konnect-orchestrator-apply")
}

/// `{team}-{env}`
pub fn control_plane_name(team: &TeamName, env: &EnvName) -> String {
    format!("{team}-{env}")
}

pub fn control_plane_description(team: &TeamName, env: &EnvName) -> String {
    format!("Control plane for team {team} in environment {env}")
}

/// `konnect/{org}/envs/{env}/teams/{team}/services/{service}`. Pure, no I/O.
pub fn service_dir(org: &OrgName, env: &EnvName, team: &TeamName, service: &ServiceName) -> PathBuf {
    PathBuf::from("konnect")
        .join(org.as_str())
        .join("envs")
        .join(env.as_str())
        .join("teams")
        .join(team.as_str())
        .join("services")
        .join(service.as_str())
}

/// [`service_dir`] + `openapi.yaml`.
pub fn service_spec_path(
    org: &OrgName,
    env: &EnvName,
    team: &TeamName,
    service: &ServiceName,
) -> PathBuf {
    service_dir(org, env, team, service).join(SPEC_FILE_NAME)
}

/// True when `name` can be used as exactly one directory of the layout.
pub fn is_path_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// True when `path` is relative and never climbs above its root.
pub fn is_contained(path: &str) -> bool {
    let path = Path::new(path);
    let mut normal = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    normal > 0
}

// ---------------------------------------------------------------------------
// Remote URL parsing
// ---------------------------------------------------------------------------

/// Owner and repository name of a hosted git remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl RepoSlug {
    /// Split a git remote into `owner/repo`.
    ///
    /// Accepts `git@host:owner/repo(.git)`, `ssh://[user@]host[:port]/owner/repo(.git)`
    /// and `http(s)://host/owner/repo(.git)`.
    pub fn parse(remote: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidRemote {
            remote: remote.to_string(),
        };
        let trimmed = remote.trim();

        let path = if let Some((_, rest)) = trimmed.split_once("://") {
            // scheme://authority/path
            rest.split_once('/').map(|(_, path)| path).ok_or_else(invalid)?
        } else if let Some((_, path)) = trimmed.split_once(':') {
            // scp-like: user@host:path
            path
        } else {
            return Err(invalid());
        };

        let path = path.trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let mut parts = path.rsplitn(2, '/');
        let repo = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let owner = parts
            .next()
            .map(|o| o.rsplit('/').next().unwrap_or(o))
            .filter(|s| !s.is_empty())
            .ok_or_else(invalid)?;

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}
