//! Manifest loading and validation.
//!
//! The manifest is YAML; JSON is accepted as a fallback. A `.json` extension
//! tries JSON first.
//!
//! [`validate`] checks every cross-reference and every platform requirement up
//! front, so a reconciliation pass never starts on a manifest it would have to
//! abandon halfway for a configuration reason.

use std::path::Path;

use crate::error::ConfigError;
use crate::layout::{self, RepoSlug};
use crate::types::{AuthKind, AuthRef, HostingKind, Manifest, ServiceDef, TeamDef, TeamName};

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

/// Read and parse the manifest at `path`. Does not validate.
///
/// Returns `ConfigError::ManifestNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed.
pub fn load_at(path: &Path) -> Result<Manifest, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ManifestNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let json_first = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if json_first {
        if let Ok(manifest) = serde_json::from_str(&contents) {
            return Ok(manifest);
        }
    }

    match serde_yaml::from_str(&contents) {
        Ok(manifest) => Ok(manifest),
        Err(yaml_err) => serde_json::from_str(&contents).map_err(|_| ConfigError::Parse {
            path: path.to_path_buf(),
            source: yaml_err,
        }),
    }
}

/// [`load_at`] followed by [`validate`].
pub fn load_validated(path: &Path) -> Result<Manifest, ConfigError> {
    let manifest = load_at(path)?;
    validate(&manifest)?;
    Ok(manifest)
}

// ---------------------------------------------------------------------------
// 2. Lookups
// ---------------------------------------------------------------------------

/// `manifest.teams[team]`, or `UnknownTeam` naming the referencing path.
pub fn team<'m>(
    manifest: &'m Manifest,
    org: &str,
    env: &str,
    team: &TeamName,
) -> Result<&'m TeamDef, ConfigError> {
    manifest
        .teams
        .get(team.as_str())
        .ok_or_else(|| ConfigError::UnknownTeam {
            org: org.to_string(),
            env: env.to_string(),
            team: team.to_string(),
        })
}

/// `team_def.services[service]`, or `UnknownService` naming the referencing path.
pub fn service<'m>(
    team_def: &'m TeamDef,
    org: &str,
    env: &str,
    team: &str,
    service: &str,
) -> Result<&'m ServiceDef, ConfigError> {
    team_def
        .services
        .get(service)
        .ok_or_else(|| ConfigError::UnknownService {
            org: org.to_string(),
            env: env.to_string(),
            team: team.to_string(),
            service: service.to_string(),
        })
}

// ---------------------------------------------------------------------------
// 3. Validate
// ---------------------------------------------------------------------------

/// Check the manifest without touching any remote or git state.
///
/// - every environment team exists under `teams`
/// - every environment service exists under that team's `services`
/// - names used in the layout are single path segments, and every
///   `spec-path` stays inside its repository
/// - the platform ref has an author and a supported hosting provider, and
///   its remote yields an `owner/repo`
/// - every git auth in use is `none` or `ssh-key` with a secret
pub fn validate(manifest: &Manifest) -> Result<(), ConfigError> {
    for (org, org_def) in &manifest.organizations {
        check_name(org.as_str(), "organizations")?;
        for (env, env_def) in &org_def.environments {
            check_name(env.as_str(), &format!("organizations.{org}.environments"))?;
            for (team_name, env_team) in &env_def.teams {
                let at = format!("organizations.{org}.environments.{env}.teams");
                check_name(team_name.as_str(), &at)?;
                let team_def = team(manifest, org.as_str(), env.as_str(), team_name)?;
                for svc in env_team.services.keys() {
                    check_name(svc.as_str(), &format!("{at}.{team_name}.services"))?;
                    let def = service(
                        team_def,
                        org.as_str(),
                        env.as_str(),
                        team_name.as_str(),
                        svc.as_str(),
                    )?;
                    let at = format!("teams.{team_name}.services.{svc}");
                    if !layout::is_contained(&def.spec_path) {
                        return Err(ConfigError::UnsafePath {
                            path: format!("{at}.spec-path"),
                            value: def.spec_path.clone(),
                        });
                    }
                    check_auth(&def.git.auth, &format!("{at}.git"))?;
                }
            }
        }
    }

    let git = &manifest.platform.git;
    if git.author.is_none() {
        return Err(ConfigError::MissingField {
            path: "platform.git.author".to_string(),
        });
    }
    match &git.hosting {
        None => {
            return Err(ConfigError::MissingField {
                path: "platform.git.hosting".to_string(),
            })
        }
        Some(hosting) => {
            if let HostingKind::Other(kind) = &hosting.kind {
                return Err(ConfigError::UnsupportedHosting { kind: kind.clone() });
            }
        }
    }
    RepoSlug::parse(&git.remote)?;
    check_auth(&git.auth, "platform.git")?;
    Ok(())
}

/// Manifest keys become directory names in the platform layout.
fn check_name(key: &str, at: &str) -> Result<(), ConfigError> {
    if layout::is_path_segment(key) {
        Ok(())
    } else {
        Err(ConfigError::InvalidName {
            path: at.to_string(),
            key: key.to_string(),
        })
    }
}

/// Reject auth kinds the git driver cannot use.
pub fn check_auth(auth: &AuthRef, at: &str) -> Result<(), ConfigError> {
    match &auth.kind {
        AuthKind::None => Ok(()),
        AuthKind::SshKey => match auth.value {
            Some(_) => Ok(()),
            None => Err(ConfigError::MissingField {
                path: format!("{at}.auth.value"),
            }),
        },
        other => Err(ConfigError::UnsupportedAuth {
            kind: other.to_string(),
        }),
    }
}
