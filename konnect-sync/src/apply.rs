//! Idempotent apply primitives.
//!
//! Each `ensure_*` function reads the remote state first and only writes when
//! it differs from the desired shape, so a converged tenant sees no writes.
//! Nothing is ever deleted.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use konnect_core::layout::{
    control_plane_description, control_plane_name, CONTROL_PLANE_CLUSTER_TYPE,
    CONTROL_PLANE_ENTITY_TYPE,
};
use konnect_core::{CancelToken, EnvDef, EnvName, TeamDef, TeamName};
use konnect_ports::{
    AssignedRole, ControlPlanePort, ControlPlaneUpdate, KonnectPorts, NewControlPlane,
    RemoteError, RoleFilter, RolePort, TeamSpec,
};

/// What an `ensure_*` call did to the remote entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Created,
    Updated,
    Unchanged,
    /// Nothing is desired (e.g. no role for this environment type).
    Skipped,
}

impl Change {
    pub fn is_write(self) -> bool {
        matches!(self, Change::Created | Change::Updated)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Change::Created => "created",
            Change::Updated => "updated",
            Change::Unchanged => "unchanged",
            Change::Skipped => "skipped",
        })
    }
}

/// Result of [`ensure_team`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamOutcome {
    pub id: String,
    pub change: Change,
    /// Emails that had to be invited.
    pub invited: Vec<String>,
    /// Emails added to the team.
    pub added: Vec<String>,
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// Ensure team `name` exists with `def.description` and has every `def.users`
/// member. Unknown users are invited first.
pub fn ensure_team(
    ports: &KonnectPorts,
    name: &TeamName,
    def: &TeamDef,
    cx: &CancelToken,
) -> Result<TeamOutcome, RemoteError> {
    let spec = TeamSpec {
        name: name.to_string(),
        description: def.description.clone(),
    };

    let existing = ports
        .teams
        .list(name.as_str(), cx)?
        .into_iter()
        .find(|t| t.name == name.as_str());

    let (id, change) = match existing {
        Some(team) if team.description == spec.description => (team.id, Change::Unchanged),
        Some(team) => {
            ports.teams.update(&team.id, &spec, cx)?;
            tracing::info!("team '{name}' updated ({})", team.id);
            (team.id, Change::Updated)
        }
        None => {
            let id = ports.teams.create(&spec, cx)?;
            tracing::info!("team '{name}' created ({id})");
            (id, Change::Created)
        }
    };

    let mut outcome = TeamOutcome {
        id,
        change,
        invited: Vec::new(),
        added: Vec::new(),
    };
    if def.users.is_empty() {
        return Ok(outcome);
    }

    let mut member_ids: BTreeSet<String> = ports
        .memberships
        .list_users(&outcome.id, cx)?
        .into_iter()
        .map(|m| m.id)
        .collect();
    let mut seen = BTreeSet::new();
    for email in &def.users {
        if !seen.insert(email.to_ascii_lowercase()) {
            continue;
        }
        let user_id = match find_user(ports, email, cx)? {
            Some(id) => id,
            None => {
                ports.invites.invite(email, cx)?;
                tracing::info!("invited {email}");
                outcome.invited.push(email.clone());
                find_user(ports, email, cx)?.ok_or_else(|| RemoteError::Rejected {
                    op: "users.list".to_string(),
                    detail: format!("user {email} not found after invite"),
                })?
            }
        };

        if member_ids.contains(&user_id) {
            continue;
        }
        ports.memberships.add_user(&outcome.id, &user_id, cx)?;
        tracing::info!("added {email} to team '{name}'");
        outcome.added.push(email.clone());
        member_ids.insert(user_id);
    }
    Ok(outcome)
}

fn find_user(
    ports: &KonnectPorts,
    email: &str,
    cx: &CancelToken,
) -> Result<Option<String>, RemoteError> {
    Ok(ports
        .users
        .list(email, cx)?
        .into_iter()
        .find(|u| u.email.eq_ignore_ascii_case(email))
        .map(|u| u.id))
}

// ---------------------------------------------------------------------------
// Control plane
// ---------------------------------------------------------------------------

/// The two labels the engine owns on every control plane.
pub fn owned_labels(env_def: &EnvDef, team: &TeamName) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("env".to_string(), env_def.env_type.to_string()),
        ("team".to_string(), team.to_string()),
    ])
}

/// Ensure control plane `{team}-{env}` exists in the port's region with the
/// engine-owned description and labels. Returns its id.
pub fn ensure_control_plane(
    port: &dyn ControlPlanePort,
    env: &EnvName,
    env_def: &EnvDef,
    team: &TeamName,
    cx: &CancelToken,
) -> Result<(String, Change), RemoteError> {
    let name = control_plane_name(team, env);
    let description = control_plane_description(team, env);
    let owned = owned_labels(env_def, team);

    let existing = port
        .list(&name, cx)?
        .into_iter()
        .find(|cp| cp.name == name);

    match existing {
        Some(cp) => {
            let mut labels = cp.labels.clone();
            labels.extend(owned);
            if cp.description == description && labels == cp.labels {
                return Ok((cp.id, Change::Unchanged));
            }
            port.update(&cp.id, &ControlPlaneUpdate { description, labels }, cx)?;
            tracing::info!("control plane '{name}' updated ({})", cp.id);
            Ok((cp.id, Change::Updated))
        }
        None => {
            let id = port.create(
                &NewControlPlane {
                    name: name.clone(),
                    description,
                    cluster_type: CONTROL_PLANE_CLUSTER_TYPE.to_string(),
                    labels: owned,
                },
                cx,
            )?;
            tracing::info!("control plane '{name}' created ({id}) in {}", env_def.region);
            Ok((id, Change::Created))
        }
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Grant the team the role its environment type calls for on `cp_id`.
///
/// `DEV` gets `Viewer`, `PROD` gets `Admin`, anything else is skipped.
/// Existing assignments are never removed.
pub fn ensure_role(
    roles: &dyn RolePort,
    team_id: &str,
    cp_id: &str,
    env_def: &EnvDef,
    cx: &CancelToken,
) -> Result<Change, RemoteError> {
    let Some(role_name) = env_def.env_type.role_name() else {
        tracing::debug!("no role for environment type {}", env_def.env_type);
        return Ok(Change::Skipped);
    };

    let filter = RoleFilter {
        role_name: Some(role_name.to_string()),
        entity_type: Some(CONTROL_PLANE_ENTITY_TYPE.to_string()),
    };
    let present = roles.list_team_roles(team_id, &filter, cx)?.iter().any(|r| {
        r.role_name == role_name
            && r.entity_type == CONTROL_PLANE_ENTITY_TYPE
            && r.entity_id == cp_id
    });
    if present {
        return Ok(Change::Unchanged);
    }

    roles.assign(
        team_id,
        &AssignedRole {
            role_name: role_name.to_string(),
            entity_id: cp_id.to_string(),
            entity_region: env_def.region.clone(),
            entity_type: CONTROL_PLANE_ENTITY_TYPE.to_string(),
        },
        cx,
    )?;
    tracing::info!("role {role_name} on {cp_id} assigned to team {team_id}");
    Ok(Change::Created)
}
