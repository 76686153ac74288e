//! Konnect service ports.
//!
//! Each trait is the smallest capability set the reconciler needs. Listings
//! return the first page only; callers must not assume more.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use konnect_core::{CancelToken, HostingRef};

use crate::error::RemoteError;
use crate::hosting::HostingPort;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Body of team create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSpec {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPlane {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewControlPlane {
    pub name: String,
    pub description: String,
    pub cluster_type: String,
    pub labels: BTreeMap<String, String>,
}

/// Body of a control-plane update. `labels` is the complete label set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPlaneUpdate {
    pub description: String,
    pub labels: BTreeMap<String, String>,
}

/// A role bound to a team on one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedRole {
    pub role_name: String,
    pub entity_id: String,
    pub entity_region: String,
    #[serde(rename = "entity_type_name")]
    pub entity_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleFilter {
    pub role_name: Option<String>,
    pub entity_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

pub trait TeamPort: Send + Sync {
    /// Teams whose name equals `name` exactly.
    fn list(&self, name: &str, cx: &CancelToken) -> Result<Vec<Team>, RemoteError>;
    /// Returns the new team's id.
    fn create(&self, spec: &TeamSpec, cx: &CancelToken) -> Result<String, RemoteError>;
    fn update(&self, id: &str, spec: &TeamSpec, cx: &CancelToken) -> Result<(), RemoteError>;
}

pub trait TeamMembershipPort: Send + Sync {
    fn list_users(&self, team_id: &str, cx: &CancelToken) -> Result<Vec<User>, RemoteError>;
    fn add_user(&self, team_id: &str, user_id: &str, cx: &CancelToken) -> Result<(), RemoteError>;
}

pub trait UserPort: Send + Sync {
    /// Users whose email equals `email`.
    fn list(&self, email: &str, cx: &CancelToken) -> Result<Vec<User>, RemoteError>;
}

pub trait InvitePort: Send + Sync {
    fn invite(&self, email: &str, cx: &CancelToken) -> Result<(), RemoteError>;
}

/// Scoped to one region.
pub trait ControlPlanePort: Send + Sync {
    fn list(&self, name: &str, cx: &CancelToken) -> Result<Vec<ControlPlane>, RemoteError>;
    /// Returns the new control plane's id.
    fn create(&self, spec: &NewControlPlane, cx: &CancelToken) -> Result<String, RemoteError>;
    fn update(
        &self,
        id: &str,
        update: &ControlPlaneUpdate,
        cx: &CancelToken,
    ) -> Result<(), RemoteError>;
}

pub trait RolePort: Send + Sync {
    fn list_team_roles(
        &self,
        team_id: &str,
        filter: &RoleFilter,
        cx: &CancelToken,
    ) -> Result<Vec<AssignedRole>, RemoteError>;
    fn assign(&self, team_id: &str, role: &AssignedRole, cx: &CancelToken)
        -> Result<(), RemoteError>;
}

/// The organization-wide (global endpoint) ports of one access token.
pub struct KonnectPorts {
    pub teams: Box<dyn TeamPort>,
    pub memberships: Box<dyn TeamMembershipPort>,
    pub users: Box<dyn UserPort>,
    pub invites: Box<dyn InvitePort>,
    pub roles: Box<dyn RolePort>,
}

/// Builds port instances. The reconciler asks for fresh ones per organization
/// (and per region for control planes); nothing is shared across organizations.
pub trait Connector: Send + Sync {
    fn global(&self, token: &str) -> Result<KonnectPorts, RemoteError>;
    fn regional(&self, token: &str, region: &str)
        -> Result<Box<dyn ControlPlanePort>, RemoteError>;
    fn hosting(&self, hosting: &HostingRef, token: &str)
        -> Result<Box<dyn HostingPort>, RemoteError>;
}
