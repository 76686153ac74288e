//! Konnect REST client: `/v3` identity endpoints on the global host and
//! `/v2/control-planes` on regional hosts.

use serde::Serialize;
use serde_json::json;

use konnect_core::CancelToken;

use super::{segment, Endpoint, Page};
use crate::error::RemoteError;
use crate::konnect::{
    AssignedRole, ControlPlane, ControlPlanePort, ControlPlaneUpdate, InvitePort,
    NewControlPlane, RoleFilter, RolePort, Team, TeamMembershipPort, TeamPort, TeamSpec, User,
    UserPort,
};

const PAGE_SIZE: &str = "100";

/// Global-endpoint client; implements every organization-wide port.
#[derive(Clone)]
pub struct KonnectClient {
    endpoint: Endpoint,
}

impl KonnectClient {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl TeamPort for KonnectClient {
    fn list(&self, name: &str, cx: &CancelToken) -> Result<Vec<Team>, RemoteError> {
        let page: Page<Team> = self.endpoint.get(
            "list teams",
            "/v3/teams",
            &[("filter[name][eq]", name), ("page[size]", PAGE_SIZE)],
            cx,
        )?;
        // The filter is server-side; keep the exact-match contract regardless.
        Ok(page.data.into_iter().filter(|t| t.name == name).collect())
    }

    fn create(&self, spec: &TeamSpec, cx: &CancelToken) -> Result<String, RemoteError> {
        let team: Team = self
            .endpoint
            .send("create team", "POST", "/v3/teams", spec, cx)?;
        Ok(team.id)
    }

    fn update(&self, id: &str, spec: &TeamSpec, cx: &CancelToken) -> Result<(), RemoteError> {
        let path = format!("/v3/teams/{}", segment(id));
        self.endpoint
            .send_empty("update team", "PATCH", &path, spec, cx)
    }
}

impl TeamMembershipPort for KonnectClient {
    fn list_users(&self, team_id: &str, cx: &CancelToken) -> Result<Vec<User>, RemoteError> {
        let path = format!("/v3/teams/{}/users", segment(team_id));
        let page: Page<User> =
            self.endpoint
                .get("list team users", &path, &[("page[size]", PAGE_SIZE)], cx)?;
        Ok(page.data)
    }

    fn add_user(&self, team_id: &str, user_id: &str, cx: &CancelToken) -> Result<(), RemoteError> {
        let path = format!("/v3/teams/{}/users", segment(team_id));
        self.endpoint
            .send_empty("add team user", "POST", &path, &json!({ "id": user_id }), cx)
    }
}

impl UserPort for KonnectClient {
    fn list(&self, email: &str, cx: &CancelToken) -> Result<Vec<User>, RemoteError> {
        let page: Page<User> = self.endpoint.get(
            "list users",
            "/v3/users",
            &[("filter[email][eq]", email), ("page[size]", PAGE_SIZE)],
            cx,
        )?;
        Ok(page.data)
    }
}

impl InvitePort for KonnectClient {
    fn invite(&self, email: &str, cx: &CancelToken) -> Result<(), RemoteError> {
        self.endpoint
            .send_empty("invite user", "POST", "/v3/invites", &json!({ "email": email }), cx)
    }
}

impl RolePort for KonnectClient {
    fn list_team_roles(
        &self,
        team_id: &str,
        filter: &RoleFilter,
        cx: &CancelToken,
    ) -> Result<Vec<AssignedRole>, RemoteError> {
        let path = format!("/v3/teams/{}/assigned-roles", segment(team_id));
        let mut query = vec![("page[size]", PAGE_SIZE)];
        if let Some(role) = filter.role_name.as_deref() {
            query.push(("filter[role_name][eq]", role));
        }
        if let Some(entity_type) = filter.entity_type.as_deref() {
            query.push(("filter[entity_type_name][eq]", entity_type));
        }
        let page: Page<AssignedRole> =
            self.endpoint.get("list team roles", &path, &query, cx)?;
        Ok(page.data)
    }

    fn assign(
        &self,
        team_id: &str,
        role: &AssignedRole,
        cx: &CancelToken,
    ) -> Result<(), RemoteError> {
        let path = format!("/v3/teams/{}/assigned-roles", segment(team_id));
        self.endpoint
            .send_empty("assign team role", "POST", &path, role, cx)
    }
}

/// Regional-endpoint client for control planes.
#[derive(Clone)]
pub struct RegionalKonnectClient {
    endpoint: Endpoint,
}

impl RegionalKonnectClient {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[derive(Serialize)]
struct ControlPlanePatch<'a> {
    description: &'a str,
    labels: &'a std::collections::BTreeMap<String, String>,
}

impl ControlPlanePort for RegionalKonnectClient {
    fn list(&self, name: &str, cx: &CancelToken) -> Result<Vec<ControlPlane>, RemoteError> {
        let page: Page<ControlPlane> = self.endpoint.get(
            "list control planes",
            "/v2/control-planes",
            &[("filter[name][eq]", name), ("page[size]", PAGE_SIZE)],
            cx,
        )?;
        Ok(page.data.into_iter().filter(|cp| cp.name == name).collect())
    }

    fn create(&self, spec: &NewControlPlane, cx: &CancelToken) -> Result<String, RemoteError> {
        let cp: ControlPlane =
            self.endpoint
                .send("create control plane", "POST", "/v2/control-planes", spec, cx)?;
        Ok(cp.id)
    }

    fn update(
        &self,
        id: &str,
        update: &ControlPlaneUpdate,
        cx: &CancelToken,
    ) -> Result<(), RemoteError> {
        let path = format!("/v2/control-planes/{}", segment(id));
        let body = ControlPlanePatch {
            description: &update.description,
            labels: &update.labels,
        };
        self.endpoint
            .send_empty("update control plane", "PATCH", &path, &body, cx)
    }
}
