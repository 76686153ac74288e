//! The reconciliation walk.
//!
//! ```text
//! validate manifest                      (no remote or git access before this)
//! for org:   resolve token, global ports
//!   for env:   regional control-plane port
//!     for team:  clone platform, checkout {env}-konnect-orchestrator-apply,
//!                materialize services, commit + push + upsert PR if dirty,
//!                ensure team, control plane, role; close clone
//! ```
//!
//! Maps are `BTreeMap`s, so every level is visited in lexicographic order.
//! The first error ends the pass; nothing already written is rolled back.

use std::time::Instant;

use chrono::Utc;

use konnect_core::layout::{apply_branch, RepoSlug, PR_BASE_BRANCH};
use konnect_core::manifest;
use konnect_core::{
    CancelToken, ConfigError, EnvDef, EnvName, EnvTeamDef, GitAuthor, Manifest, OrgName,
    Secrets, TeamDef, TeamName,
};
use konnect_ports::{
    CloneOptions, Connector, ControlPlanePort, Credentials, Git, HostingPort, KonnectPorts,
    NewPullRequest, PullFilter, PullRequestUpdate, WorkingCopy,
};
use konnect_renderer::{ChangeContext, PullRequestText, Renderer};

use crate::apply::{ensure_control_plane, ensure_role, ensure_team};
use crate::error::{Scope, SyncError};
use crate::materialize::{credentials, materialize, ServiceTarget};
use crate::report::{PullOutcome, ReconcileReport, UnitReport};

/// Everything outside the process the reconciler talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub connector: &'a dyn Connector,
    pub git: &'a dyn Git,
    pub secrets: &'a dyn Secrets,
    pub renderer: &'a Renderer,
}

/// The platform repository and how to publish to it, resolved once per pass.
struct Platform {
    remote: String,
    slug: RepoSlug,
    author: GitAuthor,
    credentials: Credentials,
    hosting: Box<dyn HostingPort>,
}

impl Platform {
    fn prepare(manifest: &Manifest, collab: &Collaborators<'_>) -> Result<Self, SyncError> {
        let git = &manifest.platform.git;
        let author = git.author.clone().ok_or_else(|| ConfigError::MissingField {
            path: "platform.git.author".to_string(),
        })?;
        let hosting_ref = git.hosting.as_ref().ok_or_else(|| ConfigError::MissingField {
            path: "platform.git.hosting".to_string(),
        })?;
        let token = collab.secrets.resolve(&hosting_ref.token)?;
        let hosting = collab.connector.hosting(hosting_ref, &token)?;

        Ok(Self {
            remote: git.remote.clone(),
            slug: RepoSlug::parse(&git.remote)?,
            author,
            credentials: credentials(collab.secrets, &git.auth, "platform.git")?,
            hosting,
        })
    }
}

/// Run one reconciliation pass over `manifest`.
pub fn apply(
    manifest: &Manifest,
    collab: &Collaborators<'_>,
    cx: &CancelToken,
) -> Result<ReconcileReport, SyncError> {
    manifest::validate(manifest)?;

    let started_at = Utc::now();
    let clock = Instant::now();
    tracing::info!(
        "reconciliation pass started: {} organization(s)",
        manifest.organizations.len()
    );

    let platform = Platform::prepare(manifest, collab)?;
    let mut units = Vec::new();

    for (org, org_def) in &manifest.organizations {
        cx.check()?;
        let org_scope = Scope::org(org.as_str());
        let token = collab
            .secrets
            .resolve(&org_def.access_token)
            .map_err(|e| SyncError::from(e).in_scope(&org_scope))?;
        let api = collab
            .connector
            .global(&token)
            .map_err(|e| SyncError::from(e).in_scope(&org_scope))?;

        for (env, env_def) in &org_def.environments {
            cx.check()?;
            let env_scope = org_scope.clone().env(env.as_str());
            let regional = collab
                .connector
                .regional(&token, &env_def.region)
                .map_err(|e| SyncError::from(e).in_scope(&env_scope))?;

            for (team, env_team) in &env_def.teams {
                cx.check()?;
                let scope = env_scope.clone().team(team.as_str());
                tracing::info!("{scope}: reconciling");
                let unit = Unit {
                    manifest,
                    collab,
                    platform: &platform,
                    api: &api,
                    regional: regional.as_ref(),
                    org,
                    env,
                    env_def,
                    team,
                    env_team,
                    scope: &scope,
                };
                let report = unit.run(cx).map_err(|e| e.in_scope(&scope))?;
                units.push(report);
            }
        }
    }

    let report = ReconcileReport {
        started_at,
        finished_at: Utc::now(),
        units,
    };
    tracing::info!(
        "reconciliation pass finished in {:.2?}: {} unit(s), {} file(s) written",
        clock.elapsed(),
        report.units.len(),
        report.files_written()
    );
    Ok(report)
}

/// One `(org, env, team)`.
struct Unit<'a> {
    manifest: &'a Manifest,
    collab: &'a Collaborators<'a>,
    platform: &'a Platform,
    api: &'a KonnectPorts,
    regional: &'a dyn ControlPlanePort,
    org: &'a OrgName,
    env: &'a EnvName,
    env_def: &'a EnvDef,
    team: &'a TeamName,
    env_team: &'a EnvTeamDef,
    scope: &'a Scope,
}

/// Git half of a unit.
struct Published {
    branch: String,
    written: usize,
    unchanged: usize,
    pushed: bool,
    pull_request: PullOutcome,
}

impl Unit<'_> {
    fn run(&self, cx: &CancelToken) -> Result<UnitReport, SyncError> {
        let team_def = manifest::team(
            self.manifest,
            self.org.as_str(),
            self.env.as_str(),
            self.team,
        )?;

        let mut wc = self.collab.git.clone_repo(
            &self.platform.remote,
            &self.platform.credentials,
            &CloneOptions::default(),
            cx,
        )?;
        let result = self
            .publish(wc.as_mut(), team_def, cx)
            .and_then(|published| self.ensure_remote(team_def, published, cx));
        let closed = wc.close();
        let report = result?;
        closed?;
        Ok(report)
    }

    /// Materialize every active service onto the env branch and publish it.
    fn publish(
        &self,
        wc: &mut dyn WorkingCopy,
        team_def: &TeamDef,
        cx: &CancelToken,
    ) -> Result<Published, SyncError> {
        let branch = apply_branch(self.env);
        wc.checkout(&branch, cx)?;

        let mut written = 0;
        let mut unchanged = 0;
        for (service, env_service) in &self.env_team.services {
            let def = manifest::service(
                team_def,
                self.org.as_str(),
                self.env.as_str(),
                self.team.as_str(),
                service.as_str(),
            )?;
            let target = ServiceTarget {
                org: self.org,
                env: self.env,
                team: self.team,
                service,
            };
            let write = materialize(
                self.collab.git,
                self.collab.secrets,
                wc.root(),
                target,
                def,
                env_service,
                cx,
            )
            .map_err(|e| e.in_scope(&self.scope.clone().service(service.as_str())))?;
            if write.is_written() {
                written += 1;
            } else {
                unchanged += 1;
            }
        }

        if wc.is_clean(cx)? {
            tracing::info!("{}: {branch} is up to date", self.scope);
            return Ok(Published {
                branch,
                written,
                unchanged,
                pushed: false,
                pull_request: PullOutcome::None,
            });
        }

        let services = self
            .env_team
            .services
            .keys()
            .map(|s| s.to_string())
            .collect();
        let change = ChangeContext::new(
            self.org.as_str(),
            self.env.as_str(),
            self.team.as_str(),
            services,
        );
        let message = self.collab.renderer.commit_message(&change)?;
        wc.add(".", cx)?;
        wc.commit(&message, &self.platform.author, cx)?;
        wc.push(cx)?;
        tracing::info!("{}: pushed {branch}", self.scope);

        let text = self.collab.renderer.pull_request(&change)?;
        let pull_request = upsert_pull(self.platform, &branch, &text, cx)?;
        Ok(Published {
            branch,
            written,
            unchanged,
            pushed: true,
            pull_request,
        })
    }

    /// Team, control plane and role, after the git side is published.
    fn ensure_remote(
        &self,
        team_def: &TeamDef,
        published: Published,
        cx: &CancelToken,
    ) -> Result<UnitReport, SyncError> {
        let team = ensure_team(self.api, self.team, team_def, cx)?;
        let (cp_id, control_plane) =
            ensure_control_plane(self.regional, self.env, self.env_def, self.team, cx)?;
        let role = ensure_role(self.api.roles.as_ref(), &team.id, &cp_id, self.env_def, cx)?;

        Ok(UnitReport {
            org: self.org.to_string(),
            env: self.env.to_string(),
            team: self.team.to_string(),
            branch: published.branch,
            files_written: published.written,
            files_unchanged: published.unchanged,
            pushed: published.pushed,
            pull_request: published.pull_request,
            team_id: team.id,
            team_change: team.change,
            invited: team.invited,
            members_added: team.added,
            control_plane_id: cp_id,
            control_plane,
            role,
        })
    }
}

/// Open the env's pull request, or refresh the open one when its text drifted.
fn upsert_pull(
    platform: &Platform,
    branch: &str,
    text: &PullRequestText,
    cx: &CancelToken,
) -> Result<PullOutcome, SyncError> {
    let RepoSlug { owner, repo } = &platform.slug;
    let filter = PullFilter {
        head: format!("{owner}:{branch}"),
        base: PR_BASE_BRANCH.to_string(),
        state: "open".to_string(),
    };
    let open = platform
        .hosting
        .list_pulls(owner, repo, &filter, cx)
        .map_err(SyncError::pull_request)?;

    match open.into_iter().next() {
        Some(pr) if pr.title == text.title && pr.body == text.body => {
            tracing::info!("pull request #{} for {branch} is up to date", pr.number);
            Ok(PullOutcome::Unchanged(pr.number))
        }
        Some(pr) => {
            let update = PullRequestUpdate {
                title: text.title.clone(),
                body: text.body.clone(),
            };
            let updated = platform
                .hosting
                .update_pull(owner, repo, pr.number, &update, cx)
                .map_err(SyncError::pull_request)?;
            tracing::info!("pull request #{} for {branch} updated", updated.number);
            Ok(PullOutcome::Updated(updated.number))
        }
        None => {
            let new = NewPullRequest {
                title: text.title.clone(),
                head: branch.to_string(),
                base: PR_BASE_BRANCH.to_string(),
                body: text.body.clone(),
            };
            let created = platform
                .hosting
                .create_pull(owner, repo, &new, cx)
                .map_err(SyncError::pull_request)?;
            tracing::info!("pull request #{} for {branch} opened: {}", created.number, created.url);
            Ok(PullOutcome::Created(created.number))
        }
    }
}
