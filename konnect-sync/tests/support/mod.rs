//! In-memory fakes of every port the reconciler drives.
//!
//! Konnect, hosting and git fakes share one [`Journal`]: an ordered log of
//! every call plus hooks that cancel the token or fail on a named operation.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tempfile::TempDir;

use konnect_core::{CancelToken, GitAuthor, HostingRef, Manifest, ProcessSecrets};
use konnect_ports::{
    AssignedRole, CloneOptions, Connector, ControlPlane, ControlPlanePort, ControlPlaneUpdate,
    Credentials, Git, GitError, HostingPort, InvitePort, KonnectPorts, NewControlPlane,
    NewPullRequest, PullFilter, PullRequest, PullRequestUpdate, RemoteError, RoleFilter, RolePort,
    Team, TeamMembershipPort, TeamPort, TeamSpec, User, UserPort, WorkingCopy,
};
use konnect_renderer::Renderer;
use konnect_sync::reconcile::{self, Collaborators};
use konnect_sync::{ReconcileReport, SyncError};

pub const PLATFORM_REMOTE: &str = "git@github.com:acme/platform.git";
pub const CHECKOUT_REMOTE: &str = "git@example:checkout";
pub const SPEC: &[u8] = b"openapi: 3.0.0";
pub const SPEC_FILE: &str = "konnect/acme/envs/dev/teams/payments/services/checkout/openapi.yaml";

/// Scenario manifest: one org, one DEV env in `us`, team `payments` with one
/// user and one service.
pub const SCENARIO: &str = r#"
platform:
  git:
    remote: git@github.com:acme/platform.git
    author: { name: Konnect Orchestrator, email: ko@acme.io }
    hosting: { type: github, token: { type: literal, value: ghp_test } }
teams:
  payments:
    description: Payments team
    users: [a@x.io]
    services:
      checkout:
        name: checkout
        git: { remote: "git@example:checkout" }
        spec-path: openapi.yaml
organizations:
  acme:
    access-token: { type: literal, value: kpat_acme }
    environments:
      dev:
        type: DEV
        region: us
        teams:
          payments:
            services:
              checkout: { branch: main }
"#;

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn manifest(yaml: &str) -> Manifest {
    serde_yaml::from_str(yaml).expect("manifest parses")
}

pub fn scenario() -> Manifest {
    manifest(SCENARIO)
}

/// Operations that change remote or git state.
pub const WRITE_OPS: &[&str] = &[
    "teams.create",
    "teams.update",
    "memberships.add_user",
    "invites.invite",
    "control_planes.create",
    "control_planes.update",
    "roles.assign",
    "pulls.create",
    "pulls.update",
    "git.commit",
    "git.push",
];

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Journal {
    pub calls: Vec<String>,
    /// Cancel the caller's token when this operation is entered.
    pub cancel_on: Option<String>,
    /// Fail this operation with HTTP 500 (or a git command error).
    pub fail_on: Option<String>,
}

pub type SharedJournal = Arc<Mutex<Journal>>;

enum Entry {
    Proceed,
    Fail,
}

fn enter(journal: &SharedJournal, op: &str, cx: &CancelToken) -> Result<Entry, konnect_core::Cancelled> {
    let mut j = journal.lock().unwrap();
    j.calls.push(op.to_string());
    if j.cancel_on.as_deref() == Some(op) {
        cx.cancel();
    }
    cx.check()?;
    if j.fail_on.as_deref() == Some(op) {
        return Ok(Entry::Fail);
    }
    Ok(Entry::Proceed)
}

fn remote_call(journal: &SharedJournal, op: &str, cx: &CancelToken) -> Result<(), RemoteError> {
    match enter(journal, op, cx)? {
        Entry::Proceed => Ok(()),
        Entry::Fail => Err(RemoteError::Status {
            op: op.to_string(),
            status: 500,
            body: "injected failure".to_string(),
        }),
    }
}

fn git_call(journal: &SharedJournal, op: &str, cx: &CancelToken) -> Result<(), GitError> {
    match enter(journal, op, cx)? {
        Entry::Proceed => Ok(()),
        Entry::Fail => Err(GitError::Command {
            args: op.to_string(),
            status: "exit status: 128".to_string(),
            stderr: "injected failure".to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Konnect + hosting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FakePull {
    pub owner: String,
    pub repo: String,
    pub head: String,
    pub base: String,
    pub pr: PullRequest,
}

#[derive(Debug)]
pub struct KonnectState {
    pub teams: Vec<Team>,
    /// Users known to the tenant.
    pub users: Vec<User>,
    /// team id -> member user ids
    pub members: BTreeMap<String, Vec<String>>,
    /// (region, control plane)
    pub control_planes: Vec<(String, ControlPlane)>,
    /// team id -> roles
    pub roles: BTreeMap<String, Vec<AssignedRole>>,
    pub pulls: Vec<FakePull>,
    /// Access tokens the connector was asked for, in order.
    pub tokens: Vec<String>,
    pub hosting_tokens: Vec<String>,
    /// An invite registers the user immediately.
    pub invite_registers_user: bool,
    next_id: u64,
}

impl Default for KonnectState {
    fn default() -> Self {
        Self {
            teams: Vec::new(),
            users: Vec::new(),
            members: BTreeMap::new(),
            control_planes: Vec::new(),
            roles: BTreeMap::new(),
            pulls: Vec::new(),
            tokens: Vec::new(),
            hosting_tokens: Vec::new(),
            invite_registers_user: true,
            next_id: 0,
        }
    }
}

impl KonnectState {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name == name)
    }

    pub fn control_plane(&self, name: &str) -> Option<&(String, ControlPlane)> {
        self.control_planes.iter().find(|(_, cp)| cp.name == name)
    }

    pub fn roles_of(&self, team: &str) -> Vec<AssignedRole> {
        self.team(team)
            .and_then(|t| self.roles.get(&t.id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn member_emails(&self, team: &str) -> Vec<String> {
        let Some(ids) = self.team(team).and_then(|t| self.members.get(&t.id)) else {
            return Vec::new();
        };
        self.users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(|u| u.email.clone())
            .collect()
    }

    pub fn seed_team(&mut self, name: &str, description: &str) -> String {
        let id = self.id("team");
        self.teams.push(Team {
            id: id.clone(),
            name: name.to_string(),
            description: description.to_string(),
        });
        id
    }

    pub fn seed_user(&mut self, email: &str) -> String {
        let id = self.id("user");
        self.users.push(User {
            id: id.clone(),
            email: email.to_string(),
        });
        id
    }

    pub fn seed_control_plane(
        &mut self,
        region: &str,
        name: &str,
        description: &str,
        labels: &[(&str, &str)],
    ) -> String {
        let id = self.id("cp");
        self.control_planes.push((
            region.to_string(),
            ControlPlane {
                id: id.clone(),
                name: name.to_string(),
                description: description.to_string(),
                labels: labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        ));
        id
    }

    pub fn seed_pull(&mut self, owner: &str, repo: &str, branch: &str, title: &str, body: &str) -> u64 {
        let number = self.pulls.len() as u64 + 1;
        self.pulls.push(FakePull {
            owner: owner.to_string(),
            repo: repo.to_string(),
            head: format!("{owner}:{branch}"),
            base: "main".to_string(),
            pr: PullRequest {
                number,
                title: title.to_string(),
                body: body.to_string(),
                state: "open".to_string(),
                url: format!("https://github.com/{owner}/{repo}/pull/{number}"),
            },
        });
        number
    }
}

#[derive(Clone)]
pub struct FakeKonnect {
    pub state: Arc<Mutex<KonnectState>>,
    journal: SharedJournal,
}

impl FakeKonnect {
    pub fn new(journal: SharedJournal) -> Self {
        Self {
            state: Arc::default(),
            journal,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, KonnectState> {
        self.state.lock().unwrap()
    }

    fn call(&self, op: &str, cx: &CancelToken) -> Result<MutexGuard<'_, KonnectState>, RemoteError> {
        remote_call(&self.journal, op, cx)?;
        Ok(self.state())
    }
}

struct Teams(FakeKonnect);
struct Memberships(FakeKonnect);
struct Users(FakeKonnect);
struct Invites(FakeKonnect);
struct Roles(FakeKonnect);
struct ControlPlanes(FakeKonnect, String);
struct Hosting(FakeKonnect);

impl TeamPort for Teams {
    fn list(&self, name: &str, cx: &CancelToken) -> Result<Vec<Team>, RemoteError> {
        let s = self.0.call("teams.list", cx)?;
        Ok(s.teams.iter().filter(|t| t.name == name).cloned().collect())
    }

    fn create(&self, spec: &TeamSpec, cx: &CancelToken) -> Result<String, RemoteError> {
        let mut s = self.0.call("teams.create", cx)?;
        Ok(s.seed_team(&spec.name, &spec.description))
    }

    fn update(&self, id: &str, spec: &TeamSpec, cx: &CancelToken) -> Result<(), RemoteError> {
        let mut s = self.0.call("teams.update", cx)?;
        let team = s.teams.iter_mut().find(|t| t.id == id).ok_or_else(|| not_found("teams.update", id))?;
        team.name = spec.name.clone();
        team.description = spec.description.clone();
        Ok(())
    }
}

impl TeamMembershipPort for Memberships {
    fn list_users(&self, team_id: &str, cx: &CancelToken) -> Result<Vec<User>, RemoteError> {
        let s = self.0.call("memberships.list_users", cx)?;
        let ids = s.members.get(team_id).cloned().unwrap_or_default();
        Ok(s.users.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    fn add_user(&self, team_id: &str, user_id: &str, cx: &CancelToken) -> Result<(), RemoteError> {
        let mut s = self.0.call("memberships.add_user", cx)?;
        s.members
            .entry(team_id.to_string())
            .or_default()
            .push(user_id.to_string());
        Ok(())
    }
}

impl UserPort for Users {
    fn list(&self, email: &str, cx: &CancelToken) -> Result<Vec<User>, RemoteError> {
        let s = self.0.call("users.list", cx)?;
        Ok(s.users.iter().filter(|u| u.email == email).cloned().collect())
    }
}

impl InvitePort for Invites {
    fn invite(&self, email: &str, cx: &CancelToken) -> Result<(), RemoteError> {
        let mut s = self.0.call("invites.invite", cx)?;
        if s.invite_registers_user {
            s.seed_user(email);
        }
        Ok(())
    }
}

impl RolePort for Roles {
    fn list_team_roles(
        &self,
        team_id: &str,
        filter: &RoleFilter,
        cx: &CancelToken,
    ) -> Result<Vec<AssignedRole>, RemoteError> {
        let s = self.0.call("roles.list", cx)?;
        Ok(s.roles
            .get(team_id)
            .map(|roles| {
                roles
                    .iter()
                    .filter(|r| filter.role_name.as_deref().map_or(true, |n| r.role_name == n))
                    .filter(|r| filter.entity_type.as_deref().map_or(true, |t| r.entity_type == t))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn assign(&self, team_id: &str, role: &AssignedRole, cx: &CancelToken) -> Result<(), RemoteError> {
        let mut s = self.0.call("roles.assign", cx)?;
        s.roles.entry(team_id.to_string()).or_default().push(role.clone());
        Ok(())
    }
}

impl ControlPlanePort for ControlPlanes {
    fn list(&self, name: &str, cx: &CancelToken) -> Result<Vec<ControlPlane>, RemoteError> {
        let s = self.0.call("control_planes.list", cx)?;
        Ok(s.control_planes
            .iter()
            .filter(|(region, cp)| *region == self.1 && cp.name == name)
            .map(|(_, cp)| cp.clone())
            .collect())
    }

    fn create(&self, spec: &NewControlPlane, cx: &CancelToken) -> Result<String, RemoteError> {
        let mut s = self.0.call("control_planes.create", cx)?;
        let labels: Vec<(String, String)> = spec.labels.clone().into_iter().collect();
        let refs: Vec<(&str, &str)> = labels.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        Ok(s.seed_control_plane(&self.1, &spec.name, &spec.description, &refs))
    }

    fn update(&self, id: &str, update: &ControlPlaneUpdate, cx: &CancelToken) -> Result<(), RemoteError> {
        let mut s = self.0.call("control_planes.update", cx)?;
        let (_, cp) = s
            .control_planes
            .iter_mut()
            .find(|(region, cp)| *region == self.1 && cp.id == id)
            .ok_or_else(|| not_found("control_planes.update", id))?;
        cp.description = update.description.clone();
        cp.labels = update.labels.clone();
        Ok(())
    }
}

impl HostingPort for Hosting {
    fn list_pulls(
        &self,
        owner: &str,
        repo: &str,
        filter: &PullFilter,
        cx: &CancelToken,
    ) -> Result<Vec<PullRequest>, RemoteError> {
        let s = self.0.call("pulls.list", cx)?;
        Ok(s.pulls
            .iter()
            .filter(|p| p.owner == owner && p.repo == repo)
            .filter(|p| p.head == filter.head && p.base == filter.base && p.pr.state == filter.state)
            .map(|p| p.pr.clone())
            .collect())
    }

    fn create_pull(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest,
        cx: &CancelToken,
    ) -> Result<PullRequest, RemoteError> {
        let mut s = self.0.call("pulls.create", cx)?;
        let number = s.seed_pull(owner, repo, &pull.head, &pull.title, &pull.body);
        s.pulls.last_mut().expect("just pushed").base = pull.base.clone();
        Ok(s.pulls[number as usize - 1].pr.clone())
    }

    fn update_pull(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        update: &PullRequestUpdate,
        cx: &CancelToken,
    ) -> Result<PullRequest, RemoteError> {
        let mut s = self.0.call("pulls.update", cx)?;
        let pull = s
            .pulls
            .iter_mut()
            .find(|p| p.owner == owner && p.repo == repo && p.pr.number == number)
            .ok_or_else(|| not_found("pulls.update", &number.to_string()))?;
        pull.pr.title = update.title.clone();
        pull.pr.body = update.body.clone();
        Ok(pull.pr.clone())
    }
}

fn not_found(op: &str, id: &str) -> RemoteError {
    RemoteError::Status {
        op: op.to_string(),
        status: 404,
        body: format!("{id} not found"),
    }
}

impl Connector for FakeKonnect {
    fn global(&self, token: &str) -> Result<KonnectPorts, RemoteError> {
        self.state().tokens.push(token.to_string());
        Ok(KonnectPorts {
            teams: Box::new(Teams(self.clone())),
            memberships: Box::new(Memberships(self.clone())),
            users: Box::new(Users(self.clone())),
            invites: Box::new(Invites(self.clone())),
            roles: Box::new(Roles(self.clone())),
        })
    }

    fn regional(&self, token: &str, region: &str) -> Result<Box<dyn ControlPlanePort>, RemoteError> {
        self.state().tokens.push(format!("{token}@{region}"));
        Ok(Box::new(ControlPlanes(self.clone(), region.to_string())))
    }

    fn hosting(&self, _hosting: &HostingRef, token: &str) -> Result<Box<dyn HostingPort>, RemoteError> {
        self.state().hosting_tokens.push(token.to_string());
        Ok(Box::new(Hosting(self.clone())))
    }
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

/// Relative path -> bytes.
pub type Tree = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Default)]
pub struct GitState {
    /// remote -> branch -> tree; `main` is every remote's default branch.
    pub remotes: BTreeMap<String, BTreeMap<String, Tree>>,
    /// (remote, requested branch, credentials)
    pub clones: Vec<(String, Option<String>, Credentials)>,
    pub closed: usize,
    pub dropped: usize,
    /// (remote, branch, message, author email)
    pub commits: Vec<(String, String, String, String)>,
}

impl GitState {
    pub fn seed(&mut self, remote: &str, branch: &str, files: &[(&str, &[u8])]) {
        let tree = files
            .iter()
            .map(|(path, bytes)| (path.to_string(), bytes.to_vec()))
            .collect();
        self.remotes
            .entry(remote.to_string())
            .or_default()
            .insert(branch.to_string(), tree);
    }

    pub fn branch(&self, remote: &str, branch: &str) -> Option<&Tree> {
        self.remotes.get(remote).and_then(|b| b.get(branch))
    }
}

#[derive(Clone)]
pub struct FakeGit {
    pub state: Arc<Mutex<GitState>>,
    journal: SharedJournal,
}

impl FakeGit {
    pub fn new(journal: SharedJournal) -> Self {
        Self {
            state: Arc::default(),
            journal,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, GitState> {
        self.state.lock().unwrap()
    }
}

impl Git for FakeGit {
    fn clone_repo(
        &self,
        remote: &str,
        credentials: &Credentials,
        options: &CloneOptions,
        cx: &CancelToken,
    ) -> Result<Box<dyn WorkingCopy>, GitError> {
        git_call(&self.journal, "git.clone", cx)?;
        let mut s = self.state();
        s.clones
            .push((remote.to_string(), options.branch.clone(), credentials.clone()));
        let branch = options.branch.clone().unwrap_or_else(|| "main".to_string());
        let tree = s.branch(remote, &branch).cloned().ok_or_else(|| GitError::Command {
            args: format!("clone {remote}"),
            status: "exit status: 128".to_string(),
            stderr: format!("Remote branch {branch} not found"),
        })?;
        drop(s);

        let dir = TempDir::new().map_err(|source| GitError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
        write_tree(dir.path(), &tree);
        let root = dir.path().to_path_buf();
        Ok(Box::new(FakeWorkingCopy {
            git: self.clone(),
            dir: Some(dir),
            root,
            remote: remote.to_string(),
            branch,
            baseline: tree,
        }))
    }
}

pub struct FakeWorkingCopy {
    git: FakeGit,
    dir: Option<TempDir>,
    root: PathBuf,
    remote: String,
    branch: String,
    /// Tree of the last commit.
    baseline: Tree,
}

impl WorkingCopy for FakeWorkingCopy {
    fn root(&self) -> &Path {
        &self.root
    }

    fn remote(&self) -> &str {
        &self.remote
    }

    fn branch(&self) -> &str {
        &self.branch
    }

    fn checkout(&mut self, branch: &str, cx: &CancelToken) -> Result<(), GitError> {
        git_call(&self.git.journal, "git.checkout", cx)?;
        let existing = self.git.state().branch(&self.remote, branch).cloned();
        if let Some(tree) = existing {
            assert_eq!(
                snapshot(&self.root),
                self.baseline,
                "fake checkout of an existing branch needs a clean tree"
            );
            clear_dir(&self.root);
            write_tree(&self.root, &tree);
            self.baseline = tree;
        }
        self.branch = branch.to_string();
        Ok(())
    }

    fn is_clean(&self, cx: &CancelToken) -> Result<bool, GitError> {
        git_call(&self.git.journal, "git.is_clean", cx)?;
        Ok(snapshot(&self.root) == self.baseline)
    }

    fn add(&mut self, _pathspec: &str, cx: &CancelToken) -> Result<(), GitError> {
        git_call(&self.git.journal, "git.add", cx)
    }

    fn commit(&mut self, message: &str, author: &GitAuthor, cx: &CancelToken) -> Result<(), GitError> {
        git_call(&self.git.journal, "git.commit", cx)?;
        self.baseline = snapshot(&self.root);
        self.git.state().commits.push((
            self.remote.clone(),
            self.branch.clone(),
            message.to_string(),
            author.email.clone(),
        ));
        Ok(())
    }

    fn push(&mut self, cx: &CancelToken) -> Result<(), GitError> {
        git_call(&self.git.journal, "git.push", cx)?;
        self.git
            .state()
            .remotes
            .entry(self.remote.clone())
            .or_default()
            .insert(self.branch.clone(), self.baseline.clone());
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<(), GitError> {
        self.git.journal.lock().unwrap().calls.push("git.close".to_string());
        self.git.state().closed += 1;
        if let Some(dir) = self.dir.take() {
            dir.close().map_err(|source| GitError::Io {
                path: self.root.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

impl Drop for FakeWorkingCopy {
    fn drop(&mut self) {
        if let Ok(mut s) = self.git.state.lock() {
            s.dropped += 1;
        }
    }
}

fn write_tree(root: &Path, tree: &Tree) {
    for (path, bytes) in tree {
        let full = root.join(path);
        fs::create_dir_all(full.parent().expect("parent")).expect("mkdir");
        fs::write(full, bytes).expect("write");
    }
}

fn clear_dir(root: &Path) {
    for entry in fs::read_dir(root).expect("read_dir") {
        let path = entry.expect("entry").path();
        if path.is_dir() {
            fs::remove_dir_all(&path).expect("rm -r");
        } else {
            fs::remove_file(&path).expect("rm");
        }
    }
}

/// Every regular file under `root`, keyed by `/`-joined relative path.
pub fn snapshot(root: &Path) -> Tree {
    fn walk(root: &Path, dir: &Path, out: &mut Tree) {
        for entry in fs::read_dir(dir).expect("read_dir") {
            let path = entry.expect("entry").path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).expect("under root");
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                out.insert(key, fs::read(&path).expect("read"));
            }
        }
    }
    let mut out = Tree::new();
    walk(root, root, &mut out);
    out
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub journal: SharedJournal,
    pub konnect: FakeKonnect,
    pub git: FakeGit,
    pub renderer: Renderer,
}

impl Harness {
    /// Fakes seeded with the platform repo (`main` holds a README) and the
    /// `checkout` service repo.
    pub fn new() -> Self {
        init_logs();
        let journal = SharedJournal::default();
        let harness = Self {
            konnect: FakeKonnect::new(journal.clone()),
            git: FakeGit::new(journal.clone()),
            journal,
            renderer: Renderer::new().expect("templates compile"),
        };
        {
            let mut git = harness.git.state();
            git.seed(PLATFORM_REMOTE, "main", &[("README.md", b"platform\n")]);
            git.seed(CHECKOUT_REMOTE, "main", &[("openapi.yaml", SPEC)]);
        }
        harness
    }

    pub fn apply(&self, manifest: &Manifest, cx: &CancelToken) -> Result<ReconcileReport, SyncError> {
        let collab = Collaborators {
            connector: &self.konnect,
            git: &self.git,
            secrets: &ProcessSecrets,
            renderer: &self.renderer,
        };
        reconcile::apply(manifest, &collab, cx)
    }

    pub fn calls(&self) -> Vec<String> {
        self.journal.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.journal.lock().unwrap().calls.clear();
    }

    /// Calls that changed remote or git state.
    pub fn writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| WRITE_OPS.contains(&c.as_str()))
            .collect()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| *c == op).count()
    }

    pub fn cancel_on(&self, op: &str) {
        self.journal.lock().unwrap().cancel_on = Some(op.to_string());
    }

    pub fn fail_on(&self, op: &str) {
        self.journal.lock().unwrap().fail_on = Some(op.to_string());
    }

    /// Every clone was closed explicitly.
    pub fn assert_all_closed(&self) {
        let git = self.git.state();
        assert_eq!(git.clones.len(), git.closed, "clone without close");
    }
}
