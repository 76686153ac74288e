//! GitHub REST client for the pull-request port.

use serde::Deserialize;

use konnect_core::CancelToken;

use super::{segment, Endpoint};
use crate::error::RemoteError;
use crate::hosting::{HostingPort, NewPullRequest, PullFilter, PullRequest, PullRequestUpdate};

#[derive(Clone)]
pub struct GithubClient {
    endpoint: Endpoint,
}

impl GithubClient {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

/// Wire shape of a GitHub pull request (the fields we read).
#[derive(Debug, Deserialize)]
struct GhPull {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    #[serde(default)]
    html_url: String,
}

impl From<GhPull> for PullRequest {
    fn from(p: GhPull) -> Self {
        PullRequest {
            number: p.number,
            title: p.title,
            body: p.body.unwrap_or_default(),
            state: p.state,
            url: p.html_url,
        }
    }
}

fn pulls_path(owner: &str, repo: &str) -> String {
    format!("/repos/{}/{}/pulls", segment(owner), segment(repo))
}

impl HostingPort for GithubClient {
    fn list_pulls(
        &self,
        owner: &str,
        repo: &str,
        filter: &PullFilter,
        cx: &CancelToken,
    ) -> Result<Vec<PullRequest>, RemoteError> {
        let pulls: Vec<GhPull> = self.endpoint.get(
            "list pull requests",
            &pulls_path(owner, repo),
            &[
                ("head", filter.head.as_str()),
                ("base", filter.base.as_str()),
                ("state", filter.state.as_str()),
                ("per_page", "100"),
            ],
            cx,
        )?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    fn create_pull(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest,
        cx: &CancelToken,
    ) -> Result<PullRequest, RemoteError> {
        let created: GhPull = self.endpoint.send(
            "create pull request",
            "POST",
            &pulls_path(owner, repo),
            pull,
            cx,
        )?;
        Ok(created.into())
    }

    fn update_pull(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        update: &PullRequestUpdate,
        cx: &CancelToken,
    ) -> Result<PullRequest, RemoteError> {
        let path = format!("{}/{number}", pulls_path(owner, repo));
        let updated: GhPull =
            self.endpoint
                .send("update pull request", "PATCH", &path, update, cx)?;
        Ok(updated.into())
    }
}
