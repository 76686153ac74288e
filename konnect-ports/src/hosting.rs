//! Code-hosting pull-request port.

use serde::{Deserialize, Serialize};

use konnect_core::CancelToken;

use crate::error::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub state: String,
    pub url: String,
}

/// Query for [`HostingPort::list_pulls`]. `head` is `owner:branch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullFilter {
    pub head: String,
    pub base: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestUpdate {
    pub title: String,
    pub body: String,
}

pub trait HostingPort: Send + Sync {
    fn list_pulls(
        &self,
        owner: &str,
        repo: &str,
        filter: &PullFilter,
        cx: &CancelToken,
    ) -> Result<Vec<PullRequest>, RemoteError>;

    fn create_pull(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest,
        cx: &CancelToken,
    ) -> Result<PullRequest, RemoteError>;

    fn update_pull(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        update: &PullRequestUpdate,
        cx: &CancelToken,
    ) -> Result<PullRequest, RemoteError>;
}
