//! `ureq` implementations of the Konnect and code-hosting ports.

mod github;
mod konnect;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use konnect_core::{CancelToken, HostingKind, HostingRef};

use crate::config::ClientConfig;
use crate::error::RemoteError;
use crate::hosting::HostingPort;
use crate::konnect::{Connector, ControlPlanePort, KonnectPorts};

pub use github::GithubClient;
pub use konnect::{KonnectClient, RegionalKonnectClient};

const USER_AGENT: &str = concat!("konnect-orchestrator/", env!("CARGO_PKG_VERSION"));

/// Konnect list envelope: `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// One authenticated base URL.
#[derive(Clone)]
pub(crate) struct Endpoint {
    agent: ureq::Agent,
    base: String,
    headers: Vec<(&'static str, String)>,
}

impl Endpoint {
    pub(crate) fn new(agent: ureq::Agent, base: impl Into<String>, token: &str) -> Self {
        Self {
            agent,
            base: base.into().trim_end_matches('/').to_string(),
            headers: vec![("Authorization", format!("Bearer {}", token.trim()))],
        }
    }

    pub(crate) fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!("{}{}", self.base, path);
        tracing::debug!(method, %url, "http request");
        self.headers
            .iter()
            .fold(self.agent.request(method, &url), |req, (name, value)| {
                req.set(name, value)
            })
    }

    pub(crate) fn get<T: DeserializeOwned>(
        &self,
        op: &str,
        path: &str,
        query: &[(&str, &str)],
        cx: &CancelToken,
    ) -> Result<T, RemoteError> {
        cx.check()?;
        let req = query
            .iter()
            .fold(self.request("GET", path), |req, (k, v)| req.query(k, v));
        let resp = req.call().map_err(|e| map_ureq(op, e))?;
        cx.check()?;
        decode(op, resp)
    }

    pub(crate) fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        op: &str,
        method: &str,
        path: &str,
        body: &B,
        cx: &CancelToken,
    ) -> Result<T, RemoteError> {
        let resp = self.send_raw(op, method, path, body, cx)?;
        decode(op, resp)
    }

    /// Like [`send`](Self::send) but ignores the response body.
    pub(crate) fn send_empty<B: Serialize>(
        &self,
        op: &str,
        method: &str,
        path: &str,
        body: &B,
        cx: &CancelToken,
    ) -> Result<(), RemoteError> {
        self.send_raw(op, method, path, body, cx).map(|_| ())
    }

    fn send_raw<B: Serialize>(
        &self,
        op: &str,
        method: &str,
        path: &str,
        body: &B,
        cx: &CancelToken,
    ) -> Result<ureq::Response, RemoteError> {
        cx.check()?;
        let resp = self
            .request(method, path)
            .send_json(body)
            .map_err(|e| map_ureq(op, e))?;
        cx.check()?;
        Ok(resp)
    }
}

fn decode<T: DeserializeOwned>(op: &str, resp: ureq::Response) -> Result<T, RemoteError> {
    resp.into_json::<T>().map_err(|e| RemoteError::Decode {
        op: op.to_string(),
        detail: e.to_string(),
    })
}

fn map_ureq(op: &str, err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, resp) => RemoteError::Status {
            op: op.to_string(),
            status,
            body: resp.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(t) => RemoteError::Transport {
            op: op.to_string(),
            detail: t.to_string(),
        },
    }
}

/// Bytes escaped in a URL path segment: everything but RFC 3986 unreserved.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode one path segment (ids, owners, repository names).
pub(crate) fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// Production [`Connector`]: one `ureq` agent, fresh authenticated clients per call.
#[derive(Clone)]
pub struct HttpConnector {
    config: ClientConfig,
    agent: ureq::Agent,
}

impl HttpConnector {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build();
        Self { config, agent }
    }
}

impl Connector for HttpConnector {
    fn global(&self, token: &str) -> Result<KonnectPorts, RemoteError> {
        let client = KonnectClient::new(Endpoint::new(
            self.agent.clone(),
            self.config.global_url(),
            token,
        ));
        Ok(KonnectPorts {
            teams: Box::new(client.clone()),
            memberships: Box::new(client.clone()),
            users: Box::new(client.clone()),
            invites: Box::new(client.clone()),
            roles: Box::new(client),
        })
    }

    fn regional(
        &self,
        token: &str,
        region: &str,
    ) -> Result<Box<dyn ControlPlanePort>, RemoteError> {
        Ok(Box::new(RegionalKonnectClient::new(Endpoint::new(
            self.agent.clone(),
            self.config.regional_url(region),
            token,
        ))))
    }

    fn hosting(
        &self,
        hosting: &HostingRef,
        token: &str,
    ) -> Result<Box<dyn HostingPort>, RemoteError> {
        if let HostingKind::Other(kind) = &hosting.kind {
            return Err(RemoteError::Rejected {
                op: "hosting".to_string(),
                detail: format!("unsupported hosting type '{kind}'"),
            });
        }
        let base = hosting
            .api_url
            .clone()
            .unwrap_or_else(|| self.config.github_api_url.clone());
        let endpoint = Endpoint::new(self.agent.clone(), base, token)
            .with_header("Accept", "application/vnd.github+json")
            .with_header("X-GitHub-Api-Version", "2022-11-28");
        Ok(Box::new(GithubClient::new(endpoint)))
    }
}
