//! Endpoint and client settings shared by the HTTP clients and git driver.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_KONNECT_DOMAIN: &str = "api.konghq.com";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Konnect API domain; endpoints are `https://{global|region}.{domain}`.
    pub konnect_domain: String,
    /// GitHub REST base URL, unless a manifest `hosting.api-url` overrides it.
    pub github_api_url: String,
    pub http_timeout: Duration,
    /// `git` executable.
    pub git_program: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            konnect_domain: DEFAULT_KONNECT_DOMAIN.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            git_program: PathBuf::from("git"),
        }
    }
}

impl ClientConfig {
    /// `https://global.{domain}`
    pub fn global_url(&self) -> String {
        format!("https://global.{}", self.konnect_domain)
    }

    /// `https://{region}.{domain}`
    pub fn regional_url(&self, region: &str) -> String {
        format!("https://{region}.{}", self.konnect_domain)
    }
}
