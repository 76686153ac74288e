pub mod apply;
pub mod validate;

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use konnect_ports::config::{DEFAULT_GITHUB_API_URL, DEFAULT_HTTP_TIMEOUT, DEFAULT_KONNECT_DOMAIN};
use konnect_ports::ClientConfig;

/// Where the remote APIs and the git executable live.
#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    /// Konnect API domain (`https://global.<domain>`, `https://<region>.<domain>`).
    #[arg(long, env = "KONNECT_DOMAIN", default_value = DEFAULT_KONNECT_DOMAIN)]
    pub konnect_domain: String,

    /// GitHub REST base URL, unless the manifest sets `hosting.api-url`.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL)]
    pub github_api_url: String,

    /// Per-request HTTP timeout.
    #[arg(
        long = "http-timeout",
        env = "KONNECT_HTTP_TIMEOUT_S",
        value_name = "SECONDS",
        default_value_t = DEFAULT_HTTP_TIMEOUT.as_secs()
    )]
    pub http_timeout_s: u64,

    /// `git` executable.
    #[arg(long = "git-bin", env = "KONNECT_GIT_BIN", default_value = "git")]
    pub git_bin: PathBuf,
}

impl EndpointArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            konnect_domain: self.konnect_domain.clone(),
            github_api_url: self.github_api_url.clone(),
            http_timeout: Duration::from_secs(self.http_timeout_s),
            git_program: self.git_bin.clone(),
        }
    }
}
