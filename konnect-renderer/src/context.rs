//! Template context for one `(org, env, team)` unit of a reconciliation pass.

use serde::Serialize;

use konnect_core::layout::{apply_branch, PR_BASE_BRANCH};
use konnect_core::EnvName;

/// Everything a template may reference.
///
/// Deliberately free of timestamps: the rendered PR body must be identical
/// between passes so an already-open PR is left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeContext {
    pub org: String,
    pub env: String,
    pub team: String,
    /// Services materialized for this team, sorted.
    pub services: Vec<String>,
    pub branch: String,
    pub base: String,
}

impl ChangeContext {
    pub fn new(
        org: impl Into<String>,
        env: impl Into<String>,
        team: impl Into<String>,
        mut services: Vec<String>,
    ) -> Self {
        let env = env.into();
        services.sort();
        Self {
            org: org.into(),
            branch: apply_branch(&EnvName::from(env.as_str())),
            base: PR_BASE_BRANCH.to_string(),
            env,
            team: team.into(),
            services,
        }
    }
}
