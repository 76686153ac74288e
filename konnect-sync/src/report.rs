//! Summary of a reconciliation pass.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::apply::Change;

/// What happened to the environment's pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "outcome", content = "number")]
pub enum PullOutcome {
    /// The tree was clean; the hosting provider was not called.
    None,
    Created(u64),
    Updated(u64),
    Unchanged(u64),
}

impl PullOutcome {
    pub fn number(self) -> Option<u64> {
        match self {
            PullOutcome::None => None,
            PullOutcome::Created(n) | PullOutcome::Updated(n) | PullOutcome::Unchanged(n) => {
                Some(n)
            }
        }
    }
}

impl fmt::Display for PullOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullOutcome::None => f.write_str("-"),
            PullOutcome::Created(n) => write!(f, "created #{n}"),
            PullOutcome::Updated(n) => write!(f, "updated #{n}"),
            PullOutcome::Unchanged(n) => write!(f, "unchanged #{n}"),
        }
    }
}

/// One `(org, env, team)` unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub org: String,
    pub env: String,
    pub team: String,
    pub branch: String,
    pub files_written: usize,
    pub files_unchanged: usize,
    /// A commit was pushed to `branch`.
    pub pushed: bool,
    pub pull_request: PullOutcome,
    pub team_id: String,
    pub team_change: Change,
    pub invited: Vec<String>,
    pub members_added: Vec<String>,
    pub control_plane_id: String,
    pub control_plane: Change,
    pub role: Change,
}

impl UnitReport {
    /// True when the unit issued no remote or git write.
    pub fn is_converged(&self) -> bool {
        !self.pushed
            && self.pull_request.number().is_none()
            && !self.team_change.is_write()
            && self.invited.is_empty()
            && self.members_added.is_empty()
            && !self.control_plane.is_write()
            && !self.role.is_write()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub units: Vec<UnitReport>,
}

impl ReconcileReport {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    pub fn is_converged(&self) -> bool {
        self.units.iter().all(UnitReport::is_converged)
    }

    pub fn files_written(&self) -> usize {
        self.units.iter().map(|u| u.files_written).sum()
    }
}
