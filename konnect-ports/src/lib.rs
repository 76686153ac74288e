//! # konnect-ports
//!
//! The narrow interfaces the reconciler drives, and their production
//! implementations:
//!
//! - [`konnect`]: team, membership, user, invite, control-plane and role ports
//! - [`hosting`]: pull-request port of the code-hosting provider
//! - [`git`]: working-copy driver over the `git` executable
//! - [`http`]: `ureq` clients for the Konnect and GitHub REST APIs
//!
//! Every blocking call takes the ambient [`CancelToken`](konnect_core::CancelToken)
//! and fails with a `Cancelled` variant once it is tripped.

pub mod config;
pub mod error;
pub mod git;
pub mod hosting;
pub mod http;
pub mod konnect;

pub use config::ClientConfig;
pub use error::{GitError, RemoteError};
pub use git::{CliGit, CloneOptions, Credentials, Git, WorkingCopy};
pub use hosting::{HostingPort, NewPullRequest, PullFilter, PullRequest, PullRequestUpdate};
pub use http::HttpConnector;
pub use konnect::{
    AssignedRole, Connector, ControlPlane, ControlPlanePort, ControlPlaneUpdate, InvitePort,
    KonnectPorts, NewControlPlane, RoleFilter, RolePort, Team, TeamMembershipPort, TeamPort,
    TeamSpec, User, UserPort,
};
