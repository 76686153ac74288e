//! # konnect-sync
//!
//! The reconciliation engine.
//!
//! - [`apply`]: idempotent `ensure_*` primitives for teams, memberships,
//!   control planes and role assignments
//! - [`materialize`]: copy a service's OpenAPI document into the platform layout
//! - [`writer`]: hash-gated atomic file writer
//! - [`reconcile`]: the organization → environment → team → service walk
//! - [`pipeline`]: load the manifest and run a pass with production clients
//!
//! Call [`pipeline::run`] for a full pass, or [`reconcile::apply`] with your
//! own [`Collaborators`].

pub mod apply;
pub mod error;
pub mod materialize;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod writer;

pub use apply::{Change, TeamOutcome};
pub use error::{Scope, SyncError};
pub use reconcile::Collaborators;
pub use report::{PullOutcome, ReconcileReport, UnitReport};
pub use writer::WriteResult;
