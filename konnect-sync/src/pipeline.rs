//! Shared pass entrypoint used by the CLI and the control loop.

use std::path::Path;

use konnect_core::{manifest, CancelToken, ProcessSecrets};
use konnect_ports::{ClientConfig, CliGit, HttpConnector};
use konnect_renderer::Renderer;

use crate::error::SyncError;
use crate::reconcile::{self, Collaborators};
use crate::report::ReconcileReport;

/// Load the manifest at `manifest_path` and run one reconciliation pass
/// against the production Konnect, GitHub and git clients.
///
/// The manifest is read afresh on every call.
pub fn run(
    manifest_path: &Path,
    config: &ClientConfig,
    cx: &CancelToken,
) -> Result<ReconcileReport, SyncError> {
    let manifest = manifest::load_at(manifest_path)?;
    let connector = HttpConnector::new(config.clone());
    let git = CliGit::new(config.git_program.clone());
    let renderer = Renderer::new()?;
    let collab = Collaborators {
        connector: &connector,
        git: &git,
        secrets: &ProcessSecrets,
        renderer: &renderer,
    };
    reconcile::apply(&manifest, &collab, cx)
}
