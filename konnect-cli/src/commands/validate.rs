//! `konnect-orchestrator validate`: offline manifest check.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use konnect_core::layout::RepoSlug;
use konnect_core::{manifest, Manifest};

/// Arguments for `konnect-orchestrator validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Manifest file (YAML, or JSON).
    pub manifest: PathBuf,

    /// Emit the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ValidateArgs {
    pub fn run(self) -> Result<()> {
        let parsed = manifest::load_validated(&self.manifest)
            .with_context(|| format!("invalid manifest {}", self.manifest.display()))?;
        let summary = Summary::of(&parsed)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!("✓ {} is valid", self.manifest.display());
        println!(
            "  platform: {} ({}/{})",
            summary.platform, summary.owner, summary.repo
        );
        println!(
            "  {} organization(s), {} environment(s), {} team(s) declared",
            summary.organizations, summary.environments, summary.teams
        );
        for unit in &summary.units {
            let services = if unit.services.is_empty() {
                "-".to_string()
            } else {
                unit.services.join(", ")
            };
            println!("  {}/{}/{}: {services}", unit.org, unit.env, unit.team);
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    platform: String,
    owner: String,
    repo: String,
    organizations: usize,
    environments: usize,
    teams: usize,
    units: Vec<UnitSummary>,
}

#[derive(Debug, Serialize)]
struct UnitSummary {
    org: String,
    env: String,
    team: String,
    services: Vec<String>,
}

impl Summary {
    fn of(manifest: &Manifest) -> Result<Self> {
        let remote = &manifest.platform.git.remote;
        let RepoSlug { owner, repo } = RepoSlug::parse(remote)?;

        let mut units = Vec::new();
        let mut environments = 0;
        for (org, org_def) in &manifest.organizations {
            environments += org_def.environments.len();
            for (env, env_def) in &org_def.environments {
                for (team, env_team) in &env_def.teams {
                    units.push(UnitSummary {
                        org: org.to_string(),
                        env: env.to_string(),
                        team: team.to_string(),
                        services: env_team.services.keys().map(|s| s.to_string()).collect(),
                    });
                }
            }
        }

        Ok(Self {
            platform: remote.clone(),
            owner,
            repo,
            organizations: manifest.organizations.len(),
            environments,
            teams: manifest.teams.len(),
            units,
        })
    }
}
