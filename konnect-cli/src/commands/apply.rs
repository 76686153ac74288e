//! `konnect-orchestrator apply`: reconcile once or on a cadence.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use konnect_daemon::{init_tracing, LogFormat};
use konnect_sync::{ReconcileReport, UnitReport};

use super::EndpointArgs;

/// Arguments for `konnect-orchestrator apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Manifest file (YAML, or JSON).
    pub manifest: PathBuf,

    /// Re-run every N seconds until interrupted; 0 runs a single pass.
    #[arg(long = "loop", value_name = "SECONDS", default_value_t = 0)]
    pub interval_s: u64,

    /// Print each pass report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Log line format on stderr.
    #[arg(long, value_name = "FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub endpoints: EndpointArgs,
}

impl ApplyArgs {
    pub fn run(self) -> Result<()> {
        init_tracing(self.log_format);

        let json = self.json;
        let summary = konnect_daemon::start_blocking(
            self.manifest.clone(),
            self.endpoints.client_config(),
            Duration::from_secs(self.interval_s),
            |report| {
                if json {
                    print_json(report);
                } else {
                    print_table(report);
                }
            },
        )
        .with_context(|| format!("reconciling {}", self.manifest.display()))?;

        if summary.shutdown && !json {
            println!("stopped after {} pass(es)", summary.passes);
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct UnitRow {
    #[tabled(rename = "org")]
    org: String,
    #[tabled(rename = "env")]
    env: String,
    #[tabled(rename = "team")]
    team: String,
    #[tabled(rename = "specs")]
    specs: String,
    #[tabled(rename = "pushed")]
    pushed: &'static str,
    #[tabled(rename = "pull request")]
    pull_request: String,
    #[tabled(rename = "konnect team")]
    team_change: String,
    #[tabled(rename = "control plane")]
    control_plane: String,
    #[tabled(rename = "role")]
    role: String,
}

impl From<&UnitReport> for UnitRow {
    fn from(unit: &UnitReport) -> Self {
        let mut team_change = unit.team_change.to_string();
        if !unit.invited.is_empty() || !unit.members_added.is_empty() {
            team_change.push_str(&format!(
                " (+{} member(s), {} invited)",
                unit.members_added.len(),
                unit.invited.len()
            ));
        }
        Self {
            org: unit.org.clone(),
            env: unit.env.clone(),
            team: unit.team.clone(),
            specs: format!(
                "{} written, {} unchanged",
                unit.files_written, unit.files_unchanged
            ),
            pushed: if unit.pushed { "yes" } else { "no" },
            pull_request: unit.pull_request.to_string(),
            team_change,
            control_plane: unit.control_plane.to_string(),
            role: unit.role.to_string(),
        }
    }
}

fn print_table(report: &ReconcileReport) {
    if report.units.is_empty() {
        println!("No (org, env, team) units in the manifest.");
        return;
    }

    let rows: Vec<UnitRow> = report.units.iter().map(UnitRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let status = if report.is_converged() {
        "converged".green().to_string()
    } else {
        "applied".yellow().to_string()
    };
    println!(
        "✓ {} unit(s) {status} in {} ms ({} spec file(s) written)",
        report.units.len(),
        report.duration_ms(),
        report.files_written()
    );
}

fn print_json(report: &ReconcileReport) {
    match serde_json::to_string_pretty(report) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("warning: cannot encode report as JSON: {err}"),
    }
}
