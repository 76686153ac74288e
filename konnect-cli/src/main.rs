//! konnect-orchestrator: declarative Konnect onboarding from one manifest.
//!
//! # Usage
//!
//! ```text
//! konnect-orchestrator apply <manifest> [--loop <seconds>] [--json] [--log-format text|json]
//! konnect-orchestrator validate <manifest> [--json]
//! ```

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{apply::ApplyArgs, validate::ValidateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "konnect-orchestrator",
    version,
    about = "Reconcile Konnect teams, control planes and API specs from a manifest",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one reconciliation pass, or keep reconciling with --loop.
    Apply(ApplyArgs),

    /// Check a manifest without touching Konnect, GitHub or git.
    Validate(ValidateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Apply(args) => args.run(),
        Commands::Validate(args) => args.run(),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), one_line(&err));
            ExitCode::FAILURE
        }
    }
}

/// The cause chain on a single line, joined by `": "`.
///
/// Most library errors already print their source inline, so a cause whose
/// text is contained in what came before is skipped.
fn one_line(err: &anyhow::Error) -> String {
    let mut line = String::new();
    for cause in err.chain() {
        let text = cause.to_string().replace('\n', " ");
        let text = text.trim();
        if text.is_empty() || line.contains(text) {
            continue;
        }
        if !line.is_empty() {
            line.push_str(": ");
        }
        line.push_str(text);
    }
    line
}
