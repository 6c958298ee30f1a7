mod config;
mod pipeline;

use anyhow::Context;
use clap::Parser;
use config::{Cli, RunConfig};
use model::RideError;
use pipeline::Outcome;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Some output files could not be written.
const EXIT_PARTIAL_OUTPUT: u8 = 5;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match config::usage_exit_code(&e) {
            Some(code) => {
                let _ = e.print();
                return ExitCode::from(code);
            }
            None => e.exit(),
        },
    };
    init_tracing(cli.quiet);
    tracing::debug!("rideology2gpx v{}", env!("CARGO_PKG_VERSION"));

    let cfg = match RunConfig::try_from(cli) {
        Ok(cfg) => cfg,
        Err(e) => return fail(&e),
    };

    let outcome = match pipeline::run(&cfg) {
        Ok(outcome) => outcome,
        Err(e) => return fail(&e),
    };

    if let Err(e) = present(&cfg, &outcome) {
        eprintln!("Error, {e:#}");
        return ExitCode::FAILURE;
    }

    if outcome.failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        for (path, e) in &outcome.failed {
            eprintln!("Error, could not make {:?}: {e}", path.display().to_string());
        }
        ExitCode::from(EXIT_PARTIAL_OUTPUT)
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn fail(e: &RideError) -> ExitCode {
    eprintln!("Error, {e}");
    ExitCode::from(e.exit_code())
}

fn present(cfg: &RunConfig, outcome: &Outcome) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    if !cfg.quiet {
        writeln!(stdout, "{}", outcome.report).context("printing report")?;
    }
    if cfg.json {
        let json = serde_json::to_string_pretty(&outcome.statistics.summary())
            .context("serializing statistics")?;
        writeln!(stdout, "{json}").context("printing statistics")?;
    }
    Ok(())
}
