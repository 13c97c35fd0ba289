//! `landsat-prep` command-line entry point.

use clap::Parser;
use landsat_runner::{run_batch, write_report, Cli, RunnerResult};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: &Cli) -> RunnerResult<bool> {
    let config = cli.load_config()?;
    let mode = cli.command.mode();

    let report = run_batch(&config, mode)?;
    println!("{report}");

    if let Some(path) = &config.report {
        write_report(&report, &config, mode, path)?;
    }
    Ok(report.failed() == 0)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => {
            info!("Done");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            warn!("Finished with failed units; see the report above");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
