//! fleetdu - find file-heavy and stale directories across a fleet of hosts.
//!
//! Usage:
//!   fleetdu --local --paths /data /home      Scan this machine
//!   fleetdu --config fleet.toml              Scan the hosts in a config file
//!   fleetdu --host db1 --paths /data         Scan one host over ssh
//!   fleetdu --config fleet.toml --dry-run    Show the commands only
//!   fleetdu --help                           Show help
//!
//! Exit status: 0 when every host succeeded, 1 when any host failed, 2 when
//! the configuration is invalid, 130 when interrupted.

mod cli;
mod report;
mod settings;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use fleetdu_scan::{FleetScanner, ScanEvent};

use crate::cli::Cli;
use crate::report::Report;

/// Exit status for an invalid configuration.
const EXIT_CONFIG_ERROR: u8 = 2;

/// Exit status after Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = match settings::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            return Ok(ExitCode::from(EXIT_CONFIG_ERROR));
        }
    };
    debug!(?config, "Configuration loaded");
    info!(
        hosts = config.hosts.len(),
        local = config.local,
        mode = %config.report_mode,
        "Configuration loaded"
    );

    let scanner = FleetScanner::new(config);
    let progress = print_progress(scanner.subscribe());

    // Probes run in their own process groups and never see the terminal's
    // SIGINT; returning here shuts the runtime down, which kills them.
    let results = tokio::select! {
        results = scanner.scan() => results,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted, stopping running probes");
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
    };
    // The sender lives in the scanner; dropping it ends the progress task.
    let config = scanner.config().clone();
    drop(scanner);
    let _ = progress.await;

    let rendered = Report::new(&results, &config).render()?;
    report::write(&rendered, cli.output.as_deref())?;

    Ok(if results.iter().all(|r| r.success) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn setup_logging(verbose: bool) {
    let default = if verbose { "fleetdu=debug,warn" } else { "fleetdu=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print one line per finished host to stderr.
fn print_progress(
    mut events: tokio::sync::broadcast::Receiver<ScanEvent>,
) -> tokio::task::JoinHandle<()> {
    use tokio::sync::broadcast::error::RecvError;

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ScanEvent::HostFinished {
                    host,
                    success,
                    completed,
                    total,
                }) => {
                    let status = if success { "ok" } else { "FAILED" };
                    eprintln!("[{completed}/{total}] {host}: {status}");
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    })
}
