//! The per-path scan state machine.
//!
//! One host unit walks `probe size -> parse -> rank`, then optionally
//! `probe stale -> parse stale -> enrich`. Any stage can end the unit early;
//! the failure is folded into the returned summary and never escapes as an
//! error. Nothing here is concurrent.

use std::time::Duration;

use strum::Display;
use thiserror::Error;
use tracing::{debug, warn};

use fleetdu_analyze::{
    count_access_denied, only_access_denied, parse_size_samples, parse_stale_samples, RootAnalyzer,
};
use fleetdu_core::{FleetConfig, ReportMode, RootSummary, SizeSample};
use fleetdu_exec::{probes_for, CommandResult, CommandRunner, ShellCommand, Transport};

use crate::plan::HostPlan;

/// Exit status of the ssh client when the connection itself failed.
const SSH_CONNECTION_FAILED: i32 = 255;

/// Longest stderr excerpt carried into warnings.
const STDERR_EXCERPT: usize = 100;

/// Stages of one host unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    ProbeSize,
    Parse,
    Rank,
    ProbeStale,
    ParseStale,
    Enrich,
    Done,
}

/// A stage that ended its unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{what}: {detail}")]
pub struct UnitError {
    pub stage: Stage,
    what: &'static str,
    detail: String,
}

impl UnitError {
    fn new(stage: Stage, what: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            what,
            detail: detail.into(),
        }
    }

    /// Map a failed probe to the reason it failed.
    fn from_probe(stage: Stage, what: &'static str, result: &CommandResult, remote: bool) -> Self {
        let detail = if result.timed_out {
            result.stderr.clone()
        } else if remote && result.return_code == SSH_CONNECTION_FAILED {
            format!("ssh connection failed: {}", excerpt(&result.stderr))
        } else {
            format!("exit code {}: {}", result.return_code, excerpt(&result.stderr))
        };
        Self::new(stage, what, detail)
    }
}

/// Outcome of one host unit.
#[derive(Debug, Clone, PartialEq)]
pub struct PathOutcome {
    pub summary: RootSummary,
    /// Set when the unit failed; the summary then carries the same text as a
    /// warning.
    pub error: Option<UnitError>,
}

impl PathOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    fn done(summary: RootSummary) -> Self {
        Self { summary, error: None }
    }

    fn failed(path: &str, error: UnitError) -> Self {
        Self {
            summary: RootSummary::failed(path, error.to_string()),
            error: Some(error),
        }
    }
}

/// Start of `stderr`, cut to a readable length.
fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return "no error output".to_string();
    }
    trimmed.chars().take(STDERR_EXCERPT).collect()
}

/// Run the unit for `path` on the host described by `plan`.
pub async fn scan_path<T: Transport>(
    plan: &HostPlan,
    path: &str,
    config: &FleetConfig,
    runner: &CommandRunner<T>,
    analyzer: &RootAnalyzer,
) -> PathOutcome {
    match run_unit(plan, path, config, runner, analyzer).await {
        Ok(summary) => {
            debug!(host = %plan.name, path, stage = %Stage::Done, "Unit finished");
            PathOutcome::done(summary)
        }
        Err(err) => {
            warn!(host = %plan.name, path, stage = %err.stage, error = %err, "Unit failed");
            PathOutcome::failed(path, err)
        }
    }
}

async fn run_unit<T: Transport>(
    plan: &HostPlan,
    path: &str,
    config: &FleetConfig,
    runner: &CommandRunner<T>,
    analyzer: &RootAnalyzer,
) -> Result<RootSummary, UnitError> {
    let probes = probes_for(plan.flavor);
    let timeout = config.timeout();
    let stale_mode = config.report_mode == ReportMode::Stale;

    let size_probe =
        probes.build_size_probe(path, plan.scan_depth, &plan.excludes, config.single_filesystem, &plan.du_command);
    let stale_probe = probes.build_stale_probe(path, config.stale_days, config.stale_kind, &plan.find_command);

    debug!(host = %plan.name, path, stage = %Stage::ProbeSize);
    let size = runner.run(&size_probe, &plan.target, timeout).await;

    if size.dry_run {
        let mut summary = RootSummary::new(path, 0);
        summary.warn(format!("dry-run: {}", size.command));
        if stale_mode || config.stale_enabled() {
            let stale = runner.run(&stale_probe, &plan.target, timeout).await;
            summary.warn(format!("dry-run: {}", stale.command));
        }
        return Ok(summary);
    }

    debug!(host = %plan.name, path, stage = %Stage::Parse);
    let samples = parse_size_samples(&size.stdout).scaled(probes.size_unit());
    let partial = check_size_probe(&size, &samples, plan.target.is_remote())?;

    let mut summary = if stale_mode {
        let stale = probe_stale(plan, path, runner, &stale_probe, timeout)
            .await
            .map_err(|failed| {
                UnitError::from_probe(Stage::ProbeStale, "stale probe failed", &failed, plan.target.is_remote())
            })?;
        debug!(host = %plan.name, path, stage = %Stage::Rank);
        analyzer.analyze_stale(path, &samples, &stale)
    } else {
        debug!(host = %plan.name, path, stage = %Stage::Rank);
        let mut summary = analyzer.analyze_sizes(path, &samples);
        if config.stale_enabled() && !summary.top_directories.is_empty() {
            match probe_stale(plan, path, runner, &stale_probe, timeout).await {
                Ok(stale) => {
                    debug!(host = %plan.name, path, stage = %Stage::Enrich);
                    analyzer.enrich(&mut summary, &stale);
                }
                Err(failed) => {
                    warn!(host = %plan.name, path, return_code = failed.return_code, "Stale probe failed");
                    summary.warn(format!("stale probe failed: {}", excerpt(&failed.stderr)));
                }
            }
        }
        summary
    };

    if let Some(unreadable) = partial {
        summary.approx = true;
        summary.warn(format!(
            "{unreadable} path(s) unreadable (permission denied); sizes are partial"
        ));
    }
    Ok(summary)
}

/// Decide whether the size probe produced usable data.
///
/// Returns the number of unreadable paths when the data is partial.
fn check_size_probe(result: &CommandResult, samples: &SizeSample, remote: bool) -> Result<Option<usize>, UnitError> {
    let unreadable = count_access_denied(&result.stderr);

    if result.success() {
        return Ok((unreadable > 0).then_some(unreadable));
    }

    let unreachable = result.timed_out || (remote && result.return_code == SSH_CONNECTION_FAILED);
    if !unreachable && !samples.is_empty() && only_access_denied(&result.stderr) {
        return Ok(Some(unreadable));
    }
    Err(UnitError::from_probe(Stage::ProbeSize, "size probe failed", result, remote))
}

/// Run the stale probe; the failed result is handed back as the error.
async fn probe_stale<T: Transport>(
    plan: &HostPlan,
    path: &str,
    runner: &CommandRunner<T>,
    probe: &ShellCommand,
    timeout: Duration,
) -> Result<SizeSample, CommandResult> {
    debug!(host = %plan.name, path, stage = %Stage::ProbeStale);
    let result = runner.run(probe, &plan.target, timeout).await;
    if !result.success() {
        return Err(result);
    }

    debug!(host = %plan.name, path, stage = %Stage::ParseStale);
    Ok(parse_stale_samples(&result.stdout))
}
