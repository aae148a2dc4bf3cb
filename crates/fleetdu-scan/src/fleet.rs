//! Fan-out of host scans over a bounded worker pool.

use std::sync::Arc;

use tokio::sync::{broadcast, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn, Instrument};

use fleetdu_analyze::RootAnalyzer;
use fleetdu_core::{FleetConfig, HostProfile, HostResult};
use fleetdu_exec::{CommandRunner, SystemTransport, Transport};

use crate::plan::{HostPlan, LOCAL_HOST_NAME};
use crate::progress::{FleetProgress, ProgressTracker, ScanEvent};
use crate::unit::scan_path;

/// Capacity of the progress channel; slow subscribers lose old events.
const EVENT_CAPACITY: usize = 256;

/// Scan the paths of one host, one after the other.
///
/// `host` is `None` in local mode. The result holds one summary per path, in
/// configured order, and is successful only when every path was.
pub async fn scan_host<T: Transport>(
    host: Option<&HostProfile>,
    config: &FleetConfig,
    runner: &CommandRunner<T>,
) -> HostResult {
    scan_host_with_events(host, config, runner, None).await
}

async fn scan_host_with_events<T: Transport>(
    host: Option<&HostProfile>,
    config: &FleetConfig,
    runner: &CommandRunner<T>,
    events: Option<&broadcast::Sender<ScanEvent>>,
) -> HostResult {
    let plan = HostPlan::resolve(host, config);
    let analyzer = RootAnalyzer::with_config(config.into());
    let mut result = HostResult::new(&plan.name);

    for path in &plan.paths {
        let outcome = scan_path(&plan, path, config, runner, &analyzer).await;
        let success = outcome.success();

        if let Some(events) = events {
            // No subscribers is fine.
            let _ = events.send(ScanEvent::PathFinished {
                host: plan.name.clone(),
                path: path.clone(),
                success,
            });
        }
        result.record(outcome.summary, outcome.error.map(|e| format!("{path}: {e}")));
    }

    result
}

/// Scans a whole fleet, at most `parallel` hosts at a time.
pub struct FleetScanner<T: Transport = SystemTransport> {
    config: Arc<FleetConfig>,
    runner: Arc<CommandRunner<T>>,
    events: broadcast::Sender<ScanEvent>,
}

impl FleetScanner<SystemTransport> {
    /// Scanner that runs real `du`, `find` and ssh processes.
    pub fn new(config: FleetConfig) -> Self {
        Self::with_transport(config, SystemTransport::new())
    }
}

impl<T: Transport> FleetScanner<T> {
    /// Scanner over a custom transport.
    pub fn with_transport(config: FleetConfig, transport: T) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let runner = CommandRunner::new(transport, config.dry_run);
        Self {
            config: Arc::new(config),
            runner: Arc::new(runner),
            events,
        }
    }

    /// Subscribe to progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn runner(&self) -> &CommandRunner<T> {
        &self.runner
    }

    /// Scan every unit and collect one result per host, in completion order.
    ///
    /// A host whose scan task panics is reported as a failed result; it
    /// never takes other hosts down.
    pub async fn scan(&self) -> Vec<HostResult> {
        let units: Vec<Option<HostProfile>> = if self.config.local {
            vec![None]
        } else {
            self.config.hosts.iter().cloned().map(Some).collect()
        };

        let total = units.len();
        let mut tracker = ProgressTracker::new(total);
        let semaphore = Arc::new(Semaphore::new(self.config.parallel.max(1)));
        let mut tasks = JoinSet::new();
        let mut pending: Vec<String> = Vec::with_capacity(total);

        info!(hosts = total, parallel = self.config.parallel, dry_run = self.config.dry_run, "Starting fleet scan");

        for unit in units {
            let name = unit.as_ref().map_or(LOCAL_HOST_NAME, |h| h.name.as_str()).to_string();
            pending.push(name.clone());

            let config = Arc::clone(&self.config);
            let runner = Arc::clone(&self.runner);
            let events = self.events.clone();
            let semaphore = Arc::clone(&semaphore);
            let span = tracing::info_span!("host", host = %name);

            tasks.spawn(
                async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return HostResult::failed(&name, "worker pool closed");
                    };
                    let _ = events.send(ScanEvent::HostStarted { host: name.clone() });

                    let worker = tokio::spawn(async move {
                        scan_host_with_events(unit.as_ref(), &config, &runner, Some(&events)).await
                    });
                    match worker.await {
                        Ok(result) => result,
                        Err(err) => {
                            let reason = join_failure(err);
                            error!(reason = %reason, "Host scan aborted");
                            HostResult::failed(&name, format!("scan aborted: {reason}"))
                        }
                    }
                }
                .instrument(span),
            );
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    if let Some(idx) = pending.iter().position(|n| n == &result.host_name) {
                        pending.swap_remove(idx);
                    }
                    let _ = self.events.send(tracker.finish(&result.host_name, result.success));
                    results.push(result);
                }
                Err(err) => warn!(reason = %join_failure(err), "Scan task lost"),
            }
        }

        // Tasks that vanished without reporting still get a result.
        for name in pending {
            let _ = self.events.send(tracker.finish(&name, false));
            results.push(HostResult::failed(name, "scan task did not report a result"));
        }

        let progress: FleetProgress = tracker.snapshot();
        info!(
            hosts = progress.hosts_total,
            failed = progress.hosts_failed,
            elapsed = ?progress.elapsed,
            "Fleet scan finished"
        );
        results
    }
}

/// Human-readable reason for a task that ended without a result.
fn join_failure(err: JoinError) -> String {
    if !err.is_panic() {
        return "task cancelled".to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}

/// Scan the fleet described by `config` with real processes.
pub async fn scan_fleet(config: FleetConfig) -> Vec<HostResult> {
    FleetScanner::new(config).scan().await
}
