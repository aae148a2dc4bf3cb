//! Fleet scan progress reporting.

use std::time::{Duration, Instant};

/// Progress notifications broadcast while a fleet scan runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// A worker slot picked up a host.
    HostStarted { host: String },
    /// One root path of a host finished, successfully or not.
    PathFinished { host: String, path: String, success: bool },
    /// A host finished; `completed` of `total` hosts are done.
    HostFinished {
        host: String,
        success: bool,
        completed: usize,
        total: usize,
    },
}

/// Snapshot of fleet progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetProgress {
    pub hosts_total: usize,
    pub hosts_completed: usize,
    pub hosts_failed: usize,
    pub elapsed: Duration,
}

impl FleetProgress {
    /// Completed share of the fleet in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.hosts_total == 0 {
            1.0
        } else {
            self.hosts_completed as f64 / self.hosts_total as f64
        }
    }
}

/// Counts finished hosts for one fleet scan.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    total: usize,
    completed: usize,
    failed: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            start_time: Instant::now(),
            total,
            completed: 0,
            failed: 0,
        }
    }

    /// Record a finished host and build its event.
    pub fn finish(&mut self, host: &str, success: bool) -> ScanEvent {
        self.completed += 1;
        if !success {
            self.failed += 1;
        }
        ScanEvent::HostFinished {
            host: host.to_string(),
            success,
            completed: self.completed,
            total: self.total,
        }
    }

    pub fn snapshot(&self) -> FleetProgress {
        FleetProgress {
            hosts_total: self.total,
            hosts_completed: self.completed,
            hosts_failed: self.failed,
            elapsed: self.start_time.elapsed(),
        }
    }
}
