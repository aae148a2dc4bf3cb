//! Fleet scan orchestration for fleetdu.
//!
//! Two layers:
//!
//! - **Host units** run sequentially within a host: size probe, parse,
//!   rank, then optional stale probe and enrichment. See [`scan_path`].
//! - **Fleet fan-out** runs one task per host over a bounded worker pool and
//!   collects every result, converting task panics into failed hosts.
//!
//! ```rust,no_run
//! use fleetdu_core::{FleetConfig, HostProfile};
//! use fleetdu_scan::FleetScanner;
//!
//! # async fn run() {
//! let config = FleetConfig {
//!     hosts: vec![HostProfile::new("db1", vec!["/data".into()])],
//!     ..Default::default()
//! };
//!
//! let scanner = FleetScanner::new(config);
//! let mut events = scanner.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//! });
//!
//! for host in scanner.scan().await {
//!     println!("{}: {}", host.host_name, if host.success { "ok" } else { "failed" });
//! }
//! # }
//! ```

mod fleet;
mod plan;
mod progress;
mod unit;

pub use fleet::{scan_fleet, scan_host, FleetScanner};
pub use plan::{HostPlan, LOCAL_HOST_NAME};
pub use progress::{FleetProgress, ScanEvent};
pub use unit::{scan_path, PathOutcome, Stage, UnitError};

// Re-export core types for convenience
pub use fleetdu_core::{FleetConfig, HostProfile, HostResult, RootSummary};
