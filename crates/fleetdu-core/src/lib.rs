//! Core types and configuration for fleetdu.
//!
//! This crate holds the data passed between the probe runner, the tree
//! analyzer and the fleet scanner: size samples, ranked directories, per-root
//! and per-host results, plus the validated configuration snapshot every scan
//! worker reads from.

mod config;
mod config_file;
mod error;
mod model;
pub mod path;

pub use config::{
    FleetConfig, FleetConfigBuilder, HostProfile, OutputFormat, ProbeFlavor, ReportMode,
    SshSettings, StaleKind, DEFAULT_SSH_OPTIONS,
};
pub use config_file::{ConfigFile, FileDefaults, FileSsh};
pub use error::ConfigError;
pub use model::{DirectoryInfo, HostResult, RootSummary, SizeSample};
