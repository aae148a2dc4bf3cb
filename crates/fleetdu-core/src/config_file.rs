//! On-disk TOML configuration.
//!
//! ```toml
//! [defaults]
//! paths = ["/data"]
//! top_n = 10
//! stale_days = 180
//!
//! [ssh]
//! user = "monitor"
//! options = ["-o", "BatchMode=yes"]
//!
//! [[hosts]]
//! name = "db1"
//! paths = ["/var/lib/pgsql"]
//! flavor = "bsd"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{HostProfile, OutputFormat, ProbeFlavor, ReportMode, StaleKind};
use crate::error::ConfigError;

/// Parsed config file. Every value is optional so that command-line flags
/// can take precedence over it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub defaults: FileDefaults,
    pub ssh: FileSsh,
    pub hosts: Vec<HostProfile>,
}

/// `[defaults]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileDefaults {
    pub paths: Vec<String>,
    pub excludes: Vec<String>,
    pub local: Option<bool>,
    pub top_n: Option<usize>,
    pub file_heavy_threshold: Option<f64>,
    pub scan_depth: Option<u32>,
    pub stale_days: Option<u32>,
    pub stale_kind: Option<StaleKind>,
    pub report_mode: Option<ReportMode>,
    pub format: Option<OutputFormat>,
    pub single_filesystem: Option<bool>,
    pub parallel: Option<usize>,
    pub timeout: Option<u64>,
    pub dry_run: Option<bool>,
    pub verbose: Option<bool>,
    pub du_command: Option<String>,
    pub find_command: Option<String>,
    pub flavor: Option<ProbeFlavor>,
}

/// `[ssh]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSsh {
    pub user: Option<String>,
    pub port: Option<u16>,
    pub options: Option<Vec<String>>,
}

impl ConfigFile {
    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
