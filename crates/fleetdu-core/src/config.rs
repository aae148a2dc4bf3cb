//! Fleet scan configuration types.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::ConfigError;

/// Options passed to the ssh client when none are configured.
pub const DEFAULT_SSH_OPTIONS: &[&str] = &[
    "-o",
    "BatchMode=yes",
    "-o",
    "ConnectTimeout=10",
    "-o",
    "StrictHostKeyChecking=accept-new",
];

/// Fragments that must never appear in ssh options.
const SHELL_METACHARACTERS: &[&str] = &["`", "$", "&&", "||", ";", "|", ">", "<"];

/// File timestamp used to decide whether a file is stale.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StaleKind {
    /// Last modification time.
    #[default]
    Mtime,
    /// Last access time.
    Atime,
    /// Last status change time.
    Ctime,
}

impl StaleKind {
    /// The `find` predicate for this timestamp.
    pub fn find_predicate(self) -> &'static str {
        match self {
            Self::Mtime => "-mtime",
            Self::Atime => "-atime",
            Self::Ctime => "-ctime",
        }
    }
}

/// Which signal ranks the top directories of each root.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReportMode {
    /// Rank by total size among file-heavy directories.
    #[default]
    Size,
    /// Rank by bytes in stale files.
    Stale,
}

/// Report output format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Family of `du`/`find` utilities available on a host.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProbeFlavor {
    /// GNU coreutils and findutils.
    #[default]
    Gnu,
    /// BSD, macOS and other POSIX-only utilities.
    Bsd,
}

/// Global ssh transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshSettings {
    /// Remote user (None = ssh client default).
    pub user: Option<String>,
    /// Remote port.
    pub port: u16,
    /// Extra ssh client arguments, one argument per element.
    pub options: Vec<String>,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            user: None,
            port: 22,
            options: DEFAULT_SSH_OPTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One remote host with optional per-host overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProfile {
    /// Name used in reports, and the ssh destination unless `ssh_host` is set.
    pub name: String,
    /// Root paths to scan on this host.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Exclusions added to the global list.
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub scan_depth: Option<u32>,
    #[serde(default)]
    pub ssh_user: Option<String>,
    #[serde(default)]
    pub ssh_port: Option<u16>,
    #[serde(default)]
    pub ssh_host: Option<String>,
    /// Path to `du` on this host (e.g. `/opt/freeware/bin/du`).
    #[serde(default)]
    pub du_command: Option<String>,
    #[serde(default)]
    pub find_command: Option<String>,
    #[serde(default)]
    pub flavor: Option<ProbeFlavor>,
}

impl HostProfile {
    /// Create a host with the given paths and no overrides.
    pub fn new(name: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            name: name.into(),
            paths,
            ..Default::default()
        }
    }

    /// ssh destination host (defaults to the name).
    pub fn ssh_destination(&self) -> &str {
        self.ssh_host.as_deref().unwrap_or(&self.name)
    }
}

/// Complete, read-only configuration snapshot for one fleet scan.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(error = "ConfigError"))]
#[serde(default)]
pub struct FleetConfig {
    /// Remote hosts (ignored in local mode).
    #[builder(default)]
    pub hosts: Vec<HostProfile>,

    /// Paths for local mode.
    #[builder(default)]
    pub paths: Vec<String>,

    /// Scan the local machine instead of remote hosts.
    #[builder(default = "false")]
    pub local: bool,

    /// Number of ranked directories kept per root.
    #[builder(default = "20")]
    pub top_n: usize,

    /// Minimum file-heavy ratio for a directory to be ranked.
    #[builder(default = "0.8")]
    pub file_heavy_threshold: f64,

    /// Depth bound passed to the size probe.
    #[builder(default = "20")]
    pub scan_depth: u32,

    /// Files older than this many days are stale (0 disables enrichment).
    #[builder(default = "365")]
    pub stale_days: u32,

    #[builder(default)]
    pub stale_kind: StaleKind,

    #[builder(default)]
    pub report_mode: ReportMode,

    #[builder(default)]
    pub output_format: OutputFormat,

    /// Global exclusion patterns passed to the size probe.
    #[builder(default)]
    pub excludes: Vec<String>,

    /// Keep probes on the filesystem of each root.
    #[builder(default = "true")]
    pub single_filesystem: bool,

    /// Maximum number of hosts scanned at once.
    #[builder(default = "10")]
    pub parallel: usize,

    /// Per-command timeout in seconds.
    #[builder(default = "1800")]
    pub timeout_secs: u64,

    /// Resolve and report commands without running them.
    #[builder(default = "false")]
    pub dry_run: bool,

    #[builder(default = "false")]
    pub verbose: bool,

    #[builder(default)]
    pub ssh: SshSettings,

    /// Default `du` binary.
    #[builder(default = "\"du\".to_string()")]
    pub du_command: String,

    /// Default `find` binary.
    #[builder(default = "\"find\".to_string()")]
    pub find_command: String,

    /// Default probe flavor.
    #[builder(default)]
    pub flavor: ProbeFlavor,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            paths: Vec::new(),
            local: false,
            top_n: 20,
            file_heavy_threshold: 0.8,
            scan_depth: 20,
            stale_days: 365,
            stale_kind: StaleKind::default(),
            report_mode: ReportMode::default(),
            output_format: OutputFormat::default(),
            excludes: Vec::new(),
            single_filesystem: true,
            parallel: 10,
            timeout_secs: 1800,
            dry_run: false,
            verbose: false,
            ssh: SshSettings::default(),
            du_command: "du".to_string(),
            find_command: "find".to_string(),
            flavor: ProbeFlavor::default(),
        }
    }
}

impl FleetConfig {
    /// Create a new config builder.
    ///
    /// `build` only fills in defaults; call [`validate`](Self::validate)
    /// before scanning.
    pub fn builder() -> FleetConfigBuilder {
        FleetConfigBuilder::default()
    }

    /// Per-command timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether stale enrichment runs in size mode.
    pub fn stale_enabled(&self) -> bool {
        self.stale_days > 0
    }

    /// Check every setting, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.local {
            if self.paths.is_empty() {
                problems.push("no paths to scan; pass --paths".to_string());
            }
        } else {
            if self.hosts.is_empty() {
                problems.push("no hosts to scan; pass --host or --local".to_string());
            }
            for host in &self.hosts {
                check_ssh_word(&mut problems, "host name", &host.name);
                if host.paths.is_empty() {
                    problems.push(format!("host {} has no paths", host.name));
                }
                if let Some(ssh_host) = &host.ssh_host {
                    check_ssh_word(&mut problems, "ssh_host", ssh_host);
                }
                if let Some(user) = &host.ssh_user {
                    check_ssh_word(&mut problems, "ssh_user", user);
                }
                if host.scan_depth == Some(0) {
                    problems.push(format!("host {} scan_depth must be >= 1", host.name));
                }
            }
        }

        if self.top_n < 1 {
            problems.push("top_n must be >= 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.file_heavy_threshold) {
            problems.push("file_heavy_threshold must be within 0.0-1.0".to_string());
        }
        if self.scan_depth < 1 {
            problems.push("scan_depth must be >= 1".to_string());
        }
        if self.parallel < 1 {
            problems.push("parallel must be >= 1".to_string());
        }
        if self.timeout_secs < 1 {
            problems.push("timeout must be >= 1 second".to_string());
        }
        if let Some(user) = &self.ssh.user {
            check_ssh_word(&mut problems, "ssh user", user);
        }
        if let Some(bad) = self
            .ssh
            .options
            .iter()
            .find_map(|opt| SHELL_METACHARACTERS.iter().find(|m| opt.contains(**m)))
        {
            problems.push(format!("ssh options contain a forbidden character: {bad}"));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }
}

fn check_ssh_word(problems: &mut Vec<String>, what: &str, value: &str) {
    if value.trim().is_empty() {
        problems.push(format!("{what} must not be empty"));
    } else if value.starts_with('-') {
        problems.push(format!("{what} must not start with '-': {value}"));
    }
}
