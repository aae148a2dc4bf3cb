//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use fleetdu_core::{OutputFormat, ProbeFlavor, ReportMode, StaleKind};

#[derive(Debug, Parser)]
#[command(
    name = "fleetdu",
    version,
    about = "Find file-heavy and stale directories across a fleet of hosts",
    long_about = "fleetdu runs du and find on each host (locally or over ssh), ranks \
                  directories whose bytes sit directly in them, and reports how much of \
                  that data has not been touched for a while.",
    after_help = "Examples:\n  \
                  fleetdu --local --paths /data /home --top-n 5\n  \
                  fleetdu --config fleet.toml\n  \
                  fleetdu --config fleet.toml --dry-run --verbose\n  \
                  fleetdu --host server1 --paths /data --ssh-user admin"
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// Scan this machine instead of remote hosts
    #[arg(short, long, help_heading = "Configuration")]
    pub local: bool,

    /// Host to scan (repeatable)
    #[arg(long = "host", value_name = "HOST", help_heading = "Configuration")]
    pub hosts: Vec<String>,

    /// Paths to scan
    #[arg(short, long, num_args = 1.., value_name = "PATH", help_heading = "Configuration")]
    pub paths: Vec<String>,

    /// Number of ranked directories per root [default: 20]
    #[arg(short = 'n', long, value_name = "N", help_heading = "Scan")]
    pub top_n: Option<usize>,

    /// Minimum file-heavy ratio [default: 0.8]
    #[arg(short = 't', long, value_name = "RATIO", help_heading = "Scan")]
    pub file_heavy_threshold: Option<f64>,

    /// Depth passed to du [default: 20]
    #[arg(short = 'd', long, value_name = "DEPTH", help_heading = "Scan")]
    pub scan_depth: Option<u32>,

    /// Exclusion pattern (repeatable)
    #[arg(short, long = "exclude", value_name = "PATTERN", help_heading = "Scan")]
    pub excludes: Vec<String>,

    /// Let probes cross filesystem boundaries
    #[arg(long, help_heading = "Scan")]
    pub cross_filesystems: bool,

    /// Rank by file-heavy size or by stale bytes [default: size]
    #[arg(short, long, value_name = "MODE", help_heading = "Scan")]
    pub mode: Option<ReportMode>,

    /// Utility family on the hosts: gnu or bsd [default: gnu]
    #[arg(long, value_name = "FLAVOR", help_heading = "Scan")]
    pub flavor: Option<ProbeFlavor>,

    /// du binary [default: du]
    #[arg(long, value_name = "PATH", help_heading = "Scan")]
    pub du_command: Option<String>,

    /// find binary [default: find]
    #[arg(long, value_name = "PATH", help_heading = "Scan")]
    pub find_command: Option<String>,

    /// Age in days after which a file is stale; 0 disables [default: 365]
    #[arg(long, value_name = "DAYS", help_heading = "Stale analysis")]
    pub stale_days: Option<u32>,

    /// Timestamp used for staleness: mtime, atime or ctime [default: mtime]
    #[arg(long, value_name = "KIND", help_heading = "Stale analysis")]
    pub stale_kind: Option<StaleKind>,

    /// Report format: text, json or csv [default: text]
    #[arg(short, long, value_name = "FORMAT", help_heading = "Output")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE", help_heading = "Output")]
    pub output: Option<PathBuf>,

    /// ssh user
    #[arg(long, value_name = "USER", help_heading = "SSH")]
    pub ssh_user: Option<String>,

    /// ssh port [default: 22]
    #[arg(long, value_name = "PORT", help_heading = "SSH")]
    pub ssh_port: Option<u16>,

    /// Extra ssh client options, whitespace separated
    #[arg(long, value_name = "OPTIONS", allow_hyphen_values = true, help_heading = "SSH")]
    pub ssh_options: Option<String>,

    /// Hosts scanned at once [default: 10]
    #[arg(long, value_name = "K", help_heading = "Execution")]
    pub parallel: Option<usize>,

    /// Per-command timeout in seconds [default: 1800]
    #[arg(long, value_name = "SECS", help_heading = "Execution")]
    pub timeout: Option<u64>,

    /// Print the commands instead of running them
    #[arg(long, help_heading = "Execution")]
    pub dry_run: bool,

    /// Debug logging and extra warnings
    #[arg(short, long, help_heading = "Execution")]
    pub verbose: bool,
}
