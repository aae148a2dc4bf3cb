//! Report rendering: text, JSON and CSV.

use std::path::Path;

use chrono::{DateTime, Local, Utc};
use color_eyre::eyre::{Context, Result};
use serde::Serialize;

use fleetdu_core::{DirectoryInfo, FleetConfig, HostResult, OutputFormat, ReportMode, RootSummary, StaleKind};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Warnings shown per root in the text report.
const TEXT_WARNING_LIMIT: usize = 5;

/// A finished fleet scan, ready to render.
pub struct Report<'a> {
    results: &'a [HostResult],
    config: &'a FleetConfig,
    generated_at: DateTime<Utc>,
}

impl<'a> Report<'a> {
    pub fn new(results: &'a [HostResult], config: &'a FleetConfig) -> Self {
        Self {
            results,
            config,
            generated_at: Utc::now(),
        }
    }

    /// Override the generation time.
    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    /// Render in the configured output format.
    pub fn render(&self) -> Result<String> {
        match self.config.output_format {
            OutputFormat::Text => Ok(self.text()),
            OutputFormat::Json => self.json(),
            OutputFormat::Csv => self.csv(),
        }
    }

    fn text(&self) -> String {
        let config = self.config;
        let rule = "=".repeat(70);
        let mut lines = vec![
            rule.clone(),
            " FLEET DISK USAGE REPORT".to_string(),
            rule.clone(),
            format!(
                " Generated: {}",
                self.generated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            ),
            format!(" Version: {VERSION}"),
            format!(
                " Mode: {} | Top N: {} | File-heavy threshold: {}",
                config.report_mode, config.top_n, config.file_heavy_threshold
            ),
            format!(" Stale: older than {} days ({})", config.stale_days, config.stale_kind),
        ];

        for host in self.results {
            lines.push(String::new());
            lines.push(rule.clone());
            let label = if config.local {
                host.host_name.to_uppercase()
            } else {
                host.host_name.clone()
            };
            lines.push(format!(" HOST: {label}{}", if host.success { "" } else { " [FAILED]" }));
            lines.push(rule.clone());

            if !host.errors.is_empty() {
                lines.push(String::new());
                lines.push(" Errors:".to_string());
                lines.extend(host.errors.iter().map(|e| format!("   ✗ {e}")));
            }

            for root in &host.roots {
                lines.push(String::new());
                text_root(&mut lines, root, config);
            }
        }

        lines.push(String::new());
        lines.push(rule);
        lines.join("\n") + "\n"
    }

    fn json(&self) -> Result<String> {
        let report = JsonReport {
            metadata: Metadata {
                version: VERSION,
                timestamp: self.generated_at.to_rfc3339(),
                parameters: Parameters {
                    report_mode: self.config.report_mode,
                    top_n: self.config.top_n,
                    file_heavy_threshold: self.config.file_heavy_threshold,
                    scan_depth: self.config.scan_depth,
                    stale_days: self.config.stale_days,
                    stale_kind: self.config.stale_kind,
                    excludes: &self.config.excludes,
                },
            },
            hosts: self.results.iter().map(JsonHost::from).collect(),
        };
        serde_json::to_string_pretty(&report).wrap_err("Failed to serialize JSON report")
    }

    fn csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "host",
            "root",
            "path",
            "total_size_bytes",
            "total_size_human",
            "direct_files_size_bytes",
            "file_heavy_ratio",
            "stale_size_bytes",
            "parent_path",
            "parent_total_size_bytes",
            "depth",
        ])?;

        for host in self.results {
            for root in &host.roots {
                for dir in &root.top_directories {
                    writer.write_record([
                        host.host_name.clone(),
                        root.path.clone(),
                        dir.path.clone(),
                        dir.total_size.to_string(),
                        format_size(dir.total_size),
                        dir.direct_files_size.to_string(),
                        round_ratio(dir.file_heavy_ratio).to_string(),
                        dir.stale_size.map(|s| s.to_string()).unwrap_or_default(),
                        dir.parent_path.clone().unwrap_or_default(),
                        dir.parent_total_size.map(|s| s.to_string()).unwrap_or_default(),
                        dir.depth.to_string(),
                    ])?;
                }
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .wrap_err("Failed to flush CSV report")?;
        String::from_utf8(bytes).wrap_err("CSV report is not valid UTF-8")
    }
}

fn text_root(lines: &mut Vec<String>, root: &RootSummary, config: &FleetConfig) {
    let stale = root
        .stale_size
        .map(|s| format!(", stale > {} days: {}", config.stale_days, format_size(s)))
        .unwrap_or_default();
    let approx = if root.approx { " [APPROX]" } else { "" };

    lines.push(format!(" ROOT: {}", root.path));
    lines.push(format!("   Size: {}{stale}{approx}", format_size(root.total_size)));
    lines.push(format!(" {}", "─".repeat(60)));

    if !root.warnings.is_empty() {
        lines.push("   Warnings:".to_string());
        lines.extend(
            root.warnings
                .iter()
                .take(TEXT_WARNING_LIMIT)
                .map(|w| format!("     ⚠ {w}")),
        );
        let hidden = root.warnings.len().saturating_sub(TEXT_WARNING_LIMIT);
        if hidden > 0 {
            lines.push(format!("     ... and {hidden} more"));
        }
        lines.push(String::new());
    }

    if root.top_directories.is_empty() {
        lines.push(match config.report_mode {
            ReportMode::Size => "   No directories meet the file-heavy criteria.".to_string(),
            ReportMode::Stale => "   No stale files found.".to_string(),
        });
        return;
    }

    for (i, dir) in root.top_directories.iter().enumerate() {
        text_directory(lines, i + 1, dir, config.stale_days);
    }
}

fn text_directory(lines: &mut Vec<String>, rank: usize, dir: &DirectoryInfo, stale_days: u32) {
    let stale = dir
        .stale_size
        .map(|s| format!(" (stale > {stale_days} days: {})", format_size(s)))
        .unwrap_or_default();

    lines.push(format!("  {rank:3}. {}", dir.path));
    lines.push(format!("       Size: {}{stale}", format_size(dir.total_size)));
    lines.push(format!(
        "       Direct files: {} ({:.0}%)",
        format_size(dir.direct_files_size),
        dir.file_heavy_ratio * 100.0
    ));
    if let (Some(parent), Some(parent_size)) = (&dir.parent_path, dir.parent_total_size) {
        lines.push(format!("       Parent: {parent} ({})", format_size(parent_size)));
    }
    lines.push(String::new());
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

fn round_ratio(ratio: f64) -> f64 {
    (ratio * 1000.0).round() / 1000.0
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: Metadata<'a>,
    hosts: Vec<JsonHost<'a>>,
}

#[derive(Serialize)]
struct Metadata<'a> {
    version: &'static str,
    timestamp: String,
    parameters: Parameters<'a>,
}

#[derive(Serialize)]
struct Parameters<'a> {
    report_mode: ReportMode,
    top_n: usize,
    file_heavy_threshold: f64,
    scan_depth: u32,
    stale_days: u32,
    stale_kind: StaleKind,
    excludes: &'a [String],
}

#[derive(Serialize)]
struct JsonHost<'a> {
    name: &'a str,
    success: bool,
    errors: &'a [String],
    roots: Vec<JsonRoot<'a>>,
}

impl<'a> From<&'a HostResult> for JsonHost<'a> {
    fn from(host: &'a HostResult) -> Self {
        Self {
            name: &host.host_name,
            success: host.success,
            errors: &host.errors,
            roots: host.roots.iter().map(JsonRoot::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct JsonRoot<'a> {
    path: &'a str,
    total_size_bytes: u64,
    total_size_human: String,
    stale_size_bytes: Option<u64>,
    stale_size_human: Option<String>,
    approx: bool,
    warnings: &'a [String],
    directories: Vec<JsonDirectory<'a>>,
}

impl<'a> From<&'a RootSummary> for JsonRoot<'a> {
    fn from(root: &'a RootSummary) -> Self {
        Self {
            path: &root.path,
            total_size_bytes: root.total_size,
            total_size_human: format_size(root.total_size),
            stale_size_bytes: root.stale_size,
            stale_size_human: root.stale_size.map(format_size),
            approx: root.approx,
            warnings: &root.warnings,
            directories: root.top_directories.iter().map(JsonDirectory::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct JsonDirectory<'a> {
    path: &'a str,
    total_size_bytes: u64,
    total_size_human: String,
    direct_files_size_bytes: u64,
    direct_files_size_human: String,
    file_heavy_ratio: f64,
    stale_size_bytes: Option<u64>,
    stale_size_human: Option<String>,
    parent_path: Option<&'a str>,
    parent_total_size_bytes: Option<u64>,
    parent_total_size_human: Option<String>,
    depth: u32,
}

impl<'a> From<&'a DirectoryInfo> for JsonDirectory<'a> {
    fn from(dir: &'a DirectoryInfo) -> Self {
        Self {
            path: &dir.path,
            total_size_bytes: dir.total_size,
            total_size_human: format_size(dir.total_size),
            direct_files_size_bytes: dir.direct_files_size,
            direct_files_size_human: format_size(dir.direct_files_size),
            file_heavy_ratio: round_ratio(dir.file_heavy_ratio),
            stale_size_bytes: dir.stale_size,
            stale_size_human: dir.stale_size.map(format_size),
            parent_path: dir.parent_path.as_deref(),
            parent_total_size_bytes: dir.parent_total_size,
            parent_total_size_human: dir.parent_total_size.map(format_size),
            depth: dir.depth,
        }
    }
}

/// Write `report` to `output`, or to stdout.
pub fn write(report: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, report).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => print!("{report}"),
    }
    Ok(())
}
