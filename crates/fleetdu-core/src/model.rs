//! Scan result model shared by the analyzer, the scanner and the report.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::path;

/// Mapping from normalized path to a byte count reported by a probe.
///
/// Used both for recursive directory sizes and for per-directory stale sums.
/// Keys are unique and keep the order in which the probe listed them, which
/// is what ranking falls back on to break ties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeSample {
    entries: IndexMap<String, u64>,
    /// Lines of probe output that could not be parsed.
    #[serde(default)]
    skipped_lines: usize,
}

impl SizeSample {
    /// Create an empty sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a size for `path`, normalizing the key.
    ///
    /// A repeated path keeps its original position and takes the new size.
    pub fn insert(&mut self, path: &str, size: u64) {
        self.entries.insert(path::normalize(path), size);
    }

    /// Size recorded for `path`, if any.
    pub fn get(&self, path: &str) -> Option<u64> {
        self.entries
            .get(path)
            .or_else(|| self.entries.get(&path::normalize(path)))
            .copied()
    }

    /// Whether `path` has a recorded size.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Number of recorded paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no path was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(path, size)` in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(p, s)| (p.as_str(), *s))
    }

    /// Sum of all recorded sizes, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.entries.values().fold(0, |acc, size| acc.saturating_add(*size))
    }

    /// Count one more unparseable probe line.
    pub fn record_skipped(&mut self) {
        self.skipped_lines += 1;
    }

    /// Number of unparseable probe lines seen while building this sample.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Multiply every size by `unit` (e.g. 1024 for KiB-reporting probes).
    pub fn scaled(mut self, unit: u64) -> Self {
        if unit != 1 {
            for size in self.entries.values_mut() {
                *size = size.saturating_mul(unit);
            }
        }
        self
    }
}

impl<S: AsRef<str>> FromIterator<(S, u64)> for SizeSample {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut sample = Self::new();
        for (path, size) in iter {
            sample.insert(path.as_ref(), size);
        }
        sample
    }
}

/// One ranked candidate directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryInfo {
    /// Normalized directory path.
    pub path: String,
    /// Recursive size in bytes, as reported by the size probe.
    pub total_size: u64,
    /// Bytes held by files directly inside this directory.
    pub direct_files_size: u64,
    /// `direct_files_size / total_size`, 0.0 for empty directories.
    pub file_heavy_ratio: f64,
    /// Bytes in stale files, when stale analysis ran.
    pub stale_size: Option<u64>,
    /// Parent directory, for context.
    pub parent_path: Option<String>,
    /// Recursive size of the parent, when the probe reported it.
    pub parent_total_size: Option<u64>,
    /// Segments below the scan root (0 at the root).
    pub depth: u32,
}

impl DirectoryInfo {
    /// Create a directory record. `direct_files_size` is clamped to
    /// `total_size` so the ratio stays within `[0, 1]`.
    pub fn new(path: impl Into<String>, total_size: u64, direct_files_size: u64, depth: u32) -> Self {
        let direct_files_size = direct_files_size.min(total_size);
        let file_heavy_ratio = if total_size == 0 {
            0.0
        } else {
            direct_files_size as f64 / total_size as f64
        };

        Self {
            path: path.into(),
            total_size,
            direct_files_size,
            file_heavy_ratio,
            stale_size: None,
            parent_path: None,
            parent_total_size: None,
            depth,
        }
    }

    /// Attach parent context.
    pub fn with_parent(mut self, parent_path: impl Into<String>, parent_total_size: Option<u64>) -> Self {
        self.parent_path = Some(parent_path.into());
        self.parent_total_size = parent_total_size;
        self
    }

    /// Attach a stale size.
    pub fn with_stale(mut self, stale_size: u64) -> Self {
        self.stale_size = Some(stale_size);
        self
    }
}

/// Result for one scanned root path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootSummary {
    /// Root path as configured.
    pub path: String,
    /// Recursive size of the root.
    pub total_size: u64,
    /// Bytes in stale files under the root, when stale analysis ran.
    pub stale_size: Option<u64>,
    /// Ranked directories, best first, bounded to top N.
    pub top_directories: Vec<DirectoryInfo>,
    /// Non-fatal problems met while scanning this root.
    pub warnings: Vec<String>,
    /// Set when the sizes come from a partial scan.
    pub approx: bool,
}

impl RootSummary {
    /// Create an empty summary for `path`.
    pub fn new(path: impl Into<String>, total_size: u64) -> Self {
        Self {
            path: path.into(),
            total_size,
            ..Default::default()
        }
    }

    /// Summary for a root whose scan failed before analysis.
    pub fn failed(path: impl Into<String>, warning: impl Into<String>) -> Self {
        let mut summary = Self::new(path, 0);
        summary.warnings.push(warning.into());
        summary
    }

    /// Record a warning.
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Result for one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostResult {
    /// Host name (`localhost` in local mode).
    pub host_name: String,
    /// One summary per configured path, in configured order.
    pub roots: Vec<RootSummary>,
    /// Fatal errors for this host.
    pub errors: Vec<String>,
    /// False when any path failed.
    pub success: bool,
}

impl HostResult {
    /// Create an empty, successful result.
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            roots: Vec::new(),
            errors: Vec::new(),
            success: true,
        }
    }

    /// Result for a host whose scan could not complete at all.
    pub fn failed(host_name: impl Into<String>, error: impl Into<String>) -> Self {
        let mut result = Self::new(host_name);
        result.errors.push(error.into());
        result.success = false;
        result
    }

    /// Record the outcome of one path.
    pub fn record(&mut self, summary: RootSummary, error: Option<String>) {
        if let Some(error) = error {
            self.errors.push(error);
            self.success = false;
        }
        self.roots.push(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_keeps_first_position_on_duplicate() {
        let mut sample = SizeSample::new();
        sample.insert("/a", 1);
        sample.insert("/b", 2);
        sample.insert("/a/", 3);

        let paths: Vec<_> = sample.iter().collect();
        assert_eq!(paths, vec![("/a", 3), ("/b", 2)]);
    }

    #[test]
    fn test_directory_info_ratio() {
        let info = DirectoryInfo::new("/d", 4000, 1000, 1);
        assert!((info.file_heavy_ratio - 0.25).abs() < f64::EPSILON);

        let empty = DirectoryInfo::new("/e", 0, 0, 1);
        assert_eq!(empty.file_heavy_ratio, 0.0);

        let clamped = DirectoryInfo::new("/f", 10, 50, 1);
        assert_eq!(clamped.direct_files_size, 10);
        assert_eq!(clamped.file_heavy_ratio, 1.0);
    }

    #[test]
    fn test_host_result_record() {
        let mut result = HostResult::new("h1");
        result.record(RootSummary::new("/a", 10), None);
        assert!(result.success);

        result.record(RootSummary::failed("/b", "boom"), Some("du failed".into()));
        assert!(!result.success);
        assert_eq!(result.roots.len(), 2);
        assert_eq!(result.errors, vec!["du failed".to_string()]);
    }
}
