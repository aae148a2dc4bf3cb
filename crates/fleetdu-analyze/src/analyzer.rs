//! Per-root analysis: from parsed samples to a [`RootSummary`].

use tracing::debug;

use fleetdu_core::path;
use fleetdu_core::{FleetConfig, RootSummary, SizeSample};

use crate::rank::{rank_by_file_heavy, rank_by_stale};
use crate::stale::{attribute_stale, enrich_with_stale};

/// Ranking parameters for one root, taken from the fleet configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Maximum number of ranked directories.
    pub top_n: usize,

    /// Minimum file-heavy ratio for size ranking.
    pub file_heavy_threshold: f64,

    /// Report skipped probe lines as warnings.
    pub verbose: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: 20,
            file_heavy_threshold: 0.8,
            verbose: false,
        }
    }
}

impl From<&FleetConfig> for AnalysisConfig {
    fn from(config: &FleetConfig) -> Self {
        Self {
            top_n: config.top_n,
            file_heavy_threshold: config.file_heavy_threshold,
            verbose: config.verbose,
        }
    }
}

/// Turns parsed probe samples into root summaries.
#[derive(Debug, Clone, Default)]
pub struct RootAnalyzer {
    config: AnalysisConfig,
}

impl RootAnalyzer {
    /// Create an analyzer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with custom settings.
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Rank the file-heavy directories of `root`.
    pub fn analyze_sizes(&self, root: &str, samples: &SizeSample) -> RootSummary {
        let mut summary = RootSummary::new(root, root_total(samples, root));
        summary.top_directories = rank_by_file_heavy(
            samples,
            root,
            self.config.top_n,
            self.config.file_heavy_threshold,
        );
        self.note_skipped(&mut summary, samples, "size probe");

        debug!(
            root,
            total = summary.total_size,
            ranked = summary.top_directories.len(),
            "Ranked by file-heavy ratio"
        );
        summary
    }

    /// Rank the directories of `root` by stale bytes.
    pub fn analyze_stale(&self, root: &str, samples: &SizeSample, stale: &SizeSample) -> RootSummary {
        let mut summary = RootSummary::new(root, root_total(samples, root));
        summary.top_directories = rank_by_stale(stale, samples, root, self.config.top_n);
        summary.stale_size = Some(stale.total());
        self.note_skipped(&mut summary, samples, "size probe");
        self.note_skipped(&mut summary, stale, "stale probe");

        debug!(
            root,
            stale = stale.total(),
            ranked = summary.top_directories.len(),
            "Ranked by stale size"
        );
        summary
    }

    /// Attribute stale sums to the already ranked directories of `summary`.
    pub fn enrich(&self, summary: &mut RootSummary, stale: &SizeSample) {
        let credited = attribute_stale(stale, &summary.top_directories);
        enrich_with_stale(summary, &credited, Some(stale.total()));
        self.note_skipped(summary, stale, "stale probe");
    }

    fn note_skipped(&self, summary: &mut RootSummary, sample: &SizeSample, probe: &str) {
        let skipped = sample.skipped_lines();
        if self.config.verbose && skipped > 0 {
            summary.warn(format!("{skipped} unparseable line(s) skipped in {probe} output"));
        }
    }
}

/// Recursive size of `root`: the probe's own record for it, or the largest
/// total reported within it when the root line is missing.
pub fn root_total(samples: &SizeSample, root: &str) -> u64 {
    samples.get(root).unwrap_or_else(|| {
        samples
            .iter()
            .filter(|(p, _)| path::is_within(p, root))
            .map(|(_, size)| size)
            .max()
            .unwrap_or(0)
    })
}
