//! Analysis of raw probe output for fleetdu.
//!
//! The size probe lists recursive totals per directory. From those this
//! crate derives the bytes held directly by each directory, ranks
//! directories by how "file-heavy" they are (or by stale bytes), and
//! attributes per-directory stale sums to the ranked results.
//!
//! ```rust
//! use fleetdu_analyze::{parse_size_samples, RootAnalyzer};
//!
//! let samples = parse_size_samples("10000\t/data\n9000\t/data/logs\n");
//! let summary = RootAnalyzer::new().analyze_sizes("/data", &samples);
//!
//! assert_eq!(summary.total_size, 10000);
//! assert_eq!(summary.top_directories[0].path, "/data/logs");
//! ```

mod analyzer;
mod parse;
mod rank;
mod stale;

pub use analyzer::{root_total, AnalysisConfig, RootAnalyzer};
pub use parse::{count_access_denied, is_access_denied, only_access_denied, parse_size_samples, parse_stale_samples};
pub use rank::{compute_direct_file_sizes, rank_by_file_heavy, rank_by_stale};
pub use stale::{attribute_stale, enrich_with_stale};

// Re-export core types
pub use fleetdu_core::path::depth;
pub use fleetdu_core::{DirectoryInfo, RootSummary, SizeSample};
