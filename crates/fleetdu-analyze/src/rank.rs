//! Directory tree reconstruction and ranking.
//!
//! The size probe reports recursive totals. The bytes held directly by a
//! directory are its total minus the totals of its immediate children, which
//! is what the file-heavy ratio is built from.

use std::collections::HashMap;

use fleetdu_core::path;
use fleetdu_core::{DirectoryInfo, SizeSample};

/// Bytes held directly by each sampled directory, keyed like `samples` and
/// in the same order.
///
/// Inconsistent samples (children larger than their parent, e.g. when files
/// grew during the probe) floor at zero.
pub fn compute_direct_file_sizes(samples: &SizeSample) -> SizeSample {
    let children = children_sums(samples);

    samples
        .iter()
        .map(|(p, total)| {
            let nested = children.get(p).copied().unwrap_or(0);
            (p, total.saturating_sub(nested))
        })
        .collect()
}

fn children_sums(samples: &SizeSample) -> HashMap<String, u64> {
    let mut sums: HashMap<String, u64> = HashMap::new();
    for (p, size) in samples.iter() {
        let parent = path::parent(p);
        if parent != p {
            let sum = sums.entry(parent).or_default();
            *sum = sum.saturating_add(size);
        }
    }
    sums
}

/// Build a record for `p` with ratio, depth and parent context filled in.
fn directory_info(
    p: &str,
    samples: &SizeSample,
    direct: &SizeSample,
    root: &str,
) -> DirectoryInfo {
    let total = samples.get(p).unwrap_or(0);
    let direct_size = direct.get(p).unwrap_or(0);
    let parent = path::parent(p);
    let parent_total = samples.get(&parent);

    DirectoryInfo::new(p, total, direct_size, path::depth(p, root)).with_parent(parent, parent_total)
}

/// Largest directories under `root` whose file-heavy ratio reaches
/// `threshold`, biggest first, at most `n`.
///
/// Directories with a zero total never qualify. Equal totals keep the
/// order in which the probe listed them.
pub fn rank_by_file_heavy(
    samples: &SizeSample,
    root: &str,
    n: usize,
    threshold: f64,
) -> Vec<DirectoryInfo> {
    let root = path::normalize(root);
    let direct = compute_direct_file_sizes(samples);

    let mut candidates: Vec<DirectoryInfo> = samples
        .iter()
        .filter(|&(p, total)| total > 0 && path::is_within(p, &root))
        .map(|(p, _)| directory_info(p, samples, &direct, &root))
        .filter(|info| info.file_heavy_ratio >= threshold)
        .collect();

    candidates.sort_by(|a, b| b.total_size.cmp(&a.total_size));
    candidates.truncate(n);
    candidates
}

/// Directories under `root` holding the most stale bytes, at most `n`.
///
/// Candidates come from the stale sample; sizes and ratios are looked up in
/// `samples` and are zero for directories below the size probe's depth.
/// Entries with no stale bytes are dropped.
pub fn rank_by_stale(
    stale: &SizeSample,
    samples: &SizeSample,
    root: &str,
    n: usize,
) -> Vec<DirectoryInfo> {
    let root = path::normalize(root);
    let direct = compute_direct_file_sizes(samples);

    let mut candidates: Vec<DirectoryInfo> = stale
        .iter()
        .filter(|&(p, stale_size)| stale_size > 0 && path::is_within(p, &root))
        .map(|(p, stale_size)| directory_info(p, samples, &direct, &root).with_stale(stale_size))
        .collect();

    candidates.sort_by(|a, b| b.stale_size.cmp(&a.stale_size));
    candidates.truncate(n);
    candidates
}
