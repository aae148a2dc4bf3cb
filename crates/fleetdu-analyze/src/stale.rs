//! Attaching stale-file sizes to ranked directories.

use fleetdu_core::path;
use fleetdu_core::{DirectoryInfo, RootSummary, SizeSample};

/// Credit per-directory stale sums to the ranked directories.
///
/// Each stale directory counts towards its innermost ranked ancestor (or
/// itself, when ranked). When ranked directories nest, the deeper one
/// absorbs the bytes and the outer one does not see them again. Ranked
/// directories that received nothing map to 0; stale directories with no
/// ranked ancestor are not attributed anywhere.
pub fn attribute_stale(stale: &SizeSample, ranked: &[DirectoryInfo]) -> SizeSample {
    let mut credited: SizeSample = ranked.iter().map(|d| (d.path.as_str(), 0)).collect();
    if credited.is_empty() {
        return credited;
    }

    for (dir, size) in stale.iter() {
        if let Some(owner) = innermost_ranked(dir, &credited) {
            let current = credited.get(&owner).unwrap_or(0);
            credited.insert(&owner, current.saturating_add(size));
        }
    }

    credited
}

/// Walk up from `dir` until a ranked path is found.
fn innermost_ranked(dir: &str, ranked: &SizeSample) -> Option<String> {
    let mut current = path::normalize(dir);
    loop {
        if ranked.contains(&current) {
            return Some(current);
        }
        let parent = path::parent(&current);
        if parent == current {
            return None;
        }
        current = parent;
    }
}

/// Attach stale sizes to a summary without re-ranking.
///
/// `root_stale` becomes the root's stale size; ranked directories whose
/// path appears in `stale_by_path` take that value.
pub fn enrich_with_stale(summary: &mut RootSummary, stale_by_path: &SizeSample, root_stale: Option<u64>) {
    summary.stale_size = root_stale;

    for dir in &mut summary.top_directories {
        if let Some(stale) = stale_by_path.get(&dir.path) {
            dir.stale_size = Some(stale);
        }
    }
}
