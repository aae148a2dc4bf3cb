//! Parsers for raw probe output.

use fleetdu_core::SizeSample;

/// stderr fragments that mark an unreadable path, across `du`/`find`
/// implementations and locales.
const ACCESS_DENIED_MARKERS: &[&str] = &["permission denied", "cannot read", "brak dostępu"];

/// Parse size probe output, one `size<TAB>path` record per line.
///
/// Malformed lines (no tab, non-numeric size) are skipped and counted in
/// [`SizeSample::skipped_lines`]. Blank lines are ignored silently.
pub fn parse_size_samples(raw: &str) -> SizeSample {
    let mut sample = SizeSample::new();

    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        match line.split_once('\t') {
            Some((size, path)) if !path.is_empty() => match size.trim().parse::<u64>() {
                Ok(size) => sample.insert(path, size),
                Err(_) => sample.record_skipped(),
            },
            _ => sample.record_skipped(),
        }
    }

    sample
}

/// Parse stale probe output, one `directory<TAB>bytes` record per line.
///
/// Some awk implementations print large sums in exponent form
/// (`1.23457e+10`), so a non-integer but finite, non-negative number is
/// accepted and rounded.
pub fn parse_stale_samples(raw: &str) -> SizeSample {
    let mut sample = SizeSample::new();

    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        let Some((dir, size)) = line.split_once('\t') else {
            sample.record_skipped();
            continue;
        };

        match parse_byte_count(size.trim()) {
            Some(size) if !dir.is_empty() => sample.insert(dir, size),
            _ => sample.record_skipped(),
        }
    }

    sample
}

fn parse_byte_count(text: &str) -> Option<u64> {
    if let Ok(n) = text.parse::<u64>() {
        return Some(n);
    }
    let n = text.parse::<f64>().ok()?;
    (n.is_finite() && n >= 0.0).then(|| n.round() as u64)
}

/// Whether a stderr line reports an unreadable path.
pub fn is_access_denied(line: &str) -> bool {
    let line = line.to_lowercase();
    ACCESS_DENIED_MARKERS.iter().any(|m| line.contains(m))
}

/// Number of access-denied lines in `stderr`.
pub fn count_access_denied(stderr: &str) -> usize {
    stderr.lines().filter(|l| is_access_denied(l)).count()
}

/// Whether `stderr` is non-empty and made up only of access-denied lines.
pub fn only_access_denied(stderr: &str) -> bool {
    let mut lines = stderr.lines().filter(|l| !l.trim().is_empty()).peekable();
    lines.peek().is_some() && lines.all(is_access_denied)
}
