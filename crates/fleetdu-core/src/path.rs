//! POSIX path helpers for paths reported by remote probes.
//!
//! Probe output describes paths on another machine, so none of these helpers
//! touch the local filesystem or resolve symlinks. They operate purely on
//! `/`-separated strings.

/// Normalize a probe path: collapse repeated separators, drop `.` segments
/// and strip the trailing slash. `/` stays `/`.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    match (absolute, segments.is_empty()) {
        (true, true) => "/".to_string(),
        (false, true) => ".".to_string(),
        (true, false) => format!("/{}", segments.join("/")),
        (false, false) => segments.join("/"),
    }
}

/// Parent of a normalized path. The parent of `/` is `/`, and a single
/// relative segment has parent `.`.
pub fn parent(path: &str) -> String {
    match path.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// Whether `child` equals `ancestor` or lies below it.
///
/// Uses a separator-aware prefix test, so `/data/app2` is not under
/// `/data/app`.
pub fn is_within(child: &str, ancestor: &str) -> bool {
    let child = normalize(child);
    let ancestor = normalize(ancestor);

    if child == ancestor {
        return true;
    }
    if ancestor == "/" {
        return child.starts_with('/');
    }
    child
        .strip_prefix(ancestor.as_str())
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Number of segments from `root` down to `path`; 0 when they are equal.
///
/// `path` is expected to lie within `root`; anything else reports 0.
pub fn depth(path: &str, root: &str) -> u32 {
    let path = normalize(path);
    let root = normalize(root);

    if path == root || !is_within(&path, &root) {
        return 0;
    }

    let relative = if root == "/" {
        path.trim_start_matches('/')
    } else {
        path[root.len()..].trim_start_matches('/')
    };

    relative.split('/').filter(|s| !s.is_empty()).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/data/"), "/data");
        assert_eq!(normalize("/data//logs/./app"), "/data/logs/app");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("///"), "/");
        assert_eq!(normalize("data/x/"), "data/x");
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("/data/logs"), "/data");
        assert_eq!(parent("/data"), "/");
        assert_eq!(parent("/"), "/");
        assert_eq!(parent("data"), ".");
    }

    #[test]
    fn test_is_within_rejects_sibling_prefix() {
        assert!(is_within("/data/app/x", "/data/app"));
        assert!(is_within("/data/app", "/data/app/"));
        assert!(!is_within("/data/app2", "/data/app"));
        assert!(is_within("/anything", "/"));
    }

    #[test]
    fn test_depth() {
        assert_eq!(depth("/data", "/data"), 0);
        assert_eq!(depth("/data/a", "/data"), 1);
        assert_eq!(depth("/data/a/b/c", "/data/"), 3);
        assert_eq!(depth("/etc", "/"), 1);
        assert_eq!(depth("/other", "/data"), 0);
    }
}
