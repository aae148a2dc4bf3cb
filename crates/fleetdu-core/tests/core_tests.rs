use fleetdu_core::{
    path, ConfigError, ConfigFile, DirectoryInfo, FleetConfig, HostProfile, HostResult,
    RootSummary, SizeSample,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_size_sample_from_iter_normalizes() {
    let sample: SizeSample = vec![("/data/", 10u64), ("/data//a", 4), ("/data/./b", 6)]
        .into_iter()
        .collect();

    assert_eq!(sample.len(), 3);
    assert_eq!(sample.get("/data"), Some(10));
    assert_eq!(sample.get("/data/a/"), Some(4));
    assert_eq!(sample.get("/data/b"), Some(6));
    assert_eq!(sample.total(), 20);
}

#[test]
fn test_size_sample_scaled() {
    let sample: SizeSample = vec![("/x", 4u64), ("/x/y", 1)].into_iter().collect();
    let scaled = sample.scaled(1024);

    assert_eq!(scaled.get("/x"), Some(4096));
    assert_eq!(scaled.get("/x/y"), Some(1024));
}

#[test]
fn test_size_sample_total_saturates() {
    let sample: SizeSample = vec![("/a", u64::MAX), ("/b", u64::MAX), ("/c", 7)].into_iter().collect();
    assert_eq!(sample.total(), u64::MAX);
}

#[test]
fn test_depth_follows_parent_chain() {
    let root = "/srv/data";
    let paths = ["/srv/data", "/srv/data/a", "/srv/data/a/b", "/srv/data/a/b/c"];

    assert_eq!(path::depth(root, root), 0);
    for child in &paths[1..] {
        let parent = path::parent(child);
        assert_eq!(path::depth(child, root), path::depth(&parent, root) + 1);
    }
}

#[test]
fn test_result_model_serializes() {
    let mut summary = RootSummary::new("/data", 10_000);
    summary.top_directories.push(
        DirectoryInfo::new("/data/big", 5000, 5000, 1)
            .with_parent("/data", Some(10_000))
            .with_stale(1200),
    );

    let mut host = HostResult::new("web1");
    host.record(summary, None);

    let json = serde_json::to_value(&host).unwrap();
    assert_eq!(json["host_name"], "web1");
    assert_eq!(json["success"], true);
    assert_eq!(json["roots"][0]["top_directories"][0]["stale_size"], 1200);
    assert_eq!(json["roots"][0]["top_directories"][0]["file_heavy_ratio"], 1.0);
}

#[test]
fn test_failed_host_result() {
    let host = HostResult::failed("db1", "ssh: connection refused");
    assert!(!host.success);
    assert!(host.roots.is_empty());
    assert_eq!(host.errors.len(), 1);
}

#[test]
fn test_config_file_load() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("fleet.toml");
    fs::write(
        &file_path,
        r#"
        [defaults]
        paths = ["/data", "/home"]
        parallel = 4

        [[hosts]]
        name = "app1"
        paths = ["/opt"]
        scan_depth = 3
        "#,
    )
    .unwrap();

    let file = ConfigFile::load(&file_path).unwrap();
    assert_eq!(file.defaults.paths, vec!["/data", "/home"]);
    assert_eq!(file.defaults.parallel, Some(4));
    assert_eq!(file.hosts[0].scan_depth, Some(3));
}

#[test]
fn test_config_file_missing() {
    let temp = TempDir::new().unwrap();
    let err = ConfigFile::load(temp.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
}

#[test]
fn test_config_file_malformed() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("bad.toml");
    fs::write(&file_path, "[defaults\ntop_n = ").unwrap();

    let err = ConfigFile::load(&file_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_remote_config_validates() {
    let config = FleetConfig::builder()
        .hosts(vec![HostProfile::new("web1", vec!["/data".to_string()])])
        .build()
        .unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.timeout().as_secs(), 1800);
    assert!(config.stale_enabled());
}

#[test]
fn test_local_config_requires_paths() {
    let config = FleetConfig::builder().local(true).build().unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.problems().iter().any(|p| p.contains("no paths")));
}
