use std::process::Command;

fn fleetdu() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fleetdu"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_invalid_config_exits_with_2() {
    let output = fleetdu().args(["--top-n", "0"]).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no hosts to scan"));
    assert!(stderr.contains("top_n must be >= 1"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_dry_run_json_report() {
    let output = fleetdu()
        .args(["--local", "--paths", "/srv/data", "--dry-run", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let root = &report["hosts"][0]["roots"][0];

    assert_eq!(report["hosts"][0]["name"], "localhost");
    assert_eq!(root["path"], "/srv/data");
    assert_eq!(root["warnings"][0], "dry-run: du -B1 -x --max-depth=20 /srv/data");
    assert!(root["warnings"][1].as_str().unwrap().starts_with("dry-run: find /srv/data"));
}

#[test]
fn test_dry_run_remote_writes_report_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("fleet.toml");
    let report = dir.path().join("report.csv");
    std::fs::write(
        &config,
        "[defaults]\nstale_days = 0\n\n[[hosts]]\nname = \"db1\"\npaths = [\"/data\"]\n",
    )
    .unwrap();

    let status = fleetdu()
        .arg("--config")
        .arg(&config)
        .args(["--dry-run", "--format", "csv", "--output"])
        .arg(&report)
        .status()
        .unwrap();

    assert!(status.success());
    let csv = std::fs::read_to_string(&report).unwrap();
    assert!(csv.starts_with("host,root,path"));
    assert_eq!(csv.lines().count(), 1);
}
