use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use fleetdu_core::{FleetConfig, HostProfile, ReportMode};
use fleetdu_exec::{CommandRunner, Invocation, RawOutput, Transport, SSH_PROGRAM};
use fleetdu_scan::{scan_host, FleetScanner, ScanEvent};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Behavior {
    Healthy,
    Hang,
    Panic,
    Unreachable,
    StaleFails,
    PartialAccess,
}

/// Fake fleet: answers probes per host and records what was asked.
#[derive(Default)]
struct FakeFleet {
    behaviors: HashMap<String, Behavior>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    commands: Mutex<Vec<(String, String)>>,
}

impl FakeFleet {
    fn with(behaviors: &[(&str, Behavior)]) -> Self {
        Self {
            behaviors: behaviors.iter().map(|(h, b)| (h.to_string(), *b)).collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// `(host, shell command)` for an invocation.
fn decode(invocation: &Invocation) -> (String, String) {
    let args = &invocation.args;
    if invocation.program == SSH_PROGRAM {
        (args[args.len() - 2].clone(), args[args.len() - 1].clone())
    } else if invocation.program == "sh" {
        ("localhost".to_string(), args[1].clone())
    } else {
        ("localhost".to_string(), invocation.display())
    }
}

fn size_listing(root: &str) -> String {
    format!(
        "5000\t{root}/big\n3000\t{root}/medium\n500\t{root}/medium/sub\n1000\t{root}/small\n10000\t{root}\n"
    )
}

fn stale_listing(root: &str) -> String {
    format!("{root}/big/old\t1200\n{root}/small\t50\n")
}

impl Transport for FakeFleet {
    async fn execute(&self, invocation: &Invocation) -> io::Result<RawOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (host, command) = decode(invocation);
        self.commands.lock().unwrap().push((host.clone(), command.clone()));
        let behavior = self.behaviors.get(&host).copied().unwrap_or(Behavior::Healthy);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let stale = command.contains("awk");
        let root = if stale {
            command.split(' ').nth(1).unwrap_or_default().to_string()
        } else {
            command.rsplit(' ').next().unwrap_or_default().to_string()
        };

        match (behavior, stale) {
            (Behavior::Hang, _) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(RawOutput::default())
            }
            (Behavior::Panic, _) => panic!("transport exploded"),
            (Behavior::Unreachable, _) => Ok(RawOutput::failed(
                255,
                format!("ssh: connect to host {host} port 22: Connection refused"),
            )),
            (Behavior::StaleFails, true) => Ok(RawOutput::failed(1, "find: invalid predicate")),
            (Behavior::PartialAccess, false) => Ok(RawOutput {
                stdout: size_listing(&root),
                stderr: format!("du: cannot read directory '{root}/secret': Permission denied\n"),
                status: 1,
            }),
            (_, true) => Ok(RawOutput::ok(stale_listing(&root))),
            (_, false) => Ok(RawOutput::ok(size_listing(&root))),
        }
    }
}

fn fleet_config(hosts: &[&str]) -> FleetConfig {
    FleetConfig {
        hosts: hosts
            .iter()
            .map(|h| HostProfile::new(*h, vec!["/data".into()]))
            .collect(),
        timeout_secs: 5,
        ..Default::default()
    }
}

fn by_name(results: &[fleetdu_core::HostResult], name: &str) -> fleetdu_core::HostResult {
    results
        .iter()
        .find(|r| r.host_name == name)
        .cloned()
        .unwrap_or_else(|| panic!("no result for {name}"))
}

#[tokio::test(start_paused = true)]
async fn test_one_host_timing_out_does_not_affect_others() {
    let fleet = FakeFleet::with(&[("web2", Behavior::Hang)]);
    let scanner = FleetScanner::with_transport(fleet_config(&["web1", "web2", "web3"]), fleet);

    let results = scanner.scan().await;

    assert_eq!(results.len(), 3);
    assert_eq!(results.iter().filter(|r| !r.success).count(), 1);

    let slow = by_name(&results, "web2");
    assert!(!slow.success);
    assert!(slow.errors[0].contains("Timed out"), "{:?}", slow.errors);
    assert_eq!(slow.roots.len(), 1);
    assert!(!slow.roots[0].warnings.is_empty());

    for name in ["web1", "web3"] {
        let ok = by_name(&results, name);
        assert!(ok.success);
        assert_eq!(ok.roots[0].total_size, 10000);
        assert!(!ok.roots[0].top_directories.is_empty());
    }
}

#[tokio::test]
async fn test_dry_run_runs_nothing() {
    let config = FleetConfig {
        dry_run: true,
        ..fleet_config(&["db1", "db2"])
    };
    let scanner = FleetScanner::with_transport(config, FakeFleet::default());

    let results = scanner.scan().await;

    assert_eq!(scanner.runner().transport().calls(), 0);
    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(result.success);
        let root = &result.roots[0];
        assert_eq!(root.total_size, 0);
        assert_eq!(root.warnings.len(), 2);
        assert!(root.warnings[0].starts_with("dry-run: ssh "));
        assert!(root.warnings[0].contains("--max-depth=20"));
        assert!(root.warnings[1].contains("-mtime"));
    }
}

#[tokio::test]
async fn test_panicking_host_becomes_failed_result() {
    let fleet = FakeFleet::with(&[("bad", Behavior::Panic)]);
    let scanner = FleetScanner::with_transport(fleet_config(&["good", "bad"]), fleet);

    let results = scanner.scan().await;

    assert_eq!(results.len(), 2);
    assert!(by_name(&results, "good").success);

    let bad = by_name(&results, "bad");
    assert!(!bad.success);
    assert!(bad.errors[0].contains("transport exploded"), "{:?}", bad.errors);
}

#[tokio::test]
async fn test_unreachable_host() {
    let fleet = FakeFleet::with(&[("gone", Behavior::Unreachable)]);
    let scanner = FleetScanner::with_transport(fleet_config(&["gone"]), fleet);

    let results = scanner.scan().await;
    let gone = by_name(&results, "gone");

    assert!(!gone.success);
    assert!(gone.errors[0].starts_with("/data: size probe failed: ssh connection failed"));
}

#[tokio::test]
async fn test_paths_keep_configured_order() {
    let mut config = fleet_config(&[]);
    config.hosts = vec![HostProfile::new(
        "app1",
        vec!["/srv".into(), "/data".into(), "/logs".into()],
    )];
    let runner = CommandRunner::new(FakeFleet::default(), false);

    let result = scan_host(Some(&config.hosts[0]), &config, &runner).await;

    let roots: Vec<_> = result.roots.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(roots, vec!["/srv", "/data", "/logs"]);
    assert!(result.success);
}

#[tokio::test]
async fn test_size_mode_enriches_with_stale() {
    let scanner = FleetScanner::with_transport(fleet_config(&["h"]), FakeFleet::default());

    let results = scanner.scan().await;
    let root = &results[0].roots[0];

    assert_eq!(root.stale_size, Some(1250));
    let stale: HashMap<_, _> = root
        .top_directories
        .iter()
        .map(|d| (d.path.as_str(), d.stale_size))
        .collect();
    assert_eq!(stale["/data/big"], Some(1200));
    assert_eq!(stale["/data/medium"], Some(0));
    assert_eq!(stale["/data/small"], Some(50));
}

#[tokio::test]
async fn test_stale_disabled_skips_stale_probe() {
    let config = FleetConfig {
        stale_days: 0,
        ..fleet_config(&["h"])
    };
    let scanner = FleetScanner::with_transport(config, FakeFleet::default());

    let results = scanner.scan().await;

    assert_eq!(scanner.runner().transport().calls(), 1);
    assert_eq!(results[0].roots[0].stale_size, None);
}

#[tokio::test]
async fn test_stale_failure_is_only_a_warning_in_size_mode() {
    let fleet = FakeFleet::with(&[("h", Behavior::StaleFails)]);
    let scanner = FleetScanner::with_transport(fleet_config(&["h"]), fleet);

    let results = scanner.scan().await;

    assert!(results[0].success);
    assert_eq!(
        results[0].roots[0].warnings,
        vec!["stale probe failed: find: invalid predicate".to_string()]
    );
}

#[tokio::test]
async fn test_stale_mode() {
    let config = FleetConfig {
        report_mode: ReportMode::Stale,
        ..fleet_config(&["ok", "broken"])
    };
    let fleet = FakeFleet::with(&[("broken", Behavior::StaleFails)]);
    let scanner = FleetScanner::with_transport(config, fleet);

    let results = scanner.scan().await;

    let ok = by_name(&results, "ok");
    let top: Vec<_> = ok.roots[0].top_directories.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(top, vec!["/data/big/old", "/data/small"]);
    assert_eq!(ok.roots[0].stale_size, Some(1250));

    let broken = by_name(&results, "broken");
    assert!(!broken.success);
    assert!(broken.errors[0].contains("stale probe failed"));
}

#[tokio::test]
async fn test_permission_denied_gives_partial_result() {
    let fleet = FakeFleet::with(&[("h", Behavior::PartialAccess)]);
    let scanner = FleetScanner::with_transport(fleet_config(&["h"]), fleet);

    let results = scanner.scan().await;
    let root = &results[0].roots[0];

    assert!(results[0].success);
    assert!(root.approx);
    assert_eq!(root.total_size, 10000);
    assert!(root
        .warnings
        .contains(&"1 path(s) unreadable (permission denied); sizes are partial".to_string()));
}

#[tokio::test]
async fn test_local_mode_runs_one_unit() {
    let config = FleetConfig {
        local: true,
        paths: vec!["/home".into()],
        hosts: vec![HostProfile::new("ignored", vec!["/x".into()])],
        ..Default::default()
    };
    let scanner = FleetScanner::with_transport(config, FakeFleet::default());

    let results = scanner.scan().await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].host_name, "localhost");
    assert_eq!(results[0].roots[0].total_size, 10000);

    let commands = scanner.runner().transport().commands.lock().unwrap().clone();
    assert!(commands.iter().all(|(host, cmd)| host == "localhost" && !cmd.contains("ssh")));
}

#[tokio::test(start_paused = true)]
async fn test_worker_pool_bounds_concurrency() {
    let config = FleetConfig {
        parallel: 2,
        stale_days: 0,
        ..fleet_config(&["a", "b", "c", "d", "e"])
    };
    let fleet = FakeFleet {
        delay: Duration::from_secs(1),
        ..Default::default()
    };
    let scanner = FleetScanner::with_transport(config, fleet);

    let results = scanner.scan().await;

    assert_eq!(results.len(), 5);
    let transport = scanner.runner().transport();
    assert_eq!(transport.calls(), 5);
    assert!(transport.max_in_flight.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_progress_events() {
    let scanner = FleetScanner::with_transport(fleet_config(&["a", "b", "c"]), FakeFleet::default());
    let mut events = scanner.subscribe();

    scanner.scan().await;

    let mut started = 0;
    let mut paths = 0;
    let mut finished = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            ScanEvent::HostStarted { .. } => started += 1,
            ScanEvent::PathFinished { success, .. } => {
                assert!(success);
                paths += 1;
            }
            ScanEvent::HostFinished { completed, total, .. } => finished.push((completed, total)),
        }
    }

    assert_eq!(started, 3);
    assert_eq!(paths, 3);
    assert_eq!(finished, vec![(1, 3), (2, 3), (3, 3)]);
}
