//! Per-host settings resolved against the global configuration.

use fleetdu_core::{FleetConfig, HostProfile, ProbeFlavor};
use fleetdu_exec::{RemoteTarget, Target};

/// Name of the synthetic host used in local mode.
pub const LOCAL_HOST_NAME: &str = "localhost";

/// Everything needed to scan the paths of one host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostPlan {
    pub name: String,
    pub target: Target,
    pub paths: Vec<String>,
    /// Global exclusions followed by the host's own, without duplicates.
    pub excludes: Vec<String>,
    pub scan_depth: u32,
    pub du_command: String,
    pub find_command: String,
    pub flavor: ProbeFlavor,
}

impl HostPlan {
    /// Plan for `host`, or for the local machine when `None`.
    pub fn resolve(host: Option<&HostProfile>, config: &FleetConfig) -> Self {
        match host {
            Some(profile) => Self::remote(profile, config),
            None => Self::local(config),
        }
    }

    /// Plan for the local machine, scanning `config.paths`.
    pub fn local(config: &FleetConfig) -> Self {
        Self {
            name: LOCAL_HOST_NAME.to_string(),
            target: Target::Local,
            paths: config.paths.clone(),
            excludes: config.excludes.clone(),
            scan_depth: config.scan_depth,
            du_command: config.du_command.clone(),
            find_command: config.find_command.clone(),
            flavor: config.flavor,
        }
    }

    /// Plan for a remote host, applying its overrides.
    pub fn remote(profile: &HostProfile, config: &FleetConfig) -> Self {
        let mut excludes = config.excludes.clone();
        for pattern in &profile.excludes {
            if !excludes.contains(pattern) {
                excludes.push(pattern.clone());
            }
        }

        Self {
            name: profile.name.clone(),
            target: Target::Remote(RemoteTarget::from_profile(profile, &config.ssh)),
            paths: profile.paths.clone(),
            excludes,
            scan_depth: profile.scan_depth.unwrap_or(config.scan_depth),
            du_command: profile.du_command.clone().unwrap_or_else(|| config.du_command.clone()),
            find_command: profile
                .find_command
                .clone()
                .unwrap_or_else(|| config.find_command.clone()),
            flavor: profile.flavor.unwrap_or(config.flavor),
        }
    }
}
