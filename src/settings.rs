//! Merging the config file and command-line flags into one [`FleetConfig`].
//!
//! Precedence is flag, then `[defaults]` in the file, then the built-in
//! default.

use fleetdu_core::{ConfigError, ConfigFile, FleetConfig, HostProfile, SshSettings};

use crate::cli::Cli;

/// Load the file named by `--config` (if any), merge the flags and validate.
pub fn load(cli: &Cli) -> Result<FleetConfig, ConfigError> {
    let file = cli.config.as_deref().map(ConfigFile::load).transpose()?;
    let config = merge(cli, file.unwrap_or_default())?;
    config.validate()?;
    Ok(config)
}

/// Merge without validating.
pub fn merge(cli: &Cli, file: ConfigFile) -> Result<FleetConfig, ConfigError> {
    let ConfigFile { defaults, ssh, mut hosts } = file;
    let base = FleetConfig::default();

    let paths = if cli.paths.is_empty() {
        defaults.paths.clone()
    } else {
        cli.paths.clone()
    };

    for name in &cli.hosts {
        match hosts.iter_mut().find(|h| &h.name == name) {
            Some(existing) if !cli.paths.is_empty() => existing.paths = cli.paths.clone(),
            Some(_) => {}
            None => hosts.push(HostProfile::new(name.clone(), paths.clone())),
        }
    }

    let mut excludes = defaults.excludes;
    for pattern in &cli.excludes {
        if !excludes.contains(pattern) {
            excludes.push(pattern.clone());
        }
    }

    let ssh_options = cli
        .ssh_options
        .as_deref()
        .map(|opts| opts.split_whitespace().map(str::to_string).collect())
        .or(ssh.options)
        .unwrap_or(base.ssh.options);

    FleetConfig::builder()
        .hosts(hosts)
        .paths(paths)
        .local(cli.local || defaults.local.unwrap_or(base.local))
        .top_n(cli.top_n.or(defaults.top_n).unwrap_or(base.top_n))
        .file_heavy_threshold(
            cli.file_heavy_threshold
                .or(defaults.file_heavy_threshold)
                .unwrap_or(base.file_heavy_threshold),
        )
        .scan_depth(cli.scan_depth.or(defaults.scan_depth).unwrap_or(base.scan_depth))
        .stale_days(cli.stale_days.or(defaults.stale_days).unwrap_or(base.stale_days))
        .stale_kind(cli.stale_kind.or(defaults.stale_kind).unwrap_or(base.stale_kind))
        .report_mode(cli.mode.or(defaults.report_mode).unwrap_or(base.report_mode))
        .output_format(cli.format.or(defaults.format).unwrap_or(base.output_format))
        .excludes(excludes)
        .single_filesystem(
            !cli.cross_filesystems && defaults.single_filesystem.unwrap_or(base.single_filesystem),
        )
        .parallel(cli.parallel.or(defaults.parallel).unwrap_or(base.parallel))
        .timeout_secs(cli.timeout.or(defaults.timeout).unwrap_or(base.timeout_secs))
        .dry_run(cli.dry_run || defaults.dry_run.unwrap_or(base.dry_run))
        .verbose(cli.verbose || defaults.verbose.unwrap_or(base.verbose))
        .ssh(SshSettings {
            user: cli.ssh_user.clone().or(ssh.user),
            port: cli.ssh_port.or(ssh.port).unwrap_or(base.ssh.port),
            options: ssh_options,
        })
        .du_command(cli.du_command.clone().or(defaults.du_command).unwrap_or(base.du_command))
        .find_command(cli.find_command.clone().or(defaults.find_command).unwrap_or(base.find_command))
        .flavor(cli.flavor.or(defaults.flavor).unwrap_or(base.flavor))
        .build()
}
