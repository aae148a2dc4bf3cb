//! Builders for the `du`- and `find`-based probes.
//!
//! Each builder is a pure function of its inputs. Utility families differ in
//! flags and output units, so they are modelled as a small capability set
//! ([`ProbeBuilder`]) chosen from [`ProbeFlavor`].
//!
//! Both stale probes emit one `directory<TAB>bytes` record per directory,
//! summed on the remote side so only one line per directory crosses the
//! transport.

use fleetdu_core::{ProbeFlavor, StaleKind};

use crate::command::ShellCommand;

/// awk program summing `dir<TAB>size` records per directory.
const AWK_SUM_BY_DIR: &str = r#"{sums[$1]+=$2} END{for(d in sums) print d"\t"sums[d]}"#;

/// POSIX shell loop printing `dir<TAB>size` for each file argument, for
/// `find` implementations without `-printf`.
const POSIX_SIZE_LOOP: &str =
    r#"for f in "$@"; do d=${f%/*}; printf '%s\t%s\n' "${d:-/}" "$(wc -c < "$f")"; done"#;

/// Builds the probe commands for one family of utilities.
pub trait ProbeBuilder: Send + Sync {
    /// Recursive size listing of `path`, bounded to `depth`, one
    /// `size<TAB>path` line per directory.
    fn build_size_probe(
        &self,
        path: &str,
        depth: u32,
        excludes: &[String],
        single_filesystem: bool,
        binary: &str,
    ) -> ShellCommand;

    /// Regular files under `root` older than `age_days` by `kind`, summed
    /// per containing directory.
    fn build_stale_probe(&self, root: &str, age_days: u32, kind: StaleKind, binary: &str) -> ShellCommand;

    /// Bytes per unit in size probe output.
    fn size_unit(&self) -> u64 {
        1
    }
}

/// GNU coreutils and findutils.
#[derive(Debug, Clone, Copy, Default)]
pub struct GnuProbes;

impl ProbeBuilder for GnuProbes {
    fn build_size_probe(
        &self,
        path: &str,
        depth: u32,
        excludes: &[String],
        single_filesystem: bool,
        binary: &str,
    ) -> ShellCommand {
        let mut argv = vec![binary.to_string(), "-B1".to_string()];
        if single_filesystem {
            argv.push("-x".to_string());
        }
        argv.push(format!("--max-depth={depth}"));
        argv.extend(excludes.iter().map(|p| format!("--exclude={p}")));
        argv.push(path.to_string());
        ShellCommand::new(argv)
    }

    fn build_stale_probe(&self, root: &str, age_days: u32, kind: StaleKind, binary: &str) -> ShellCommand {
        ShellCommand::new([
            binary.to_string(),
            root.to_string(),
            "-xdev".to_string(),
            "-type".to_string(),
            "f".to_string(),
            kind.find_predicate().to_string(),
            format!("+{age_days}"),
            "-printf".to_string(),
            r"%h\t%s\n".to_string(),
        ])
        .pipe(["awk", r"-F\t", AWK_SUM_BY_DIR])
    }
}

/// BSD, macOS and other utilities limited to POSIX options.
///
/// `du` reports KiB here, hence the size unit of 1024.
#[derive(Debug, Clone, Copy, Default)]
pub struct BsdProbes;

impl ProbeBuilder for BsdProbes {
    fn build_size_probe(
        &self,
        path: &str,
        depth: u32,
        excludes: &[String],
        single_filesystem: bool,
        binary: &str,
    ) -> ShellCommand {
        let mut argv = vec![binary.to_string(), "-k".to_string()];
        if single_filesystem {
            argv.push("-x".to_string());
        }
        argv.push("-d".to_string());
        argv.push(depth.to_string());
        for pattern in excludes {
            argv.push("-I".to_string());
            argv.push(pattern.clone());
        }
        argv.push(path.to_string());
        ShellCommand::new(argv)
    }

    fn build_stale_probe(&self, root: &str, age_days: u32, kind: StaleKind, binary: &str) -> ShellCommand {
        let age = format!("+{age_days}");
        ShellCommand::new([
            binary,
            root,
            "-xdev",
            "-type",
            "f",
            kind.find_predicate(),
            age.as_str(),
            "-exec",
            "sh",
            "-c",
            POSIX_SIZE_LOOP,
            "sh",
            "{}",
            "+",
        ])
        .pipe(["awk", r"-F\t", AWK_SUM_BY_DIR])
    }

    fn size_unit(&self) -> u64 {
        1024
    }
}

/// Probe builder for a flavor.
pub fn probes_for(flavor: ProbeFlavor) -> &'static dyn ProbeBuilder {
    match flavor {
        ProbeFlavor::Gnu => &GnuProbes,
        ProbeFlavor::Bsd => &BsdProbes,
    }
}

/// GNU recursive size probe in raw bytes.
pub fn build_size_probe(
    path: &str,
    depth: u32,
    excludes: &[String],
    single_filesystem: bool,
    binary: &str,
) -> ShellCommand {
    GnuProbes.build_size_probe(path, depth, excludes, single_filesystem, binary)
}

/// GNU batched stale-size probe.
pub fn build_stale_probe(root: &str, age_days: u32, kind: StaleKind, binary: &str) -> ShellCommand {
    GnuProbes.build_stale_probe(root, age_days, kind, binary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gnu_size_probe() {
        let cmd = build_size_probe("/data", 10, &[], true, "du");
        assert_eq!(cmd.render(), "du -B1 -x --max-depth=10 /data");
    }

    #[test]
    fn test_gnu_size_probe_excludes_and_binary() {
        let excludes = vec!["*.log".to_string(), "cache".to_string()];
        let cmd = build_size_probe("/data", 3, &excludes, false, "/opt/freeware/bin/du");
        let argv = cmd.argv().unwrap();

        assert_eq!(argv[0], "/opt/freeware/bin/du");
        assert!(!argv.contains(&"-x".to_string()));
        assert!(argv.contains(&"--exclude=*.log".to_string()));
        assert!(argv.contains(&"--exclude=cache".to_string()));
        assert_eq!(argv.last().unwrap(), "/data");
    }

    #[test]
    fn test_gnu_stale_probe() {
        let cmd = build_stale_probe("/data", 365, StaleKind::Mtime, "find");
        let rendered = cmd.render();

        assert!(cmd.is_pipeline());
        assert!(rendered.starts_with("find /data -xdev -type f -mtime +365 -printf '%h\\t%s\\n' | awk"));
        assert!(rendered.contains("sums[$1]+=$2"));
    }

    #[test]
    fn test_stale_probe_time_kind() {
        let cmd = build_stale_probe("/data", 30, StaleKind::Atime, "find");
        assert!(cmd.stages()[0].windows(2).any(|w| w[0] == "-atime" && w[1] == "+30"));
    }

    #[test]
    fn test_probes_are_deterministic() {
        let excludes = vec!["tmp".to_string()];
        for flavor in [ProbeFlavor::Gnu, ProbeFlavor::Bsd] {
            let probes = probes_for(flavor);
            assert_eq!(
                probes.build_size_probe("/x", 2, &excludes, true, "du"),
                probes.build_size_probe("/x", 2, &excludes, true, "du")
            );
        }
    }

    #[test]
    fn test_bsd_probes() {
        let probes = probes_for(ProbeFlavor::Bsd);
        let excludes = vec!["*.iso".to_string()];

        let size = probes.build_size_probe("/home", 4, &excludes, true, "du");
        assert_eq!(size.render(), "du -k -x -d 4 -I '*.iso' /home");
        assert_eq!(probes.size_unit(), 1024);

        let stale = probes.build_stale_probe("/home", 90, StaleKind::Ctime, "find");
        let first = &stale.stages()[0];
        assert!(first.contains(&"-ctime".to_string()));
        assert!(!first.contains(&"-printf".to_string()));
        assert_eq!(stale.stages()[1][0], "awk");
    }

    #[test]
    fn test_hostile_path_stays_one_word() {
        let cmd = build_size_probe("/data; rm -rf /", 1, &[], true, "du");
        assert!(cmd.render().ends_with("'/data; rm -rf /'"));
    }
}
