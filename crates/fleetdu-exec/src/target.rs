//! Where a command runs: the local machine or a host reached over ssh.

use itertools::Itertools;

use fleetdu_core::{HostProfile, SshSettings};

use crate::command::{quote, ShellCommand};

/// Program used for the remote-shell transport.
pub const SSH_PROGRAM: &str = "ssh";

/// Execution target for a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Run on this machine.
    Local,
    /// Run on a remote host through ssh.
    Remote(RemoteTarget),
}

/// ssh connection details for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub user: Option<String>,
    pub port: u16,
    /// Extra client arguments, passed through as separate argv entries.
    pub options: Vec<String>,
}

impl RemoteTarget {
    /// Resolve per-host overrides against the global ssh settings.
    pub fn from_profile(profile: &HostProfile, ssh: &SshSettings) -> Self {
        Self {
            host: profile.ssh_destination().to_string(),
            user: profile.ssh_user.clone().or_else(|| ssh.user.clone()),
            port: profile.ssh_port.unwrap_or(ssh.port),
            options: ssh.options.clone(),
        }
    }

    /// `user@host`, or just `host`.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Shell-quoted rendering, suitable for copy and paste.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|w| quote(w))
            .join(" ")
    }
}

impl Target {
    /// Whether this target goes through the remote-shell transport.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Resolve `command` into the process that has to be spawned.
    ///
    /// Locally, a single-stage command is spawned directly and a pipeline is
    /// handed to `sh -c`. Remotely, the quoted rendering becomes the last
    /// argument of the ssh client, which the remote shell then parses.
    pub fn invocation(&self, command: &ShellCommand) -> Invocation {
        match self {
            Self::Local => match command.argv() {
                Some([program, args @ ..]) => Invocation {
                    program: program.clone(),
                    args: args.to_vec(),
                },
                _ => Invocation {
                    program: "sh".to_string(),
                    args: vec!["-c".to_string(), command.render()],
                },
            },
            Self::Remote(remote) => {
                let mut args = remote.options.clone();
                args.push("-p".to_string());
                args.push(remote.port.to_string());
                args.push(remote.destination());
                args.push(command.render());
                Invocation {
                    program: SSH_PROGRAM.to_string(),
                    args,
                }
            }
        }
    }

    /// The exact command line that runs for `command` on this target.
    pub fn display(&self, command: &ShellCommand) -> String {
        match self {
            Self::Local => command.render(),
            Self::Remote(_) => self.invocation(command).display(),
        }
    }
}
