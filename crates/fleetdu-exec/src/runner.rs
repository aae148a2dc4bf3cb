//! Uniform command execution on local or remote targets.

use std::time::Duration;

use tracing::{debug, warn};

use crate::command::ShellCommand;
use crate::target::Target;
use crate::transport::{SystemTransport, Transport};

/// Return code reported for commands that timed out or never started.
pub const SENTINEL_RETURN_CODE: i32 = -1;

/// Outcome of one command invocation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Fully resolved command line, including the ssh wrapper.
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub return_code: i32,
    pub timed_out: bool,
    /// Set when nothing was executed.
    pub dry_run: bool,
}

impl CommandResult {
    /// Exit code 0 and no timeout.
    pub fn success(&self) -> bool {
        self.return_code == 0 && !self.timed_out
    }

    fn planned(command: String) -> Self {
        Self {
            command,
            stdout: String::new(),
            stderr: String::new(),
            return_code: 0,
            timed_out: false,
            dry_run: true,
        }
    }

    fn timed_out(command: String, timeout: Duration) -> Self {
        Self {
            command,
            stdout: String::new(),
            stderr: format!("Timed out after {timeout:?}"),
            return_code: SENTINEL_RETURN_CODE,
            timed_out: true,
            dry_run: false,
        }
    }
}

/// Runs commands through a [`Transport`], honouring dry-run and timeouts.
///
/// Failures of any kind come back as a [`CommandResult`]; `run` never
/// returns an error.
#[derive(Debug, Clone)]
pub struct CommandRunner<T = SystemTransport> {
    transport: T,
    dry_run: bool,
}

impl CommandRunner<SystemTransport> {
    /// Runner that spawns real processes.
    pub fn system(dry_run: bool) -> Self {
        Self::new(SystemTransport::new(), dry_run)
    }
}

impl<T: Transport> CommandRunner<T> {
    /// Create a runner over `transport`.
    pub fn new(transport: T, dry_run: bool) -> Self {
        Self { transport, dry_run }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether this runner only reports commands.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run `command` on `target`, giving up after `timeout`.
    ///
    /// On timeout the transport future is dropped, which terminates the
    /// child process.
    pub async fn run(&self, command: &ShellCommand, target: &Target, timeout: Duration) -> CommandResult {
        let shown = target.display(command);

        if self.dry_run {
            debug!(command = %shown, "Dry run, not executing");
            return CommandResult::planned(shown);
        }

        let invocation = target.invocation(command);
        debug!(command = %shown, "Running command");

        match tokio::time::timeout(timeout, self.transport.execute(&invocation)).await {
            Ok(Ok(raw)) => CommandResult {
                command: shown,
                stdout: raw.stdout,
                stderr: raw.stderr,
                return_code: raw.status,
                timed_out: false,
                dry_run: false,
            },
            Ok(Err(err)) => {
                warn!(program = %invocation.program, error = %err, "Failed to start command");
                CommandResult {
                    command: shown,
                    stdout: String::new(),
                    stderr: format!("Failed to start {}: {err}", invocation.program),
                    return_code: SENTINEL_RETURN_CODE,
                    timed_out: false,
                    dry_run: false,
                }
            }
            Err(_) => {
                warn!(command = %shown, ?timeout, "Command timed out");
                CommandResult::timed_out(shown, timeout)
            }
        }
    }
}
