//! Process execution behind a small trait, so scans can be driven by a fake
//! transport in tests.

use std::future::Future;
use std::io;
use std::process::Stdio;

use tokio::process::Command;
use tracing::trace;

use crate::target::Invocation;

/// Raw outcome of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; -1 when the process was killed by a signal.
    pub status: i32,
}

impl RawOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            status,
            ..Default::default()
        }
    }
}

/// Something that can run a resolved invocation to completion.
///
/// Timeouts are applied by the caller by dropping the returned future, so an
/// implementation must release whatever it holds (child processes,
/// connections) when dropped early.
pub trait Transport: Send + Sync + 'static {
    fn execute(&self, invocation: &Invocation) -> impl Future<Output = io::Result<RawOutput>> + Send;
}

/// Spawns real child processes with tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTransport;

impl SystemTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for SystemTransport {
    async fn execute(&self, invocation: &Invocation) -> io::Result<RawOutput> {
        trace!(program = %invocation.program, args = ?invocation.args, "Spawning process");

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn()?;
        let group = ProcessGroup::new(child.id());
        let output = child.wait_with_output().await?;
        group.release();

        Ok(RawOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code().unwrap_or(-1),
        })
    }
}

/// Kills a child's whole process group when dropped.
///
/// `kill_on_drop` only reaches the direct child; the stages of a `sh -c`
/// pipeline live in the child's group and must go with it.
struct ProcessGroup {
    #[cfg(unix)]
    leader: Option<rustix::process::Pid>,
}

impl ProcessGroup {
    #[cfg(unix)]
    fn new(pid: Option<u32>) -> Self {
        let leader = pid
            .and_then(|pid| i32::try_from(pid).ok())
            .and_then(rustix::process::Pid::from_raw);
        Self { leader }
    }

    #[cfg(not(unix))]
    fn new(_pid: Option<u32>) -> Self {
        Self {}
    }

    /// The child exited on its own; leave the group alone.
    fn release(self) {
        std::mem::forget(self);
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(leader) = self.leader.take() {
            use rustix::process::{kill_process_group, Signal};

            trace!(?leader, "Killing process group");
            // Already gone is fine.
            let _ = kill_process_group(leader, Signal::Kill);
        }
    }
}
