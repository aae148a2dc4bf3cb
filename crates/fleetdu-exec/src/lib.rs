//! Command execution and probe construction for fleetdu.
//!
//! This crate turns scan parameters into probe commands and runs them,
//! either on the local machine or on a remote host through the system ssh
//! client:
//!
//! - **Probe builders** produce the `du` and `find` command lines for a
//!   [`ProbeFlavor`](fleetdu_core::ProbeFlavor)
//! - **Targets** decide whether a command is spawned directly, through
//!   `sh -c`, or wrapped in an ssh invocation
//! - **The runner** applies dry-run and per-command timeouts and always hands
//!   back a [`CommandResult`], never an error
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use fleetdu_exec::{build_size_probe, CommandRunner, Target};
//!
//! # async fn demo() {
//! let runner = CommandRunner::system(false);
//! let probe = build_size_probe("/data", 3, &[], true, "du");
//! let result = runner.run(&probe, &Target::Local, Duration::from_secs(60)).await;
//!
//! if result.success() {
//!     println!("{}", result.stdout);
//! }
//! # }
//! ```

mod command;
mod probe;
mod runner;
mod target;
mod transport;

pub use command::{quote, ShellCommand};
pub use probe::{build_size_probe, build_stale_probe, probes_for, BsdProbes, GnuProbes, ProbeBuilder};
pub use runner::{CommandResult, CommandRunner, SENTINEL_RETURN_CODE};
pub use target::{Invocation, RemoteTarget, Target, SSH_PROGRAM};
pub use transport::{RawOutput, SystemTransport, Transport};
