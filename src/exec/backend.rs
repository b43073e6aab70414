// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The supervisor talks to a `ProcessBackend` instead of the OS directly.
//! This makes it easy to swap in a fake backend in tests while keeping the
//! production implementation in [`TokioBackend`].
//!
//! A backend owns the OS handles; the supervisor only ever holds process ids.
//! Every child is started as the leader of its own process group, and
//! signals are delivered to the whole group so that anything the child
//! spawned goes down with it.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::types::{ProcessOutcome, Termination};

/// Boxed future returned by [`ProcessBackend::wait`].
pub type WaitFuture<'a> = Pin<Box<dyn Future<Output = std::io::Result<ProcessOutcome>> + Send + 'a>>;

/// Trait abstracting process creation, signalling and reaping.
///
/// Production code uses [`TokioBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ProcessBackend: Send {
    /// Launch `argv[0]` with the remaining arguments in a new process group.
    ///
    /// `argv` is never empty; the supervisor checks that first.
    fn spawn(&mut self, argv: &[String]) -> std::io::Result<u32>;

    /// Deliver a termination signal to the process group led by `pid`.
    fn signal(&mut self, pid: u32, termination: Termination) -> std::io::Result<()>;

    /// Non-blocking exit check. `Some` once the process has exited.
    fn try_wait(&mut self, pid: u32) -> std::io::Result<Option<ProcessOutcome>>;

    /// Wait until the process exits.
    fn wait(&mut self, pid: u32) -> WaitFuture<'_>;
}

/// Real backend built on `tokio::process`.
///
/// Children inherit stdin/stdout/stderr: the supervised program talks to the
/// terminal directly.
#[derive(Debug, Default)]
pub struct TokioBackend {
    children: HashMap<u32, Child>,
}

impl TokioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn child_mut(&mut self, pid: u32) -> std::io::Result<&mut Child> {
        self.children.get_mut(&pid).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no child process with pid {pid}"),
            )
        })
    }
}

impl ProcessBackend for TokioBackend {
    fn spawn(&mut self, argv: &[String]) -> std::io::Result<u32> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argument vector")
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn()?;
        let pid = child.id().ok_or_else(|| {
            std::io::Error::other(format!("process '{program}' exited before its pid was read"))
        })?;

        debug!(pid, program = %program, "spawned child process group");
        self.children.insert(pid, child);
        Ok(pid)
    }

    fn signal(&mut self, pid: u32, termination: Termination) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            let signal = match termination {
                Termination::Graceful => Signal::SIGTERM,
                Termination::Forceful => Signal::SIGKILL,
            };
            let pgid = i32::try_from(pid).map_err(std::io::Error::other)?;
            killpg(Pid::from_raw(pgid), signal).map_err(std::io::Error::from)
        }

        #[cfg(not(unix))]
        {
            let _ = termination;
            self.child_mut(pid)?.start_kill()
        }
    }

    fn try_wait(&mut self, pid: u32) -> std::io::Result<Option<ProcessOutcome>> {
        let status = self.child_mut(pid)?.try_wait()?;
        Ok(status.map(|status| {
            self.children.remove(&pid);
            outcome_from_status(status)
        }))
    }

    fn wait(&mut self, pid: u32) -> WaitFuture<'_> {
        Box::pin(async move {
            let status = self.child_mut(pid)?.wait().await?;
            self.children.remove(&pid);
            Ok(outcome_from_status(status))
        })
    }
}

impl Drop for TokioBackend {
    /// Last-resort teardown: nothing we started outlives the backend.
    fn drop(&mut self) {
        let pids: Vec<u32> = self.children.keys().copied().collect();
        for pid in pids {
            if let Err(e) = self.signal(pid, Termination::Forceful) {
                warn!(pid, error = %e, "failed to kill process group on teardown");
            }
        }
    }
}

pub(crate) fn outcome_from_status(status: ExitStatus) -> ProcessOutcome {
    if status.success() {
        ProcessOutcome::Success
    } else {
        ProcessOutcome::Failed(status.code().unwrap_or(-1))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn exit_codes_are_reported() {
        let mut backend = TokioBackend::new();

        let ok = backend.spawn(&argv(&["true"])).unwrap();
        assert_eq!(backend.wait(ok).await.unwrap(), ProcessOutcome::Success);

        let failed = backend.spawn(&argv(&["sh", "-c", "exit 3"])).unwrap();
        assert_eq!(backend.wait(failed).await.unwrap(), ProcessOutcome::Failed(3));
    }

    #[tokio::test]
    async fn missing_executable_fails_to_spawn() {
        let mut backend = TokioBackend::new();
        assert!(backend.spawn(&argv(&["relaunch-no-such-binary-12345"])).is_err());
    }

    #[tokio::test]
    async fn forceful_signal_kills_the_group() {
        let mut backend = TokioBackend::new();
        let pid = backend.spawn(&argv(&["sleep", "30"])).unwrap();

        assert_eq!(backend.try_wait(pid).unwrap(), None);
        backend.signal(pid, Termination::Forceful).unwrap();
        assert_eq!(backend.wait(pid).await.unwrap(), ProcessOutcome::Failed(-1));

        // Reaped processes are forgotten.
        assert!(backend.try_wait(pid).is_err());
    }
}
