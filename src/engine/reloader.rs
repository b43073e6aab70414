// src/engine/reloader.rs

use std::fmt;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::errors::{RelaunchError, Result};
use crate::exec::{parse_command, run_build_chain, run_build_step, ProcessBackend, ProcessSupervisor};
use crate::security::CommandGuard;
use crate::types::{ManagedProcess, Role, RunMode};
use crate::watch::ChangeSource;

use super::CycleOutcome;

/// Drives one [`RunMode`] until shutdown.
///
/// - `start` performs the initial build and launch; any failure is fatal.
/// - `tick` polls the change source once and, on a change, stops the
///   application, rebuilds and relaunches it.
/// - `run` wraps both in the endless poll loop and always finishes with
///   `cleanup()` on the supervisor.
pub struct Reloader<C: ChangeSource, B: ProcessBackend> {
    monitor: C,
    supervisor: ProcessSupervisor<B>,
    guard: CommandGuard,
    poll_interval: Duration,
}

impl<C: ChangeSource, B: ProcessBackend> fmt::Debug for Reloader<C, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reloader")
            .field("supervisor", &self.supervisor)
            .field("guard", &self.guard)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl<C: ChangeSource, B: ProcessBackend> Reloader<C, B> {
    pub fn new(
        monitor: C,
        supervisor: ProcessSupervisor<B>,
        guard: CommandGuard,
        poll_interval: Duration,
    ) -> Self {
        Self {
            monitor,
            supervisor,
            guard,
            poll_interval,
        }
    }

    pub fn supervisor(&self) -> &ProcessSupervisor<B> {
        &self.supervisor
    }

    /// Run `mode` until it fails or `shutdown` resolves.
    ///
    /// Shutdown is a normal exit and yields `Ok(())`. Every exit path stops
    /// the supervised processes first.
    pub async fn run<S>(&mut self, mode: &RunMode, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        info!(mode = mode.name(), "relaunch starting");

        let result = tokio::select! {
            res = self.start_and_watch(mode) => res,
            () = shutdown => {
                info!("shutdown requested; cleaning up");
                Ok(())
            }
        };

        self.supervisor.cleanup().await;

        if let Err(e) = &result {
            error!(error = %e, "relaunch stopped on error");
        }
        result
    }

    async fn start_and_watch(&mut self, mode: &RunMode) -> Result<()> {
        self.start(mode).await?;
        self.watch(mode).await
    }

    /// Initial setup: build (if the mode has a build step), then launch.
    pub async fn start(&mut self, mode: &RunMode) -> Result<ManagedProcess> {
        if let RunMode::Interpret { script, .. } = mode {
            if let Err(e) = self.monitor.track(script) {
                warn!(script = ?script, error = %e, "script is not watched directly");
            }
        }

        if let Err(e) = self.rebuild(mode).await {
            error!(error = %e, "initial build failed");
            return Err(e);
        }

        info!("starting application");
        self.launch(mode).await.inspect_err(|e| {
            error!(error = %e, "failed to start application");
        })
    }

    /// Poll forever, restarting on every detected change.
    pub async fn watch(&mut self, mode: &RunMode) -> Result<()> {
        loop {
            sleep(self.poll_interval).await;
            self.tick(mode).await;
        }
    }

    /// One poll cycle.
    pub async fn tick(&mut self, mode: &RunMode) -> CycleOutcome {
        if !self.monitor.has_changed() {
            return CycleOutcome::Idle;
        }
        info!("change detected; restarting");
        self.restart(mode).await
    }

    /// Stop, rebuild and relaunch the application.
    ///
    /// A failed rebuild leaves the application stopped; the next successful
    /// cycle brings it back.
    pub async fn restart(&mut self, mode: &RunMode) -> CycleOutcome {
        self.supervisor.stop_application().await;

        if let Err(e) = self.rebuild(mode).await {
            error!(error = %e, "rebuild failed; application stays stopped until the next successful build");
            return CycleOutcome::BuildFailed;
        }

        match self.launch(mode).await {
            Ok(process) => CycleOutcome::Restarted { pid: process.pid },
            Err(e) => {
                error!(error = %e, "failed to restart application");
                CycleOutcome::RestartFailed
            }
        }
    }

    async fn rebuild(&mut self, mode: &RunMode) -> Result<()> {
        match mode {
            RunMode::Interpret { .. } => Ok(()),
            RunMode::CompileRun {
                compile_command, ..
            } => run_build_step(&mut self.supervisor, &self.guard, compile_command).await,
            RunMode::CommandChain { setup, .. } => {
                run_build_chain(&mut self.supervisor, &self.guard, setup).await
            }
        }
    }

    async fn launch(&mut self, mode: &RunMode) -> Result<ManagedProcess> {
        let argv = match mode {
            RunMode::Interpret {
                interpreter,
                script,
            } => {
                self.guard.check_interpreter(interpreter)?;
                self.guard.check_path(script)?;
                vec![interpreter.clone(), script.to_string_lossy().into_owned()]
            }
            RunMode::CompileRun { binary, .. } => {
                self.guard.check_path(binary)?;
                vec![executable_path(binary).to_string_lossy().into_owned()]
            }
            RunMode::CommandChain { run, .. } => {
                self.guard.check_run(run).await?;
                let argv = parse_command(run);
                if argv.is_empty() {
                    return Err(RelaunchError::EmptyCommand(Role::Application));
                }
                argv
            }
        };

        self.supervisor.start_application(&argv)
    }
}

/// A bare file name would be looked up on `PATH`; anchor it to the
/// current directory instead.
fn executable_path(binary: &Path) -> PathBuf {
    let mut components = binary.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Path::new(".").join(binary),
        _ => binary.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_binary_names_are_anchored_to_cwd() {
        assert_eq!(executable_path(Path::new("app")), PathBuf::from("./app"));
        assert_eq!(executable_path(Path::new("./app")), PathBuf::from("./app"));
        assert_eq!(
            executable_path(Path::new("target/debug/app")),
            PathBuf::from("target/debug/app")
        );
        assert_eq!(executable_path(Path::new("/opt/app")), PathBuf::from("/opt/app"));
    }
}
