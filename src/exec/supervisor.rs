// src/exec/supervisor.rs

//! Application / compiler process slots with graceful-then-forceful stop.

use std::fmt;

use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::SupervisorSettings;
use crate::errors::{RelaunchError, Result};
use crate::types::{ManagedProcess, ProcessOutcome, Role, StopOutcome, Termination};

use super::backend::ProcessBackend;

/// Owns at most one live process per [`Role`].
///
/// Every restart path must stop the current occupant before starting a new
/// one: `start` overwrites the slot unconditionally and a process whose id
/// is overwritten is no longer reaped by the supervisor.
pub struct ProcessSupervisor<B: ProcessBackend> {
    backend: B,
    settings: SupervisorSettings,
    application: Option<ManagedProcess>,
    compiler: Option<ManagedProcess>,
}

impl<B: ProcessBackend> fmt::Debug for ProcessSupervisor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("settings", &self.settings)
            .field("application", &self.application)
            .field("compiler", &self.compiler)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend> ProcessSupervisor<B> {
    pub fn new(backend: B, settings: SupervisorSettings) -> Self {
        Self {
            backend,
            settings,
            application: None,
            compiler: None,
        }
    }

    /// The process currently tracked for `role`, if any.
    pub fn tracked(&self, role: Role) -> Option<ManagedProcess> {
        match role {
            Role::Application => self.application,
            Role::Compiler => self.compiler,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<ManagedProcess> {
        match role {
            Role::Application => &mut self.application,
            Role::Compiler => &mut self.compiler,
        }
    }

    /// Launch `argv` in `role`'s slot.
    ///
    /// An empty `argv` fails without spawning and leaves the slot untouched.
    pub fn start(&mut self, role: Role, argv: &[String]) -> Result<ManagedProcess> {
        if argv.is_empty() {
            warn!(%role, "refusing to start an empty command");
            return Err(RelaunchError::EmptyCommand(role));
        }

        let pid = self.backend.spawn(argv).map_err(|source| {
            error!(%role, program = %argv[0], error = %source, "failed to start process");
            RelaunchError::Spawn {
                role,
                program: argv[0].clone(),
                source,
            }
        })?;

        let process = ManagedProcess { pid, role };
        if let Some(previous) = self.slot_mut(role).replace(process) {
            warn!(%role, previous = previous.pid, "slot overwritten while still tracked");
        }

        info!(%role, pid, cmd = %argv.join(" "), "process started");
        Ok(process)
    }

    pub fn start_application(&mut self, argv: &[String]) -> Result<ManagedProcess> {
        self.start(Role::Application, argv)
    }

    /// Non-blocking liveness check. Clears the slot if the process exited.
    pub fn is_running(&mut self, role: Role) -> bool {
        let Some(process) = self.tracked(role) else {
            return false;
        };

        match self.backend.try_wait(process.pid) {
            Ok(None) => true,
            Ok(Some(outcome)) => {
                debug!(%role, pid = process.pid, ?outcome, "process has exited");
                *self.slot_mut(role) = None;
                false
            }
            Err(e) => {
                debug!(%role, pid = process.pid, error = %e, "process no longer waitable");
                *self.slot_mut(role) = None;
                false
            }
        }
    }

    /// Stop the application: SIGTERM, wait up to the grace period, then
    /// SIGKILL. The slot is always empty afterwards.
    pub async fn stop_application(&mut self) -> StopOutcome {
        let Some(process) = self.application.take() else {
            return StopOutcome::NotRunning;
        };
        let pid = process.pid;

        warn!(pid, "stopping application");

        match self.backend.try_wait(pid) {
            Ok(None) => {}
            Ok(Some(outcome)) => {
                info!(pid, ?outcome, "application had already exited");
                return StopOutcome::AlreadyExited;
            }
            Err(e) => {
                debug!(pid, error = %e, "application no longer waitable");
                return StopOutcome::AlreadyExited;
            }
        }

        if let Err(e) = self.backend.signal(pid, Termination::Graceful) {
            warn!(pid, error = %e, "failed to deliver termination signal");
            return StopOutcome::AlreadyExited;
        }

        let outcome = if self.wait_for_exit(pid).await {
            info!(pid, "application stopped gracefully");
            StopOutcome::Graceful
        } else {
            error!(pid, grace_ms = self.settings.grace_period.as_millis() as u64, "force killing application");
            if let Err(e) = self.backend.signal(pid, Termination::Forceful) {
                warn!(pid, error = %e, "failed to deliver kill signal");
            }
            if let Err(e) = self.backend.wait(pid).await {
                warn!(pid, error = %e, "failed to reap killed application");
            }
            StopOutcome::ForceKilled
        };

        sleep(self.settings.settle_delay).await;
        outcome
    }

    /// Poll for exit every `grace_poll` until `grace_period` has elapsed.
    async fn wait_for_exit(&mut self, pid: u32) -> bool {
        let deadline = Instant::now() + self.settings.grace_period;
        loop {
            match self.backend.try_wait(pid) {
                Ok(Some(_)) => return true,
                Ok(None) => {}
                Err(e) => {
                    debug!(pid, error = %e, "lost track of process while waiting");
                    return true;
                }
            }

            if Instant::now() >= deadline {
                return false;
            }
            sleep(self.settings.grace_poll).await;
        }
    }

    /// Stop a running compiler immediately: SIGTERM and wait, no grace window.
    pub async fn stop_compiler(&mut self) -> StopOutcome {
        let Some(process) = self.compiler.take() else {
            return StopOutcome::NotRunning;
        };
        let pid = process.pid;

        if let Err(e) = self.backend.signal(pid, Termination::Graceful) {
            debug!(pid, error = %e, "compiler not signalled");
        }
        match self.backend.wait(pid).await {
            Ok(outcome) => debug!(pid, ?outcome, "compiler stopped"),
            Err(e) => debug!(pid, error = %e, "compiler already reaped"),
        }
        StopOutcome::Graceful
    }

    /// Run `argv` in the compiler slot and wait for it to finish.
    pub async fn run_compiler(&mut self, argv: &[String]) -> Result<ProcessOutcome> {
        let process = self.start(Role::Compiler, argv)?;
        let waited = self.backend.wait(process.pid).await;
        self.compiler = None;

        let outcome = waited?;
        debug!(pid = process.pid, ?outcome, "compiler finished");
        Ok(outcome)
    }

    /// Stop everything. Never fails; used on shutdown.
    pub async fn cleanup(&mut self) {
        let app = self.stop_application().await;
        let compiler = self.stop_compiler().await;
        debug!(?app, ?compiler, "supervisor cleanup complete");
    }
}
