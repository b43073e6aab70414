// src/exec/build.rs

//! Synchronous build / setup steps.

use tracing::{error, info};

use crate::errors::{RelaunchError, Result};
use crate::security::CommandGuard;
use crate::types::Role;

use super::backend::ProcessBackend;
use super::parser::parse_command;
use super::supervisor::ProcessSupervisor;

/// Validate, parse and run one build command to completion.
///
/// - Rejected commands never spawn.
/// - A non-zero exit is reported as [`RelaunchError::BuildFailed`].
pub async fn run_build_step<B: ProcessBackend>(
    supervisor: &mut ProcessSupervisor<B>,
    guard: &CommandGuard,
    raw: &str,
) -> Result<()> {
    guard.check_build(raw).await?;

    let argv = parse_command(raw);
    if argv.is_empty() {
        return Err(RelaunchError::EmptyCommand(Role::Compiler));
    }

    info!(cmd = %raw, "compiling");
    let outcome = supervisor.run_compiler(&argv).await?;
    if outcome.success() {
        info!(cmd = %raw, "build step succeeded");
        Ok(())
    } else {
        error!(cmd = %raw, exit_code = outcome.code(), "build step failed");
        Err(RelaunchError::BuildFailed {
            cmd: raw.to_string(),
            code: outcome.code(),
        })
    }
}

/// Run `steps` in order, stopping at the first failure.
pub async fn run_build_chain<B: ProcessBackend, S: AsRef<str>>(
    supervisor: &mut ProcessSupervisor<B>,
    guard: &CommandGuard,
    steps: &[S],
) -> Result<()> {
    for step in steps {
        let step = step.as_ref();
        info!(cmd = %step, "running setup");
        if let Err(e) = run_build_step(supervisor, guard, step).await {
            error!(cmd = %step, error = %e, "setup command failed");
            return Err(e);
        }
    }
    Ok(())
}
