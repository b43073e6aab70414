// src/security/guard.rs

//! Validation policy applied by the orchestrator before every spawn.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::model::{DEFAULT_ALLOWED_COMMANDS, SecuritySection};
use crate::errors::{RelaunchError, Result};

use super::command::{classify_command, CommandVerdict};
use super::path::is_path_safe_in;
use super::privilege::authenticated_user;
use super::{FORBIDDEN_CHARS, MAX_COMMAND_LENGTH};

/// Combines the command allow-list, the path containment check and the
/// optional privilege escalation into a single gate.
#[derive(Debug, Clone)]
pub struct CommandGuard {
    allowed: Vec<String>,
    allow_privileged: bool,
    base: PathBuf,
}

impl Default for CommandGuard {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ALLOWED_COMMANDS.iter().map(|s| s.to_string()).collect(),
            allow_privileged: false,
            base: PathBuf::from("."),
        }
    }
}

impl CommandGuard {
    /// Build a guard whose paths must stay inside `base`.
    pub fn new(security: &SecuritySection, base: impl Into<PathBuf>) -> Self {
        Self {
            allowed: security.allowed_commands.clone(),
            allow_privileged: security.allow_privileged,
            base: base.into(),
        }
    }

    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = base.into();
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Classify without side effects (no authentication prompt).
    pub fn classify(&self, raw: &str) -> CommandVerdict {
        classify_command(raw, &self.allowed)
    }

    /// Gate for build / setup commands: the first token must be allow-listed.
    pub async fn check_build(&self, raw: &str) -> Result<()> {
        match self.classify(raw) {
            CommandVerdict::Safe => Ok(()),
            verdict @ CommandVerdict::NotAllowed(_) => self.escalate(raw, verdict).await,
            verdict => Err(reject(raw, &verdict)),
        }
    }

    /// Gate for the long-running run command.
    ///
    /// Same as [`check_build`](Self::check_build), except that a first token
    /// naming a file inside the base directory (e.g. `./app`) is accepted.
    pub async fn check_run(&self, raw: &str) -> Result<()> {
        match self.classify_run(raw) {
            CommandVerdict::Safe => Ok(()),
            verdict @ CommandVerdict::NotAllowed(_) => self.escalate(raw, verdict).await,
            verdict => Err(reject(raw, &verdict)),
        }
    }

    /// Run-command classification without side effects.
    pub fn classify_run(&self, raw: &str) -> CommandVerdict {
        match self.classify(raw) {
            CommandVerdict::NotAllowed(first) if is_local_path(&first) && self.is_path_safe(&first) => {
                CommandVerdict::Safe
            }
            verdict => verdict,
        }
    }

    /// Interpreter names are exec'd as a single argv entry, so they must be
    /// one token free of shell metacharacters. The allow-list does not apply.
    pub fn classify_interpreter(&self, interpreter: &str) -> CommandVerdict {
        if interpreter.is_empty() {
            return CommandVerdict::Empty;
        }
        if interpreter.len() > MAX_COMMAND_LENGTH {
            return CommandVerdict::TooLong(interpreter.len());
        }
        match interpreter
            .chars()
            .find(|c| c.is_whitespace() || FORBIDDEN_CHARS.contains(c))
        {
            Some(c) => CommandVerdict::ForbiddenChar(c),
            None => CommandVerdict::Safe,
        }
    }

    pub fn check_interpreter(&self, interpreter: &str) -> Result<()> {
        match self.classify_interpreter(interpreter) {
            CommandVerdict::Safe => Ok(()),
            verdict => Err(reject(interpreter, &verdict)),
        }
    }

    /// Whether a rejected allow-list miss would be offered escalation.
    pub fn allows_privileged(&self) -> bool {
        self.allow_privileged
    }

    pub fn check_path(&self, path: &Path) -> Result<()> {
        if self.is_path_safe(path) {
            Ok(())
        } else {
            warn!(path = ?path, "[security] unsafe path rejected");
            Err(RelaunchError::UnsafePath(path.to_path_buf()))
        }
    }

    fn is_path_safe(&self, path: impl AsRef<Path>) -> bool {
        is_path_safe_in(path, &self.base)
    }

    async fn escalate(&self, raw: &str, verdict: CommandVerdict) -> Result<()> {
        if !self.allow_privileged {
            return Err(reject(raw, &verdict));
        }

        warn!(cmd = %raw, reason = %verdict.reason(), "command outside allow-list; authentication required");
        if authenticated_user().await {
            info!(cmd = %raw, "proceeding with privileged command");
            Ok(())
        } else {
            Err(RelaunchError::unsafe_command(raw, "administrator authentication failed"))
        }
    }
}

fn reject(raw: &str, verdict: &CommandVerdict) -> RelaunchError {
    warn!(cmd = %raw, reason = %verdict.reason(), "[security] unsafe command rejected");
    RelaunchError::unsafe_command(raw, verdict.reason())
}

/// `./app`, `bin/server`, `/abs/path`: anything that names a file rather
/// than a `PATH` lookup.
fn is_local_path(token: &str) -> bool {
    token.contains('/') || token.contains(std::path::MAIN_SEPARATOR)
}
