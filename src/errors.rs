// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Role;

#[derive(Error, Debug)]
pub enum RelaunchError {
    /// Command string rejected by the validator before anything was spawned.
    #[error("unsafe command rejected: {cmd} ({reason})")]
    UnsafeCommand { cmd: String, reason: String },

    /// Path rejected by the validator (escapes the working directory, too long,
    /// or could not be canonicalized).
    #[error("unsafe path rejected: {}", .0.display())]
    UnsafePath(PathBuf),

    /// A command that parsed to an empty argument vector.
    #[error("nothing to execute for {0} (empty command)")]
    EmptyCommand(Role),

    #[error("failed to spawn {role} process '{program}': {source}")]
    Spawn {
        role: Role,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A build / setup step exited unsuccessfully.
    #[error("build step '{cmd}' failed with exit code {code}")]
    BuildFailed { cmd: String, code: i32 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RelaunchError {
    /// True for the validation family: the operation was refused before any
    /// process was created and must not be retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RelaunchError::UnsafeCommand { .. }
                | RelaunchError::UnsafePath(_)
                | RelaunchError::EmptyCommand(_)
        )
    }

    pub(crate) fn unsafe_command(cmd: &str, reason: impl Into<String>) -> Self {
        RelaunchError::UnsafeCommand {
            cmd: cmd.to_string(),
            reason: reason.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RelaunchError>;
