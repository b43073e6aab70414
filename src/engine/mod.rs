// src/engine/mod.rs

//! Reload orchestration.
//!
//! The [`Reloader`] composes a change source, the process supervisor and the
//! command guard into the poll → detect → rebuild → restart loop shared by
//! every [`RunMode`](crate::types::RunMode).
//!
//! There is a single logical thread of control: the loop awaits one step at
//! a time and never overlaps a rebuild with a restart.

pub mod reloader;

pub use reloader::Reloader;

/// What a single poll cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No tracked file changed.
    Idle,
    /// The application was stopped, rebuilt and started again.
    Restarted { pid: u32 },
    /// A build or setup step failed; the application stays stopped.
    BuildFailed,
    /// The rebuild succeeded but the application could not be started.
    RestartFailed,
}
