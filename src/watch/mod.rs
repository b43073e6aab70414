// src/watch/mod.rs

//! Change detection.
//!
//! This module is responsible for:
//! - Deciding which files are worth tracking (extension allow-list, exclude
//!   globs, binary sniffing, path containment).
//! - Polling modification times and turning them into a "something changed"
//!   signal.
//!
//! It does **not** know about processes or modes; the orchestrator only sees
//! the [`ChangeSource`] trait, so the polling strategy can be replaced by a
//! native notification backend without touching the reload loop.

use std::path::Path;

use crate::errors::Result;

pub mod monitor;
pub mod path_utils;
pub mod patterns;

pub use monitor::ChangeMonitor;
pub use patterns::{build_globset, WatchFilter};

/// A source of "did anything change" signals.
pub trait ChangeSource: Send {
    /// Discover the files under `root` to watch. Returns how many are tracked.
    fn scan(&mut self, root: &Path) -> Result<usize>;

    /// Watch a single explicitly named file.
    fn track(&mut self, path: &Path) -> Result<()>;

    /// True if at least one tracked file changed since the last call.
    fn has_changed(&mut self) -> bool;
}
