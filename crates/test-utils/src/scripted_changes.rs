use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use relaunch::errors::Result;
use relaunch::watch::ChangeSource;

/// A change source driven by the test instead of the filesystem.
///
/// Each queued change makes exactly one `has_changed` call return `true`.
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChanges {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    pending: VecDeque<bool>,
    tracked: Vec<PathBuf>,
}

impl ScriptedChanges {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue one poll result that reports a change.
    pub fn push_change(&self) {
        self.lock().pending.push_back(true);
    }

    /// Queue one poll result that reports nothing.
    pub fn push_quiet(&self) {
        self.lock().pending.push_back(false);
    }

    /// Number of queued results not yet consumed.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn tracked(&self) -> Vec<PathBuf> {
        self.lock().tracked.clone()
    }
}

impl ChangeSource for ScriptedChanges {
    fn scan(&mut self, _root: &Path) -> Result<usize> {
        Ok(self.lock().tracked.len())
    }

    fn track(&mut self, path: &Path) -> Result<()> {
        self.lock().tracked.push(path.to_path_buf());
        Ok(())
    }

    fn has_changed(&mut self) -> bool {
        self.lock().pending.pop_front().unwrap_or(false)
    }
}
