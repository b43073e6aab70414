// src/watch/monitor.rs

//! Modification-time polling over a directory tree.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::errors::{RelaunchError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::security::{is_binary_with, is_path_safe_with};

use super::path_utils::relative_str;
use super::patterns::WatchFilter;
use super::ChangeSource;

/// Tracks the last seen modification time of every watched file.
///
/// A file is tracked when it is a regular file under the scanned root whose
/// canonical path stays inside `base`, whose extension is allow-listed,
/// which no exclude glob matches, and which does not look binary.
///
/// Entries are keyed by canonical path, so one file reached through two
/// spellings (`./main.py` from a scan, `main.py` from `track`) is one entry.
/// Directories matching an exclude glob are never listed.
///
/// Entries are never removed. A deleted file is skipped while it is gone and
/// reported again if it comes back with a different timestamp.
pub struct ChangeMonitor<F: FileSystem = RealFileSystem> {
    fs: F,
    base: PathBuf,
    filter: WatchFilter,
    files: BTreeMap<PathBuf, SystemTime>,
}

impl<F: FileSystem> fmt::Debug for ChangeMonitor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeMonitor")
            .field("base", &self.base)
            .field("tracked", &self.files.len())
            .finish_non_exhaustive()
    }
}

impl<F: FileSystem> ChangeMonitor<F> {
    pub fn with_fs(fs: F, base: impl Into<PathBuf>, filter: WatchFilter) -> Self {
        Self {
            fs,
            base: base.into(),
            filter,
            files: BTreeMap::new(),
        }
    }

    /// Walk `root` recursively and record every trackable file.
    ///
    /// Returns the total number of tracked files. Unreadable subdirectories
    /// are logged and skipped; an unreadable root is an error.
    pub fn scan(&mut self, root: &Path) -> Result<usize> {
        if !self.fs.is_dir(root) {
            return Err(RelaunchError::ConfigError(format!(
                "watch root {:?} is not a directory",
                root
            )));
        }

        let mut stack = vec![root.to_path_buf()];
        let mut first = true;

        while let Some(dir) = stack.pop() {
            let entries = match self.fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if first => {
                    return Err(e.context(format!("scanning watch root {:?}", root)).into());
                }
                Err(e) => {
                    warn!(dir = ?dir, error = %e, "skipping unreadable directory");
                    continue;
                }
            };
            first = false;

            for path in entries {
                if self.fs.is_dir(&path) {
                    if self.fs.is_symlink(&path) {
                        debug!(path = ?path, "not following directory symlink");
                    } else if self.is_pruned(root, &path) {
                        debug!(path = ?path, "excluded directory not scanned");
                    } else {
                        stack.push(path);
                    }
                } else if self.fs.is_file(&path) {
                    self.consider(root, path);
                }
            }
        }

        info!(root = ?root, tracked = self.files.len(), "directory scan complete");
        Ok(self.files.len())
    }

    fn is_pruned(&self, root: &Path, dir: &Path) -> bool {
        relative_str(root, dir).is_some_and(|rel| self.filter.is_dir_excluded(&rel))
    }

    fn consider(&mut self, root: &Path, path: PathBuf) {
        if let Some(rel) = relative_str(root, &path) {
            if self.filter.is_excluded(&rel) {
                debug!(path = %rel, "excluded by pattern");
                return;
            }
        }

        if !self.filter.has_allowed_extension(&path) {
            return;
        }

        if !is_path_safe_with(&self.fs, &path, &self.base) {
            warn!(path = ?path, "[security] skipping unsafe path");
            return;
        }

        if is_binary_with(&self.fs, &path) {
            debug!(path = ?path, "skipping binary file");
            return;
        }

        self.record(path);
    }

    fn key_for(&self, path: &Path) -> PathBuf {
        self.fs
            .canonicalize(path)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    fn record(&mut self, path: PathBuf) {
        let key = self.key_for(&path);
        match self.fs.modified(&key) {
            Ok(time) => {
                debug!(path = ?key, "tracking file");
                self.files.insert(key, time);
            }
            Err(e) => {
                debug!(path = ?path, error = %e, "cannot stat file; not tracked");
            }
        }
    }

    /// Track one explicit file regardless of its extension.
    ///
    /// The path must still stay inside `base`.
    pub fn track(&mut self, path: &Path) -> Result<()> {
        if !is_path_safe_with(&self.fs, path, &self.base) {
            warn!(path = ?path, "[security] refusing to track unsafe path");
            return Err(RelaunchError::UnsafePath(path.to_path_buf()));
        }
        let key = self.key_for(path);
        let time = self
            .fs
            .modified(&key)
            .with_context(|| format!("tracking {:?}", path))?;
        debug!(path = ?key, "tracking file");
        self.files.insert(key, time);
        Ok(())
    }

    /// Report whether any tracked file has a new modification time.
    ///
    /// Only the first changed file found is refreshed; a burst of N edits is
    /// drained over N calls.
    pub fn has_changed(&mut self) -> bool {
        for (path, seen) in self.files.iter_mut() {
            if !self.fs.exists(path) {
                continue;
            }

            let current = match self.fs.modified(path) {
                Ok(t) => t,
                Err(e) => {
                    debug!(path = ?path, error = %e, "cannot stat tracked file");
                    continue;
                }
            };

            if current != *seen {
                info!(path = ?path, "file changed");
                *seen = current;
                return true;
            }
        }
        false
    }

    pub fn tracked_files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<F: FileSystem> ChangeSource for ChangeMonitor<F> {
    fn scan(&mut self, root: &Path) -> Result<usize> {
        ChangeMonitor::scan(self, root)
    }

    fn track(&mut self, path: &Path) -> Result<()> {
        ChangeMonitor::track(self, path)
    }

    fn has_changed(&mut self) -> bool {
        ChangeMonitor::has_changed(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use std::io::Read;
    use std::sync::{Arc, Mutex};

    fn mock_monitor(fs: &MockFileSystem) -> ChangeMonitor<MockFileSystem> {
        ChangeMonitor::with_fs(fs.clone(), ".", WatchFilter::default())
    }

    fn tracked(monitor: &ChangeMonitor<MockFileSystem>) -> Vec<String> {
        monitor
            .tracked_files()
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn scan_applies_extension_exclude_and_binary_filters() {
        let fs = MockFileSystem::new();
        fs.add_file("./test1.cpp", b"content1");
        fs.add_file("./test2.h", b"content2");
        fs.add_file("./test3.txt", b"content3");
        fs.add_file("./subdir/test5.cpp", b"content5");
        fs.add_file("./target/debug/gen.rs", b"// generated");
        fs.add_file("./blob.c", b"\x7fELF\0\0");

        let mut monitor = mock_monitor(&fs);
        assert_eq!(monitor.scan(Path::new(".")).unwrap(), 3);
        assert_eq!(
            tracked(&monitor),
            vec!["./subdir/test5.cpp", "./test1.cpp", "./test2.h"]
        );
    }

    #[test]
    fn unchanged_tree_never_reports_changes() {
        let fs = MockFileSystem::new();
        fs.add_file("./main.go", b"package main");
        let mut monitor = mock_monitor(&fs);
        monitor.scan(Path::new(".")).unwrap();

        assert!(!monitor.has_changed());
        assert!(!monitor.has_changed());
    }

    #[test]
    fn one_edit_is_reported_exactly_once() {
        let fs = MockFileSystem::new();
        fs.add_file("./main.go", b"package main");
        let mut monitor = mock_monitor(&fs);
        monitor.scan(Path::new(".")).unwrap();

        fs.touch("./main.go").unwrap();
        assert!(monitor.has_changed());
        assert!(!monitor.has_changed());
    }

    #[test]
    fn a_burst_of_edits_drains_one_file_per_call() {
        let fs = MockFileSystem::new();
        fs.add_file("./a.c", b"");
        fs.add_file("./b.c", b"");
        fs.add_file("./c.c", b"");
        let mut monitor = mock_monitor(&fs);
        monitor.scan(Path::new(".")).unwrap();

        for f in ["./a.c", "./b.c", "./c.c"] {
            fs.touch(f).unwrap();
        }
        assert!(monitor.has_changed());
        assert!(monitor.has_changed());
        assert!(monitor.has_changed());
        assert!(!monitor.has_changed());
    }

    #[test]
    fn deleted_file_is_skipped_then_detected_when_it_returns() {
        let fs = MockFileSystem::new();
        fs.add_file("./keep.rs", b"");
        fs.add_file("./flaky.rs", b"v1");
        let mut monitor = mock_monitor(&fs);
        monitor.scan(Path::new(".")).unwrap();

        fs.remove_file("./flaky.rs");
        assert!(!monitor.has_changed());
        assert_eq!(monitor.len(), 2, "stale entry is retained");

        fs.add_file("./flaky.rs", b"v2");
        assert!(monitor.has_changed());
        assert!(!monitor.has_changed());
    }

    #[test]
    fn files_created_after_scan_are_not_tracked() {
        let fs = MockFileSystem::new();
        fs.add_file("./a.rs", b"");
        let mut monitor = mock_monitor(&fs);
        monitor.scan(Path::new(".")).unwrap();

        fs.add_file("./new.rs", b"");
        assert!(!monitor.has_changed());
    }

    #[test]
    fn explicit_tracking_ignores_the_extension_list() {
        let fs = MockFileSystem::new();
        fs.add_file("./script.rb", b"puts 1");
        let mut monitor = mock_monitor(&fs);
        monitor.scan(Path::new(".")).unwrap();
        assert!(monitor.is_empty());

        monitor.track(Path::new("./script.rb")).unwrap();
        fs.touch("./script.rb").unwrap();
        assert!(monitor.has_changed());
    }

    #[test]
    fn tracking_a_scanned_file_by_another_spelling_adds_no_entry() {
        let fs = MockFileSystem::new();
        fs.add_file("./main.py", b"print(1)");
        let mut monitor = mock_monitor(&fs);
        monitor.scan(Path::new(".")).unwrap();

        monitor.track(Path::new("main.py")).unwrap();
        assert_eq!(tracked(&monitor), vec!["./main.py"]);

        fs.touch("main.py").unwrap();
        let polls = [monitor.has_changed(), monitor.has_changed()];
        assert_eq!(polls, [true, false]);
    }

    /// Records which directories get listed and which paths get resolved.
    #[derive(Debug, Clone, Default)]
    struct CountingFs {
        inner: MockFileSystem,
        listed: Arc<Mutex<Vec<PathBuf>>>,
        resolved: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl FileSystem for CountingFs {
        fn open_read(&self, path: &Path) -> anyhow::Result<Box<dyn Read + Send>> {
            self.inner.open_read(path)
        }
        fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path)
        }
        fn is_file(&self, path: &Path) -> bool {
            self.inner.is_file(path)
        }
        fn is_dir(&self, path: &Path) -> bool {
            self.inner.is_dir(path)
        }
        fn canonicalize(&self, path: &Path) -> anyhow::Result<PathBuf> {
            self.resolved.lock().unwrap().push(path.to_path_buf());
            self.inner.canonicalize(path)
        }
        fn modified(&self, path: &Path) -> anyhow::Result<SystemTime> {
            self.inner.modified(path)
        }
        fn read_dir(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
            self.listed.lock().unwrap().push(path.to_path_buf());
            self.inner.read_dir(path)
        }
    }

    #[test]
    fn excluded_subtrees_are_never_listed() {
        let fs = CountingFs::default();
        fs.inner.add_file("./src/main.rs", b"fn main() {}");
        fs.inner.add_file("./target/debug/build/out/gen.rs", b"");
        fs.inner.add_file("./node_modules/pkg/index.js", b"");
        fs.inner.add_file("./.git/hooks/pre-commit.py", b"");
        fs.inner.add_file("./proto/api.pb.go", b"");

        let filter = WatchFilter::new(
            &[".rs".to_string(), ".js".to_string(), ".py".to_string(), ".go".to_string()],
            &[
                "target/**".to_string(),
                "node_modules/**".to_string(),
                ".git/**".to_string(),
                "**/*.pb.go".to_string(),
            ],
        )
        .unwrap();
        let mut monitor = ChangeMonitor::with_fs(fs.clone(), ".", filter);
        assert_eq!(monitor.scan(Path::new(".")).unwrap(), 1);

        let listed = fs.listed.lock().unwrap().clone();
        for pruned in ["./target", "./node_modules", "./.git"] {
            assert!(
                !listed.iter().any(|p| p.starts_with(pruned)),
                "{pruned} was listed: {listed:?}"
            );
        }
        assert!(listed.contains(&PathBuf::from("./src")));

        let resolved = fs.resolved.lock().unwrap().clone();
        assert!(
            !resolved.iter().any(|p| p.ends_with("api.pb.go")),
            "excluded file went through the path check: {resolved:?}"
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let fs = MockFileSystem::new();
        let mut monitor = mock_monitor(&fs);
        assert!(monitor.scan(Path::new("./nope")).is_err());
    }
}
