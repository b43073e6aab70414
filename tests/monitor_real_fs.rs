use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};

use relaunch::fs::RealFileSystem;
use relaunch::watch::{ChangeMonitor, ChangeSource, WatchFilter};
use relaunch_test_utils::init_tracing;

fn monitor_in(dir: &Path) -> ChangeMonitor {
    ChangeMonitor::with_fs(RealFileSystem, dir, WatchFilter::default())
}

/// Move a file's mtime forward without relying on clock resolution.
fn bump_mtime(path: &Path, secs: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(secs))
        .unwrap();
}

#[test]
fn scan_tracks_sources_and_skips_everything_else() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("src/nested")).unwrap();
    fs::create_dir_all(root.join("target/debug")).unwrap();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join("main.go"), "package main").unwrap();
    fs::write(root.join("src/nested/util.h"), "#pragma once").unwrap();
    fs::write(root.join("README.md"), "# readme").unwrap();
    fs::write(root.join("target/debug/build.rs"), "fn main() {}").unwrap();
    fs::write(root.join(".git/hook.py"), "").unwrap();
    fs::write(root.join("compiled.c"), [0x7f, b'E', b'L', b'F', 0, 1, 2]).unwrap();

    let mut monitor = monitor_in(root);
    assert_eq!(monitor.scan(root).unwrap(), 2);

    let canonical_root = root.canonicalize().unwrap();
    let mut tracked: Vec<_> = monitor
        .tracked_files()
        .map(|p| p.strip_prefix(&canonical_root).unwrap().to_path_buf())
        .collect();
    tracked.sort();
    assert_eq!(
        tracked,
        vec![Path::new("main.go").to_path_buf(), Path::new("src/nested/util.h").to_path_buf()]
    );
}

#[test]
fn detects_a_real_modification_once() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("app.rs");
    fs::write(&file, "fn main() {}").unwrap();

    let mut monitor = monitor_in(dir.path());
    monitor.scan(dir.path()).unwrap();
    assert!(!monitor.has_changed());

    bump_mtime(&file, 5);
    assert!(monitor.has_changed());
    assert!(!monitor.has_changed());
}

#[test]
fn a_scanned_script_tracked_again_changes_once_per_edit() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("main.py");
    fs::write(&script, "print('hi')").unwrap();

    let mut monitor = monitor_in(dir.path());
    monitor.scan(dir.path()).unwrap();
    monitor.track(&dir.path().join(".").join("main.py")).unwrap();
    assert_eq!(monitor.len(), 1);

    bump_mtime(&script, 5);
    assert_eq!([monitor.has_changed(), monitor.has_changed()], [true, false]);
}

#[test]
fn excluded_directories_are_skipped_on_disk() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
    fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();
    fs::write(root.join("index.js"), "").unwrap();

    let mut monitor = monitor_in(root);
    assert_eq!(monitor.scan(root).unwrap(), 1);
}

#[test]
fn deleting_a_tracked_file_is_not_a_change() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("gone.ts");
    fs::write(&file, "export {}").unwrap();

    let mut monitor = monitor_in(dir.path());
    monitor.scan(dir.path()).unwrap();
    fs::remove_file(&file).unwrap();

    assert!(!monitor.has_changed());
}

#[cfg(unix)]
#[test]
fn symlinks_leading_outside_the_base_are_not_tracked() {
    init_tracing();
    let outside = tempfile::tempdir().unwrap();
    fs::write(outside.path().join("secret.c"), "int x;").unwrap();
    let base = tempfile::tempdir().unwrap();
    fs::write(base.path().join("ok.c"), "int y;").unwrap();
    std::os::unix::fs::symlink(outside.path().join("secret.c"), base.path().join("link.c"))
        .unwrap();
    std::os::unix::fs::symlink(outside.path(), base.path().join("linked_dir")).unwrap();

    let mut monitor = monitor_in(base.path());
    assert_eq!(monitor.scan(base.path()).unwrap(), 1);
}

#[test]
fn scan_through_the_trait_object_seam() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("lib.py"), "").unwrap();

    let mut source: Box<dyn ChangeSource> = Box::new(monitor_in(dir.path()));
    assert_eq!(source.scan(dir.path()).unwrap(), 1);
    assert!(!source.has_changed());
}

#[test]
fn unreadable_root_is_an_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut monitor = monitor_in(dir.path());
    assert!(monitor.scan(&dir.path().join("missing")).is_err());
}
