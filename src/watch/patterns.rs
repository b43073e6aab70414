// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::WatchSection;

/// Decides which files under the watch root are worth tracking.
///
/// - `extensions` is an allow-list of suffixes including the dot (`".rs"`).
/// - `exclude` globs are matched against the path relative to the watch
///   root, with forward slashes (e.g. `"target/debug/build.rs"`).
/// - a `dir/**` exclude also prunes `dir` itself from the walk.
#[derive(Clone)]
pub struct WatchFilter {
    extensions: Vec<String>,
    exclude_set: Option<GlobSet>,
    dir_exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchFilter")
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

impl WatchFilter {
    pub fn new(extensions: &[String], exclude: &[String]) -> Result<Self> {
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };

        let dirs = subtree_roots(exclude);
        let dir_exclude_set = if dirs.is_empty() {
            None
        } else {
            Some(build_globset(&dirs).context("building directory exclude globset")?)
        };

        Ok(Self {
            extensions: extensions.to_vec(),
            exclude_set,
            dir_exclude_set,
        })
    }

    pub fn from_config(watch: &WatchSection) -> Result<Self> {
        Self::new(&watch.extensions, &watch.exclude)
    }

    /// True if the file's extension is on the allow-list.
    pub fn has_allowed_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.strip_prefix('.') == Some(ext))
    }

    /// True if `rel_path` (relative to the watch root) matches an exclude glob.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        self.exclude_set
            .as_ref()
            .is_some_and(|set| set.is_match(rel_path))
    }

    /// True if the directory at `rel_path` needs no listing: either it is
    /// the root of an excluded `dir/**` subtree or a glob matches it directly.
    pub fn is_dir_excluded(&self, rel_path: &str) -> bool {
        self.dir_exclude_set
            .as_ref()
            .is_some_and(|set| set.is_match(rel_path))
            || self.is_excluded(rel_path)
    }
}

impl Default for WatchFilter {
    fn default() -> Self {
        let watch = WatchSection::default();
        let exclude_set = build_globset(&watch.exclude).ok();
        let dir_exclude_set = build_globset(&subtree_roots(&watch.exclude)).ok();
        Self {
            extensions: watch.extensions,
            exclude_set,
            dir_exclude_set,
        }
    }
}

/// `"target/**"` becomes `"target"`; patterns without that suffix are dropped.
fn subtree_roots(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .filter_map(|pat| pat.strip_suffix("/**"))
        .filter(|root| !root.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
