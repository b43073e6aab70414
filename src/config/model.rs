// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Executables a build or run command may start with.
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &[
    "make", "dlv", "go", "gcc", "g++", "clang", "clang++", "cargo", "npm", "yarn", "cmake",
];

/// Source and header extensions tracked by the change monitor.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".c", ".cpp", ".cc", ".cxx", ".h", ".hpp", ".go", ".rs", ".js", ".ts", ".py",
];

/// Directories that hold generated output or VCS metadata.
pub const DEFAULT_EXCLUDES: &[&str] = &[".git/**", "target/**", "node_modules/**"];

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 3000;
pub const DEFAULT_GRACE_POLL_MS: u64 = 100;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [watch]
/// root = "."
/// poll_interval_ms = 500
/// exclude = [".git/**", "target/**"]
///
/// [supervisor]
/// grace_period_ms = 3000
///
/// [security]
/// allow_privileged = false
/// ```
///
/// All sections are optional and have the reference defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub supervisor: SupervisorSection,

    #[serde(default)]
    pub security: SecuritySection,
}

/// Validated configuration. Construct via `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub supervisor: SupervisorSection,
    pub security: SecuritySection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        watch: WatchSection,
        supervisor: SupervisorSection,
        security: SecuritySection,
    ) -> Self {
        Self {
            watch,
            supervisor,
            security,
        }
    }

    pub fn supervisor_settings(&self) -> SupervisorSettings {
        SupervisorSettings {
            grace_period: Duration::from_millis(self.supervisor.grace_period_ms),
            grace_poll: Duration::from_millis(self.supervisor.grace_poll_ms),
            settle_delay: Duration::from_millis(self.supervisor.settle_delay_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch.poll_interval_ms)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let raw = RawConfigFile::default();
        Self::new_unchecked(raw.watch, raw.supervisor, raw.security)
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Directory tree scanned for changes.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Replaces the built-in extension allow-list when present.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Globs, relative to `root`, for files that are never tracked.
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            poll_interval_ms: default_poll_interval_ms(),
            extensions: default_extensions(),
            exclude: default_excludes(),
        }
    }
}

/// `[supervisor]` section: termination timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorSection {
    /// How long a terminated application may take before it is killed.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// Liveness check interval inside the grace window.
    #[serde(default = "default_grace_poll_ms")]
    pub grace_poll_ms: u64,

    /// Pause after the application exits, so the replacement can rebind
    /// ports and sockets the old instance was still releasing.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            grace_period_ms: default_grace_period_ms(),
            grace_poll_ms: default_grace_poll_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

/// `[security]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecuritySection {
    /// Replaces the built-in executable allow-list when present.
    #[serde(default = "default_allowed_commands")]
    pub allowed_commands: Vec<String>,

    /// Let a command outside the allow-list run after the user authenticates
    /// as an administrator. Off by default.
    #[serde(default)]
    pub allow_privileged: bool,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            allowed_commands: default_allowed_commands(),
            allow_privileged: false,
        }
    }
}

/// Timing knobs for `ProcessSupervisor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    pub grace_period: Duration,
    pub grace_poll: Duration,
    pub settle_delay: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        ConfigFile::default().supervisor_settings()
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_grace_period_ms() -> u64 {
    DEFAULT_GRACE_PERIOD_MS
}

fn default_grace_poll_ms() -> u64 {
    DEFAULT_GRACE_POLL_MS
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

fn default_allowed_commands() -> Vec<String> {
    DEFAULT_ALLOWED_COMMANDS.iter().map(|s| s.to_string()).collect()
}
