#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use relaunch::config::{ConfigFile, RawConfigFile, SupervisorSettings};
use relaunch::security::CommandGuard;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.watch.root = root.into();
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.watch.poll_interval_ms = ms;
        self
    }

    pub fn extensions(mut self, exts: &[&str]) -> Self {
        self.config.watch.extensions = exts.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn allow_command(mut self, exe: &str) -> Self {
        self.config.security.allowed_commands.push(exe.to_string());
        self
    }

    pub fn allow_privileged(mut self, val: bool) -> Self {
        self.config.security.allow_privileged = val;
        self
    }

    pub fn fast_supervisor(mut self) -> Self {
        self.config.supervisor.grace_period_ms = 200;
        self.config.supervisor.grace_poll_ms = 10;
        self.config.supervisor.settle_delay_ms = 5;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Supervisor timings short enough for tests.
pub fn fast_settings() -> SupervisorSettings {
    SupervisorSettings {
        grace_period: Duration::from_millis(200),
        grace_poll: Duration::from_millis(10),
        settle_delay: Duration::from_millis(5),
    }
}

/// Default guard whose paths must stay inside `base`.
pub fn guard_in(base: impl Into<PathBuf>) -> CommandGuard {
    CommandGuard::default().with_base(base)
}
