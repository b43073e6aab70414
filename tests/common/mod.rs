#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use relaunch::engine::Reloader;
use relaunch::exec::ProcessSupervisor;
use relaunch::security::CommandGuard;
use relaunch::types::{Role, RunMode};
use relaunch_test_utils::builders::{fast_settings, guard_in};
use relaunch_test_utils::{FakeBackend, ScriptedChanges};

pub const POLL: Duration = Duration::from_millis(10);

/// A reloader over the fake backend and scripted change source, plus
/// handles on both for inspection.
pub struct Harness {
    pub backend: FakeBackend,
    pub changes: ScriptedChanges,
    pub reloader: Reloader<ScriptedChanges, FakeBackend>,
}

impl Harness {
    /// Guard rooted at the test's working directory, so `./app` is local.
    pub fn in_cwd() -> Self {
        let cwd = std::env::current_dir().expect("cwd");
        Self::with_guard(guard_in(cwd))
    }

    pub fn in_dir(base: &Path) -> Self {
        Self::with_guard(guard_in(base))
    }

    pub fn with_guard(guard: CommandGuard) -> Self {
        let backend = FakeBackend::new();
        let changes = ScriptedChanges::new();
        let supervisor = ProcessSupervisor::new(backend.clone(), fast_settings());
        let reloader = Reloader::new(changes.clone(), supervisor, guard, POLL);
        Self {
            backend,
            changes,
            reloader,
        }
    }

    pub fn app_pid(&self) -> Option<u32> {
        self.reloader
            .supervisor()
            .tracked(Role::Application)
            .map(|p| p.pid)
    }
}

pub fn chain(commands: &[&str]) -> RunMode {
    RunMode::command_chain(commands.iter().map(|s| s.to_string()).collect())
        .expect("at least one command")
}

pub fn compile(binary: &str, cmd: &str) -> RunMode {
    RunMode::CompileRun {
        binary: PathBuf::from(binary),
        compile_command: cmd.to_string(),
    }
}

pub fn interpret(interpreter: &str, script: impl Into<PathBuf>) -> RunMode {
    RunMode::Interpret {
        interpreter: interpreter.to_string(),
        script: script.into(),
    }
}
