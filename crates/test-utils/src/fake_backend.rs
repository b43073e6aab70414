use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use relaunch::exec::{ProcessBackend, WaitFuture};
use relaunch::types::{ProcessOutcome, Termination};

/// A process backend that never touches the OS.
///
/// - Every spawn is recorded and gets a fresh fake pid.
/// - A process stays "running" until it is signalled, except that `wait`
///   returns at once with the scripted exit code (default 0). That makes
///   build steps finish immediately while applications run until stopped.
/// - Clones share state, so a test can keep a handle after moving the
///   backend into a supervisor.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Debug, Default)]
struct FakeState {
    next_pid: u32,
    spawned: Vec<Vec<String>>,
    signals: Vec<(u32, Termination)>,
    processes: HashMap<u32, FakeProcess>,
    exit_codes: HashMap<String, VecDeque<i32>>,
    refused: HashSet<String>,
    ignore_graceful: bool,
}

#[derive(Debug)]
struct FakeProcess {
    exit_code: i32,
    exited: Option<ProcessOutcome>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The next spawn of exactly `command_line` (argv joined by spaces)
    /// exits with `code`. Calls queue up in order.
    pub fn exit_with(&self, command_line: &str, code: i32) -> &Self {
        self.lock()
            .exit_codes
            .entry(command_line.to_string())
            .or_default()
            .push_back(code);
        self
    }

    /// Spawning `program` fails with `NotFound`.
    pub fn refuse_spawn(&self, program: &str) -> &Self {
        self.lock().refused.insert(program.to_string());
        self
    }

    /// Undo [`refuse_spawn`](Self::refuse_spawn).
    pub fn allow_spawn(&self, program: &str) -> &Self {
        self.lock().refused.remove(program);
        self
    }

    /// SIGTERM is ignored; only a forceful kill stops a process.
    pub fn ignore_graceful(&self, ignore: bool) -> &Self {
        self.lock().ignore_graceful = ignore;
        self
    }

    /// Mark a running process as exited on its own.
    pub fn exit_now(&self, pid: u32, code: i32) {
        if let Some(p) = self.lock().processes.get_mut(&pid) {
            p.exited = Some(outcome(code));
        }
    }

    pub fn spawned(&self) -> Vec<Vec<String>> {
        self.lock().spawned.clone()
    }

    /// Spawned commands as space-joined strings, in spawn order.
    pub fn spawned_lines(&self) -> Vec<String> {
        self.lock().spawned.iter().map(|argv| argv.join(" ")).collect()
    }

    pub fn signals(&self) -> Vec<(u32, Termination)> {
        self.lock().signals.clone()
    }

    /// Pids that were spawned and have neither exited nor been reaped.
    pub fn running(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self
            .lock()
            .processes
            .iter()
            .filter(|(_, p)| p.exited.is_none())
            .map(|(pid, _)| *pid)
            .collect();
        pids.sort_unstable();
        pids
    }
}

fn outcome(code: i32) -> ProcessOutcome {
    if code == 0 {
        ProcessOutcome::Success
    } else {
        ProcessOutcome::Failed(code)
    }
}

fn unknown(pid: u32) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no fake process with pid {pid}"))
}

impl ProcessBackend for FakeBackend {
    fn spawn(&mut self, argv: &[String]) -> io::Result<u32> {
        let mut state = self.lock();
        let program = argv.first().cloned().unwrap_or_default();
        if state.refused.contains(&program) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{program}: not found"),
            ));
        }

        state.next_pid += 1;
        let pid = 1000 + state.next_pid;
        let exit_code = state
            .exit_codes
            .get_mut(&argv.join(" "))
            .and_then(VecDeque::pop_front)
            .unwrap_or(0);

        state.spawned.push(argv.to_vec());
        state.processes.insert(
            pid,
            FakeProcess {
                exit_code,
                exited: None,
            },
        );
        Ok(pid)
    }

    fn signal(&mut self, pid: u32, termination: Termination) -> io::Result<()> {
        let mut state = self.lock();
        state.signals.push((pid, termination));
        let ignore_graceful = state.ignore_graceful;

        let process = state.processes.get_mut(&pid).ok_or_else(|| unknown(pid))?;
        if process.exited.is_none() {
            match termination {
                Termination::Graceful if ignore_graceful => {}
                Termination::Graceful => process.exited = Some(ProcessOutcome::Failed(-1)),
                Termination::Forceful => process.exited = Some(ProcessOutcome::Failed(-1)),
            }
        }
        Ok(())
    }

    fn try_wait(&mut self, pid: u32) -> io::Result<Option<ProcessOutcome>> {
        let mut state = self.lock();
        let exited = state.processes.get(&pid).ok_or_else(|| unknown(pid))?.exited;
        if exited.is_some() {
            state.processes.remove(&pid);
        }
        Ok(exited)
    }

    fn wait(&mut self, pid: u32) -> WaitFuture<'_> {
        let result = {
            let mut state = self.lock();
            state
                .processes
                .remove(&pid)
                .map(|p| p.exited.unwrap_or_else(|| outcome(p.exit_code)))
                .ok_or_else(|| unknown(pid))
        };
        Box::pin(async move { result })
    }
}
