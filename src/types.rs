use std::fmt;
use std::path::PathBuf;

/// The two process slots the supervisor tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The long-running program being developed.
    Application,
    /// A synchronous build / setup step.
    Compiler,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Application => f.write_str("application"),
            Role::Compiler => f.write_str("compiler"),
        }
    }
}

/// A live child process owned by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedProcess {
    pub pid: u32,
    pub role: Role,
}

/// Ordered argument vector; the first token is the executable.
///
/// Never handed to a shell.
pub type CommandSpec = Vec<String>;

/// Operating mode, selected once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Run `interpreter script`, restart on every change.
    Interpret {
        interpreter: String,
        script: PathBuf,
    },
    /// Compile, then run the produced binary; recompile and restart on change.
    CompileRun {
        binary: PathBuf,
        compile_command: String,
    },
    /// Run every setup command in order, then the long-running run command.
    CommandChain {
        setup: Vec<String>,
        run: String,
    },
}

impl RunMode {
    /// Build a command-chain mode from a flat list where the last entry is
    /// the run command. Returns `None` for an empty list.
    pub fn command_chain(mut commands: Vec<String>) -> Option<Self> {
        let run = commands.pop()?;
        Some(RunMode::CommandChain {
            setup: commands,
            run,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunMode::Interpret { .. } => "interpret",
            RunMode::CompileRun { .. } => "compile",
            RunMode::CommandChain { .. } => "command",
        }
    }
}

/// How a finished process exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Success,
    /// Non-zero exit; `-1` when the process was killed by a signal.
    Failed(i32),
}

impl ProcessOutcome {
    pub fn success(self) -> bool {
        matches!(self, ProcessOutcome::Success)
    }

    pub fn code(self) -> i32 {
        match self {
            ProcessOutcome::Success => 0,
            ProcessOutcome::Failed(code) => code,
        }
    }
}

/// Termination signal flavour delivered to a process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// SIGTERM: ask the group to exit.
    Graceful,
    /// SIGKILL: cannot be ignored.
    Forceful,
}

/// Result of a stop operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The slot was empty.
    NotRunning,
    /// The process had already exited before any signal was sent.
    AlreadyExited,
    /// Exited within the grace window.
    Graceful,
    /// Ignored the grace window and was killed.
    ForceKilled,
}
