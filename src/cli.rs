// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::RunMode;

/// Command-line arguments for `relaunch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "relaunch",
    version,
    about = "Rebuild and restart a program whenever its source files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Relaunch.toml` in the current directory is used when it
    /// exists; otherwise built-in defaults apply.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory to watch. Overrides `[watch] root`.
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RELAUNCH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate commands and configuration, list watched files, then exit
    /// without running anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub mode: ModeArgs,
}

/// One subcommand per operating mode.
#[derive(Debug, Clone, Subcommand)]
pub enum ModeArgs {
    /// Run a script with an interpreter; restart it on every change.
    Interpret {
        /// Interpreter executable, e.g. `python3`.
        interpreter: String,
        /// Script to run.
        script: PathBuf,
    },

    /// Compile, run the produced binary, and redo both on every change.
    Compile {
        /// Binary produced by the compile command.
        binary: PathBuf,
        /// Build command, e.g. `"go build -o app"`.
        compile_command: String,
    },

    /// Run setup commands in order, then the last command as the application.
    Command {
        /// Setup commands followed by the run command.
        #[arg(required = true, num_args = 1..)]
        commands: Vec<String>,
    },
}

impl ModeArgs {
    pub fn into_run_mode(self) -> Option<RunMode> {
        match self {
            ModeArgs::Interpret {
                interpreter,
                script,
            } => Some(RunMode::Interpret {
                interpreter,
                script,
            }),
            ModeArgs::Compile {
                binary,
                compile_command,
            } => Some(RunMode::CompileRun {
                binary,
                compile_command,
            }),
            ModeArgs::Command { commands } => RunMode::command_chain(commands),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
