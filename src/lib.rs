// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod security;
pub mod types;
pub mod watch;

use std::path::Path;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::engine::Reloader;
use crate::errors::{RelaunchError, Result};
use crate::exec::{parse_command, ProcessSupervisor, TokioBackend};
use crate::fs::RealFileSystem;
use crate::security::{CommandGuard, CommandVerdict};
use crate::types::RunMode;
use crate::watch::{ChangeMonitor, WatchFilter};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, then CLI overrides)
/// - the command guard, rooted at the current directory
/// - the change monitor and its initial scan
/// - the process supervisor on the real backend
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_or_default(args.config.as_deref())?;
    if let Some(root) = args.root {
        cfg.watch.root = root;
    }

    let mode = args
        .mode
        .into_run_mode()
        .ok_or_else(|| RelaunchError::ConfigError("no command given".to_string()))?;

    let base = std::env::current_dir()?;
    let guard = CommandGuard::new(&cfg.security, &base);

    let filter = WatchFilter::from_config(&cfg.watch)?;
    let mut monitor = ChangeMonitor::with_fs(RealFileSystem, &base, filter);
    let tracked = monitor.scan(&cfg.watch.root)?;
    info!(root = ?cfg.watch.root, tracked, "watching for changes");

    if args.dry_run {
        print_dry_run(&cfg, &mode, &guard, &monitor);
        return Ok(());
    }

    let supervisor = ProcessSupervisor::new(TokioBackend::new(), cfg.supervisor_settings());
    let mut reloader = Reloader::new(monitor, supervisor, guard, cfg.poll_interval());
    reloader.run(&mode, shutdown_signal()).await
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C"),
        () = terminate => info!("received SIGTERM"),
    }
}

/// Dry-run output: effective settings, command verdicts and watched files.
fn print_dry_run(cfg: &ConfigFile, mode: &RunMode, guard: &CommandGuard, monitor: &ChangeMonitor) {
    println!("relaunch dry-run");
    println!("  mode = {}", mode.name());
    println!("  watch.root = {}", cfg.watch.root.display());
    println!("  watch.poll_interval_ms = {}", cfg.watch.poll_interval_ms);
    println!("  supervisor.grace_period_ms = {}", cfg.supervisor.grace_period_ms);
    println!("  security.allow_privileged = {}", cfg.security.allow_privileged);
    println!();

    match mode {
        RunMode::Interpret {
            interpreter,
            script,
        } => {
            println!("run: {interpreter} {}", script.display());
            println!(
                "      interpreter: {}",
                verdict_line(guard, &guard.classify_interpreter(interpreter))
            );
            println!("      script: {}", path_verdict(guard, script));
        }
        RunMode::CompileRun {
            binary,
            compile_command,
        } => {
            println!("build: {compile_command}");
            println!("      argv: {:?}", parse_command(compile_command));
            println!("      {}", verdict_line(guard, &guard.classify(compile_command)));
            println!("run: {}", binary.display());
            println!("      binary: {}", path_verdict(guard, binary));
        }
        RunMode::CommandChain { setup, run } => {
            for step in setup {
                println!("setup: {step}");
                println!("      argv: {:?}", parse_command(step));
                println!("      {}", verdict_line(guard, &guard.classify(step)));
            }
            println!("run: {run}");
            println!("      argv: {:?}", parse_command(run));
            println!("      {}", verdict_line(guard, &guard.classify_run(run)));
        }
    }
    println!();

    println!("watched files ({}):", monitor.len());
    for path in monitor.tracked_files() {
        println!("  - {}", path.display());
    }

    debug!("dry-run complete (no execution)");
}

fn verdict_line(guard: &CommandGuard, verdict: &CommandVerdict) -> String {
    match verdict {
        CommandVerdict::Safe => "ok".to_string(),
        CommandVerdict::NotAllowed(_) if guard.allows_privileged() => {
            format!("needs authentication: {}", verdict.reason())
        }
        other => format!("rejected: {}", other.reason()),
    }
}

fn path_verdict(guard: &CommandGuard, path: &Path) -> &'static str {
    if guard.check_path(path).is_ok() {
        "ok"
    } else {
        "rejected: outside the working directory"
    }
}
