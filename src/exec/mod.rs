// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `ProcessBackend` trait (spawn / signal / wait)
//!   and the production `TokioBackend`, which tests can replace with a fake.
//! - [`supervisor`] tracks the application and compiler slots and owns the
//!   graceful-then-forceful termination policy.
//! - [`parser`] splits command strings into argument vectors.
//! - [`build`] runs validated build / setup commands synchronously.

pub mod backend;
pub mod build;
pub mod parser;
pub mod supervisor;

pub use backend::{ProcessBackend, TokioBackend, WaitFuture};
pub use build::{run_build_chain, run_build_step};
pub use parser::{parse_command, MAX_ARG_LENGTH};
pub use supervisor::ProcessSupervisor;
