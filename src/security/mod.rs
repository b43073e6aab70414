// src/security/mod.rs

//! Command and path validation.
//!
//! Every externally supplied command passes through here before anything is
//! spawned. Commands are later executed without a shell, so shell
//! metacharacters are refused outright rather than escaped.
//!
//! - [`command`] classifies raw command strings against the allow-list.
//! - [`path`] checks that a path canonicalizes to somewhere inside the
//!   working directory.
//! - [`binary`] sniffs file headers so compiled artefacts are not tracked.
//! - [`guard`] combines the above into the policy the orchestrator applies.
//! - [`privilege`] is the opt-in administrator authentication escape hatch.

pub mod binary;
pub mod command;
pub mod guard;
pub mod path;
pub mod privilege;

pub use binary::{is_binary_file, is_binary_with, looks_binary};
pub use command::{classify_command, is_command_safe, CommandVerdict};
pub use guard::CommandGuard;
pub use path::{canonical_path, canonical_path_with, is_path_safe, is_path_safe_in, is_path_safe_with};
pub use privilege::authenticated_user;

/// Longest accepted raw command string, in bytes.
pub const MAX_COMMAND_LENGTH: usize = 1024;

/// Longest accepted canonical path, in bytes.
pub const MAX_PATH_LENGTH: usize = 512;

/// Number of leading bytes inspected by the binary sniffer.
pub const BINARY_SNIFF_BYTES: usize = 512;

/// Shell metacharacters that are never accepted in a command.
pub const FORBIDDEN_CHARS: &[char] = &[
    ';', '|', '&', '`', '$', '(', ')', '{', '}', '[', ']', '<', '>', '*', '?',
];
