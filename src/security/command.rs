// src/security/command.rs

use crate::config::model::DEFAULT_ALLOWED_COMMANDS;

use super::{FORBIDDEN_CHARS, MAX_COMMAND_LENGTH};

/// Why a command string was (or was not) accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandVerdict {
    Safe,
    Empty,
    TooLong(usize),
    ForbiddenChar(char),
    /// The first token is not an allow-listed executable.
    NotAllowed(String),
}

impl CommandVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, CommandVerdict::Safe)
    }

    /// Human readable rejection reason.
    pub fn reason(&self) -> String {
        match self {
            CommandVerdict::Safe => "safe".to_string(),
            CommandVerdict::Empty => "empty command".to_string(),
            CommandVerdict::TooLong(len) => {
                format!("{len} bytes exceeds the {MAX_COMMAND_LENGTH} byte limit")
            }
            CommandVerdict::ForbiddenChar(c) => format!("contains forbidden character '{c}'"),
            CommandVerdict::NotAllowed(exe) => format!("'{exe}' is not an allowed executable"),
        }
    }
}

/// Classify `raw` against the forbidden character set and `allowed`.
///
/// Checks run in order: emptiness, length, metacharacters, allow-list. The
/// allow-list is matched against the first whitespace-delimited token only.
pub fn classify_command<S: AsRef<str>>(raw: &str, allowed: &[S]) -> CommandVerdict {
    if raw.is_empty() {
        return CommandVerdict::Empty;
    }

    if raw.len() > MAX_COMMAND_LENGTH {
        return CommandVerdict::TooLong(raw.len());
    }

    if let Some(c) = raw.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return CommandVerdict::ForbiddenChar(c);
    }

    let first = raw.split_whitespace().next().unwrap_or_default();
    if allowed.iter().any(|a| a.as_ref() == first) {
        CommandVerdict::Safe
    } else {
        CommandVerdict::NotAllowed(first.to_string())
    }
}

/// True if `raw` passes every check against the built-in allow-list.
pub fn is_command_safe(raw: &str) -> bool {
    classify_command(raw, DEFAULT_ALLOWED_COMMANDS).is_safe()
}
