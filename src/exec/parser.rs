// src/exec/parser.rs

//! Turn a validated command string into an argument vector.
//!
//! Splitting happens on whitespace before quotes are considered, so a quoted
//! argument containing spaces cannot be expressed. Commands never reach a
//! shell, so there is no other quoting or escaping to honour.

use crate::types::CommandSpec;

/// Longest accepted single argument, in bytes. Longer tokens are dropped.
pub const MAX_ARG_LENGTH: usize = 256;

/// Split `raw` into tokens.
///
/// - Tokens longer than [`MAX_ARG_LENGTH`] are skipped; the rest of the
///   command is still parsed.
/// - One layer of surrounding double quotes is removed from each token.
/// - Empty input yields an empty vector, meaning "nothing to execute".
pub fn parse_command(raw: &str) -> CommandSpec {
    raw.split_whitespace()
        .filter(|token| token.len() <= MAX_ARG_LENGTH)
        .map(|token| strip_quotes(token).to_string())
        .collect()
}

fn strip_quotes(token: &str) -> &str {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token)
}
