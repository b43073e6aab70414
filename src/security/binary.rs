// src/security/binary.rs

use std::io::Read;
use std::path::Path;

use crate::fs::{FileSystem, RealFileSystem};

use super::BINARY_SNIFF_BYTES;

/// True if `bytes` contains a control byte other than tab, newline,
/// vertical tab, form feed or carriage return (9..=13), or DEL.
pub fn looks_binary(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .any(|&b| b < 9 || (14..32).contains(&b) || b == 127)
}

/// Sniff the first [`BINARY_SNIFF_BYTES`] of a file.
///
/// Unreadable files are reported as not binary; the caller decides what to
/// do with a file it then fails to stat.
pub fn is_binary_with(fs: &dyn FileSystem, path: &Path) -> bool {
    let Ok(reader) = fs.open_read(path) else {
        return false;
    };

    let mut buf = Vec::with_capacity(BINARY_SNIFF_BYTES);
    if reader
        .take(BINARY_SNIFF_BYTES as u64)
        .read_to_end(&mut buf)
        .is_err()
    {
        return false;
    }

    looks_binary(&buf)
}

pub fn is_binary_file(path: impl AsRef<Path>) -> bool {
    is_binary_with(&RealFileSystem, path.as_ref())
}
