//! Loading the text that is sent to the backend for one file

use super::error::{PayloadError, PayloadResult};
use crate::core::config::Config;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

const TAIL_CHUNK: u64 = 8 * 1024;
/// Tail reads stop after `n * TAIL_BYTES_PER_LINE` bytes even when fewer
/// than `n` line breaks were found
pub const TAIL_BYTES_PER_LINE: u64 = 256;

/// How a file's payload is loaded and which actions it may receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Size-capped, rewrite-eligible
    Code,
    /// Tailed, exempt from the size cap
    Log,
    Other,
}

impl FileKind {
    pub fn classify(config: &Config, ext: &str) -> Self {
        if config.is_log_ext(ext) {
            FileKind::Log
        } else if config.is_code_ext(ext) {
            FileKind::Code
        } else {
            FileKind::Other
        }
    }
}

/// Log files yield their last `log-tail-lines` lines; everything else is read
/// up to the size cap. Invalid UTF-8 is replaced, never fatal.
pub fn load_payload(path: &Path, kind: FileKind, config: &Config) -> PayloadResult<String> {
    match kind {
        FileKind::Log => tail_lines(path, config.log_tail_lines),
        FileKind::Code | FileKind::Other => read_prefix(path, config.max_file_bytes()),
    }
}

/// Last `n` lines of a file, joined with `\n`.
///
/// Reads backwards in fixed-size chunks until more than `n` line breaks have
/// been seen or the byte budget is spent, so only the tail of a large log is
/// ever loaded. With very long lines the first returned line may be partial.
pub fn tail_lines(path: &Path, n: usize) -> PayloadResult<String> {
    if n == 0 {
        return Ok(String::new());
    }

    let mut file = open(path)?;
    let read_err = |source| PayloadError::Read {
        path: path.to_path_buf(),
        source,
    };

    let budget = (n as u64).saturating_mul(TAIL_BYTES_PER_LINE);
    let mut pos = file.seek(SeekFrom::End(0)).map_err(read_err)?;
    let mut chunks: Vec<Vec<u8>> = Vec::new();
    let mut newlines = 0usize;
    let mut consumed = 0u64;

    while pos > 0 && newlines <= n && consumed < budget {
        let size = TAIL_CHUNK.min(pos).min(budget - consumed);
        pos -= size;
        consumed += size;
        file.seek(SeekFrom::Start(pos)).map_err(read_err)?;

        let mut chunk = vec![0u8; size as usize];
        file.read_exact(&mut chunk).map_err(read_err)?;
        newlines += chunk.iter().filter(|&&b| b == b'\n').count();
        chunks.push(chunk);
    }

    let bytes: Vec<u8> = chunks.into_iter().rev().flatten().collect();
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}

/// At most `max_bytes` from the start of the file, decoded permissively
pub fn read_prefix(path: &Path, max_bytes: u64) -> PayloadResult<String> {
    let file = open(path)?;
    let mut bytes = Vec::new();
    file.take(max_bytes)
        .read_to_end(&mut bytes)
        .map_err(|source| PayloadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn open(path: &Path) -> PayloadResult<File> {
    File::open(path).map_err(|source| PayloadError::Open {
        path: path.to_path_buf(),
        source,
    })
}
