//! Append-only record store
//!
//! One payload per line, exactly as received, followed by `\n`. Every append
//! is flushed before returning. The file is never truncated or rotated here.

use crate::error::{RelayError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub struct RecordStore {
    path: PathBuf,
    file: File,
}

impl RecordStore {
    /// Open `path` for appending, creating it (and its directory) if absent
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let map_err = |e| RelayError::StoreOpen {
            path: path.clone(),
            source: e,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(map_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(map_err)?;

        Ok(Self { path, file })
    }

    /// Append one payload as a line and flush it
    pub fn append(&mut self, payload: &[u8]) -> io::Result<()> {
        let mut line = Vec::with_capacity(payload.len() + 1);
        line.extend_from_slice(payload);
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read every stored record in file order
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the dump.
pub fn read_records(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path).map_err(|e| RelayError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut records: Vec<String> = bytes
        .split(|b| *b == b'\n')
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect();
    // A trailing newline leaves one empty tail element
    if bytes.last() == Some(&b'\n') || bytes.is_empty() {
        records.pop();
    }
    Ok(records)
}
