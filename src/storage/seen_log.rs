//! Append-only log of every observed address
//!
//! The match log alone only remembers watch-list hits. When a seen log is
//! configured, every newly observed address is appended here as well, so a
//! restarted scan can rebuild the full set of already-seen addresses.

use crate::storage::traits::{StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One address per line, appended in the order addresses were first seen
pub struct SeenLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SeenLog {
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::file(&path, e))?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Reads every address recorded so far; a missing file yields none
    pub fn read_addresses(path: &Path) -> StorageResult<Vec<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StorageError::file(path, e)),
        }
    }

    pub fn append_all<'a, I>(&mut self, addresses: I) -> StorageResult<()>
    where
        I: IntoIterator<Item = &'a String>,
    {
        for address in addresses {
            writeln!(self.writer, "{}", address).map_err(|e| StorageError::file(&self.path, e))?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> StorageResult<()> {
        self.writer
            .flush()
            .and_then(|_| self.writer.get_ref().sync_data())
            .map_err(|e| StorageError::file(&self.path, e))
    }
}
