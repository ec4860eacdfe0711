//! File-backed checkpoint
//!
//! The checkpoint is a single decimal integer: the next page index not yet
//! confirmed scanned. Writes go to a sibling temp file which is synced and
//! renamed over the target, so a crash leaves either the old or the new value.

use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Checkpoint stored as decimal text in a single file
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> StorageResult<Option<u64>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::file(&self.path, e)),
        };

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        trimmed
            .parse::<u64>()
            .map(Some)
            .map_err(|_| StorageError::CorruptCheckpoint {
                path: self.path.clone(),
                content: trimmed.to_string(),
            })
    }

    fn save(&mut self, next_page: u64) -> StorageResult<()> {
        let temp = self.temp_path();

        {
            let mut file = fs::File::create(&temp).map_err(|e| StorageError::file(&temp, e))?;
            file.write_all(next_page.to_string().as_bytes())
                .and_then(|_| file.sync_all())
                .map_err(|e| StorageError::file(&temp, e))?;
        }

        fs::rename(&temp, &self.path).map_err(|e| StorageError::file(&self.path, e))?;

        tracing::debug!("Checkpoint saved: next page {}", next_page);
        Ok(())
    }
}
