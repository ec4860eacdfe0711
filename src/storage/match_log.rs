//! CSV match log
//!
//! An append-only two-column table (`page,address`). The header row is
//! written only when the file is created, so reopening an existing log on
//! restart just continues appending.

use crate::storage::traits::{MatchRecord, MatchSink, StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Header row of a freshly created match log
pub const MATCH_LOG_HEADER: [&str; 2] = ["page", "address"];

/// Match sink writing CSV rows to a file
pub struct CsvMatchLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvMatchLog {
    /// Opens the log for appending, creating it with a header row if needed
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let is_new = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(StorageError::file(&path, e)),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::file(&path, e))?;

        // Rows are positional; the header is written by hand only once
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let mut log = Self { path, writer };

        if is_new {
            log.writer
                .write_record(MATCH_LOG_HEADER)
                .map_err(|e| StorageError::csv(&log.path, e))?;
            log.flush()?;
            tracing::info!("Created match log {}", log.path.display());
        }

        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record from an existing log
    ///
    /// A missing file yields no records. The first row is always treated as
    /// the header, whatever its text.
    pub fn read_records(path: &Path) -> StorageResult<Vec<MatchRecord>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::file(path, e)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| StorageError::csv(path, e))?;

            let malformed = || StorageError::MalformedRecord {
                path: path.to_path_buf(),
                line: row
                    .position()
                    .map_or(0, |position| position.line() as usize),
                content: row.iter().collect::<Vec<_>>().join(","),
            };

            if row.len() != MATCH_LOG_HEADER.len() {
                return Err(malformed());
            }
            let record: MatchRecord = row.deserialize(None).map_err(|_| malformed())?;
            records.push(record);
        }

        Ok(records)
    }
}

impl MatchSink for CsvMatchLog {
    fn append(&mut self, record: &MatchRecord) -> StorageResult<()> {
        self.writer
            .serialize(record)
            .map_err(|e| StorageError::csv(&self.path, e))
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.writer
            .flush()
            .and_then(|_| self.writer.get_ref().sync_data())
            .map_err(|e| StorageError::file(&self.path, e))
    }
}
