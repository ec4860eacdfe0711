use crate::state::ScanPhase;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Summary of a scan run, returned when the scanner halts
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Page the run started from (the loaded checkpoint, or 1)
    pub start_page: u64,

    /// Batches dispatched
    pub batches: u64,

    /// Page fetches that returned content
    pub pages_fetched: u64,

    /// Pages whose fetch failed and that never succeeded later in the run
    ///
    /// These are not revisited once the checkpoint moves past them.
    pub failed_pages: BTreeSet<u64>,

    /// Pages that contributed at least one new address
    pub pages_with_new_addresses: u64,

    /// Match records appended to the match log
    pub matches_recorded: u64,

    /// Last checkpoint value persisted during this run
    pub checkpoint: Option<u64>,

    /// Phase the scanner ended in
    pub phase: ScanPhase,
}

impl ScanReport {
    pub fn new(start_page: u64) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            start_page,
            batches: 0,
            pages_fetched: 0,
            failed_pages: BTreeSet::new(),
            pages_with_new_addresses: 0,
            matches_recorded: 0,
            checkpoint: None,
            phase: ScanPhase::Running,
        }
    }

    /// Wall-clock duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}
