//! State module for tracking scan progress
//!
//! # Components
//!
//! - `ScanPhase`: The scheduler's state machine (running, idle backoff, halted)
//! - `ScanState`: Watch-list and every address observed so far, with match detection
//! - `PageResult`: What one page contributed once folded into the scan state

mod phase;
mod scan_state;

// Re-export main types
pub use phase::ScanPhase;
pub use scan_state::{AddressSet, PageOutcome, PageResult, ScanState, WatchList};
