/// Scan phase definitions for the scheduler state machine
///
/// This module defines the phases the scan loop moves through between batches.
use std::fmt;

/// Represents the current phase of the scan loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanPhase {
    /// The last batch produced new addresses
    Running,

    /// One or more consecutive batches produced nothing new, but the idle
    /// limit has not been reached yet
    IdleBackoff {
        /// Number of consecutive batches without new addresses
        streak: u32,
    },

    /// The idle limit was reached; no further pages are fetched
    Halted,
}

impl ScanPhase {
    /// Returns the phase after a batch that produced at least one page with new addresses
    pub fn after_productive_batch(self) -> Self {
        match self {
            Self::Halted => Self::Halted,
            _ => Self::Running,
        }
    }

    /// Returns the phase after a batch that produced nothing new
    ///
    /// Reaching `idle_limit` consecutive idle batches halts the scan.
    pub fn after_idle_batch(self, idle_limit: u32) -> Self {
        let streak = match self {
            Self::Halted => return Self::Halted,
            Self::Running => 1,
            Self::IdleBackoff { streak } => streak + 1,
        };

        if streak >= idle_limit {
            Self::Halted
        } else {
            Self::IdleBackoff { streak }
        }
    }

    /// Returns the current idle streak length
    pub fn idle_streak(&self) -> u32 {
        match self {
            Self::IdleBackoff { streak } => *streak,
            _ => 0,
        }
    }

    /// Returns true once the scan has stopped for good
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Halted)
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::IdleBackoff { streak } => write!(f, "idle-backoff ({})", streak),
            Self::Halted => write!(f, "halted"),
        }
    }
}
