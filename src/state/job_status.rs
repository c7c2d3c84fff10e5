/// Crawl job status definitions
///
/// This module defines the lifecycle states of a crawl job and the transitions between them.
use serde::Serialize;
use std::fmt;

/// Represents the current state of a crawl job
///
/// ```text
/// PENDING ──> RUNNING ──> COMPLETED
///    │           │
///    └───────────┴──────> FAILED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job has been admitted but its worker pool has not started
    Pending,

    /// Worker pool is active
    Running,

    /// Frontier exhausted or page budget reached
    Completed,

    /// An unrecoverable error ended the crawl
    Failed,
}

impl JobStatus {
    /// Returns true if no further transition can leave this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }


    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }

    /// Wire representation used in API responses and progress records
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
