use chrono::{DateTime, Utc};

use super::domain::{JobId, JobPosting, JobStatus, Notification, StudentRecord};

/// Document-store abstraction over job postings so the lifecycle engine can be
/// exercised against any backend.
///
/// The status field and publish timestamp are owned by [`JobStore::transition`]
/// and [`JobStore::mark_published`]; [`JobStore::update`] must never touch them,
/// so an edit carrying a stale snapshot cannot move a posting backward.
pub trait JobStore: Send + Sync {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, StoreError>;

    /// Replace the descriptive, criteria, and schedule fields of a stored
    /// posting. The stored status and `published_at` survive the write.
    fn update(&self, job: JobPosting) -> Result<(), StoreError>;

    fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, StoreError>;
    fn by_status(&self, status: JobStatus) -> Result<Vec<JobPosting>, StoreError>;

    /// Compare-and-set on the status field: succeeds (returning `true`) only if
    /// the stored status still equals `expected`. Racing reconcilers observing
    /// stale state get `false` instead of a double transition.
    fn transition(
        &self,
        id: &JobId,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<bool, StoreError>;

    /// Record when a posting went live. Called once by whichever actor won the
    /// publishing transition.
    fn mark_published(&self, id: &JobId, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Read-only access to the student population.
pub trait StudentDirectory: Send + Sync {
    fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError>;
}

/// Destination for fan-out notifications. Writes are keyed by the deterministic
/// notification id, so implementations deduplicate retried deliveries by
/// upserting rather than appending.
pub trait NotificationSink: Send + Sync {
    fn write(&self, notification: Notification) -> Result<(), SinkError>;
}

/// Error enumeration for job and student store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Per-recipient notification write failure.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("notification rejected: {0}")]
    Rejected(String),
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}
