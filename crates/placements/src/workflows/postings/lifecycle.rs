use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use super::domain::{
    EligibilityCriteria, JobDetails, JobId, JobPosting, JobStatus, PublishMode, PublishSchedule,
};
use super::fanout::{FanoutDispatcher, FanoutReport};
use super::store::{JobStore, NotificationSink, StoreError, StudentDirectory};

/// Administrative surface over the job store: create, edit, publish, close, and
/// list postings. Fan-out fires exactly once per posting, at the moment it
/// transitions to `Open`.
pub struct JobLifecycleService<S, D, N> {
    store: Arc<S>,
    dispatcher: FanoutDispatcher<D, N>,
}

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_job_id() -> JobId {
    let id = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobId(format!("job-{id:06}"))
}

/// Attributes supplied when creating a posting.
#[derive(Debug, Clone, Deserialize)]
pub struct JobDraft {
    pub details: JobDetails,
    pub schedule: PublishSchedule,
    #[serde(default)]
    pub criteria: EligibilityCriteria,
}

/// Partial edit applied to a stored posting. Editing never re-triggers fan-out,
/// even when eligibility-affecting fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPatch {
    #[serde(default)]
    pub details: Option<JobDetails>,
    #[serde(default)]
    pub criteria: Option<EligibilityCriteria>,
    #[serde(default)]
    pub application_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scheduled_close_at: Option<DateTime<Utc>>,
}

/// Result of an operation that may have opened the posting: the stored job plus
/// the fan-out report when a fan-out pass ran.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub job: JobPosting,
    pub fanout: Option<FanoutReport>,
}

/// Error raised by the lifecycle service. Partial fan-out failure is not an
/// error: publication succeeded and the failures travel in the outcome report.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("invalid posting configuration: {0}")]
    InvalidConfiguration(String),
    #[error("job {id} cannot move from {from} to {to}")]
    ConflictingTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<S, D, N> JobLifecycleService<S, D, N>
where
    S: JobStore + 'static,
    D: StudentDirectory + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(store: Arc<S>, dispatcher: FanoutDispatcher<D, N>) -> Self {
        Self { store, dispatcher }
    }

    /// Create a posting in its initial state. A scheduled publish date already
    /// in the past is treated as an immediate publish, so callers observe the
    /// job directly in `Open` with fan-out already executed.
    pub async fn create_job(
        &self,
        draft: JobDraft,
        now: DateTime<Utc>,
    ) -> Result<PublishOutcome, LifecycleError> {
        let status = match draft.schedule.mode {
            PublishMode::Draft => JobStatus::Draft,
            PublishMode::Immediate => JobStatus::Open,
            PublishMode::Scheduled => match draft.schedule.scheduled_publish_at {
                None => {
                    return Err(LifecycleError::InvalidConfiguration(
                        "scheduled publish requires a publish date".to_string(),
                    ))
                }
                Some(at) if at > now => JobStatus::PendingPublish,
                Some(_) => JobStatus::Open,
            },
        };

        let job = JobPosting {
            id: next_job_id(),
            details: draft.details,
            schedule: draft.schedule,
            criteria: draft.criteria,
            status,
            created_at: now,
            published_at: (status == JobStatus::Open).then_some(now),
        };

        let stored = self.store.insert(job)?;
        info!(job = %stored.id, status = %stored.status, "posting created");

        let fanout = if stored.status == JobStatus::Open {
            Some(self.dispatcher.dispatch(&stored, now).await?)
        } else {
            None
        };

        Ok(PublishOutcome {
            job: stored,
            fanout,
        })
    }

    /// Explicitly publish a `Draft` or `PendingPublish` posting. The status
    /// write is a conditional transition so a racing reconciler cannot cause a
    /// second fan-out; losing the race is reported as a conflict.
    pub async fn manual_publish(
        &self,
        id: &JobId,
        now: DateTime<Utc>,
    ) -> Result<PublishOutcome, LifecycleError> {
        let job = self.fetch_existing(id)?;

        if !matches!(job.status, JobStatus::Draft | JobStatus::PendingPublish) {
            return Err(LifecycleError::ConflictingTransition {
                id: id.clone(),
                from: job.status,
                to: JobStatus::Open,
            });
        }

        let claimed = self.store.transition(id, job.status, JobStatus::Open)?;
        if !claimed {
            return Err(LifecycleError::ConflictingTransition {
                id: id.clone(),
                from: job.status,
                to: JobStatus::Open,
            });
        }

        self.store.mark_published(id, now)?;
        let opened = self.fetch_existing(id)?;
        info!(job = %opened.id, "posting published manually");

        let fanout = self.dispatcher.dispatch(&opened, now).await?;
        Ok(PublishOutcome {
            job: opened,
            fanout: Some(fanout),
        })
    }

    /// Apply a partial edit. Permitted in any non-terminal state. The store
    /// keeps the status and publish timestamp it already holds, so an edit
    /// racing a publish can never revert the posting.
    pub fn edit_job(&self, id: &JobId, patch: JobPatch) -> Result<JobPosting, LifecycleError> {
        let mut job = self.fetch_existing(id)?;

        if job.status.is_terminal() {
            return Err(LifecycleError::ConflictingTransition {
                id: id.clone(),
                from: job.status,
                to: job.status,
            });
        }

        if let Some(details) = patch.details {
            job.details = details;
        }
        if let Some(criteria) = patch.criteria {
            job.criteria = criteria;
        }
        if let Some(deadline) = patch.application_deadline {
            job.schedule.application_deadline = deadline;
        }
        if let Some(close_at) = patch.scheduled_close_at {
            job.schedule.scheduled_close_at = Some(close_at);
        }

        self.store.update(job)?;
        self.fetch_existing(id)
    }

    /// Close an `Open` posting. Explicit administrative action only.
    pub fn close_job(&self, id: &JobId) -> Result<JobPosting, LifecycleError> {
        let job = self.fetch_existing(id)?;

        if job.status != JobStatus::Open {
            return Err(LifecycleError::ConflictingTransition {
                id: id.clone(),
                from: job.status,
                to: JobStatus::Closed,
            });
        }

        let closed = self.store.transition(id, JobStatus::Open, JobStatus::Closed)?;
        if !closed {
            return Err(LifecycleError::ConflictingTransition {
                id: id.clone(),
                from: job.status,
                to: JobStatus::Closed,
            });
        }
        info!(job = %id, "posting closed");
        self.fetch_existing(id)
    }

    pub fn get(&self, id: &JobId) -> Result<JobPosting, LifecycleError> {
        self.fetch_existing(id)
    }

    pub fn list_by_status(&self, status: JobStatus) -> Result<Vec<JobPosting>, LifecycleError> {
        Ok(self.store.by_status(status)?)
    }

    fn fetch_existing(&self, id: &JobId) -> Result<JobPosting, LifecycleError> {
        self.store
            .fetch(id)?
            .ok_or_else(|| LifecycleError::NotFound(id.clone()))
    }
}
