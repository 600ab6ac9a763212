use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use super::domain::{JobId, JobPosting, Notification, StudentId};
use super::eligibility::is_eligible;
use super::store::{NotificationSink, StoreError, StudentDirectory};

const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Writes one notification per eligible student when a posting opens.
///
/// The full student population is the candidate set; filtering happens entirely
/// through the eligibility evaluator. Per-student writes run on a bounded worker
/// pool and fail independently: one rejected write never aborts the rest.
pub struct FanoutDispatcher<D, N> {
    directory: Arc<D>,
    sink: Arc<N>,
    max_in_flight: usize,
}

impl<D, N> Clone for FanoutDispatcher<D, N> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            sink: self.sink.clone(),
            max_in_flight: self.max_in_flight,
        }
    }
}

/// Result of one fan-out pass, including every per-student write failure so an
/// operator (or a retry pass) can act on them.
#[derive(Debug, Clone, Serialize)]
pub struct FanoutReport {
    pub job_id: JobId,
    pub candidates: usize,
    pub eligible: usize,
    pub delivered: usize,
    pub failures: Vec<FanoutFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FanoutFailure {
    pub student_id: StudentId,
    pub error: String,
}

impl FanoutReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<D, N> FanoutDispatcher<D, N>
where
    D: StudentDirectory + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(directory: Arc<D>, sink: Arc<N>) -> Self {
        Self {
            directory,
            sink,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Fan a just-opened posting out to every eligible student. The posting
    /// itself is never mutated; the only side effects are sink writes.
    pub async fn dispatch(
        &self,
        job: &JobPosting,
        now: DateTime<Utc>,
    ) -> Result<FanoutReport, StoreError> {
        let students = self.directory.list_all()?;
        let candidates = students.len();

        let eligible: Vec<StudentId> = students
            .iter()
            .filter(|student| is_eligible(&job.criteria, student))
            .map(|student| student.id.clone())
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut writes = JoinSet::new();
        for recipient in &eligible {
            let notification = Notification::for_posting(job, recipient, now);
            let recipient = recipient.clone();
            let sink = self.sink.clone();
            let semaphore = semaphore.clone();
            writes.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("fan-out semaphore closed");
                (recipient, sink.write(notification))
            });
        }

        let mut delivered = 0;
        let mut failures = Vec::new();
        while let Some(joined) = writes.join_next().await {
            match joined {
                Ok((_, Ok(()))) => delivered += 1,
                Ok((student_id, Err(err))) => {
                    warn!(%job.id, %student_id, error = %err, "notification write failed");
                    failures.push(FanoutFailure {
                        student_id,
                        error: err.to_string(),
                    });
                }
                Err(join_err) => {
                    warn!(%job.id, error = %join_err, "notification task aborted");
                }
            }
        }

        Ok(FanoutReport {
            job_id: job.id.clone(),
            candidates,
            eligible: eligible.len(),
            delivered,
            failures,
        })
    }
}
