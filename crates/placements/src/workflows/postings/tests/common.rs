use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::workflows::postings::domain::{
    EligibilityCriteria, Gender, JobDetails, JobId, JobPosting, JobStatus, Notification,
    NotificationId, PublishMode, PublishSchedule, StudentId, StudentRecord,
};
use crate::workflows::postings::fanout::FanoutDispatcher;
use crate::workflows::postings::lifecycle::{JobDraft, JobLifecycleService};
use crate::workflows::postings::store::{
    JobStore, NotificationSink, SinkError, StoreError, StudentDirectory,
};

pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn student(id: &str, cgpa: f32, batch: u16, department: &str) -> StudentRecord {
    StudentRecord {
        id: StudentId(id.to_string()),
        name: format!("Student {id}"),
        cgpa,
        current_arrears: 0,
        history_arrears: 0,
        gender: Gender::Female,
        batch,
        department: department.to_string(),
    }
}

pub(super) fn details() -> JobDetails {
    JobDetails {
        company: "Aurora Systems".to_string(),
        position: "Graduate Engineer".to_string(),
        description: "Backend engineering role".to_string(),
        location: Some("Chennai".to_string()),
        salary: Some("6.5 LPA".to_string()),
    }
}

pub(super) fn schedule(mode: PublishMode, publish_at: Option<DateTime<Utc>>) -> PublishSchedule {
    PublishSchedule {
        mode,
        scheduled_publish_at: publish_at,
        scheduled_close_at: None,
        application_deadline: at(23),
    }
}

pub(super) fn draft(mode: PublishMode, publish_at: Option<DateTime<Utc>>) -> JobDraft {
    JobDraft {
        details: details(),
        schedule: schedule(mode, publish_at),
        criteria: EligibilityCriteria::default(),
    }
}

pub(super) fn batch_restricted_criteria(batch: u16) -> EligibilityCriteria {
    EligibilityCriteria {
        eligible_batches: BTreeSet::from([batch]),
        ..EligibilityCriteria::default()
    }
}

#[derive(Default)]
pub(super) struct MemoryJobStore {
    jobs: Mutex<HashMap<JobId, JobPosting>>,
}

impl JobStore for MemoryJobStore {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, StoreError> {
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        if guard.contains_key(&job.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn update(&self, job: JobPosting) -> Result<(), StoreError> {
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        let stored = guard.get_mut(&job.id).ok_or(StoreError::NotFound)?;
        let status = stored.status;
        let published_at = stored.published_at;
        *stored = job;
        stored.status = status;
        stored.published_at = published_at;
        Ok(())
    }

    fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, StoreError> {
        let guard = self.jobs.lock().expect("job store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn by_status(&self, status: JobStatus) -> Result<Vec<JobPosting>, StoreError> {
        let guard = self.jobs.lock().expect("job store mutex poisoned");
        Ok(guard
            .values()
            .filter(|job| job.status == status)
            .cloned()
            .collect())
    }

    fn transition(
        &self,
        id: &JobId,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<bool, StoreError> {
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        let job = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        if job.status != expected {
            return Ok(false);
        }
        job.status = next;
        Ok(true)
    }

    fn mark_published(&self, id: &JobId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        let job = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        job.published_at = Some(at);
        Ok(())
    }
}

/// Wraps the memory store and fails conditional transitions for chosen jobs, to
/// exercise the reconciler's per-job error handling.
pub(super) struct FailingTransitionStore {
    pub(super) inner: MemoryJobStore,
    pub(super) fail_transitions_for: BTreeSet<JobId>,
}

impl JobStore for FailingTransitionStore {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, StoreError> {
        self.inner.insert(job)
    }

    fn update(&self, job: JobPosting) -> Result<(), StoreError> {
        self.inner.update(job)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, StoreError> {
        self.inner.fetch(id)
    }

    fn by_status(&self, status: JobStatus) -> Result<Vec<JobPosting>, StoreError> {
        self.inner.by_status(status)
    }

    fn transition(
        &self,
        id: &JobId,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<bool, StoreError> {
        if self.fail_transitions_for.contains(id) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        self.inner.transition(id, expected, next)
    }

    fn mark_published(&self, id: &JobId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.inner.mark_published(id, at)
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    pub(super) students: Vec<StudentRecord>,
}

impl StudentDirectory for MemoryDirectory {
    fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        Ok(self.students.clone())
    }
}

#[derive(Default)]
pub(super) struct MemorySink {
    notifications: Mutex<BTreeMap<NotificationId, Notification>>,
}

impl NotificationSink for MemorySink {
    fn write(&self, notification: Notification) -> Result<(), SinkError> {
        let mut guard = self.notifications.lock().expect("sink mutex poisoned");
        guard.insert(notification.id.clone(), notification);
        Ok(())
    }
}

impl MemorySink {
    pub(super) fn all(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("sink mutex poisoned")
            .values()
            .cloned()
            .collect()
    }
}

/// Sink double that rejects writes for selected recipients.
#[derive(Default)]
pub(super) struct FlakySink {
    fail_for: BTreeSet<StudentId>,
    inner: MemorySink,
}

impl FlakySink {
    pub(super) fn failing_for(fail_for: BTreeSet<StudentId>) -> Self {
        Self {
            fail_for,
            inner: MemorySink::default(),
        }
    }

    pub(super) fn all(&self) -> Vec<Notification> {
        self.inner.all()
    }
}

impl NotificationSink for FlakySink {
    fn write(&self, notification: Notification) -> Result<(), SinkError> {
        if self.fail_for.contains(&notification.recipient) {
            return Err(SinkError::Unavailable("simulated write failure".to_string()));
        }
        self.inner.write(notification)
    }
}

pub(super) fn service_with(
    students: Vec<StudentRecord>,
) -> (
    Arc<MemoryJobStore>,
    Arc<MemorySink>,
    JobLifecycleService<MemoryJobStore, MemoryDirectory, MemorySink>,
) {
    let store = Arc::new(MemoryJobStore::default());
    let directory = Arc::new(MemoryDirectory { students });
    let sink = Arc::new(MemorySink::default());
    let dispatcher = FanoutDispatcher::new(directory, sink.clone());
    let service = JobLifecycleService::new(store.clone(), dispatcher);
    (store, sink, service)
}
