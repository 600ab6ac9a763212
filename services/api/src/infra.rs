use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use placements::workflows::postings::{
    JobId, JobPosting, JobStatus, JobStore, Notification, NotificationId, NotificationSink,
    SinkError, StoreError, StudentDirectory, StudentRecord,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryJobStore {
    jobs: Arc<Mutex<HashMap<JobId, JobPosting>>>,
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, StoreError> {
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        if guard.contains_key(&job.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    // Edits carry whatever snapshot the caller fetched; the stored status and
    // publish timestamp always win, since only transition/mark_published own
    // those fields.
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

    // The whole compare-and-set happens under one lock acquisition, which is
    // what makes concurrent reconcilers safe against this store.
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryStudentDirectory {
    students: Arc<Mutex<Vec<StudentRecord>>>,
}

impl InMemoryStudentDirectory {
    pub(crate) fn seed(&self, students: Vec<StudentRecord>) {
        let mut guard = self.students.lock().expect("directory mutex poisoned");
        *guard = students;
    }
}

impl StudentDirectory for InMemoryStudentDirectory {
    fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let guard = self.students.lock().expect("directory mutex poisoned");
        Ok(guard.clone())
    }
}

/// Upserts by the deterministic notification id, so a retried fan-out write
/// lands on the existing record instead of appending a duplicate.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationSink {
    notifications: Arc<Mutex<BTreeMap<NotificationId, Notification>>>,
}

impl NotificationSink for InMemoryNotificationSink {
    fn write(&self, notification: Notification) -> Result<(), SinkError> {
        let mut guard = self.notifications.lock().expect("sink mutex poisoned");
        guard.insert(notification.id.clone(), notification);
        Ok(())
    }
}

impl InMemoryNotificationSink {
    pub(crate) fn all(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("sink mutex poisoned")
            .values()
            .cloned()
            .collect()
    }
}
