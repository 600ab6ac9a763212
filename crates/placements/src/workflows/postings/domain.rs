use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for student records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for a notification, deterministic per `(job, recipient)` pair so
/// retried fan-out writes collapse into a single record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotificationId(pub String);

impl NotificationId {
    pub fn for_pair(job: &JobId, student: &StudentId) -> Self {
        Self(format!("notif-{}-{}", job.0, student.0))
    }
}

/// Publication state of a job posting. Automatic transitions only ever move
/// `PendingPublish` to `Open`; everything else is explicit administrative action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    PendingPublish,
    Open,
    Closed,
    Cancelled,
    Hold,
    Completed,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::PendingPublish => "pending_publish",
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Hold => "hold",
            JobStatus::Completed => "completed",
        }
    }

    /// Terminal states accept no further edits or transitions from this engine.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Closed | JobStatus::Cancelled | JobStatus::Completed
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a posting should become visible to students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishMode {
    Immediate,
    Scheduled,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Gender restriction carried by a posting. `Any` places no restriction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderPreference {
    #[default]
    Any,
    Male,
    Female,
}

impl GenderPreference {
    pub const fn admits(self, gender: Gender) -> bool {
        match self {
            GenderPreference::Any => true,
            GenderPreference::Male => matches!(gender, Gender::Male),
            GenderPreference::Female => matches!(gender, Gender::Female),
        }
    }
}

/// Multi-field eligibility predicate configuration. Every field that can be left
/// unset defaults to permissive: a blank criterion broadens eligibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EligibilityCriteria {
    #[serde(default)]
    pub min_cgpa: f32,
    #[serde(default)]
    pub max_cgpa: Option<f32>,
    #[serde(default)]
    pub max_current_arrears: Option<u8>,
    #[serde(default)]
    pub max_history_arrears: Option<u8>,
    #[serde(default)]
    pub gender_preference: GenderPreference,
    /// Empty set admits every batch year.
    #[serde(default)]
    pub eligible_batches: BTreeSet<u16>,
    /// Empty set admits every department.
    #[serde(default)]
    pub eligible_departments: BTreeSet<String>,
    #[serde(default)]
    pub excluded_students: BTreeSet<StudentId>,
}

/// Timing fields controlling when a posting opens and stops accepting applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishSchedule {
    pub mode: PublishMode,
    #[serde(default)]
    pub scheduled_publish_at: Option<DateTime<Utc>>,
    /// Stored for administrative display; close-by-date is not acted on here.
    #[serde(default)]
    pub scheduled_close_at: Option<DateTime<Utc>>,
    pub application_deadline: DateTime<Utc>,
}

/// Descriptive fields the lifecycle engine carries but never interprets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub company: String,
    pub position: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
}

/// A recruitment posting tracked through its publication lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub details: JobDetails,
    pub schedule: PublishSchedule,
    pub criteria: EligibilityCriteria,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Read-only student projection consumed by the eligibility evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: StudentId,
    pub name: String,
    pub cgpa: f32,
    pub current_arrears: u8,
    pub history_arrears: u8,
    pub gender: Gender,
    pub batch: u16,
    pub department: String,
}

/// One per `(job, recipient)` pair, created only by the fan-out dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: StudentId,
    pub job_id: JobId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    /// Build the announcement delivered to one eligible student when a posting opens.
    pub fn for_posting(job: &JobPosting, recipient: &StudentId, now: DateTime<Utc>) -> Self {
        let title = format!(
            "New Job Opening: {} at {}",
            job.details.position, job.details.company
        );
        let mut body = format!(
            "A new opportunity is available for {} at {}.",
            job.details.position, job.details.company
        );
        if let Some(location) = &job.details.location {
            body.push_str(&format!(" Location: {location}."));
        }
        if let Some(salary) = &job.details.salary {
            body.push_str(&format!(" Compensation: {salary}."));
        }
        body.push_str(&format!(
            " Apply before {}.",
            job.schedule.application_deadline.format("%Y-%m-%d %H:%M UTC")
        ));

        Self {
            id: NotificationId::for_pair(&job.id, recipient),
            recipient: recipient.clone(),
            job_id: job.id.clone(),
            title,
            body,
            created_at: now,
            read: false,
        }
    }
}
