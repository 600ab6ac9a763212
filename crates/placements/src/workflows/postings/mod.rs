//! Job-posting lifecycle engine: publication states, eligibility evaluation,
//! notification fan-out, and the reconciler that publishes scheduled postings.

pub mod domain;
pub mod eligibility;
pub mod fanout;
pub mod lifecycle;
pub mod reconciler;
pub mod roster;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    EligibilityCriteria, Gender, GenderPreference, JobDetails, JobId, JobPosting, JobStatus,
    Notification, NotificationId, PublishMode, PublishSchedule, StudentId, StudentRecord,
};
pub use eligibility::{ineligibility_reasons, is_eligible, IneligibilityReason};
pub use fanout::{FanoutDispatcher, FanoutFailure, FanoutReport};
pub use lifecycle::{
    JobDraft, JobLifecycleService, JobPatch, LifecycleError, PublishOutcome,
};
pub use reconciler::{LifecycleReconciler, TickReport};
pub use roster::{load_roster, parse_roster, RosterImportError};
pub use router::{posting_router, PostingView, PublishReceipt};
pub use store::{JobStore, NotificationSink, SinkError, StoreError, StudentDirectory};
