use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{JobId, JobPosting, JobStatus};
use super::fanout::FanoutReport;
use super::lifecycle::{JobDraft, JobLifecycleService, JobPatch, LifecycleError, PublishOutcome};
use super::store::{JobStore, NotificationSink, StudentDirectory};

/// Router builder exposing the administrative lifecycle surface over HTTP.
pub fn posting_router<S, D, N>(service: Arc<JobLifecycleService<S, D, N>>) -> Router
where
    S: JobStore + 'static,
    D: StudentDirectory + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/postings",
            post(create_handler::<S, D, N>).get(list_handler::<S, D, N>),
        )
        .route(
            "/api/v1/postings/:job_id",
            get(get_handler::<S, D, N>).patch(edit_handler::<S, D, N>),
        )
        .route(
            "/api/v1/postings/:job_id/publish",
            post(publish_handler::<S, D, N>),
        )
        .route(
            "/api/v1/postings/:job_id/close",
            post(close_handler::<S, D, N>),
        )
        .with_state(service)
}

/// Sanitized posting representation returned by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PostingView {
    pub id: JobId,
    pub status: &'static str,
    pub company: String,
    pub position: String,
    pub application_deadline: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_publish_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl PostingView {
    pub fn from_posting(job: &JobPosting) -> Self {
        Self {
            id: job.id.clone(),
            status: job.status.label(),
            company: job.details.company.clone(),
            position: job.details.position.clone(),
            application_deadline: job.schedule.application_deadline,
            scheduled_publish_at: job.schedule.scheduled_publish_at,
            published_at: job.published_at,
        }
    }
}

/// Response for operations that may have opened the posting.
#[derive(Debug, Serialize)]
pub struct PublishReceipt {
    pub posting: PostingView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fanout: Option<FanoutReport>,
}

impl PublishReceipt {
    fn from_outcome(outcome: &PublishOutcome) -> Self {
        Self {
            posting: PostingView::from_posting(&outcome.job),
            fanout: outcome.fanout.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    status: JobStatus,
}

pub(crate) async fn create_handler<S, D, N>(
    State(service): State<Arc<JobLifecycleService<S, D, N>>>,
    axum::Json(draft): axum::Json<JobDraft>,
) -> Response
where
    S: JobStore + 'static,
    D: StudentDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.create_job(draft, Utc::now()).await {
        Ok(outcome) => (
            StatusCode::CREATED,
            axum::Json(PublishReceipt::from_outcome(&outcome)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<S, D, N>(
    State(service): State<Arc<JobLifecycleService<S, D, N>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: JobStore + 'static,
    D: StudentDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.list_by_status(query.status) {
        Ok(jobs) => {
            let views: Vec<PostingView> = jobs.iter().map(PostingView::from_posting).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<S, D, N>(
    State(service): State<Arc<JobLifecycleService<S, D, N>>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: JobStore + 'static,
    D: StudentDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.get(&JobId(job_id)) {
        Ok(job) => (StatusCode::OK, axum::Json(PostingView::from_posting(&job))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn edit_handler<S, D, N>(
    State(service): State<Arc<JobLifecycleService<S, D, N>>>,
    Path(job_id): Path<String>,
    axum::Json(patch): axum::Json<JobPatch>,
) -> Response
where
    S: JobStore + 'static,
    D: StudentDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.edit_job(&JobId(job_id), patch) {
        Ok(job) => (StatusCode::OK, axum::Json(PostingView::from_posting(&job))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn publish_handler<S, D, N>(
    State(service): State<Arc<JobLifecycleService<S, D, N>>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: JobStore + 'static,
    D: StudentDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.manual_publish(&JobId(job_id), Utc::now()).await {
        Ok(outcome) => (
            StatusCode::OK,
            axum::Json(PublishReceipt::from_outcome(&outcome)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn close_handler<S, D, N>(
    State(service): State<Arc<JobLifecycleService<S, D, N>>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: JobStore + 'static,
    D: StudentDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.close_job(&JobId(job_id)) {
        Ok(job) => (StatusCode::OK, axum::Json(PostingView::from_posting(&job))).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: LifecycleError) -> Response {
    let status = match &err {
        LifecycleError::InvalidConfiguration(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LifecycleError::ConflictingTransition { .. } => StatusCode::CONFLICT,
        LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
        LifecycleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
