//! Job board routes: search, fetch, create, apply.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::auth::{OptionalAuth, RequireAuth};
use crate::directory::{JobSearchRequest, JobView, ResultPage, ViewerContext};
use crate::error::AppError;
use crate::models::Job;
use crate::models::job::{ApplyInput, CreateJob};
use crate::state::AppState;

fn viewer(auth: &OptionalAuth) -> Option<ViewerContext> {
    auth.0.as_ref().map(|a| ViewerContext {
        user_id: a.user_id,
    })
}

/// Job search handler.
///
/// POST /api/jobs/search
async fn search(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Json(request): Json<JobSearchRequest>,
) -> Result<Json<ResultPage<JobView>>, AppError> {
    Ok(Json(
        state.directory().search_jobs(request, viewer(&auth)).await?,
    ))
}

/// Single posting fetch.
///
/// GET /api/jobs/{id}
async fn fetch(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<JobView>, AppError> {
    Ok(Json(state.directory().fetch_job(id, viewer(&auth)).await?))
}

/// Posting creation handler.
///
/// POST /api/jobs (authenticated)
async fn create(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<CreateJob>,
) -> Result<(StatusCode, Json<JobView>), AppError> {
    let job = Job::create(state.db(), auth.user_id, &request).await?;
    let view = state
        .directory()
        .fetch_job(job.id, Some(ViewerContext { user_id: auth.user_id }))
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Application handler.
///
/// POST /api/jobs/{id}/apply (authenticated)
async fn apply(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<ApplyInput>,
) -> Result<Json<JobView>, AppError> {
    Job::apply(state.db(), id, auth.user_id, &request).await?;
    let view = state
        .directory()
        .fetch_job(id, Some(ViewerContext { user_id: auth.user_id }))
        .await?;

    Ok(Json(view))
}

/// Create the job router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/jobs/search", post(search))
        .route("/api/jobs", post(create))
        .route("/api/jobs/{id}", get(fetch))
        .route("/api/jobs/{id}/apply", post(apply))
}
