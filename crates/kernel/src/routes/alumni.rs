//! Alumni directory routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::directory::{AlumniEntry, AlumniSearchRequest, ResultPage};
use crate::error::AppError;
use crate::state::AppState;

/// Directory search handler.
///
/// POST /api/alumni/search
async fn search(
    State(state): State<AppState>,
    Json(request): Json<AlumniSearchRequest>,
) -> Result<Json<ResultPage<AlumniEntry>>, AppError> {
    Ok(Json(state.directory().search_alumni(request).await?))
}

/// Public profile fetch.
///
/// GET /api/alumni/{id}
async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AlumniEntry>, AppError> {
    Ok(Json(state.directory().fetch_alumni(id).await?))
}

/// Create the alumni router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/alumni/search", post(search))
        .route("/api/alumni/{id}", get(fetch))
}
