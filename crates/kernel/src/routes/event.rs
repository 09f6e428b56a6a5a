//! Event routes: search, fetch, create, RSVP.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::auth::{OptionalAuth, RequireAuth};
use crate::directory::{EventSearchRequest, EventView, ResultPage, ViewerContext};
use crate::error::AppError;
use crate::models::Event;
use crate::models::event::{CreateEvent, RsvpInput};
use crate::state::AppState;

fn viewer(auth: &OptionalAuth) -> Option<ViewerContext> {
    auth.0.as_ref().map(|a| ViewerContext {
        user_id: a.user_id,
    })
}

/// Event search handler.
///
/// POST /api/events/search
async fn search(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Json(request): Json<EventSearchRequest>,
) -> Result<Json<ResultPage<EventView>>, AppError> {
    Ok(Json(
        state
            .directory()
            .search_events(request, viewer(&auth))
            .await?,
    ))
}

/// Single event fetch.
///
/// GET /api/events/{id}
async fn fetch(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<EventView>, AppError> {
    Ok(Json(state.directory().fetch_event(id, viewer(&auth)).await?))
}

/// Event creation handler.
///
/// POST /api/events (authenticated)
async fn create(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<CreateEvent>,
) -> Result<(StatusCode, Json<EventView>), AppError> {
    let event = Event::create(state.db(), auth.user_id, &request).await?;
    let view = state
        .directory()
        .fetch_event(event.id, Some(ViewerContext { user_id: auth.user_id }))
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// RSVP handler. Upserts the caller's RSVP and recomputes the attendee
/// count.
///
/// POST /api/events/{id}/rsvp (authenticated)
async fn rsvp(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<RsvpInput>,
) -> Result<Json<EventView>, AppError> {
    Event::set_rsvp(state.db(), id, auth.user_id, &request).await?;
    let view = state
        .directory()
        .fetch_event(id, Some(ViewerContext { user_id: auth.user_id }))
        .await?;

    Ok(Json(view))
}

/// Create the event router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events/search", post(search))
        .route("/api/events", post(create))
        .route("/api/events/{id}", get(fetch))
        .route("/api/events/{id}/rsvp", post(rsvp))
}
