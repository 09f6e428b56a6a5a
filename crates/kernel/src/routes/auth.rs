//! Authentication routes (register, login).

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{REMEMBER_ME_TTL_DAYS, TOKEN_TTL_DAYS};
use crate::directory::AlumniEntry;
use crate::error::AppError;
use crate::models::User;
use crate::models::user::RegisterUser;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Response for successful registration or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AlumniEntry,
}

/// Registration handler.
///
/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterUser>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let role = request.validate(chrono::Utc::now())?;

    if User::find_by_email(state.db(), &request.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "a user already exists with this email".to_string(),
        ));
    }

    let user = User::create(state.db(), &request, role).await?;
    let token = state.tokens().create_token(user.id, role, TOKEN_TTL_DAYS)?;

    info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: crate::directory::project_user(user),
        }),
    ))
}

/// Login handler.
///
/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = User::find_by_email(state.db(), &request.email)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::Unauthorized)?;

    if !user.verify_password(&request.password) {
        return Err(AppError::Unauthorized);
    }

    if let Err(e) = User::touch_last_active(state.db(), user.id).await {
        tracing::warn!(error = %e, user_id = %user.id, "failed to update last active timestamp");
    }

    let ttl = if request.remember_me {
        REMEMBER_ME_TTL_DAYS
    } else {
        TOKEN_TTL_DAYS
    };
    let token = state.tokens().create_token(user.id, user.role, ttl)?;

    info!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        token,
        user: crate::directory::project_user(user),
    }))
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}
