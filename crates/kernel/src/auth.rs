//! JWT token issuance, verification, and bearer extraction middleware.

use std::convert::Infallible;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::Request,
    http::StatusCode,
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::directory::types::UserRole;
use crate::error::AppError;
use crate::state::AppState;

/// Token issuer claim.
const TOKEN_ISSUER: &str = "coorte";

/// Default token lifetime.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Extended token lifetime for "remember me" logins.
pub const REMEMBER_ME_TTL_DAYS: i64 = 30;

/// JWT claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Account role at issue time.
    pub role: UserRole,
}

/// Signs and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token for an authenticated user.
    pub fn create_token(&self, user_id: Uuid, role: UserRole, ttl_days: i64) -> Result<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(ttl_days)).timestamp(),
            role,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("failed to encode token")
    }

    /// Verify a token and return its claims.
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .context("invalid token")?;

        Ok(data.claims)
    }
}

/// Authenticated caller extracted from a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

/// Middleware to authenticate `Authorization: Bearer` tokens.
///
/// A valid token sets [`AuthUser`] in the request extensions. No token
/// passes through unauthenticated; an invalid token is rejected with 401.
pub async fn authenticate_bearer(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    let Some(auth_header) = auth_header else {
        return next.run(request).await;
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return next.run(request).await;
    };

    let claims = match state.tokens().verify_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "invalid bearer token");
            return (
                StatusCode::UNAUTHORIZED,
                [("WWW-Authenticate", "Bearer error=\"invalid_token\"")],
                "Invalid token",
            )
                .into_response();
        }
    };

    let Ok(user_id) = claims.sub.parse::<Uuid>() else {
        debug!(sub = %claims.sub, "invalid user ID in token");
        return (StatusCode::UNAUTHORIZED, "Invalid token subject").into_response();
    };

    request.extensions_mut().insert(AuthUser {
        user_id,
        role: claims.role,
    });

    next.run(request).await
}

/// Extractor for the optional authenticated caller.
pub struct OptionalAuth(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthUser>().cloned()))
    }
}

/// Extractor requiring an authenticated caller; rejects with 401 otherwise.
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(Self)
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip() {
        let service = TokenService::new(b"test-secret");
        let user_id = Uuid::now_v7();

        let token = service
            .create_token(user_id, UserRole::Alumni, TOKEN_TTL_DAYS)
            .unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, UserRole::Alumni);
        assert_eq!(claims.iss, "coorte");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_rejected() {
        let service = TokenService::new(b"test-secret");
        let other = TokenService::new(b"other-secret");
        let token = other
            .create_token(Uuid::now_v7(), UserRole::Alumni, TOKEN_TTL_DAYS)
            .unwrap();

        assert!(service.verify_token(&token).is_err());
        assert!(service.verify_token("not.a.token").is_err());
    }

    #[test]
    fn wrong_issuer_rejected() {
        let secret = b"test-secret";
        let claims = TokenClaims {
            sub: Uuid::now_v7().to_string(),
            iss: "someone-else".to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::days(1)).timestamp(),
            role: UserRole::Alumni,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();

        let service = TokenService::new(secret);
        assert!(service.verify_token(&token).is_err());
    }
}
