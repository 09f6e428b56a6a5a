//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;

use crate::auth::TokenService;
use crate::config::Config;
use crate::db;
use crate::directory::DirectoryService;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Bearer token service.
    tokens: TokenService,

    /// Directory search service.
    directory: DirectoryService,
}

impl AppState {
    /// Initialize state: connect to the database and apply the schema.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config).await?;
        db::ensure_schema(&pool).await?;

        let tokens = TokenService::new(config.jwt_secret.as_bytes());
        let directory = DirectoryService::new(pool.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                db: pool,
                tokens,
                directory,
            }),
        })
    }

    /// Database connection pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Token service.
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Directory search service.
    pub fn directory(&self) -> &DirectoryService {
        &self.inner.directory
    }

    /// Check database reachability.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }
}
