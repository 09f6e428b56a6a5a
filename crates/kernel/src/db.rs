//! Database connection pool management and schema setup.

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    Ok(pool)
}

/// Check if the database connection is healthy.
pub async fn check_health(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

/// Apply the idempotent schema. Search vectors are generated columns so the
/// text index never drifts from the row contents.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            pass TEXT NOT NULL,
            name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'alumni',
            profile JSONB NOT NULL,
            email_verified BOOLEAN NOT NULL DEFAULT FALSE,
            email_verification_token TEXT,
            password_reset_token TEXT,
            password_reset_expires TIMESTAMPTZ,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            search_vector tsvector GENERATED ALWAYS AS (
                to_tsvector('english',
                    coalesce(name, '') || ' ' ||
                    coalesce(profile->>'bio', '') || ' ' ||
                    coalesce(profile->>'skills', '') || ' ' ||
                    coalesce(profile->>'company', '') || ' ' ||
                    coalesce(profile->>'position', ''))
            ) STORED
        )
        "#,
    )
    .execute(pool)
    .await
    .context("failed to create users table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS event (
            id UUID PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            type TEXT NOT NULL,
            start_date TIMESTAMPTZ NOT NULL,
            end_date TIMESTAMPTZ NOT NULL,
            location JSONB NOT NULL,
            max_attendees INTEGER,
            current_attendees INTEGER NOT NULL DEFAULT 0,
            organizer_id UUID NOT NULL REFERENCES users(id),
            tags JSONB NOT NULL DEFAULT '[]',
            rsvps JSONB NOT NULL DEFAULT '[]',
            is_public BOOLEAN NOT NULL DEFAULT TRUE,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            search_vector tsvector GENERATED ALWAYS AS (
                to_tsvector('english',
                    coalesce(title, '') || ' ' ||
                    coalesce(description, '') || ' ' ||
                    coalesce(tags::text, ''))
            ) STORED
        )
        "#,
    )
    .execute(pool)
    .await
    .context("failed to create event table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job (
            id UUID PRIMARY KEY,
            title TEXT NOT NULL,
            company TEXT NOT NULL,
            description TEXT NOT NULL,
            requirements JSONB NOT NULL DEFAULT '[]',
            responsibilities JSONB NOT NULL DEFAULT '[]',
            type TEXT NOT NULL,
            experience TEXT NOT NULL,
            location JSONB NOT NULL,
            salary JSONB,
            skills JSONB NOT NULL DEFAULT '[]',
            benefits JSONB NOT NULL DEFAULT '[]',
            application_url TEXT,
            application_email TEXT,
            posted_by UUID NOT NULL REFERENCES users(id),
            applications JSONB NOT NULL DEFAULT '[]',
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            expires_at TIMESTAMPTZ,
            created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            search_vector tsvector GENERATED ALWAYS AS (
                to_tsvector('english',
                    coalesce(title, '') || ' ' ||
                    coalesce(description, '') || ' ' ||
                    coalesce(company, ''))
            ) STORED
        )
        "#,
    )
    .execute(pool)
    .await
    .context("failed to create job table")?;

    let indexes = [
        "CREATE INDEX IF NOT EXISTS users_search_idx ON users USING GIN (search_vector)",
        "CREATE INDEX IF NOT EXISTS users_role_idx ON users (role)",
        "CREATE INDEX IF NOT EXISTS users_active_idx ON users (is_active)",
        "CREATE INDEX IF NOT EXISTS event_search_idx ON event USING GIN (search_vector)",
        "CREATE INDEX IF NOT EXISTS event_type_idx ON event (type)",
        "CREATE INDEX IF NOT EXISTS event_start_idx ON event (start_date)",
        "CREATE INDEX IF NOT EXISTS job_search_idx ON job USING GIN (search_vector)",
        "CREATE INDEX IF NOT EXISTS job_type_idx ON job (type)",
        "CREATE INDEX IF NOT EXISTS job_created_idx ON job (created DESC)",
        "CREATE INDEX IF NOT EXISTS job_expires_idx ON job (expires_at)",
    ];
    for ddl in indexes {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .context("failed to create index")?;
    }

    Ok(())
}
