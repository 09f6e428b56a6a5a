//! User model and account operations.

use anyhow::{Context, Result};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::directory::types::{UserRole, parse_keyword};
use crate::error::ValidationError;

/// Geographic location block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub city: String,
    pub state: String,
    pub country: String,
}

/// Profile block stored as JSONB alongside the account record.
///
/// Keys keep their camelCase spelling in storage; the directory layer
/// addresses them with dotted field paths (`profile.graduationYear`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// User record.
///
/// Credential and token fields never serialize; the directory projector
/// additionally maps users onto a public entry type before they leave the
/// search layer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub pass: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    pub profile: Json<UserProfile>,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub email_verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Registration input.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub department: Option<String>,
}

impl RegisterUser {
    /// Validate the registration input and resolve the account role.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<UserRole, ValidationError> {
        if self.first_name.trim().chars().count() < 2 {
            return Err(ValidationError::InvalidField {
                field: "firstName",
                message: "first name must be at least 2 characters".to_string(),
            });
        }
        if self.last_name.trim().chars().count() < 2 {
            return Err(ValidationError::InvalidField {
                field: "lastName",
                message: "last name must be at least 2 characters".to_string(),
            });
        }
        if !self.email.contains('@') {
            return Err(ValidationError::InvalidField {
                field: "email",
                message: "invalid email address".to_string(),
            });
        }
        if self.password.chars().count() < 6 {
            return Err(ValidationError::InvalidField {
                field: "password",
                message: "password must be at least 6 characters".to_string(),
            });
        }
        if let Some(year) = self.graduation_year {
            let max = now.year() + 10;
            if year < 1950 || year > max {
                return Err(ValidationError::InvalidRange {
                    field: "graduationYear",
                    message: format!("graduation year must be between 1950 and {max}"),
                });
            }
        }

        match &self.role {
            None => Ok(UserRole::Alumni),
            Some(raw) => parse_keyword(raw).ok_or(ValidationError::InvalidEnumValue {
                field: "role",
                value: raw.clone(),
            }),
        }
    }
}

impl User {
    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by id")?;

        Ok(user)
    }

    /// Find a user by email (stored lowercased).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email.to_lowercase())
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by email")?;

        Ok(user)
    }

    /// Create a new user from validated registration input.
    pub async fn create(pool: &PgPool, input: &RegisterUser, role: UserRole) -> Result<Self> {
        let id = Uuid::now_v7();
        let pass = hash_password(&input.password)?;
        let name = format!("{} {}", input.first_name.trim(), input.last_name.trim());

        let profile = UserProfile {
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            avatar: None,
            phone: None,
            bio: None,
            location: None,
            skills: Vec::new(),
            graduation_year: input.graduation_year,
            department: input.department.clone(),
            company: None,
            position: None,
            is_public: true,
            last_active: Some(Utc::now()),
        };

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, pass, name, role, profile)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.email.to_lowercase())
        .bind(&pass)
        .bind(&name)
        .bind(role.as_str())
        .bind(Json(&profile))
        .fetch_one(pool)
        .await
        .context("failed to create user")?;

        Ok(user)
    }

    /// Update the profile's last-active timestamp.
    pub async fn touch_last_active(pool: &PgPool, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET profile = jsonb_set(profile, '{lastActive}', to_jsonb(NOW()), true),
                updated = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update last active time")?;

        Ok(())
    }

    /// Verify a password against this user's hash.
    pub fn verify_password(&self, password: &str) -> bool {
        if self.pass.is_empty() {
            return false;
        }

        let Ok(parsed_hash) = PasswordHash::new(&self.pass) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
