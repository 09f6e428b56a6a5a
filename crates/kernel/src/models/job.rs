//! Job posting model and application operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::directory::types::{
    ApplicationStatus, ExperienceLevel, JobLocationKind, JobType, parse_keyword,
};
use crate::error::{AppError, ValidationError};

/// Longest accepted cover letter.
const MAX_COVER_LETTER_CHARS: usize = 1000;

/// Where a job is performed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLocation {
    #[serde(rename = "type")]
    pub kind: JobLocationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Pay period for a salary range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryPeriod {
    Hourly,
    Monthly,
    Yearly,
}

/// Advertised salary range (min ≤ max).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRange {
    pub min: i64,
    pub max: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_period")]
    pub period: SalaryPeriod,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_period() -> SalaryPeriod {
    SalaryPeriod::Yearly
}

/// One application, embedded in the posting record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// Job posting record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub requirements: Json<Vec<String>>,
    pub responsibilities: Json<Vec<String>>,
    #[sqlx(rename = "type", try_from = "String")]
    pub kind: JobType,
    #[sqlx(try_from = "String")]
    pub experience: ExperienceLevel,
    pub location: Json<JobLocation>,
    pub salary: Option<Json<SalaryRange>>,
    pub skills: Json<Vec<String>>,
    pub benefits: Json<Vec<String>>,
    pub application_url: Option<String>,
    pub application_email: Option<String>,
    pub posted_by: Uuid,
    pub applications: Json<Vec<JobApplication>>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Raw salary input for posting creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryInput {
    pub min: i64,
    pub max: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
}

/// Raw location input for posting creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLocationInput {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Job posting creation input.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJob {
    pub title: String,
    pub company: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub experience: String,
    pub location: JobLocationInput,
    #[serde(default)]
    pub salary: Option<SalaryInput>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub application_url: Option<String>,
    #[serde(default)]
    pub application_email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Validated creation pieces resolved out of the raw input.
#[derive(Debug)]
pub struct ValidatedJob {
    pub kind: JobType,
    pub experience: ExperienceLevel,
    pub location: JobLocation,
    pub salary: Option<SalaryRange>,
}

impl CreateJob {
    /// Validate the creation input, resolving the typed pieces.
    pub fn validate(&self) -> Result<ValidatedJob, ValidationError> {
        if self.title.trim().chars().count() < 5 {
            return Err(ValidationError::InvalidField {
                field: "title",
                message: "title must be at least 5 characters".to_string(),
            });
        }
        if self.company.trim().chars().count() < 2 {
            return Err(ValidationError::InvalidField {
                field: "company",
                message: "company name must be at least 2 characters".to_string(),
            });
        }
        if self.requirements.is_empty() {
            return Err(ValidationError::MissingField {
                field: "requirements",
            });
        }
        if self.responsibilities.is_empty() {
            return Err(ValidationError::MissingField {
                field: "responsibilities",
            });
        }
        if self.application_url.is_none() && self.application_email.is_none() {
            return Err(ValidationError::MissingField {
                field: "applicationUrl",
            });
        }

        let kind: JobType = parse_keyword(&self.kind).ok_or(ValidationError::InvalidEnumValue {
            field: "type",
            value: self.kind.clone(),
        })?;
        let experience: ExperienceLevel =
            parse_keyword(&self.experience).ok_or(ValidationError::InvalidEnumValue {
                field: "experience",
                value: self.experience.clone(),
            })?;
        let location_kind: JobLocationKind =
            parse_keyword(&self.location.kind).ok_or(ValidationError::InvalidEnumValue {
                field: "location.type",
                value: self.location.kind.clone(),
            })?;

        let salary = match &self.salary {
            None => None,
            Some(input) => {
                if input.min <= 0 {
                    return Err(ValidationError::InvalidRange {
                        field: "salary.min",
                        message: "minimum salary must be positive".to_string(),
                    });
                }
                if input.max < input.min {
                    return Err(ValidationError::InvalidRange {
                        field: "salary.max",
                        message: "maximum salary must not be below the minimum".to_string(),
                    });
                }
                let period = match &input.period {
                    None => default_period(),
                    Some(raw) => parse_keyword(raw).ok_or(ValidationError::InvalidEnumValue {
                        field: "salary.period",
                        value: raw.clone(),
                    })?,
                };
                Some(SalaryRange {
                    min: input.min,
                    max: input.max,
                    currency: input.currency.clone().unwrap_or_else(default_currency),
                    period,
                })
            }
        };

        Ok(ValidatedJob {
            kind,
            experience,
            location: JobLocation {
                kind: location_kind,
                city: self.location.city.clone(),
                state: self.location.state.clone(),
                country: self.location.country.clone(),
            },
            salary,
        })
    }
}

/// Application submission input.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyInput {
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub cover_letter: Option<String>,
}

impl Job {
    /// Find a posting by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM job WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch job by id")?;

        Ok(job)
    }

    /// Create a new posting.
    pub async fn create(pool: &PgPool, posted_by: Uuid, input: &CreateJob) -> Result<Self, AppError> {
        let validated = input.validate()?;
        let id = Uuid::now_v7();

        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO job
                (id, title, company, description, requirements, responsibilities,
                 type, experience, location, salary, skills, benefits,
                 application_url, application_email, posted_by, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.title.trim())
        .bind(input.company.trim())
        .bind(&input.description)
        .bind(Json(&input.requirements))
        .bind(Json(&input.responsibilities))
        .bind(validated.kind.as_str())
        .bind(validated.experience.as_str())
        .bind(Json(&validated.location))
        .bind(validated.salary.as_ref().map(Json))
        .bind(Json(&input.skills))
        .bind(Json(&input.benefits))
        .bind(&input.application_url)
        .bind(&input.application_email)
        .bind(posted_by)
        .bind(input.expires_at)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(job)
    }

    /// Append the caller's application to the posting.
    pub async fn apply(
        pool: &PgPool,
        job_id: Uuid,
        user_id: Uuid,
        input: &ApplyInput,
    ) -> Result<Self, AppError> {
        if let Some(letter) = &input.cover_letter
            && letter.chars().count() > MAX_COVER_LETTER_CHARS
        {
            return Err(ValidationError::InvalidRange {
                field: "coverLetter",
                message: format!(
                    "cover letter must be at most {MAX_COVER_LETTER_CHARS} characters"
                ),
            }
            .into());
        }

        let job = Self::find_by_id(pool, job_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !job.is_active {
            return Err(AppError::NotFound);
        }
        if job.application_for(user_id).is_some() {
            return Err(AppError::Conflict(
                "an application has already been submitted for this posting".to_string(),
            ));
        }

        let mut applications = job.applications.0.clone();
        applications.push(JobApplication {
            user_id,
            resume_url: input.resume_url.clone(),
            cover_letter: input.cover_letter.clone(),
            status: ApplicationStatus::Pending,
            applied_at: Utc::now(),
        });

        let job = sqlx::query_as::<_, Job>(
            r#"
            UPDATE job
            SET applications = $1, updated = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(Json(&applications))
        .bind(job_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(job)
    }

    /// The viewer's application, if any.
    pub fn application_for(&self, user_id: Uuid) -> Option<&JobApplication> {
        self.applications.0.iter().find(|a| a.user_id == user_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn create_input() -> CreateJob {
        CreateJob {
            title: "Backend engineer".to_string(),
            company: "Initech".to_string(),
            description: "Build and operate the services behind our alumni platform."
                .to_string(),
            requirements: vec!["3+ years of backend experience".to_string()],
            responsibilities: vec!["Own services end to end".to_string()],
            kind: "full_time".to_string(),
            experience: "mid".to_string(),
            location: JobLocationInput {
                kind: "remote".to_string(),
                city: None,
                state: None,
                country: None,
            },
            salary: Some(SalaryInput {
                min: 120_000,
                max: 160_000,
                currency: None,
                period: None,
            }),
            skills: vec!["rust".to_string()],
            benefits: vec![],
            application_url: Some("https://example.com/apply".to_string()),
            application_email: None,
            expires_at: None,
        }
    }

    #[test]
    fn valid_input_resolves_types_and_defaults() {
        let validated = create_input().validate().unwrap();
        assert_eq!(validated.kind, JobType::FullTime);
        assert_eq!(validated.experience, ExperienceLevel::Mid);
        assert_eq!(validated.location.kind, JobLocationKind::Remote);
        let salary = validated.salary.unwrap();
        assert_eq!(salary.currency, "USD");
        assert_eq!(salary.period, SalaryPeriod::Yearly);
    }

    #[test]
    fn inverted_salary_rejected() {
        let mut input = create_input();
        input.salary = Some(SalaryInput {
            min: 160_000,
            max: 120_000,
            currency: None,
            period: None,
        });
        let err = input.validate().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidRange { field: "salary.max", .. }
        ));
    }

    #[test]
    fn application_contact_required() {
        let mut input = create_input();
        input.application_url = None;
        input.application_email = None;
        let err = input.validate().unwrap_err();
        assert_eq!(err.field(), "applicationUrl");
    }

    #[test]
    fn unknown_experience_rejected() {
        let mut input = create_input();
        input.experience = "principal".to_string();
        let err = input.validate().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidEnumValue { field: "experience", .. }
        ));
    }

    #[test]
    fn application_serde_uses_camel_case() {
        let application = JobApplication {
            user_id: Uuid::now_v7(),
            resume_url: None,
            cover_letter: Some("I would love to work here.".to_string()),
            status: ApplicationStatus::Pending,
            applied_at: Utc::now(),
        };
        let json = serde_json::to_value(&application).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("appliedAt").is_some());
        assert!(json.get("coverLetter").is_some());
    }
}
