//! Event model and RSVP operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::directory::types::{EventLocationKind, EventType, RsvpStatus, parse_keyword};
use crate::error::{AppError, ValidationError};

/// Longest accepted RSVP note.
const MAX_RSVP_NOTE_CHARS: usize = 200;

/// Where and how an event takes place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLocation {
    #[serde(rename = "type")]
    pub kind: EventLocationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_link: Option<String>,
}

/// One attendee's RSVP, embedded in the event record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rsvp {
    pub user_id: Uuid,
    pub status: RsvpStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created: DateTime<Utc>,
}

/// Event record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[sqlx(rename = "type", try_from = "String")]
    pub kind: EventType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Json<EventLocation>,
    pub max_attendees: Option<i32>,
    pub current_attendees: i32,
    pub organizer_id: Uuid,
    pub tags: Json<Vec<String>>,
    pub rsvps: Json<Vec<Rsvp>>,
    pub is_public: bool,
    pub is_active: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Raw location input for event creation; the kind arrives as a string so
/// unknown values report against `location.type`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLocationInput {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub virtual_link: Option<String>,
}

/// Event creation input.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvent {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: EventLocationInput,
    #[serde(default)]
    pub max_attendees: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

fn default_true() -> bool {
    true
}

impl CreateEvent {
    /// Validate the creation input, resolving the typed kind and location.
    pub fn validate(&self) -> Result<(EventType, EventLocation), ValidationError> {
        if self.title.trim().chars().count() < 5 {
            return Err(ValidationError::InvalidField {
                field: "title",
                message: "title must be at least 5 characters".to_string(),
            });
        }
        if self.description.trim().chars().count() < 20 {
            return Err(ValidationError::InvalidField {
                field: "description",
                message: "description must be at least 20 characters".to_string(),
            });
        }

        let kind: EventType =
            parse_keyword(&self.kind).ok_or(ValidationError::InvalidEnumValue {
                field: "type",
                value: self.kind.clone(),
            })?;

        if self.end_date <= self.start_date {
            return Err(ValidationError::InvalidRange {
                field: "endDate",
                message: "end date must be after start date".to_string(),
            });
        }

        if let Some(cap) = self.max_attendees
            && cap <= 0
        {
            return Err(ValidationError::InvalidRange {
                field: "maxAttendees",
                message: "maximum attendees must be positive".to_string(),
            });
        }

        let location_kind: EventLocationKind =
            parse_keyword(&self.location.kind).ok_or(ValidationError::InvalidEnumValue {
                field: "location.type",
                value: self.location.kind.clone(),
            })?;

        // Virtual and hybrid events need a link; physical and hybrid need a
        // street address and city.
        if matches!(
            location_kind,
            EventLocationKind::Virtual | EventLocationKind::Hybrid
        ) && self.location.virtual_link.is_none()
        {
            return Err(ValidationError::MissingField {
                field: "location.virtualLink",
            });
        }
        if matches!(
            location_kind,
            EventLocationKind::Physical | EventLocationKind::Hybrid
        ) {
            if self.location.address.is_none() {
                return Err(ValidationError::MissingField {
                    field: "location.address",
                });
            }
            if self.location.city.is_none() {
                return Err(ValidationError::MissingField {
                    field: "location.city",
                });
            }
        }

        Ok((
            kind,
            EventLocation {
                kind: location_kind,
                address: self.location.address.clone(),
                city: self.location.city.clone(),
                state: self.location.state.clone(),
                country: self.location.country.clone(),
                virtual_link: self.location.virtual_link.clone(),
            },
        ))
    }
}

/// RSVP submission input.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpInput {
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Number of RSVPs currently marked "going".
///
/// The stored `current_attendees` column is always this derivation over the
/// embedded RSVP list; it is recomputed on every RSVP mutation and never set
/// directly.
pub fn recompute_attendee_count(rsvps: &[Rsvp]) -> i32 {
    rsvps
        .iter()
        .filter(|rsvp| rsvp.status == RsvpStatus::Going)
        .count() as i32
}

impl Event {
    /// Find an event by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM event WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch event by id")?;

        Ok(event)
    }

    /// Create a new event.
    pub async fn create(
        pool: &PgPool,
        organizer_id: Uuid,
        input: &CreateEvent,
    ) -> Result<Self, AppError> {
        let (kind, location) = input.validate()?;
        let id = Uuid::now_v7();

        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO event
                (id, title, description, type, start_date, end_date, location,
                 max_attendees, organizer_id, tags, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(kind.as_str())
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(Json(&location))
        .bind(input.max_attendees)
        .bind(organizer_id)
        .bind(Json(&input.tags))
        .bind(input.is_public)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(event)
    }

    /// Upsert the caller's RSVP and recompute the attendee count.
    pub async fn set_rsvp(
        pool: &PgPool,
        event_id: Uuid,
        user_id: Uuid,
        input: &RsvpInput,
    ) -> Result<Self, AppError> {
        let status: RsvpStatus =
            parse_keyword(&input.status).ok_or(ValidationError::InvalidEnumValue {
                field: "status",
                value: input.status.clone(),
            })?;

        if let Some(notes) = &input.notes
            && notes.chars().count() > MAX_RSVP_NOTE_CHARS
        {
            return Err(ValidationError::InvalidRange {
                field: "notes",
                message: format!("notes must be at most {MAX_RSVP_NOTE_CHARS} characters"),
            }
            .into());
        }

        let event = Self::find_by_id(pool, event_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut rsvps = event.rsvps.0.clone();
        let already_going = rsvps
            .iter()
            .any(|r| r.user_id == user_id && r.status == RsvpStatus::Going);

        if status == RsvpStatus::Going
            && !already_going
            && let Some(cap) = event.max_attendees
            && recompute_attendee_count(&rsvps) >= cap
        {
            return Err(AppError::Conflict("event is at capacity".to_string()));
        }

        match rsvps.iter_mut().find(|r| r.user_id == user_id) {
            Some(existing) => {
                existing.status = status;
                existing.notes = input.notes.clone();
            }
            None => rsvps.push(Rsvp {
                user_id,
                status,
                notes: input.notes.clone(),
                created: Utc::now(),
            }),
        }

        let current_attendees = recompute_attendee_count(&rsvps);

        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE event
            SET rsvps = $1, current_attendees = $2, updated = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(Json(&rsvps))
        .bind(current_attendees)
        .bind(event_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(event)
    }

    /// The viewer's RSVP status, if any.
    pub fn rsvp_status_for(&self, user_id: Uuid) -> Option<RsvpStatus> {
        self.rsvps
            .0
            .iter()
            .find(|r| r.user_id == user_id)
            .map(|r| r.status)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn create_input() -> CreateEvent {
        CreateEvent {
            title: "Alumni networking night".to_string(),
            description: "An evening of reconnecting with fellow graduates.".to_string(),
            kind: "networking".to_string(),
            start_date: Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 5, 1, 21, 0, 0).unwrap(),
            location: EventLocationInput {
                kind: "physical".to_string(),
                address: Some("1 Campus Way".to_string()),
                city: Some("Boston".to_string()),
                state: None,
                country: None,
                virtual_link: None,
            },
            max_attendees: Some(100),
            tags: vec!["networking".to_string()],
            is_public: true,
        }
    }

    #[test]
    fn valid_input_resolves_types() {
        let (kind, location) = create_input().validate().unwrap();
        assert_eq!(kind, EventType::Networking);
        assert_eq!(location.kind, EventLocationKind::Physical);
    }

    #[test]
    fn end_before_start_rejected_on_end_date() {
        let mut input = create_input();
        input.end_date = input.start_date;
        let err = input.validate().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidRange { field: "endDate", .. }
        ));
    }

    #[test]
    fn virtual_event_requires_link() {
        let mut input = create_input();
        input.location.kind = "virtual".to_string();
        let err = input.validate().unwrap_err();
        assert_eq!(err.field(), "location.virtualLink");
    }

    #[test]
    fn physical_event_requires_address_and_city() {
        let mut input = create_input();
        input.location.city = None;
        let err = input.validate().unwrap_err();
        assert_eq!(err.field(), "location.city");
    }

    #[test]
    fn unknown_kind_rejected() {
        let mut input = create_input();
        input.kind = "hackathon".to_string();
        let err = input.validate().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidEnumValue { field: "type", .. }
        ));
    }

    #[test]
    fn attendee_count_counts_only_going() {
        let now = Utc::now();
        let rsvps = vec![
            Rsvp {
                user_id: Uuid::now_v7(),
                status: RsvpStatus::Going,
                notes: None,
                created: now,
            },
            Rsvp {
                user_id: Uuid::now_v7(),
                status: RsvpStatus::Maybe,
                notes: None,
                created: now,
            },
            Rsvp {
                user_id: Uuid::now_v7(),
                status: RsvpStatus::Going,
                notes: None,
                created: now,
            },
            Rsvp {
                user_id: Uuid::now_v7(),
                status: RsvpStatus::NotGoing,
                notes: None,
                created: now,
            },
        ];
        assert_eq!(recompute_attendee_count(&rsvps), 2);
        assert_eq!(recompute_attendee_count(&[]), 0);
    }

    #[test]
    fn rsvp_serde_round_trip() {
        let rsvp = Rsvp {
            user_id: Uuid::now_v7(),
            status: RsvpStatus::NotGoing,
            notes: Some("travelling".to_string()),
            created: Utc::now(),
        };
        let json = serde_json::to_value(&rsvp).unwrap();
        assert_eq!(json["status"], "not_going");
        assert!(json.get("userId").is_some());
    }
}
