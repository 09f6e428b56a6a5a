//! Projection of stored records into their public API shapes.
//!
//! Person records are mapped onto [`AlumniEntry`], a type with no credential
//! or token fields at all, so sensitive data cannot leave the layer
//! regardless of caller identity. Event and job views optionally attach a
//! denormalized organizer/poster summary and, when a viewer context is
//! supplied, membership flags computed from the embedded sub-lists.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::event::EventLocation;
use crate::models::job::{JobLocation, SalaryRange};
use crate::models::user::UserProfile;
use crate::models::{Event, Job, User};

use super::types::{
    ApplicationStatus, EventType, ExperienceLevel, JobType, RsvpStatus, UserRole,
};

/// The authenticated viewer a search or fetch runs on behalf of.
#[derive(Debug, Clone, Copy)]
pub struct ViewerContext {
    pub user_id: Uuid,
}

/// Public directory entry for a person.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlumniEntry {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub profile: UserProfile,
    pub created: DateTime<Utc>,
}

/// Lightweight reference to a user, attached to events and postings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Public view of an event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: EventLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<i32>,
    pub current_attendees: i32,
    pub organizer_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<UserSummary>,
    pub tags: Vec<String>,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_has_rsvpd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_rsvp_status: Option<RsvpStatus>,
    pub created: DateTime<Utc>,
}

/// Public view of a job posting. The embedded application list stays
/// internal; only the viewer's own membership is reported.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    #[serde(rename = "type")]
    pub kind: JobType,
    pub experience: ExperienceLevel,
    pub location: JobLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<SalaryRange>,
    pub skills: Vec<String>,
    pub benefits: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_email: Option<String>,
    pub posted_by: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_has_applied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_application_status: Option<ApplicationStatus>,
    pub created: DateTime<Utc>,
}

/// Project a person record for the public directory.
pub fn project_user(user: User) -> AlumniEntry {
    AlumniEntry {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
        profile: user.profile.0,
        created: user.created,
    }
}

/// Project an event, optionally attaching the organizer summary and viewer
/// membership flags.
pub fn project_event(
    event: Event,
    organizer: Option<UserSummary>,
    viewer: Option<&ViewerContext>,
) -> EventView {
    let viewer_status = viewer.map(|v| event.rsvp_status_for(v.user_id));

    EventView {
        id: event.id,
        title: event.title,
        description: event.description,
        kind: event.kind,
        start_date: event.start_date,
        end_date: event.end_date,
        location: event.location.0,
        max_attendees: event.max_attendees,
        current_attendees: event.current_attendees,
        organizer_id: event.organizer_id,
        organizer,
        tags: event.tags.0,
        is_public: event.is_public,
        viewer_has_rsvpd: viewer_status.map(|status| status.is_some()),
        viewer_rsvp_status: viewer_status.flatten(),
        created: event.created,
    }
}

/// Project a job posting, optionally attaching the poster summary and viewer
/// membership flags.
pub fn project_job(job: Job, poster: Option<UserSummary>, viewer: Option<&ViewerContext>) -> JobView {
    let viewer_status = viewer.map(|v| job.application_for(v.user_id).map(|a| a.status));

    JobView {
        id: job.id,
        title: job.title,
        company: job.company,
        description: job.description,
        requirements: job.requirements.0,
        responsibilities: job.responsibilities.0,
        kind: job.kind,
        experience: job.experience,
        location: job.location.0,
        salary: job.salary.map(|s| s.0),
        skills: job.skills.0,
        benefits: job.benefits.0,
        application_url: job.application_url,
        application_email: job.application_email,
        posted_by: job.posted_by,
        poster,
        expires_at: job.expires_at,
        viewer_has_applied: viewer_status.map(|status| status.is_some()),
        viewer_application_status: viewer_status.flatten(),
        created: job.created,
    }
}
