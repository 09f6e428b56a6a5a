//! Directory search types.
//!
//! Every string enumeration accepted by the search API is represented as a
//! closed sum type, parsed once at the validation boundary. Downstream code
//! matches exhaustively instead of re-checking string membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when a stored or submitted keyword is outside its
/// enumeration.
#[derive(Debug, Clone, Error)]
#[error("unknown value: {0}")]
pub struct UnknownValue(pub String);

/// Parse a keyword string through the type's serde representation, so the
/// accepted spellings have a single source of truth.
pub(crate) fn parse_keyword<T: serde::de::DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
}

macro_rules! keyword_try_from {
    ($ty:ty) => {
        impl TryFrom<String> for $ty {
            type Error = UnknownValue;

            fn try_from(raw: String) -> Result<Self, UnknownValue> {
                parse_keyword(&raw).ok_or(UnknownValue(raw))
            }
        }
    };
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Alumni,
    Student,
    Recruiter,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Alumni => "alumni",
            UserRole::Student => "student",
            UserRole::Recruiter => "recruiter",
        }
    }
}

keyword_try_from!(UserRole);

/// Event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Networking,
    Webinar,
    Reunion,
    CareerFair,
    Workshop,
    Social,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Networking => "networking",
            EventType::Webinar => "webinar",
            EventType::Reunion => "reunion",
            EventType::CareerFair => "career_fair",
            EventType::Workshop => "workshop",
            EventType::Social => "social",
        }
    }
}

keyword_try_from!(EventType);

/// How an event is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLocationKind {
    Virtual,
    Physical,
    Hybrid,
}

impl EventLocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLocationKind::Virtual => "virtual",
            EventLocationKind::Physical => "physical",
            EventLocationKind::Hybrid => "hybrid",
        }
    }
}

/// RSVP answer for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Going,
    Maybe,
    NotGoing,
}

/// Employment type of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Freelance,
    Internship,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full_time",
            JobType::PartTime => "part_time",
            JobType::Contract => "contract",
            JobType::Freelance => "freelance",
            JobType::Internship => "internship",
        }
    }
}

keyword_try_from!(JobType);

/// Experience level of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Executive,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Executive => "executive",
        }
    }
}

keyword_try_from!(ExperienceLevel);

/// Where a job is performed. Remote postings are exempt from city filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobLocationKind {
    Remote,
    Onsite,
    Hybrid,
}

impl JobLocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobLocationKind::Remote => "remote",
            JobLocationKind::Onsite => "onsite",
            JobLocationKind::Hybrid => "hybrid",
        }
    }
}

/// Status of a job application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Interviewed,
    Offered,
    Rejected,
    Withdrawn,
}

/// Recency window for job postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePostedWindow {
    Today,
    Week,
    Month,
    All,
}

/// Sort direction shared by every entity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Allow-listed sort keys for the alumni directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlumniSortKey {
    Name,
    GraduationYear,
    LastActive,
}

/// Allow-listed sort keys for event search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSortKey {
    Date,
    Title,
    Attendees,
}

/// Allow-listed sort keys for job search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSortKey {
    Date,
    Salary,
    Relevance,
}

// -------------------------------------------------------------------------
// Raw search requests (as received from the API)
// -------------------------------------------------------------------------

/// Raw alumni-directory search request.
///
/// Enum-valued fields arrive as strings and are parsed by the validator so
/// unknown values produce a field-attributed error rather than a decode
/// failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlumniSearchRequest {
    pub query: Option<String>,
    pub graduation_year: Vec<i32>,
    pub department: Vec<String>,
    pub company: Vec<String>,
    pub location: Vec<String>,
    pub skills: Vec<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Inclusive date range filter.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DateRangeRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Raw event search request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventSearchRequest {
    pub query: Option<String>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub date_range: Option<DateRangeRequest>,
    pub location: Vec<String>,
    pub is_virtual: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Raw job search request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSearchRequest {
    pub query: Option<String>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub experience: Vec<String>,
    pub location: Vec<String>,
    pub skills: Vec<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub date_posted: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// -------------------------------------------------------------------------
// Validated filters
// -------------------------------------------------------------------------

/// Requested result page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

/// Validated alumni-directory filters.
#[derive(Debug, Clone)]
pub struct AlumniFilters {
    pub query: Option<String>,
    pub graduation_years: Vec<i32>,
    pub departments: Vec<String>,
    pub companies: Vec<String>,
    pub cities: Vec<String>,
    pub skills: Vec<String>,
    pub sort_by: Option<AlumniSortKey>,
    pub direction: Option<SortDirection>,
    pub page: PageRequest,
}

/// Validated event filters.
#[derive(Debug, Clone)]
pub struct EventFilters {
    pub query: Option<String>,
    pub types: Vec<EventType>,
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub cities: Vec<String>,
    pub is_virtual: Option<bool>,
    pub sort_by: Option<EventSortKey>,
    pub direction: Option<SortDirection>,
    pub page: PageRequest,
}

/// Validated job filters.
#[derive(Debug, Clone)]
pub struct JobFilters {
    pub query: Option<String>,
    pub types: Vec<JobType>,
    pub experience: Vec<ExperienceLevel>,
    pub cities: Vec<String>,
    pub skills: Vec<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub date_posted: Option<DatePostedWindow>,
    pub sort_by: Option<JobSortKey>,
    pub direction: Option<SortDirection>,
    pub page: PageRequest,
}

// -------------------------------------------------------------------------
// Result page
// -------------------------------------------------------------------------

/// One page of projected search results plus pagination metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> ResultPage<T> {
    /// Create a page with the total-page count computed from the limit.
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit > 0 {
            ((total as f64) / (f64::from(limit))).ceil() as u32
        } else {
            1
        };

        Self {
            items,
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn keyword_parsing_follows_serde_spelling() {
        assert_eq!(parse_keyword::<EventType>("career_fair"), Some(EventType::CareerFair));
        assert_eq!(parse_keyword::<JobType>("full_time"), Some(JobType::FullTime));
        assert_eq!(
            parse_keyword::<AlumniSortKey>("graduationYear"),
            Some(AlumniSortKey::GraduationYear)
        );
        assert_eq!(parse_keyword::<JobType>("fulltime"), None::<JobType>);
    }

    #[test]
    fn stored_keyword_try_from() {
        let role = UserRole::try_from("recruiter".to_string()).unwrap();
        assert_eq!(role, UserRole::Recruiter);
        assert!(UserRole::try_from("superuser".to_string()).is_err());
    }

    #[test]
    fn as_str_round_trips() {
        for ty in [
            JobType::FullTime,
            JobType::PartTime,
            JobType::Contract,
            JobType::Freelance,
            JobType::Internship,
        ] {
            assert_eq!(parse_keyword::<JobType>(ty.as_str()), Some(ty));
        }
    }

    #[test]
    fn search_request_accepts_camel_case() {
        let req: JobSearchRequest = serde_json::from_str(
            r#"{"type": ["full_time"], "salaryMin": 100000, "sortBy": "salary", "sortOrder": "desc"}"#,
        )
        .unwrap();
        assert_eq!(req.types, vec!["full_time"]);
        assert_eq!(req.salary_min, Some(100_000));
        assert_eq!(req.sort_by.as_deref(), Some("salary"));
    }

    #[test]
    fn result_page_math() {
        let page = ResultPage::new(vec![1, 2, 3], 25, 2, 10);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total, 25);
    }

    #[test]
    fn result_page_beyond_last_page() {
        let page: ResultPage<i32> = ResultPage::new(vec![], 25, 9, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn result_page_serializes_camel_case() {
        let page: ResultPage<i32> = ResultPage::new(vec![], 0, 1, 20);
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("totalPages").is_some());
        assert_eq!(json["total"], 0);
    }
}
