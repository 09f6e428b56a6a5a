//! Filter criteria validation.
//!
//! Normalizes raw search requests into validated filters: enum keywords are
//! parsed into their closed types, pagination is clamped, and range filters
//! are checked for consistency. Pure functions of their input.

use crate::error::ValidationError;

use super::types::{
    AlumniFilters, AlumniSearchRequest, DatePostedWindow, EventFilters, EventSearchRequest,
    JobFilters, JobSearchRequest, PageRequest, parse_keyword,
};

/// Page size applied when the request does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Validate an alumni-directory search request.
pub fn alumni(request: AlumniSearchRequest) -> Result<AlumniFilters, ValidationError> {
    Ok(AlumniFilters {
        query: normalize_query(request.query),
        graduation_years: request.graduation_year,
        departments: request.department,
        companies: request.company,
        cities: request.location,
        skills: request.skills,
        sort_by: parse_opt(request.sort_by, "sortBy")?,
        direction: parse_opt(request.sort_order, "sortOrder")?,
        page: page_request(request.page, request.limit)?,
    })
}

/// Validate an event search request.
pub fn events(request: EventSearchRequest) -> Result<EventFilters, ValidationError> {
    let date_range = match request.date_range {
        Some(range) => {
            if range.end <= range.start {
                return Err(ValidationError::InvalidRange {
                    field: "dateRange.end",
                    message: "range end must be after its start".to_string(),
                });
            }
            Some((range.start, range.end))
        }
        None => None,
    };

    Ok(EventFilters {
        query: normalize_query(request.query),
        types: parse_each(request.types, "type")?,
        date_range,
        cities: request.location,
        is_virtual: request.is_virtual,
        sort_by: parse_opt(request.sort_by, "sortBy")?,
        direction: parse_opt(request.sort_order, "sortOrder")?,
        page: page_request(request.page, request.limit)?,
    })
}

/// Validate a job search request.
pub fn jobs(request: JobSearchRequest) -> Result<JobFilters, ValidationError> {
    if let Some(min) = request.salary_min
        && min <= 0
    {
        return Err(ValidationError::InvalidRange {
            field: "salaryMin",
            message: "salary bound must be positive".to_string(),
        });
    }
    if let Some(max) = request.salary_max
        && max <= 0
    {
        return Err(ValidationError::InvalidRange {
            field: "salaryMax",
            message: "salary bound must be positive".to_string(),
        });
    }
    if let (Some(min), Some(max)) = (request.salary_min, request.salary_max)
        && max < min
    {
        return Err(ValidationError::InvalidRange {
            field: "salaryMax",
            message: "maximum salary must not be below the minimum".to_string(),
        });
    }

    let date_posted = parse_opt::<DatePostedWindow>(request.date_posted, "datePosted")?
        // "all" is an explicit no-op, equivalent to leaving the filter out.
        .filter(|window| *window != DatePostedWindow::All);

    Ok(JobFilters {
        query: normalize_query(request.query),
        types: parse_each(request.types, "type")?,
        experience: parse_each(request.experience, "experience")?,
        cities: request.location,
        skills: request.skills,
        salary_min: request.salary_min,
        salary_max: request.salary_max,
        date_posted,
        sort_by: parse_opt(request.sort_by, "sortBy")?,
        direction: parse_opt(request.sort_order, "sortOrder")?,
        page: page_request(request.page, request.limit)?,
    })
}

/// Trim a free-text query; an empty string is treated as absent.
fn normalize_query(query: Option<String>) -> Option<String> {
    query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
}

/// Resolve page number and page size, applying defaults and bounds.
fn page_request(page: Option<i64>, limit: Option<i64>) -> Result<PageRequest, ValidationError> {
    let page = match page {
        None => 1,
        Some(p) if p >= 1 => p as u32,
        Some(_) => {
            return Err(ValidationError::InvalidPagination {
                field: "page",
                message: "page must be at least 1".to_string(),
            });
        }
    };

    let limit = match limit {
        None => DEFAULT_PAGE_SIZE,
        Some(l) if (1..=i64::from(MAX_PAGE_SIZE)).contains(&l) => l as u32,
        Some(_) => {
            return Err(ValidationError::InvalidPagination {
                field: "limit",
                message: format!("limit must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }
    };

    Ok(PageRequest { page, limit })
}

/// Parse every keyword in a list, attributing failures to `field`.
fn parse_each<T: serde::de::DeserializeOwned>(
    values: Vec<String>,
    field: &'static str,
) -> Result<Vec<T>, ValidationError> {
    values
        .into_iter()
        .map(|raw| {
            parse_keyword(&raw).ok_or(ValidationError::InvalidEnumValue { field, value: raw })
        })
        .collect()
}

/// Parse an optional keyword, attributing failure to `field`.
fn parse_opt<T: serde::de::DeserializeOwned>(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<T>, ValidationError> {
    value
        .map(|raw| {
            parse_keyword(&raw).ok_or(ValidationError::InvalidEnumValue { field, value: raw })
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::super::types::{
        AlumniSortKey, DateRangeRequest, EventType, JobSortKey, JobType, SortDirection,
    };
    use super::*;

    #[test]
    fn defaults_applied_when_paging_absent() {
        let filters = alumni(AlumniSearchRequest::default()).unwrap();
        assert_eq!(filters.page, PageRequest { page: 1, limit: 20 });
        assert!(filters.sort_by.is_none());
    }

    #[test]
    fn limit_of_one_hundred_accepted() {
        let filters = alumni(AlumniSearchRequest {
            limit: Some(100),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filters.page.limit, 100);
    }

    #[test]
    fn limit_of_one_hundred_one_rejected() {
        let err = alumni(AlumniSearchRequest {
            limit: Some(101),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidPagination { field: "limit", .. }
        ));
    }

    #[test]
    fn zero_and_negative_page_rejected() {
        for page in [0, -3] {
            let err = alumni(AlumniSearchRequest {
                page: Some(page),
                ..Default::default()
            })
            .unwrap_err();
            assert!(matches!(
                err,
                ValidationError::InvalidPagination { field: "page", .. }
            ));
        }
    }

    #[test]
    fn query_trimmed_and_emptied() {
        let filters = alumni(AlumniSearchRequest {
            query: Some("  rust engineer  ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filters.query.as_deref(), Some("rust engineer"));

        let filters = alumni(AlumniSearchRequest {
            query: Some("   ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(filters.query.is_none());
    }

    #[test]
    fn sort_keys_parsed_and_unknown_rejected() {
        let filters = alumni(AlumniSearchRequest {
            sort_by: Some("graduationYear".to_string()),
            sort_order: Some("desc".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filters.sort_by, Some(AlumniSortKey::GraduationYear));
        assert_eq!(filters.direction, Some(SortDirection::Desc));

        let err = alumni(AlumniSearchRequest {
            sort_by: Some("salary".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidEnumValue { field: "sortBy", .. }
        ));
    }

    #[test]
    fn event_types_parsed_and_unknown_rejected() {
        let filters = events(EventSearchRequest {
            types: vec!["workshop".to_string(), "career_fair".to_string()],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filters.types, vec![EventType::Workshop, EventType::CareerFair]);

        let err = events(EventSearchRequest {
            types: vec!["hackathon".to_string()],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidEnumValue { field: "type", .. }
        ));
    }

    #[test]
    fn inverted_date_range_rejected() {
        let start = Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let err = events(EventSearchRequest {
            date_range: Some(DateRangeRequest { start, end }),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRange { field: "dateRange.end", .. }));
    }

    #[test]
    fn equal_date_range_bounds_rejected() {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let err = events(EventSearchRequest {
            date_range: Some(DateRangeRequest { start: at, end: at }),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRange { .. }));
    }

    #[test]
    fn inverted_salary_range_rejected() {
        let err = jobs(JobSearchRequest {
            salary_min: Some(120_000),
            salary_max: Some(80_000),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidRange { field: "salaryMax", .. }
        ));
    }

    #[test]
    fn job_filters_parse_full_request() {
        let filters = jobs(JobSearchRequest {
            types: vec!["full_time".to_string()],
            salary_min: Some(100_000),
            sort_by: Some("salary".to_string()),
            sort_order: Some("desc".to_string()),
            page: Some(1),
            limit: Some(20),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filters.types, vec![JobType::FullTime]);
        assert_eq!(filters.salary_min, Some(100_000));
        assert_eq!(filters.sort_by, Some(JobSortKey::Salary));
        assert_eq!(filters.direction, Some(SortDirection::Desc));
    }

    #[test]
    fn date_posted_all_is_no_constraint() {
        let filters = jobs(JobSearchRequest {
            date_posted: Some("all".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(filters.date_posted.is_none());

        let filters = jobs(JobSearchRequest {
            date_posted: Some("week".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filters.date_posted, Some(DatePostedWindow::Week));
    }

    #[test]
    fn empty_arrays_pass_through_as_no_constraint() {
        let filters = jobs(JobSearchRequest::default()).unwrap();
        assert!(filters.types.is_empty());
        assert!(filters.cities.is_empty());
        assert!(filters.skills.is_empty());
    }
}
