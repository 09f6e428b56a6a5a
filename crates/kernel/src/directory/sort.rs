//! Sort-key resolution and page windows.
//!
//! Each entity exposes a fixed allow-list of sort keys mapped onto storage
//! field paths. Unknown keys never reach this module; the validator has
//! already parsed them into the closed key types.

use super::types::{AlumniSortKey, EventSortKey, JobSortKey, PageRequest, SortDirection};

/// One resolved ordering term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderTerm {
    /// Order by a stored field path.
    Field(&'static str, SortDirection),
    /// Order by text-search relevance, best match first.
    Relevance,
}

/// Resolved ordering, applied in term order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSpec {
    pub terms: Vec<OrderTerm>,
}

impl OrderSpec {
    fn single(field: &'static str, direction: SortDirection) -> Self {
        Self {
            terms: vec![OrderTerm::Field(field, direction)],
        }
    }
}

/// Resolve alumni-directory ordering. Default: name, ascending.
pub fn alumni_order(key: Option<AlumniSortKey>, direction: Option<SortDirection>) -> OrderSpec {
    let direction = direction.unwrap_or_default();
    match key {
        Some(AlumniSortKey::Name) | None => OrderSpec::single("name", direction),
        Some(AlumniSortKey::GraduationYear) => {
            OrderSpec::single("profile.graduationYear", direction)
        }
        Some(AlumniSortKey::LastActive) => OrderSpec::single("profile.lastActive", direction),
    }
}

/// Resolve event ordering. Default: start date, ascending.
pub fn event_order(key: Option<EventSortKey>, direction: Option<SortDirection>) -> OrderSpec {
    let direction = direction.unwrap_or_default();
    match key {
        Some(EventSortKey::Date) | None => OrderSpec::single("start_date", direction),
        Some(EventSortKey::Title) => OrderSpec::single("title", direction),
        Some(EventSortKey::Attendees) => OrderSpec::single("current_attendees", direction),
    }
}

/// Resolve job ordering.
///
/// With no sort key, jobs list newest first. Relevance orders by text-search
/// score (best first, ties broken by descending creation time) and falls back
/// to newest-first when no text query was supplied.
pub fn job_order(
    key: Option<JobSortKey>,
    direction: Option<SortDirection>,
    has_text_query: bool,
) -> OrderSpec {
    match key {
        None => OrderSpec::single("created", SortDirection::Desc),
        Some(JobSortKey::Date) => OrderSpec::single("created", direction.unwrap_or_default()),
        Some(JobSortKey::Salary) => OrderSpec::single("salary.min", direction.unwrap_or_default()),
        Some(JobSortKey::Relevance) => {
            if has_text_query {
                OrderSpec {
                    terms: vec![
                        OrderTerm::Relevance,
                        OrderTerm::Field("created", SortDirection::Desc),
                    ],
                }
            } else {
                OrderSpec::single("created", SortDirection::Desc)
            }
        }
    }
}

/// Compute the (skip, take) window for a validated page request.
pub fn page_window(page: &PageRequest) -> (u64, u64) {
    let skip = u64::from(page.page.saturating_sub(1)) * u64::from(page.limit);
    (skip, u64::from(page.limit))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn alumni_defaults_to_name_ascending() {
        let spec = alumni_order(None, None);
        assert_eq!(spec, OrderSpec::single("name", SortDirection::Asc));
    }

    #[test]
    fn alumni_keys_map_to_profile_paths() {
        let spec = alumni_order(Some(AlumniSortKey::GraduationYear), Some(SortDirection::Desc));
        assert_eq!(
            spec,
            OrderSpec::single("profile.graduationYear", SortDirection::Desc)
        );

        let spec = alumni_order(Some(AlumniSortKey::LastActive), None);
        assert_eq!(spec, OrderSpec::single("profile.lastActive", SortDirection::Asc));
    }

    #[test]
    fn event_defaults_to_start_date_ascending() {
        assert_eq!(
            event_order(None, None),
            OrderSpec::single("start_date", SortDirection::Asc)
        );
        assert_eq!(
            event_order(Some(EventSortKey::Attendees), Some(SortDirection::Desc)),
            OrderSpec::single("current_attendees", SortDirection::Desc)
        );
    }

    #[test]
    fn job_default_is_newest_first() {
        assert_eq!(
            job_order(None, None, false),
            OrderSpec::single("created", SortDirection::Desc)
        );
    }

    #[test]
    fn job_explicit_date_key_defaults_ascending() {
        assert_eq!(
            job_order(Some(JobSortKey::Date), None, false),
            OrderSpec::single("created", SortDirection::Asc)
        );
    }

    #[test]
    fn relevance_with_query_breaks_ties_by_recency() {
        let spec = job_order(Some(JobSortKey::Relevance), None, true);
        assert_eq!(
            spec.terms,
            vec![
                OrderTerm::Relevance,
                OrderTerm::Field("created", SortDirection::Desc),
            ]
        );
    }

    #[test]
    fn relevance_without_query_falls_back_to_recency() {
        assert_eq!(
            job_order(Some(JobSortKey::Relevance), None, false),
            OrderSpec::single("created", SortDirection::Desc)
        );
    }

    #[test]
    fn page_window_arithmetic() {
        assert_eq!(page_window(&PageRequest { page: 1, limit: 20 }), (0, 20));
        assert_eq!(page_window(&PageRequest { page: 3, limit: 10 }), (20, 10));
    }
}
