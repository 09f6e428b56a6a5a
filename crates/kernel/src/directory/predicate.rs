//! Backend-neutral search predicates.
//!
//! A [`Predicate`] is a conjunction of independent [`Clause`]s, built by one
//! pure composition function per filter dimension. Compilation never fails on
//! validated filters; the closed filter types make inconsistent input
//! unrepresentable here.
//!
//! Field paths use dots to address keys inside a row's JSONB document column
//! (`"profile.graduationYear"`); bare names address regular columns.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use super::types::{AlumniFilters, DatePostedWindow, EventFilters, JobFilters};

/// A single boolean condition over a stored record.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Field equals a string value.
    Eq(&'static str, String),
    /// Field differs from a string value.
    Ne(&'static str, String),
    /// Field equals a boolean value.
    EqBool(&'static str, bool),
    /// Field is one of the listed strings.
    InStr(&'static str, Vec<String>),
    /// Integer-valued field is one of the listed values.
    InInt(&'static str, Vec<i64>),
    /// Integer-valued field is at least the bound (inclusive).
    GteInt(&'static str, i64),
    /// Integer-valued field is at most the bound (inclusive).
    LteInt(&'static str, i64),
    /// Timestamp field is at least the bound (inclusive).
    GteTime(&'static str, DateTime<Utc>),
    /// Timestamp field lies within an inclusive range.
    BetweenTime(&'static str, DateTime<Utc>, DateTime<Utc>),
    /// JSONB string-array field shares at least one element with the list.
    ContainsAny(&'static str, Vec<String>),
    /// Field is absent (SQL NULL).
    IsNull(&'static str),
    /// Full-text search over the record's indexed text fields.
    Text(String),
    /// Disjunction of the inner clauses.
    AnyOf(Vec<Clause>),
}

/// Conjunction of clauses: a record matches when every clause holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub clauses: Vec<Clause>,
}

impl Predicate {
    fn with(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    fn with_opt(mut self, clause: Option<Clause>) -> Self {
        if let Some(clause) = clause {
            self.clauses.push(clause);
        }
        self
    }

    /// The full-text term, if one participates in the conjunction.
    pub fn text_query(&self) -> Option<&str> {
        self.clauses.iter().find_map(|clause| match clause {
            Clause::Text(query) => Some(query.as_str()),
            _ => None,
        })
    }
}

/// Compile alumni-directory filters.
///
/// Baseline: active accounts with a public profile.
pub fn alumni(filters: &AlumniFilters) -> Predicate {
    Predicate::default()
        .with(Clause::EqBool("is_active", true))
        .with(Clause::EqBool("profile.isPublic", true))
        .with_opt(text(filters.query.as_deref()))
        .with_opt(membership_int(
            "profile.graduationYear",
            &filters.graduation_years,
        ))
        .with_opt(membership("profile.department", &filters.departments))
        .with_opt(membership("profile.company", &filters.companies))
        .with_opt(membership("profile.location.city", &filters.cities))
        .with_opt(overlap("profile.skills", &filters.skills))
}

/// Compile event filters.
pub fn events(filters: &EventFilters) -> Predicate {
    Predicate::default()
        .with(Clause::EqBool("is_active", true))
        .with_opt(text(filters.query.as_deref()))
        .with_opt(membership_keywords(
            "type",
            filters.types.iter().map(|t| t.as_str()),
        ))
        .with_opt(
            filters
                .date_range
                .map(|(start, end)| Clause::BetweenTime("start_date", start, end)),
        )
        .with_opt(membership("location.city", &filters.cities))
        .with_opt(filters.is_virtual.map(|virtual_only| {
            if virtual_only {
                Clause::Eq("location.type", "virtual".to_string())
            } else {
                Clause::Ne("location.type", "virtual".to_string())
            }
        }))
}

/// Compile job filters.
///
/// Baseline: active postings that have not expired. The city filter and the
/// full-text clause are independent members of the conjunction; remote
/// postings bypass the city filter through a local disjunction only.
pub fn jobs(filters: &JobFilters, now: DateTime<Utc>) -> Predicate {
    Predicate::default()
        .with(Clause::EqBool("is_active", true))
        .with(not_expired(now))
        .with_opt(text(filters.query.as_deref()))
        .with_opt(membership_keywords(
            "type",
            filters.types.iter().map(|t| t.as_str()),
        ))
        .with_opt(membership_keywords(
            "experience",
            filters.experience.iter().map(|e| e.as_str()),
        ))
        .with_opt(city_or_remote(&filters.cities))
        .with_opt(overlap("skills", &filters.skills))
        .with_opt(filters.salary_min.map(|min| Clause::GteInt("salary.min", min)))
        .with_opt(filters.salary_max.map(|max| Clause::LteInt("salary.max", max)))
        .with_opt(posted_since(filters.date_posted, now))
}

/// Free-text clause; absent when no query survives normalization.
fn text(query: Option<&str>) -> Option<Clause> {
    query.map(|q| Clause::Text(q.to_string()))
}

/// Set-membership clause; an empty list is no constraint.
fn membership(field: &'static str, values: &[String]) -> Option<Clause> {
    (!values.is_empty()).then(|| Clause::InStr(field, values.to_vec()))
}

/// Set-membership clause over enum keywords.
fn membership_keywords<'a>(
    field: &'static str,
    values: impl Iterator<Item = &'a str>,
) -> Option<Clause> {
    let values: Vec<String> = values.map(str::to_string).collect();
    (!values.is_empty()).then(|| Clause::InStr(field, values))
}

/// Set-membership clause over integers.
fn membership_int(field: &'static str, values: &[i32]) -> Option<Clause> {
    (!values.is_empty()).then(|| Clause::InInt(field, values.iter().map(|v| i64::from(*v)).collect()))
}

/// Array-overlap clause for JSONB string arrays.
fn overlap(field: &'static str, values: &[String]) -> Option<Clause> {
    (!values.is_empty()).then(|| Clause::ContainsAny(field, values.to_vec()))
}

/// Postings with a city in the set, or performed remotely.
fn city_or_remote(cities: &[String]) -> Option<Clause> {
    (!cities.is_empty()).then(|| {
        Clause::AnyOf(vec![
            Clause::InStr("location.city", cities.to_vec()),
            Clause::Eq("location.type", "remote".to_string()),
        ])
    })
}

/// Postings with no expiry, or an expiry at or after `now`.
fn not_expired(now: DateTime<Utc>) -> Clause {
    Clause::AnyOf(vec![
        Clause::IsNull("expires_at"),
        Clause::GteTime("expires_at", now),
    ])
}

/// Lower bound on creation time derived from the recency window.
fn posted_since(window: Option<DatePostedWindow>, now: DateTime<Utc>) -> Option<Clause> {
    let cutoff = match window? {
        DatePostedWindow::Today => now.date_naive().and_time(NaiveTime::MIN).and_utc(),
        DatePostedWindow::Week => now - Duration::days(7),
        DatePostedWindow::Month => now - Duration::days(30),
        DatePostedWindow::All => return None,
    };
    Some(Clause::GteTime("created", cutoff))
}
