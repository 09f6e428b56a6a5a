//! Search query builder using SeaQuery.
//!
//! Renders a backend-neutral [`Predicate`] plus a resolved [`OrderSpec`] and
//! page window into executable SQL, with support for:
//! - JSONB field extraction (dotted field paths)
//! - PostgreSQL full-text search with relevance ordering
//! - Pagination via LIMIT/OFFSET

use sea_query::{
    Alias, Asterisk, Cond, Expr, ExprTrait, Order, PostgresQueryBuilder, Query, SelectStatement,
    SimpleExpr,
};

use super::predicate::{Clause, Predicate};
use super::sort::{OrderSpec, OrderTerm};
use super::types::SortDirection;

/// Query builder for one directory search.
pub struct SearchQuery {
    table: &'static str,
    predicate: Predicate,
    order: OrderSpec,
    skip: u64,
    take: u64,
}

impl SearchQuery {
    pub fn new(
        table: &'static str,
        predicate: Predicate,
        order: OrderSpec,
        skip: u64,
        take: u64,
    ) -> Self {
        Self {
            table,
            predicate,
            order,
            skip,
            take,
        }
    }

    /// Build the main SELECT query with ordering and pagination.
    pub fn build(&self) -> String {
        let mut query = Query::select();

        query.column((Alias::new(self.table), Asterisk));
        query.from(Alias::new(self.table));

        self.add_filters(&mut query);
        self.add_order(&mut query);

        query.limit(self.take);
        query.offset(self.skip);

        query.to_string(PostgresQueryBuilder)
    }

    /// Build the COUNT query for total results.
    pub fn build_count(&self) -> String {
        let mut query = Query::select();

        query.expr(Expr::col(Asterisk).count());
        query.from(Alias::new(self.table));

        self.add_filters(&mut query);

        query.to_string(PostgresQueryBuilder)
    }

    /// Add WHERE conditions from the predicate.
    fn add_filters(&self, query: &mut SelectStatement) {
        for clause in &self.predicate.clauses {
            if let Some(condition) = self.clause_expr(clause) {
                query.and_where(condition);
            }
        }
    }

    /// Build a single clause condition.
    fn clause_expr(&self, clause: &Clause) -> Option<SimpleExpr> {
        match clause {
            Clause::Eq(field, value) => Some(self.field_expr(field).eq(value.clone())),
            Clause::Ne(field, value) => Some(self.field_expr(field).ne(value.clone())),
            Clause::EqBool(field, value) => {
                if field.contains('.') {
                    let path = self.jsonb_text_ref(field);
                    Some(Expr::cust(format!(
                        "({path})::boolean = {}",
                        if *value { "TRUE" } else { "FALSE" }
                    )))
                } else {
                    Some(self.field_expr(field).eq(*value))
                }
            }
            Clause::InStr(field, values) => {
                if values.is_empty() {
                    return None;
                }
                Some(self.field_expr(field).is_in(values.clone()))
            }
            Clause::InInt(field, values) => {
                if values.is_empty() {
                    return None;
                }
                Some(self.int_field_expr(field).is_in(values.clone()))
            }
            Clause::GteInt(field, bound) => Some(self.int_field_expr(field).gte(*bound)),
            Clause::LteInt(field, bound) => Some(self.int_field_expr(field).lte(*bound)),
            Clause::GteTime(field, bound) => {
                Some(self.field_expr(field).gte(timestamp_value(bound)))
            }
            Clause::BetweenTime(field, start, end) => Some(
                self.field_expr(field)
                    .between(timestamp_value(start), timestamp_value(end)),
            ),
            Clause::ContainsAny(field, values) => {
                if values.is_empty() {
                    return None;
                }
                let target = self.jsonb_array_ref(field);
                let placeholders: Vec<String> =
                    (1..=values.len()).map(|i| format!("${i}")).collect();
                Some(Expr::cust_with_values(
                    format!(
                        "jsonb_exists_any({target}, ARRAY[{}])",
                        placeholders.join(", ")
                    ),
                    values.clone(),
                ))
            }
            Clause::IsNull(field) => Some(self.field_expr(field).is_null()),
            // Full-text search using PostgreSQL tsvector
            Clause::Text(raw) => {
                let tsquery = tsquery_terms(raw)?;
                // Parameterized to prevent SQL injection
                Some(Expr::cust_with_values(
                    format!(
                        "{}.search_vector @@ to_tsquery('english', $1)",
                        self.table
                    ),
                    [tsquery],
                ))
            }
            Clause::AnyOf(inner) => {
                let mut cond = Cond::any();
                for clause in inner {
                    if let Some(expr) = self.clause_expr(clause) {
                        cond = cond.add(expr);
                    }
                }
                Some(cond.into())
            }
        }
    }

    /// Add ORDER BY clauses from the resolved order spec.
    fn add_order(&self, query: &mut SelectStatement) {
        for term in &self.order.terms {
            match term {
                OrderTerm::Field(field, direction) => {
                    let order = match direction {
                        SortDirection::Asc => Order::Asc,
                        SortDirection::Desc => Order::Desc,
                    };
                    if field.contains('.') {
                        query.order_by_expr(self.sort_field_expr(field), order);
                    } else {
                        query.order_by((Alias::new(self.table), Alias::new(*field)), order);
                    }
                }
                OrderTerm::Relevance => self.add_relevance_order(query),
            }
        }
    }

    /// Order by text-search rank, best match first.
    ///
    /// The resolver only emits a relevance term when a text query exists, but
    /// a missing query degrades to newest-first rather than failing.
    fn add_relevance_order(&self, query: &mut SelectStatement) {
        let tsquery = self.predicate.text_query().and_then(tsquery_terms);
        if let Some(tsquery) = tsquery {
            query.order_by_expr(
                Expr::cust_with_values(
                    format!(
                        "ts_rank({}.search_vector, to_tsquery('english', $1))",
                        self.table
                    ),
                    [tsquery],
                ),
                Order::Desc,
            );
        } else {
            query.order_by((Alias::new(self.table), Alias::new("created")), Order::Desc);
        }
    }

    /// Expression for a field (handles JSONB paths).
    fn field_expr(&self, field: &str) -> SimpleExpr {
        if field.contains('.') {
            Expr::cust(self.jsonb_text_ref(field))
        } else {
            Expr::col((Alias::new(self.table), Alias::new(field))).into()
        }
    }

    /// Expression for an integer-compared field, casting JSONB text.
    fn int_field_expr(&self, field: &str) -> SimpleExpr {
        if field.contains('.') {
            Expr::cust(format!("({})::bigint", self.jsonb_text_ref(field)))
        } else {
            Expr::col((Alias::new(self.table), Alias::new(field))).into()
        }
    }

    /// Expression for an ORDER BY field, casting the known JSONB sort paths.
    fn sort_field_expr(&self, field: &str) -> SimpleExpr {
        let path = self.jsonb_text_ref(field);
        match field {
            "profile.graduationYear" | "salary.min" => Expr::cust(format!("({path})::bigint")),
            "profile.lastActive" => Expr::cust(format!("({path})::timestamptz")),
            _ => Expr::cust(path),
        }
    }

    /// Text extraction from a JSONB column.
    ///
    /// `"profile.isPublic"` becomes `users.profile->>'isPublic'`;
    /// `"profile.location.city"` becomes `(users.profile->'location')->>'city'`.
    fn jsonb_text_ref(&self, field: &str) -> String {
        let mut parts = field.split('.');
        // Dotted paths always have a leading column segment.
        let column = parts.next().unwrap_or(field);
        let path: Vec<&str> = parts.collect();

        let mut expr = format!("{}.{column}", self.table);
        for (i, part) in path.iter().enumerate() {
            if i == path.len() - 1 {
                expr = format!("{expr}->>'{part}'");
            } else {
                expr = format!("({expr}->'{part}')");
            }
        }
        expr
    }

    /// Reference to a JSONB array value (no text extraction).
    fn jsonb_array_ref(&self, field: &str) -> String {
        let mut parts = field.split('.');
        let column = parts.next().unwrap_or(field);
        let mut expr = format!("{}.{column}", self.table);
        for part in parts {
            expr = format!("{expr}->'{part}'");
        }
        expr
    }
}

/// Render a timestamp as a parameterized value with an explicit cast.
fn timestamp_value(at: &chrono::DateTime<chrono::Utc>) -> SimpleExpr {
    Expr::cust_with_values("$1::timestamptz", [at.to_rfc3339()])
}

/// Sanitize a raw query into a tsquery term list: keep only alphanumerics
/// and spaces, then AND the remaining terms. Returns `None` when nothing
/// searchable remains.
fn tsquery_terms(raw: &str) -> Option<String> {
    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c == ' ' { c } else { ' ' })
        .collect();
    let terms: Vec<&str> = sanitized.split_whitespace().collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" & "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::super::predicate::{self, Clause, Predicate};
    use super::super::sort::{self, OrderSpec, OrderTerm};
    use super::super::types::{
        AlumniFilters, AlumniSortKey, EventFilters, JobFilters, JobSortKey, PageRequest,
        SortDirection,
    };
    use super::*;

    fn page() -> PageRequest {
        PageRequest { page: 1, limit: 20 }
    }

    fn alumni_filters() -> AlumniFilters {
        AlumniFilters {
            query: None,
            graduation_years: vec![],
            departments: vec![],
            companies: vec![],
            cities: vec![],
            skills: vec![],
            sort_by: None,
            direction: None,
            page: page(),
        }
    }

    fn job_filters() -> JobFilters {
        JobFilters {
            query: None,
            types: vec![],
            experience: vec![],
            cities: vec![],
            skills: vec![],
            salary_min: None,
            salary_max: None,
            date_posted: None,
            sort_by: None,
            direction: None,
            page: page(),
        }
    }

    fn users_query(filters: &AlumniFilters) -> SearchQuery {
        let predicate = predicate::alumni(filters);
        let order = sort::alumni_order(filters.sort_by, filters.direction);
        let (skip, take) = sort::page_window(&filters.page);
        SearchQuery::new("users", predicate, order, skip, take)
    }

    fn jobs_query(filters: &JobFilters) -> SearchQuery {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let predicate = predicate::jobs(filters, now);
        let order = sort::job_order(filters.sort_by, filters.direction, filters.query.is_some());
        let (skip, take) = sort::page_window(&filters.page);
        SearchQuery::new("job", predicate, order, skip, take)
    }

    #[test]
    fn simple_query_build() {
        let sql = users_query(&alumni_filters()).build();

        assert!(sql.contains("FROM \"users\""), "{sql}");
        assert!(sql.contains("LIMIT 20"), "{sql}");
        assert!(sql.contains("OFFSET 0"), "{sql}");
        assert!(sql.contains("ORDER BY \"users\".\"name\" ASC"), "{sql}");
        assert!(sql.contains("\"is_active\" = TRUE"), "{sql}");
        assert!(
            sql.contains("(users.profile->>'isPublic')::boolean = TRUE"),
            "{sql}"
        );
    }

    #[test]
    fn count_query_build() {
        let sql = users_query(&alumni_filters()).build_count();

        assert!(sql.contains("COUNT(*)"), "{sql}");
        assert!(sql.contains("FROM \"users\""), "{sql}");
        assert!(!sql.contains("LIMIT"), "{sql}");
        assert!(!sql.contains("ORDER BY"), "{sql}");
    }

    #[test]
    fn pagination_offset() {
        let mut filters = alumni_filters();
        filters.page = PageRequest { page: 3, limit: 10 };
        let sql = users_query(&filters).build();

        assert!(sql.contains("LIMIT 10"), "{sql}");
        assert!(sql.contains("OFFSET 20"), "{sql}");
    }

    #[test]
    fn graduation_year_membership_casts_to_bigint() {
        let mut filters = alumni_filters();
        filters.graduation_years = vec![2019, 2020];
        let sql = users_query(&filters).build();

        assert!(
            sql.contains("(users.profile->>'graduationYear')::bigint IN (2019, 2020)"),
            "{sql}"
        );
    }

    #[test]
    fn nested_location_city_membership() {
        let mut filters = alumni_filters();
        filters.cities = vec!["Boston".to_string()];
        let sql = users_query(&filters).build();

        assert!(
            sql.contains("(users.profile->'location')->>'city' IN ('Boston')"),
            "{sql}"
        );
    }

    #[test]
    fn skills_overlap_uses_jsonb_exists_any() {
        let mut filters = alumni_filters();
        filters.skills = vec!["rust".to_string(), "sql".to_string()];
        let sql = users_query(&filters).build();

        assert!(
            sql.contains("jsonb_exists_any(users.profile->'skills', ARRAY['rust', 'sql'])"),
            "{sql}"
        );
    }

    #[test]
    fn full_text_search_ands_terms() {
        let mut filters = alumni_filters();
        filters.query = Some("rust programming".to_string());
        let sql = users_query(&filters).build();

        assert!(
            sql.contains("users.search_vector @@ to_tsquery('english', 'rust & programming')"),
            "{sql}"
        );
    }

    #[test]
    fn full_text_search_sanitizes_special_chars() {
        assert_eq!(tsquery_terms("rust's | ! & (test)"), Some("rust & s & test".to_string()));
        assert_eq!(tsquery_terms("!!!"), None);
    }

    #[test]
    fn remote_jobs_bypass_city_filter() {
        let mut filters = job_filters();
        filters.cities = vec!["Boston".to_string()];
        let sql = jobs_query(&filters).build();

        assert!(sql.contains("job.location->>'city' IN ('Boston')"), "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
        assert!(sql.contains("job.location->>'type' = 'remote'"), "{sql}");
    }

    #[test]
    fn city_filter_and_text_clause_are_independent() {
        let mut filters = job_filters();
        filters.cities = vec!["Boston".to_string()];
        filters.query = Some("backend".to_string());
        let sql = jobs_query(&filters).build();

        // Both survive in the same WHERE conjunction.
        assert!(sql.contains("job.search_vector @@ to_tsquery"), "{sql}");
        assert!(sql.contains("job.location->>'type' = 'remote'"), "{sql}");
    }

    #[test]
    fn expiry_is_null_or_future() {
        let sql = jobs_query(&job_filters()).build();

        assert!(sql.contains("\"job\".\"expires_at\" IS NULL OR "), "{sql}");
        assert!(sql.contains("\"job\".\"expires_at\" >= "), "{sql}");
        assert!(sql.contains("::timestamptz"), "{sql}");
    }

    #[test]
    fn salary_floor_renders_inclusive_bound() {
        let mut filters = job_filters();
        filters.salary_min = Some(100_000);
        let sql = jobs_query(&filters).build();

        assert!(sql.contains("(job.salary->>'min')::bigint >= 100000"), "{sql}");
    }

    #[test]
    fn salary_sort_descending() {
        let mut filters = job_filters();
        filters.sort_by = Some(JobSortKey::Salary);
        filters.direction = Some(SortDirection::Desc);
        let sql = jobs_query(&filters).build();

        assert!(
            sql.contains("ORDER BY (job.salary->>'min')::bigint DESC"),
            "{sql}"
        );
    }

    #[test]
    fn job_default_order_is_newest_first() {
        let sql = jobs_query(&job_filters()).build();
        assert!(sql.contains("ORDER BY \"job\".\"created\" DESC"), "{sql}");
    }

    #[test]
    fn relevance_orders_by_rank_with_recency_tiebreak() {
        let mut filters = job_filters();
        filters.query = Some("rust".to_string());
        filters.sort_by = Some(JobSortKey::Relevance);
        let sql = jobs_query(&filters).build();

        assert!(
            sql.contains("ts_rank(job.search_vector, to_tsquery('english', 'rust')) DESC"),
            "{sql}"
        );
        assert!(sql.contains("\"job\".\"created\" DESC"), "{sql}");
    }

    #[test]
    fn event_date_range_renders_between() {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap();
        let filters = EventFilters {
            query: None,
            types: vec![],
            date_range: Some((start, end)),
            cities: vec![],
            is_virtual: None,
            sort_by: None,
            direction: None,
            page: page(),
        };
        let predicate = predicate::events(&filters);
        let order = sort::event_order(filters.sort_by, filters.direction);
        let sql = SearchQuery::new("event", predicate, order, 0, 20).build();

        assert!(sql.contains("\"event\".\"start_date\" BETWEEN "), "{sql}");
        assert!(sql.contains("2024-02-01"), "{sql}");
        assert!(sql.contains("2024-02-28"), "{sql}");
        assert!(sql.contains("ORDER BY \"event\".\"start_date\" ASC"), "{sql}");
    }

    #[test]
    fn last_active_sort_casts_to_timestamp() {
        let mut filters = alumni_filters();
        filters.sort_by = Some(AlumniSortKey::LastActive);
        filters.direction = Some(SortDirection::Desc);
        let sql = users_query(&filters).build();

        assert!(
            sql.contains("ORDER BY (users.profile->>'lastActive')::timestamptz DESC"),
            "{sql}"
        );
    }

    #[test]
    fn relevance_without_query_degrades_to_recency() {
        let query = SearchQuery::new(
            "job",
            Predicate::default(),
            OrderSpec {
                terms: vec![OrderTerm::Relevance],
            },
            0,
            20,
        );
        let sql = query.build();
        assert!(sql.contains("ORDER BY \"job\".\"created\" DESC"), "{sql}");
    }

    #[test]
    fn unsearchable_text_clause_is_skipped() {
        let query = SearchQuery::new(
            "users",
            Predicate {
                clauses: vec![Clause::Text("!!!".to_string())],
            },
            OrderSpec::default(),
            0,
            20,
        );
        let sql = query.build();
        assert!(!sql.contains("search_vector"), "{sql}");
    }
}
