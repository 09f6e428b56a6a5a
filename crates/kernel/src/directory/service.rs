//! Directory search service.
//!
//! Executes one search per call: validate → compile → resolve → count +
//! fetch → project. Stateless apart from the connection pool; a storage
//! fault propagates to the caller without retries, and either a full page
//! (possibly empty) or an error is returned, never a partial page.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Event, Job, User};

use super::predicate;
use super::project::{
    self, AlumniEntry, EventView, JobView, UserSummary, ViewerContext,
};
use super::query_builder::SearchQuery;
use super::sort;
use super::types::{
    AlumniSearchRequest, EventSearchRequest, JobSearchRequest, ResultPage,
};
use super::validate;

/// Service executing directory searches against the store.
#[derive(Clone)]
pub struct DirectoryService {
    pool: PgPool,
}

impl DirectoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Search the alumni directory.
    pub async fn search_alumni(
        &self,
        request: AlumniSearchRequest,
    ) -> Result<ResultPage<AlumniEntry>, AppError> {
        let filters = validate::alumni(request)?;
        let predicate = predicate::alumni(&filters);
        let order = sort::alumni_order(filters.sort_by, filters.direction);
        let (skip, take) = sort::page_window(&filters.page);
        let query = SearchQuery::new("users", predicate, order, skip, take);

        let total: i64 = sqlx::query_scalar(&query.build_count())
            .fetch_one(&self.pool)
            .await?;
        let rows: Vec<User> = sqlx::query_as(&query.build()).fetch_all(&self.pool).await?;

        let items = rows.into_iter().map(project::project_user).collect();
        Ok(ResultPage::new(
            items,
            total as u64,
            filters.page.page,
            filters.page.limit,
        ))
    }

    /// Search events, attaching organizer summaries and viewer flags.
    pub async fn search_events(
        &self,
        request: EventSearchRequest,
        viewer: Option<ViewerContext>,
    ) -> Result<ResultPage<EventView>, AppError> {
        let filters = validate::events(request)?;
        let predicate = predicate::events(&filters);
        let order = sort::event_order(filters.sort_by, filters.direction);
        let (skip, take) = sort::page_window(&filters.page);
        let query = SearchQuery::new("event", predicate, order, skip, take);

        let total: i64 = sqlx::query_scalar(&query.build_count())
            .fetch_one(&self.pool)
            .await?;
        let rows: Vec<Event> = sqlx::query_as(&query.build()).fetch_all(&self.pool).await?;

        let summaries = self
            .user_summaries(rows.iter().map(|e| e.organizer_id))
            .await?;
        let items = rows
            .into_iter()
            .map(|event| {
                let organizer = summaries.get(&event.organizer_id).cloned();
                project::project_event(event, organizer, viewer.as_ref())
            })
            .collect();

        Ok(ResultPage::new(
            items,
            total as u64,
            filters.page.page,
            filters.page.limit,
        ))
    }

    /// Search job postings, attaching poster summaries and viewer flags.
    pub async fn search_jobs(
        &self,
        request: JobSearchRequest,
        viewer: Option<ViewerContext>,
    ) -> Result<ResultPage<JobView>, AppError> {
        let filters = validate::jobs(request)?;
        let predicate = predicate::jobs(&filters, Utc::now());
        let order = sort::job_order(filters.sort_by, filters.direction, filters.query.is_some());
        let (skip, take) = sort::page_window(&filters.page);
        let query = SearchQuery::new("job", predicate, order, skip, take);

        let total: i64 = sqlx::query_scalar(&query.build_count())
            .fetch_one(&self.pool)
            .await?;
        let rows: Vec<Job> = sqlx::query_as(&query.build()).fetch_all(&self.pool).await?;

        let summaries = self.user_summaries(rows.iter().map(|j| j.posted_by)).await?;
        let items = rows
            .into_iter()
            .map(|job| {
                let poster = summaries.get(&job.posted_by).cloned();
                project::project_job(job, poster, viewer.as_ref())
            })
            .collect();

        Ok(ResultPage::new(
            items,
            total as u64,
            filters.page.page,
            filters.page.limit,
        ))
    }

    /// Fetch a single public alumni profile.
    pub async fn fetch_alumni(&self, id: Uuid) -> Result<AlumniEntry, AppError> {
        let user = User::find_by_id(&self.pool, id)
            .await?
            .filter(|u| u.is_active && u.profile.0.is_public)
            .ok_or(AppError::NotFound)?;

        Ok(project::project_user(user))
    }

    /// Fetch a single event with organizer summary and viewer flags.
    pub async fn fetch_event(
        &self,
        id: Uuid,
        viewer: Option<ViewerContext>,
    ) -> Result<EventView, AppError> {
        let event = Event::find_by_id(&self.pool, id)
            .await?
            .filter(|e| e.is_active)
            .ok_or(AppError::NotFound)?;

        if !event.is_public && viewer.is_none() {
            return Err(AppError::NotFound);
        }

        let summaries = self.user_summaries([event.organizer_id].into_iter()).await?;
        let organizer = summaries.get(&event.organizer_id).cloned();
        Ok(project::project_event(event, organizer, viewer.as_ref()))
    }

    /// Fetch a single job posting with poster summary and viewer flags.
    pub async fn fetch_job(
        &self,
        id: Uuid,
        viewer: Option<ViewerContext>,
    ) -> Result<JobView, AppError> {
        let job = Job::find_by_id(&self.pool, id)
            .await?
            .filter(|j| j.is_active)
            .ok_or(AppError::NotFound)?;

        let summaries = self.user_summaries([job.posted_by].into_iter()).await?;
        let poster = summaries.get(&job.posted_by).cloned();
        Ok(project::project_job(job, poster, viewer.as_ref()))
    }

    /// Batch-load lightweight user summaries for the given ids.
    ///
    /// One query regardless of page size; duplicate ids collapse first.
    async fn user_summaries(
        &self,
        ids: impl Iterator<Item = Uuid>,
    ) -> Result<HashMap<Uuid, UserSummary>, AppError> {
        let ids: Vec<Uuid> = {
            let mut seen = HashSet::new();
            ids.filter(|id| seen.insert(*id)).collect()
        };
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<UserSummary> = sqlx::query_as(
            r#"
            SELECT id, name,
                   profile->>'avatar' AS avatar,
                   profile->>'company' AS company
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|s| (s.id, s)).collect())
    }
}
