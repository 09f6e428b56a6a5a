//! Directory search module.
//!
//! The filtered query builder shared by the alumni, event, and job search
//! endpoints:
//! - types: closed enumerations, search requests, validated filters
//! - validate: filter criteria validation
//! - predicate: backend-neutral predicate composition
//! - sort: sort-key resolution and page windows
//! - query_builder: SeaQuery-based SQL generation
//! - project: sensitive-field stripping and view assembly
//! - service: end-to-end search execution

mod predicate;
mod project;
mod query_builder;
mod service;
mod sort;
pub mod types;
mod validate;

pub use project::{
    AlumniEntry, EventView, JobView, UserSummary, ViewerContext, project_user,
};
pub use service::DirectoryService;
pub use types::{
    AlumniSearchRequest, EventSearchRequest, JobSearchRequest, ResultPage,
};
pub use validate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
