//! Core read path for the exam-prep content catalog.
//! This crate owns the content model, the publication gate, and the six
//! catalog queries served to learners.

pub mod api;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::{handle_request, ApiResponse, ApiStatus, CatalogRequest, ReadGateway};
pub use db::{DbError, StoreOptions};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::hierarchy::{MicroUnit, SubTopic, Syllabus};
pub use model::ids::{IdParseError, MicroUnitId, SubTopicId, SyllabusId};
pub use model::mcq::{McqOption, McqQuestion, MicroUnitMcq};
pub use model::note::MicroUnitNote;
pub use repo::content_repo::{ContentRepository, SqliteContentRepository};
pub use repo::store::{RepoError, RepoResult};
pub use service::catalog_service::{
    CatalogError, CatalogResult, CatalogService, McqSetView, MicroUnitSummary, MissingResource,
    NoteView, SubTopicSummary, SyllabusRow,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
