//! Request/response mapping for transport layers.
//!
//! # Responsibility
//! - Name the six read operations and their inputs.
//! - Map catalog results to JSON bodies and HTTP-equivalent statuses.
//! - Serve each request on its own read-only connection.
//!
//! # Invariants
//! - Mapping never panics; every failure becomes an error envelope.
//! - `NotFound` maps to 404, `MalformedInput` to 400, store faults to 500.
//! - `ReadGateway` holds no mutable state and is shareable across threads.

use crate::db::{open_db_read_only, StoreOptions};
use crate::repo::content_repo::{ContentRepository, SqliteContentRepository};
use crate::service::catalog_service::{CatalogError, CatalogResult, CatalogService};
use log::error;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// One read operation with its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogRequest {
    Subjects,
    Syllabus { subject: String },
    SubTopics { subject: String },
    MicroUnits { subject: String, subtopic: String },
    Note { micro_unit_id: String },
    Mcqs { micro_unit_id: String },
}

impl CatalogRequest {
    /// Operation label used in logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Subjects => "list_subjects",
            Self::Syllabus { .. } => "list_syllabus",
            Self::SubTopics { .. } => "list_subtopics",
            Self::MicroUnits { .. } => "list_micro_units",
            Self::Note { .. } => "fetch_note",
            Self::Mcqs { .. } => "fetch_mcqs",
        }
    }
}

/// Outcome class of one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStatus {
    Ok,
    BadRequest,
    NotFound,
    InternalError,
}

impl ApiStatus {
    pub fn http_code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::InternalError => 500,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

/// Response envelope: status plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: ApiStatus,
    /// Operation projection on success, `{"error", "code"}` otherwise.
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: ApiStatus::Ok,
            body,
        }
    }

    fn failure(status: ApiStatus, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({
                "error": message.into(),
                "code": code,
            }),
        }
    }
}

/// Maps a catalog error to its response status.
pub fn status_for(err: &CatalogError) -> ApiStatus {
    match err {
        CatalogError::NotFound(_) => ApiStatus::NotFound,
        CatalogError::MalformedInput(_) => ApiStatus::BadRequest,
        CatalogError::StoreUnavailable(_) | CatalogError::InconsistentData(_) => {
            ApiStatus::InternalError
        }
    }
}

/// Runs one request against an existing service.
pub fn handle_request<R: ContentRepository>(
    service: &CatalogService<R>,
    request: &CatalogRequest,
) -> ApiResponse {
    match request {
        CatalogRequest::Subjects => respond(service.list_subjects()),
        CatalogRequest::Syllabus { subject } => respond(service.list_syllabus(subject)),
        CatalogRequest::SubTopics { subject } => respond(service.list_subtopics(subject)),
        CatalogRequest::MicroUnits { subject, subtopic } => {
            respond(service.list_micro_units(subject, subtopic))
        }
        CatalogRequest::Note { micro_unit_id } => respond(service.fetch_note(micro_unit_id)),
        CatalogRequest::Mcqs { micro_unit_id } => respond(service.fetch_mcqs(micro_unit_id)),
    }
}

fn respond<T: Serialize>(result: CatalogResult<T>) -> ApiResponse {
    match result {
        Ok(value) => match serde_json::to_value(&value) {
            Ok(body) => ApiResponse::ok(body),
            Err(err) => ApiResponse::failure(
                ApiStatus::InternalError,
                "serialization_failed",
                err.to_string(),
            ),
        },
        Err(err) => ApiResponse::failure(status_for(&err), err.code(), err.to_string()),
    }
}

/// Stateless entry point that opens a read-only connection per request.
#[derive(Debug, Clone)]
pub struct ReadGateway {
    db_path: PathBuf,
    options: StoreOptions,
}

impl ReadGateway {
    pub fn new(db_path: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self {
            db_path: db_path.into(),
            options,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Serves one request. Store failures become 500 envelopes.
    pub fn handle(&self, request: &CatalogRequest) -> ApiResponse {
        let conn = match open_db_read_only(&self.db_path, &self.options) {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=gateway_request module=api status=error op={} error_code=store_unavailable unavailable={} error={}",
                    request.operation(),
                    err.is_unavailable(),
                    err
                );
                return ApiResponse::failure(
                    ApiStatus::InternalError,
                    "store_unavailable",
                    format!("content store unavailable: {err}"),
                );
            }
        };

        let repo = match SqliteContentRepository::try_new(&conn) {
            Ok(repo) => repo.with_query_timeout(self.options.query_timeout),
            Err(err) => {
                let err = CatalogError::from(err);
                error!(
                    "event=gateway_request module=api status=error op={} error_code={} unavailable={} error={}",
                    request.operation(),
                    err.code(),
                    err.is_unavailable(),
                    err
                );
                return ApiResponse::failure(status_for(&err), err.code(), err.to_string());
            }
        };

        handle_request(&CatalogService::new(repo), request)
    }
}
