//! Read-path query engine for the content catalog.
//!
//! # Responsibility
//! - Compose repository reads into the six catalog queries.
//! - Apply the publication gate asymmetry exactly as served today.
//! - Turn missing or unresolvable entities into explicit `NotFound`.
//!
//! # Invariants
//! - Syllabus-backed queries only see `v4` rows.
//! - Subtopic listing does not gate on subtopic finalization; micro-unit
//!   listing requires both subtopic and micro-unit finalization.
//! - Notes-existence is one membership query per listing, never one per unit.
//! - Missing data is never replaced with default content.

use crate::model::ids::{IdParseError, MicroUnitId, SubTopicId};
use crate::model::mcq::McqQuestion;
use crate::model::stage::Published;
use crate::repo::content_repo::ContentRepository;
use crate::repo::store::RepoError;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Entity a query needed but could not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingResource {
    /// No finalized subtopic with this `(name, subject)`.
    SubTopic { subject: String, name: String },
    MicroUnit(MicroUnitId),
    Note(MicroUnitId),
    McqSet(MicroUnitId),
}

impl Display for MissingResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubTopic { subject, name } => {
                write!(f, "subtopic `{name}` not found in subject `{subject}`")
            }
            Self::MicroUnit(id) => write!(f, "micro unit not found: {id}"),
            Self::Note(id) => write!(f, "note not found for micro unit: {id}"),
            Self::McqSet(id) => write!(f, "mcq set not found for micro unit: {id}"),
        }
    }
}

/// Query engine error.
#[derive(Debug)]
pub enum CatalogError {
    /// Required entity is absent, unpublished, or a reference does not resolve.
    NotFound(MissingResource),
    /// Identifier text is not a valid store id.
    MalformedInput(IdParseError),
    /// Store could not answer the query.
    StoreUnavailable(RepoError),
    /// Stored documents violate the content model.
    InconsistentData(RepoError),
}

impl CatalogError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::MalformedInput(_) => "malformed_input",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::InconsistentData(_) => "inconsistent_data",
        }
    }

    /// Returns whether the store was unreachable or too slow, as opposed to
    /// rejecting the query itself.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::StoreUnavailable(err) => err.is_unavailable(),
            _ => false,
        }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(resource) => write!(f, "{resource}"),
            Self::MalformedInput(err) => write!(f, "{err}"),
            Self::StoreUnavailable(err) => write!(f, "content store unavailable: {err}"),
            Self::InconsistentData(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::MalformedInput(err) => Some(err),
            Self::StoreUnavailable(err) => Some(err),
            Self::InconsistentData(err) => Some(err),
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidData(_) => Self::InconsistentData(value),
            other => Self::StoreUnavailable(other),
        }
    }
}

impl From<IdParseError> for CatalogError {
    fn from(value: IdParseError) -> Self {
        Self::MalformedInput(value)
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Syllabus projection served per subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyllabusRow {
    pub stage: String,
    pub paper: String,
    pub exam: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubTopicSummary {
    pub name: String,
    pub has_notes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MicroUnitSummary {
    pub id: MicroUnitId,
    pub name: String,
    pub order: i64,
    pub has_notes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteView {
    pub micro_unit_id: MicroUnitId,
    pub content: String,
}

/// MCQ set projection; questions and options keep stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McqSetView {
    pub mcq_count: i64,
    pub mcqs: Vec<McqQuestion>,
}

/// Catalog query facade over a content repository.
pub struct CatalogService<R: ContentRepository> {
    repo: R,
}

impl<R: ContentRepository> CatalogService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Lists distinct subjects having at least one published syllabus row.
    pub fn list_subjects(&self) -> CatalogResult<Vec<String>> {
        let started_at = Instant::now();
        let result = self.repo.published_subjects().map_err(CatalogError::from);
        log_query("list_subjects", started_at, result, Vec::len)
    }

    /// Lists published syllabus rows for a subject. Unknown subject is empty.
    pub fn list_syllabus(&self, subject: &str) -> CatalogResult<Vec<SyllabusRow>> {
        let started_at = Instant::now();
        let result = self
            .repo
            .published_syllabus(subject)
            .map(|rows| {
                debug_assert!(rows.iter().all(Published::is_published));
                rows.into_iter()
                    .map(|row| SyllabusRow {
                        stage: row.stage,
                        paper: row.paper,
                        exam: row.exam,
                    })
                    .collect::<Vec<_>>()
            })
            .map_err(CatalogError::from);
        log_query("list_syllabus", started_at, result, Vec::len)
    }

    /// Lists every subtopic of a subject with whether any of its micro-units has a note.
    pub fn list_subtopics(&self, subject: &str) -> CatalogResult<Vec<SubTopicSummary>> {
        let started_at = Instant::now();
        let result = self.subtopics_with_notes(subject);
        log_query("list_subtopics", started_at, result, Vec::len)
    }

    /// Lists published micro-units under a published subtopic, by `order`.
    pub fn list_micro_units(
        &self,
        subject: &str,
        subtopic_name: &str,
    ) -> CatalogResult<Vec<MicroUnitSummary>> {
        let started_at = Instant::now();
        let result = self.micro_units_with_notes(subject, subtopic_name);
        log_query("list_micro_units", started_at, result, Vec::len)
    }

    /// Fetches the note of a micro-unit addressed by identifier text.
    pub fn fetch_note(&self, micro_unit_id: &str) -> CatalogResult<NoteView> {
        let started_at = Instant::now();
        let result = MicroUnitId::parse(micro_unit_id)
            .map_err(CatalogError::from)
            .and_then(|id| self.note_by_id(id));
        log_query("fetch_note", started_at, result, single_document)
    }

    /// Fetches the note of a micro-unit.
    pub fn fetch_note_by_id(&self, micro_unit_id: MicroUnitId) -> CatalogResult<NoteView> {
        let started_at = Instant::now();
        let result = self.note_by_id(micro_unit_id);
        log_query("fetch_note", started_at, result, single_document)
    }

    /// Fetches the MCQ set of a micro-unit addressed by identifier text.
    pub fn fetch_mcqs(&self, micro_unit_id: &str) -> CatalogResult<McqSetView> {
        let started_at = Instant::now();
        let result = MicroUnitId::parse(micro_unit_id)
            .map_err(CatalogError::from)
            .and_then(|id| self.mcqs_by_id(id));
        log_query("fetch_mcqs", started_at, result, |view| view.mcqs.len())
    }

    /// Fetches the MCQ set of a micro-unit.
    pub fn fetch_mcqs_by_id(&self, micro_unit_id: MicroUnitId) -> CatalogResult<McqSetView> {
        let started_at = Instant::now();
        let result = self.mcqs_by_id(micro_unit_id);
        log_query("fetch_mcqs", started_at, result, |view| view.mcqs.len())
    }

    fn subtopics_with_notes(&self, subject: &str) -> CatalogResult<Vec<SubTopicSummary>> {
        let subtopics = self.repo.subtopics_for_subject(subject)?;
        if subtopics.is_empty() {
            return Ok(Vec::new());
        }

        let subtopic_ids: Vec<SubTopicId> = subtopics.iter().map(|item| item.id).collect();
        let units = self.repo.micro_units_in(&subtopic_ids)?;
        let unit_ids: Vec<MicroUnitId> = units.iter().map(|unit| unit.id).collect();
        let noted_units = self.repo.micro_units_with_notes(&unit_ids)?;

        let noted_subtopics: HashSet<SubTopicId> = units
            .iter()
            .filter(|unit| noted_units.contains(&unit.id))
            .map(|unit| unit.subtopic)
            .collect();

        Ok(subtopics
            .into_iter()
            .map(|subtopic| SubTopicSummary {
                has_notes: noted_subtopics.contains(&subtopic.id),
                name: subtopic.name,
            })
            .collect())
    }

    fn micro_units_with_notes(
        &self,
        subject: &str,
        subtopic_name: &str,
    ) -> CatalogResult<Vec<MicroUnitSummary>> {
        let subtopic = self
            .repo
            .find_published_subtopic(subject, subtopic_name)?
            .ok_or_else(|| {
                CatalogError::NotFound(MissingResource::SubTopic {
                    subject: subject.to_string(),
                    name: subtopic_name.to_string(),
                })
            })?;
        debug_assert!(subtopic.is_published());

        let units = self.repo.published_micro_units(subtopic.id)?;
        debug_assert!(units.iter().all(Published::is_published));
        let unit_ids: Vec<MicroUnitId> = units.iter().map(|unit| unit.id).collect();
        let noted_units = self.repo.micro_units_with_notes(&unit_ids)?;

        Ok(units
            .into_iter()
            .map(|unit| MicroUnitSummary {
                has_notes: noted_units.contains(&unit.id),
                id: unit.id,
                name: unit.name,
                order: unit.order,
            })
            .collect())
    }

    fn note_by_id(&self, micro_unit_id: MicroUnitId) -> CatalogResult<NoteView> {
        let unit = self
            .repo
            .get_micro_unit(micro_unit_id)?
            .ok_or(CatalogError::NotFound(MissingResource::MicroUnit(
                micro_unit_id,
            )))?;
        let note = self
            .repo
            .note_for_micro_unit(unit.id)?
            .ok_or(CatalogError::NotFound(MissingResource::Note(unit.id)))?;

        Ok(NoteView {
            micro_unit_id: unit.id,
            content: note.content,
        })
    }

    fn mcqs_by_id(&self, micro_unit_id: MicroUnitId) -> CatalogResult<McqSetView> {
        let unit = self
            .repo
            .get_micro_unit(micro_unit_id)?
            .ok_or(CatalogError::NotFound(MissingResource::MicroUnit(
                micro_unit_id,
            )))?;
        let set = self
            .repo
            .mcq_for_micro_unit(unit.id)?
            .ok_or(CatalogError::NotFound(MissingResource::McqSet(unit.id)))?;

        Ok(McqSetView {
            mcq_count: set.mcq_count,
            mcqs: set.mcqs,
        })
    }
}

/// Row count for queries that resolve exactly one document.
fn single_document<T>(_: &T) -> usize {
    1
}

fn log_query<T>(
    op: &'static str,
    started_at: Instant,
    result: CatalogResult<T>,
    rows: impl Fn(&T) -> usize,
) -> CatalogResult<T> {
    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(value) => {
            debug!(
                "event=catalog_query module=service status=ok op={} rows={} duration_ms={}",
                op,
                rows(value),
                duration_ms
            );
        }
        Err(err @ (CatalogError::NotFound(_) | CatalogError::MalformedInput(_))) => {
            debug!(
                "event=catalog_query module=service status=rejected op={} error_code={} duration_ms={}",
                op,
                err.code(),
                duration_ms
            );
        }
        Err(err) => {
            warn!(
                "event=catalog_query module=service status=error op={} error_code={} unavailable={} duration_ms={} error={}",
                op,
                err.code(),
                err.is_unavailable(),
                duration_ms,
                err
            );
        }
    }
    result
}
