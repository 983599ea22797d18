//! Content repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the use-case shaped reads the catalog needs over the five
//!   content collections.
//! - Keep filter construction and publication gating out of the service layer.
//!
//! # Invariants
//! - Every method is one store round-trip.
//! - Notes-existence is answered by one membership query over the whole
//!   candidate set.
//! - Gated reads apply the collection's terminal flag in the store predicate.

use crate::db::migrations::latest_version;
use crate::model::hierarchy::{MicroUnit, SubTopic, Syllabus};
use crate::model::ids::{MicroUnitId, SubTopicId};
use crate::model::mcq::MicroUnitMcq;
use crate::model::note::MicroUnitNote;
use crate::repo::store::{Collection, DocumentFilter, DocumentStore, RepoError, RepoResult};
use rusqlite::Connection;
use std::collections::HashSet;
use std::time::Duration;

/// Read-only repository interface for the content hierarchy.
pub trait ContentRepository {
    /// Distinct subjects among published syllabus rows.
    fn published_subjects(&self) -> RepoResult<Vec<String>>;
    /// Published syllabus rows for one subject, in storage order.
    fn published_syllabus(&self, subject: &str) -> RepoResult<Vec<Syllabus>>;
    /// Every subtopic of a subject regardless of stage, in storage order.
    fn subtopics_for_subject(&self, subject: &str) -> RepoResult<Vec<SubTopic>>;
    /// The published subtopic with this `(name, subject)`, if any.
    fn find_published_subtopic(&self, subject: &str, name: &str) -> RepoResult<Option<SubTopic>>;
    /// Every micro-unit under any of `subtopics`, regardless of stage.
    fn micro_units_in(&self, subtopics: &[SubTopicId]) -> RepoResult<Vec<MicroUnit>>;
    /// Published micro-units under one subtopic, by `order` then storage order.
    fn published_micro_units(&self, subtopic: SubTopicId) -> RepoResult<Vec<MicroUnit>>;
    /// Subset of `candidates` referenced by at least one note.
    fn micro_units_with_notes(&self, candidates: &[MicroUnitId])
        -> RepoResult<HashSet<MicroUnitId>>;
    fn get_micro_unit(&self, id: MicroUnitId) -> RepoResult<Option<MicroUnit>>;
    fn note_for_micro_unit(&self, id: MicroUnitId) -> RepoResult<Option<MicroUnitNote>>;
    fn mcq_for_micro_unit(&self, id: MicroUnitId) -> RepoResult<Option<MicroUnitMcq>>;
}

impl<R: ContentRepository + ?Sized> ContentRepository for &R {
    fn published_subjects(&self) -> RepoResult<Vec<String>> {
        (**self).published_subjects()
    }

    fn published_syllabus(&self, subject: &str) -> RepoResult<Vec<Syllabus>> {
        (**self).published_syllabus(subject)
    }

    fn subtopics_for_subject(&self, subject: &str) -> RepoResult<Vec<SubTopic>> {
        (**self).subtopics_for_subject(subject)
    }

    fn find_published_subtopic(&self, subject: &str, name: &str) -> RepoResult<Option<SubTopic>> {
        (**self).find_published_subtopic(subject, name)
    }

    fn micro_units_in(&self, subtopics: &[SubTopicId]) -> RepoResult<Vec<MicroUnit>> {
        (**self).micro_units_in(subtopics)
    }

    fn published_micro_units(&self, subtopic: SubTopicId) -> RepoResult<Vec<MicroUnit>> {
        (**self).published_micro_units(subtopic)
    }

    fn micro_units_with_notes(
        &self,
        candidates: &[MicroUnitId],
    ) -> RepoResult<HashSet<MicroUnitId>> {
        (**self).micro_units_with_notes(candidates)
    }

    fn get_micro_unit(&self, id: MicroUnitId) -> RepoResult<Option<MicroUnit>> {
        (**self).get_micro_unit(id)
    }

    fn note_for_micro_unit(&self, id: MicroUnitId) -> RepoResult<Option<MicroUnitNote>> {
        (**self).note_for_micro_unit(id)
    }

    fn mcq_for_micro_unit(&self, id: MicroUnitId) -> RepoResult<Option<MicroUnitMcq>> {
        (**self).mcq_for_micro_unit(id)
    }
}

/// SQLite-backed content repository.
pub struct SqliteContentRepository<'conn> {
    store: DocumentStore<'conn>,
}

impl<'conn> SqliteContentRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_content_connection_ready(conn)?;
        Ok(Self {
            store: DocumentStore::new(conn),
        })
    }

    /// Bounds the execution time of each repository read.
    pub fn with_query_timeout(self, timeout: Duration) -> Self {
        Self {
            store: self.store.with_query_timeout(timeout),
        }
    }

    /// Store statements issued so far by this repository.
    pub fn round_trips(&self) -> u64 {
        self.store.round_trips()
    }
}

impl ContentRepository for SqliteContentRepository<'_> {
    fn published_subjects(&self) -> RepoResult<Vec<String>> {
        let filter = DocumentFilter::new(Collection::Syllabus).published();
        self.store.distinct(&filter, "subject")
    }

    fn published_syllabus(&self, subject: &str) -> RepoResult<Vec<Syllabus>> {
        let filter = DocumentFilter::new(Collection::Syllabus)
            .eq_text("subject", subject)
            .published();
        self.store.find(&filter)
    }

    fn subtopics_for_subject(&self, subject: &str) -> RepoResult<Vec<SubTopic>> {
        let filter = DocumentFilter::new(Collection::SubTopics).eq_text("subject", subject);
        self.store.find(&filter)
    }

    fn find_published_subtopic(&self, subject: &str, name: &str) -> RepoResult<Option<SubTopic>> {
        let filter = DocumentFilter::new(Collection::SubTopics)
            .eq_text("name", name)
            .eq_text("subject", subject)
            .published();
        self.store.find_one(&filter)
    }

    fn micro_units_in(&self, subtopics: &[SubTopicId]) -> RepoResult<Vec<MicroUnit>> {
        let filter = DocumentFilter::new(Collection::MicroUnits).is_in(
            "subtopic_uuid",
            subtopics.iter().map(|id| id.to_string()),
        );
        self.store.find(&filter)
    }

    fn published_micro_units(&self, subtopic: SubTopicId) -> RepoResult<Vec<MicroUnit>> {
        let filter = DocumentFilter::new(Collection::MicroUnits)
            .eq("subtopic_uuid", subtopic.to_string())
            .published()
            .sort_ascending("sort_order");
        self.store.find(&filter)
    }

    fn micro_units_with_notes(
        &self,
        candidates: &[MicroUnitId],
    ) -> RepoResult<HashSet<MicroUnitId>> {
        if candidates.is_empty() {
            return Ok(HashSet::new());
        }

        let filter = DocumentFilter::new(Collection::MicroUnitNotes).is_in(
            "micro_unit_uuid",
            candidates.iter().map(|id| id.to_string()),
        );
        let referenced: Vec<String> = self.store.distinct(&filter, "micro_unit_uuid")?;
        referenced
            .iter()
            .map(|value| {
                MicroUnitId::parse(value).map_err(|_| {
                    RepoError::InvalidData(format!(
                        "invalid uuid `{value}` in micro_unit_notes.micro_unit_uuid"
                    ))
                })
            })
            .collect()
    }

    fn get_micro_unit(&self, id: MicroUnitId) -> RepoResult<Option<MicroUnit>> {
        let filter = DocumentFilter::new(Collection::MicroUnits).eq("uuid", id.to_string());
        self.store.find_one(&filter)
    }

    fn note_for_micro_unit(&self, id: MicroUnitId) -> RepoResult<Option<MicroUnitNote>> {
        let filter =
            DocumentFilter::new(Collection::MicroUnitNotes).eq("micro_unit_uuid", id.to_string());
        self.store.find_one(&filter)
    }

    fn mcq_for_micro_unit(&self, id: MicroUnitId) -> RepoResult<Option<MicroUnitMcq>> {
        let filter =
            DocumentFilter::new(Collection::MicroUnitMcqs).eq("micro_unit_uuid", id.to_string());
        self.store.find_one(&filter)
    }
}

fn ensure_content_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for collection in Collection::ALL {
        if !table_exists(conn, collection.table())? {
            return Err(RepoError::MissingRequiredTable(collection.table()));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
