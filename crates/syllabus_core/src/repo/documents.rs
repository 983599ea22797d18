//! Row decoding for the five content documents.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.
//! - Embedded JSON sequences keep their stored order.
//! - Ids and references decode only from canonical UUID text.
//! - Flag gaps are logged, never repaired.

use crate::model::hierarchy::{MicroUnit, SubTopic, Syllabus};
use crate::model::ids::{IdParseError, McqSetId, MicroUnitId, NoteId, SubTopicId, SyllabusId};
use crate::model::mcq::{McqQuestion, MicroUnitMcq};
use crate::model::note::MicroUnitNote;
use crate::model::stage::{
    ArtifactStage, DecodedStage, MicroUnitStage, SubTopicStage, SyllabusStage,
};
use crate::repo::store::{Collection, Document, RepoError, RepoResult};
use log::warn;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use std::fmt::Display;

impl Document for Syllabus {
    const COLLECTION: Collection = Collection::Syllabus;

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let uuid_text: String = row.get("uuid")?;
        let id = parse_id(&uuid_text, "syllabus.uuid", SyllabusId::parse)?;
        let subtopics_text: String = row.get("subtopics")?;
        let subtopics = parse_json::<Vec<String>>(&subtopics_text, "syllabus.subtopics")?
            .iter()
            .map(|value| parse_id(value, "syllabus.subtopics", SubTopicId::parse))
            .collect::<RepoResult<Vec<_>>>()?;

        let pipeline = SyllabusStage::from_flags(
            parse_flag(row, "v1", "syllabus.v1")?,
            parse_flag(row, "v2", "syllabus.v2")?,
            parse_flag(row, "v3", "syllabus.v3")?,
            parse_flag(row, "v4", "syllabus.v4")?,
        );

        Ok(Syllabus {
            id,
            exam: row.get("exam")?,
            stage: row.get("stage")?,
            paper: row.get("paper")?,
            subject: row.get("subject")?,
            subtopics,
            pipeline: checked_stage(pipeline, Collection::Syllabus, &uuid_text),
        })
    }
}

impl Document for SubTopic {
    const COLLECTION: Collection = Collection::SubTopics;

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let uuid_text: String = row.get("uuid")?;
        let id = parse_id(&uuid_text, "subtopics.uuid", SubTopicId::parse)?;
        let pipeline = SubTopicStage::from_flags(
            parse_flag(row, "generated", "subtopics.generated")?,
            parse_flag(row, "cleaned", "subtopics.cleaned")?,
            parse_flag(row, "verified", "subtopics.verified")?,
            parse_flag(row, "finalized", "subtopics.finalized")?,
        );

        Ok(SubTopic {
            id,
            name: row.get("name")?,
            subject: row.get("subject")?,
            pipeline: checked_stage(pipeline, Collection::SubTopics, &uuid_text),
        })
    }
}

impl Document for MicroUnit {
    const COLLECTION: Collection = Collection::MicroUnits;

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let uuid_text: String = row.get("uuid")?;
        let id = parse_id(&uuid_text, "micro_units.uuid", MicroUnitId::parse)?;
        let subtopic_text: String = row.get("subtopic_uuid")?;
        let subtopic = parse_id(&subtopic_text, "micro_units.subtopic_uuid", SubTopicId::parse)?;
        let pipeline = MicroUnitStage::from_flags(
            parse_flag(row, "generated", "micro_units.generated")?,
            parse_flag(row, "verified", "micro_units.verified")?,
            parse_flag(row, "finalized", "micro_units.finalized")?,
        );

        Ok(MicroUnit {
            id,
            name: row.get("name")?,
            subject: row.get("subject")?,
            subtopic,
            order: row.get("sort_order")?,
            pipeline: checked_stage(pipeline, Collection::MicroUnits, &uuid_text),
        })
    }
}

impl Document for MicroUnitNote {
    const COLLECTION: Collection = Collection::MicroUnitNotes;

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let uuid_text: String = row.get("uuid")?;
        let id = parse_id(&uuid_text, "micro_unit_notes.uuid", NoteId::parse)?;
        let micro_unit_text: String = row.get("micro_unit_uuid")?;
        let micro_unit = parse_id(
            &micro_unit_text,
            "micro_unit_notes.micro_unit_uuid",
            MicroUnitId::parse,
        )?;
        let reasons_text: String = row.get("image_reasons")?;
        let pipeline = ArtifactStage::from_flags(
            parse_flag(row, "generated", "micro_unit_notes.generated")?,
            parse_flag(row, "verified", "micro_unit_notes.verified")?,
        );

        Ok(MicroUnitNote {
            id,
            micro_unit,
            content: row.get("content")?,
            word_count: row.get("word_count")?,
            image_required: parse_flag(row, "image_required", "micro_unit_notes.image_required")?,
            image_reasons: parse_json(&reasons_text, "micro_unit_notes.image_reasons")?,
            pipeline: checked_stage(pipeline, Collection::MicroUnitNotes, &uuid_text),
        })
    }
}

impl Document for MicroUnitMcq {
    const COLLECTION: Collection = Collection::MicroUnitMcqs;

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let uuid_text: String = row.get("uuid")?;
        let id = parse_id(&uuid_text, "micro_unit_mcqs.uuid", McqSetId::parse)?;
        let micro_unit_text: String = row.get("micro_unit_uuid")?;
        let micro_unit = parse_id(
            &micro_unit_text,
            "micro_unit_mcqs.micro_unit_uuid",
            MicroUnitId::parse,
        )?;
        let mcqs_text: String = row.get("mcqs")?;
        let mcqs: Vec<McqQuestion> = parse_json(&mcqs_text, "micro_unit_mcqs.mcqs")?;
        let reasons_text: String = row.get("image_reasons")?;
        let pipeline = ArtifactStage::from_flags(
            parse_flag(row, "generated", "micro_unit_mcqs.generated")?,
            parse_flag(row, "verified", "micro_unit_mcqs.verified")?,
        );

        let set = MicroUnitMcq {
            id,
            micro_unit,
            mcq_count: row.get("mcq_count")?,
            mcqs,
            remarks: row.get("remarks")?,
            commentary: row.get("commentary")?,
            content: row.get("content")?,
            image_required: parse_flag(row, "image_required", "micro_unit_mcqs.image_required")?,
            image_reasons: parse_json(&reasons_text, "micro_unit_mcqs.image_reasons")?,
            pipeline: checked_stage(pipeline, Collection::MicroUnitMcqs, &uuid_text),
        };
        set.validate().map_err(|err| {
            RepoError::InvalidData(format!("mcq set `{uuid_text}`: {err}"))
        })?;
        Ok(set)
    }
}

/// Stored ids must be byte-identical to their canonical form; lookups bind
/// canonical text, so any other spelling would never match.
fn parse_id<T: Display>(
    value: &str,
    column: &'static str,
    parse: fn(&str) -> Result<T, IdParseError>,
) -> RepoResult<T> {
    let id = parse(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))?;
    if id.to_string() != value {
        return Err(RepoError::InvalidData(format!(
            "non-canonical uuid `{value}` in {column}"
        )));
    }
    Ok(id)
}

fn parse_flag(row: &Row<'_>, field: &str, column: &'static str) -> RepoResult<bool> {
    match row.get::<_, i64>(field)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn parse_json<T: DeserializeOwned>(value: &str, column: &'static str) -> RepoResult<T> {
    serde_json::from_str(value)
        .map_err(|err| RepoError::InvalidData(format!("invalid json in {column}: {err}")))
}

fn checked_stage<S: std::fmt::Debug>(
    decoded: DecodedStage<S>,
    collection: Collection,
    uuid: &str,
) -> S {
    if decoded.has_gap {
        warn!(
            "event=pipeline_flag_gap module=repo status=warn collection={} uuid={} stage={:?}",
            collection.table(),
            uuid,
            decoded.stage
        );
    }
    decoded.stage
}
