#![allow(dead_code)]

use rusqlite::{params, Connection};
use serde_json::{json, Value};
use syllabus_core::{MicroUnitId, SubTopicId, SyllabusId};

/// Raw-SQL writer standing in for the ingestion pipeline.
pub struct Seeder<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Seeder<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn syllabus(&self, subject: &str, stage: &str, paper: &str, published: bool) -> SyllabusId {
        let id = SyllabusId::new();
        self.conn
            .execute(
                "INSERT INTO syllabus (uuid, stage, paper, subject, v1, v2, v3, v4)
                 VALUES (?1, ?2, ?3, ?4, 1, 1, 1, ?5);",
                params![id.to_string(), stage, paper, subject, published],
            )
            .unwrap();
        id
    }

    pub fn syllabus_with_exam(&self, subject: &str, exam: &str) -> SyllabusId {
        let id = SyllabusId::new();
        self.conn
            .execute(
                "INSERT INTO syllabus (uuid, exam, stage, paper, subject, v1, v2, v3, v4)
                 VALUES (?1, ?2, 'Prelims', 'GS1', ?3, 1, 1, 1, 1);",
                params![id.to_string(), exam, subject],
            )
            .unwrap();
        id
    }

    pub fn subtopic(&self, subject: &str, name: &str, finalized: bool) -> SubTopicId {
        let id = SubTopicId::new();
        self.conn
            .execute(
                "INSERT INTO subtopics (uuid, name, subject, generated, cleaned, verified, finalized)
                 VALUES (?1, ?2, ?3, 1, 1, 1, ?4);",
                params![id.to_string(), name, subject, finalized],
            )
            .unwrap();
        id
    }

    pub fn micro_unit(
        &self,
        subtopic: SubTopicId,
        subject: &str,
        name: &str,
        order: i64,
        finalized: bool,
    ) -> MicroUnitId {
        let id = MicroUnitId::new();
        self.conn
            .execute(
                "INSERT INTO micro_units
                    (uuid, name, subject, subtopic_uuid, sort_order, generated, verified, finalized)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, 1, ?6);",
                params![id.to_string(), name, subject, subtopic.to_string(), order, finalized],
            )
            .unwrap();
        id
    }

    pub fn note(&self, micro_unit: MicroUnitId, content: &str) {
        self.conn
            .execute(
                "INSERT INTO micro_unit_notes (uuid, micro_unit_uuid, content, word_count, generated)
                 VALUES (?1, ?2, ?3, ?4, 1);",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    micro_unit.to_string(),
                    content,
                    content.split_whitespace().count() as i64
                ],
            )
            .unwrap();
    }

    /// Stores an MCQ set with `declared_count` as-is, even when it disagrees.
    pub fn mcq_set(&self, micro_unit: MicroUnitId, questions: &Value, declared_count: i64) {
        self.conn
            .execute(
                "INSERT INTO micro_unit_mcqs
                    (uuid, micro_unit_uuid, mcq_count, mcqs, content, generated)
                 VALUES (?1, ?2, ?3, ?4, 'generated from note', 1);",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    micro_unit.to_string(),
                    declared_count,
                    questions.to_string()
                ],
            )
            .unwrap();
    }
}

pub fn question(number: i64, text: &str, correct: &str) -> Value {
    json!({
        "question_number": number,
        "question_text": text,
        "options": [
            { "option": "A", "text": "Chandragupta I" },
            { "option": "B", "text": "Samudragupta" },
            { "option": "C", "text": "Ashoka" },
            { "option": "D", "text": "Bindusara" }
        ],
        "correct_answer": correct,
        "explanation": "Recorded in the Allahabad pillar inscription.",
        "additional_notes": null,
        "image_required": false,
        "image_reason": null
    })
}

/// History catalog used by query tests.
///
/// - Ancient India (finalized): Guptas (order 1, noted), Mauryas (order 2).
/// - Medieval India (not finalized): one finalized unit with a note.
pub struct HistoryCatalog {
    pub ancient_india: SubTopicId,
    pub medieval_india: SubTopicId,
    pub guptas: MicroUnitId,
    pub mauryas: MicroUnitId,
    pub delhi_sultanate: MicroUnitId,
}

pub fn seed_history(conn: &Connection) -> HistoryCatalog {
    let seed = Seeder::new(conn);
    seed.syllabus("History", "Prelims", "GS1", true);
    seed.syllabus("History", "Mains", "GS1", true);
    seed.syllabus("History", "Mains", "Optional", false);

    let ancient_india = seed.subtopic("History", "Ancient India", true);
    let medieval_india = seed.subtopic("History", "Medieval India", false);

    // Inserted out of order on purpose.
    let mauryas = seed.micro_unit(ancient_india, "History", "Mauryas", 2, true);
    let guptas = seed.micro_unit(ancient_india, "History", "Guptas", 1, true);
    let delhi_sultanate = seed.micro_unit(medieval_india, "History", "Delhi Sultanate", 1, true);

    seed.note(guptas, "The Gupta period is often called a golden age.");
    seed.note(delhi_sultanate, "The Delhi Sultanate spanned five dynasties.");

    HistoryCatalog {
        ancient_india,
        medieval_india,
        guptas,
        mauryas,
        delhi_sultanate,
    }
}

/// Seeds one finalized subtopic holding `units` finalized micro-units, enough
/// to keep a listing statement busy for many VM steps.
pub fn seed_crowded_subtopic(conn: &Connection, units: usize) -> SubTopicId {
    conn.execute_batch("BEGIN;").unwrap();
    let seed = Seeder::new(conn);
    let banking = seed.subtopic("Economy", "Banking", true);
    for order in 0..units {
        seed.micro_unit(banking, "Economy", &format!("Unit {order}"), order as i64, true);
    }
    conn.execute_batch("COMMIT;").unwrap();
    banking
}
