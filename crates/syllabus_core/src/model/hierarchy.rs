//! Syllabus, subtopic and micro-unit documents.
//!
//! # Responsibility
//! - Define the upper levels of the content hierarchy and their weak links.
//!
//! # Invariants
//! - `(name, subject)` is unique per subtopic.
//! - `(subtopic, name)` is unique per micro-unit.
//! - Links are ids only; no entity owns another.

use crate::model::ids::{MicroUnitId, SubTopicId, SyllabusId};
use crate::model::stage::{
    MicroUnitStage, PipelineStage, Published, SubTopicStage, SyllabusStage,
};
use serde::{Deserialize, Serialize};

/// One syllabus row: an (exam, stage, paper, subject) coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syllabus {
    pub id: SyllabusId,
    pub exam: String,
    /// Exam stage label such as `Prelims` or `Mains`.
    pub stage: String,
    pub paper: String,
    pub subject: String,
    /// Referenced subtopics, in stored order.
    pub subtopics: Vec<SubTopicId>,
    pub pipeline: SyllabusStage,
}

impl Published for Syllabus {
    fn is_published(&self) -> bool {
        self.pipeline.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTopic {
    pub id: SubTopicId,
    pub name: String,
    pub subject: String,
    pub pipeline: SubTopicStage,
}

impl Published for SubTopic {
    fn is_published(&self) -> bool {
        self.pipeline.is_terminal()
    }
}

/// Smallest study unit; belongs to exactly one subtopic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroUnit {
    pub id: MicroUnitId,
    pub name: String,
    pub subject: String,
    pub subtopic: SubTopicId,
    /// Presentation position within the subtopic. Ties keep storage order.
    pub order: i64,
    pub pipeline: MicroUnitStage,
}

impl Published for MicroUnit {
    fn is_published(&self) -> bool {
        self.pipeline.is_terminal()
    }
}
