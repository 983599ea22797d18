//! Micro-unit note document.
//!
//! At most one note exists per micro-unit; the store enforces it with a
//! unique index on the micro-unit reference.

use crate::model::ids::{MicroUnitId, NoteId};
use crate::model::stage::ArtifactStage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroUnitNote {
    pub id: NoteId,
    pub micro_unit: MicroUnitId,
    /// Study text, typically markdown.
    pub content: String,
    /// Legacy auxiliary field.
    pub word_count: Option<i64>,
    /// Legacy auxiliary field.
    pub image_required: bool,
    /// Legacy auxiliary field.
    pub image_reasons: Vec<String>,
    pub pipeline: ArtifactStage,
}
