//! Micro-unit MCQ set document.
//!
//! # Responsibility
//! - Define the MCQ set with its embedded question and option records.
//! - Validate set consistency before it is served.
//!
//! # Invariants
//! - `mcq_count` equals `mcqs.len()`; a mismatch is reported, never corrected.
//! - Question and option sequences keep their stored order.
//! - A set has at least one question and every question has options.

use crate::model::ids::{McqSetId, MicroUnitId};
use crate::model::stage::ArtifactStage;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One labelled answer choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqOption {
    /// Choice label such as `A`.
    pub option: String,
    pub text: String,
}

/// One embedded question record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqQuestion {
    pub question_number: i64,
    pub question_text: String,
    pub options: Vec<McqOption>,
    pub correct_answer: String,
    pub explanation: String,
    #[serde(default)]
    pub additional_notes: Option<String>,
    #[serde(default)]
    pub image_required: bool,
    #[serde(default)]
    pub image_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroUnitMcq {
    pub id: McqSetId,
    pub micro_unit: MicroUnitId,
    pub mcq_count: i64,
    pub mcqs: Vec<McqQuestion>,
    pub remarks: Option<String>,
    pub commentary: Option<String>,
    pub content: String,
    pub image_required: bool,
    pub image_reasons: Vec<String>,
    pub pipeline: ArtifactStage,
}

/// Consistency violations of a stored MCQ set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McqValidationError {
    CountMismatch { declared: i64, actual: usize },
    NoQuestions,
    QuestionWithoutOptions { question_number: i64 },
}

impl Display for McqValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CountMismatch { declared, actual } => write!(
                f,
                "mcq_count {declared} does not match {actual} stored question(s)"
            ),
            Self::NoQuestions => write!(f, "mcq set has no questions"),
            Self::QuestionWithoutOptions { question_number } => {
                write!(f, "question {question_number} has no options")
            }
        }
    }
}

impl Error for McqValidationError {}

impl MicroUnitMcq {
    /// Checks set-level consistency.
    pub fn validate(&self) -> Result<(), McqValidationError> {
        if self.mcqs.is_empty() {
            return Err(McqValidationError::NoQuestions);
        }
        if usize::try_from(self.mcq_count).ok() != Some(self.mcqs.len()) {
            return Err(McqValidationError::CountMismatch {
                declared: self.mcq_count,
                actual: self.mcqs.len(),
            });
        }
        if let Some(question) = self.mcqs.iter().find(|q| q.options.is_empty()) {
            return Err(McqValidationError::QuestionWithoutOptions {
                question_number: question.question_number,
            });
        }
        Ok(())
    }
}
