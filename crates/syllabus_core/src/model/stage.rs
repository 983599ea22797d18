//! Pipeline stages and the publication gate.
//!
//! # Responsibility
//! - Collapse each entity's sequential curation flags into one ordered stage.
//! - Define the single predicate that decides reader visibility.
//!
//! # Invariants
//! - Stages are totally ordered; a later stage implies every earlier one.
//! - An entity is visible iff its stage is the terminal stage of its ladder.
//! - The gate is evaluated per read and never cached.

use serde::{Deserialize, Serialize};

/// Ordered curation ladder of one entity kind.
pub trait PipelineStage: Copy + Ord {
    /// Stage at which the entity becomes visible to readers.
    const TERMINAL: Self;

    fn is_terminal(self) -> bool {
        self >= Self::TERMINAL
    }
}

/// Entities gated by the publication rule.
pub trait Published {
    fn is_published(&self) -> bool;
}

/// Syllabus review ladder (`v1..v4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyllabusStage {
    Pending,
    V1,
    V2,
    V3,
    V4,
}

impl PipelineStage for SyllabusStage {
    const TERMINAL: Self = Self::V4;
}

/// Subtopic curation ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTopicStage {
    Pending,
    Generated,
    Cleaned,
    Verified,
    Finalized,
}

impl PipelineStage for SubTopicStage {
    const TERMINAL: Self = Self::Finalized;
}

/// Micro-unit curation ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MicroUnitStage {
    Pending,
    Generated,
    Verified,
    Finalized,
}

impl PipelineStage for MicroUnitStage {
    const TERMINAL: Self = Self::Finalized;
}

/// Ladder shared by notes and MCQ sets. Not used for gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStage {
    Pending,
    Generated,
    Verified,
}

impl PipelineStage for ArtifactStage {
    const TERMINAL: Self = Self::Verified;
}

/// Stage decoded from stored flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedStage<S> {
    pub stage: S,
    /// A later flag was set while an earlier one was not.
    pub has_gap: bool,
}

/// Decodes a ladder of `(flag, stage)` pairs, listed earliest first.
///
/// The result is the highest stage whose flag is set, so the terminal flag
/// alone decides visibility even when the pipeline skipped a step.
pub fn decode_flags<S: PipelineStage>(pending: S, ladder: &[(bool, S)]) -> DecodedStage<S> {
    let mut stage = pending;
    let mut seen_unset = false;
    let mut has_gap = false;
    for (flag, candidate) in ladder {
        if *flag {
            stage = *candidate;
            has_gap |= seen_unset;
        } else {
            seen_unset = true;
        }
    }
    DecodedStage { stage, has_gap }
}

impl SyllabusStage {
    pub fn from_flags(v1: bool, v2: bool, v3: bool, v4: bool) -> DecodedStage<Self> {
        decode_flags(
            Self::Pending,
            &[(v1, Self::V1), (v2, Self::V2), (v3, Self::V3), (v4, Self::V4)],
        )
    }
}

impl SubTopicStage {
    pub fn from_flags(
        generated: bool,
        cleaned: bool,
        verified: bool,
        finalized: bool,
    ) -> DecodedStage<Self> {
        decode_flags(
            Self::Pending,
            &[
                (generated, Self::Generated),
                (cleaned, Self::Cleaned),
                (verified, Self::Verified),
                (finalized, Self::Finalized),
            ],
        )
    }
}

impl MicroUnitStage {
    pub fn from_flags(generated: bool, verified: bool, finalized: bool) -> DecodedStage<Self> {
        decode_flags(
            Self::Pending,
            &[
                (generated, Self::Generated),
                (verified, Self::Verified),
                (finalized, Self::Finalized),
            ],
        )
    }
}

impl ArtifactStage {
    pub fn from_flags(generated: bool, verified: bool) -> DecodedStage<Self> {
        decode_flags(
            Self::Pending,
            &[(generated, Self::Generated), (verified, Self::Verified)],
        )
    }
}
