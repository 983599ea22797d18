//! Typed identifiers, one per entity kind.
//!
//! # Invariants
//! - Ids of different kinds never compare or convert implicitly.
//! - Wire/storage form is the hyphenated lowercase UUID string.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Identifier text that cannot be parsed into the store's native id form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    /// Entity kind the caller tried to address.
    pub kind: &'static str,
    /// Raw input as received.
    pub value: String,
}

impl Display for IdParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} id `{}`", self.kind, self.value)
    }
}

impl Error for IdParseError {}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Entity kind label used in errors and logs.
            pub const KIND: &'static str = $kind;

            /// Generates a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Parses caller-provided identifier text.
            pub fn parse(value: &str) -> Result<Self, IdParseError> {
                Uuid::parse_str(value.trim())
                    .map(Self)
                    .map_err(|_| IdParseError {
                        kind: $kind,
                        value: value.to_string(),
                    })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::parse(value)
            }
        }
    };
}

entity_id!(
    /// Identity of one syllabus row.
    SyllabusId,
    "syllabus"
);
entity_id!(
    /// Identity of one subtopic.
    SubTopicId,
    "subtopic"
);
entity_id!(
    /// Identity of one micro-unit.
    MicroUnitId,
    "micro_unit"
);
entity_id!(
    /// Identity of one micro-unit note document.
    NoteId,
    "note"
);
entity_id!(
    /// Identity of one micro-unit MCQ set document.
    McqSetId,
    "mcq_set"
);

#[cfg(test)]
mod tests {
    use super::{MicroUnitId, SubTopicId};

    #[test]
    fn parse_accepts_canonical_uuid_and_trims_whitespace() {
        let id = MicroUnitId::parse(" 11111111-2222-4333-8444-555555555555 ").unwrap();
        assert_eq!(id.to_string(), "11111111-2222-4333-8444-555555555555");
    }

    #[test]
    fn parse_rejects_object_id_shaped_text() {
        let err = SubTopicId::parse("65f1c0ffee65f1c0ffee65f1").unwrap_err();
        assert_eq!(err.kind, "subtopic");
        assert_eq!(err.value, "65f1c0ffee65f1c0ffee65f1");
        assert!(err.to_string().contains("invalid subtopic id"));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = MicroUnitId::parse("11111111-2222-4333-8444-555555555555").unwrap();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, "11111111-2222-4333-8444-555555555555");
    }
}
