//! Content hierarchy domain model.
//!
//! # Responsibility
//! - Define the five document kinds and their typed weak references.
//! - Define pipeline stages and the publication gate predicate.
//!
//! # Invariants
//! - Every document is identified by a kind-specific id type.
//! - References never imply ownership or cascade.
//! - Documents are produced by the ingestion pipeline; this crate only reads them.

pub mod hierarchy;
pub mod ids;
pub mod mcq;
pub mod note;
pub mod stage;
