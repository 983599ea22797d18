//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Provide the generic document store adapter over SQLite tables.
//! - Define use-case oriented read contracts for the content hierarchy.
//! - Isolate SQL details from service orchestration.
//!
//! # Invariants
//! - The repository layer never writes.
//! - Repository APIs return `None`/empty for no match; the service decides
//!   what counts as not-found.

mod documents;

pub mod content_repo;
pub mod store;
