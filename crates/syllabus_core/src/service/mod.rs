//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into read-path catalog queries.
//! - Keep API/CLI layers decoupled from storage details.

pub mod catalog_service;
