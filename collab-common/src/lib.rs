//! # Collab Common Library
//!
//! Shared code for the collaboration ingest & analytics service:
//! - Assignment data model and the collaboration result type
//! - Database initialization (employees, projects, assignments)
//! - Configuration loading
//! - Calendar date parsing for ingested rows

pub mod config;
pub mod dates;
pub mod db;
pub mod error;

pub use db::models::{AssignmentRecord, LongestCollaboration, PairKey};
pub use error::{Error, Result};
