//! Ingestion and analysis services

pub mod assignment_writer;
pub mod chunk_batcher;
pub mod ingestion;
pub mod overlap_analyzer;
pub mod record_validator;
pub mod upload_gate;

pub use assignment_writer::{AssignmentWriter, BatchOutcome};
pub use chunk_batcher::ChunkBatcher;
pub use ingestion::{IngestError, IngestOptions, IngestSummary, IngestionCoordinator};
pub use overlap_analyzer::OverlapAnalyzer;
pub use record_validator::{RawRow, RecordValidator, RejectReason};
pub use upload_gate::{UploadGate, UploadRejection};
