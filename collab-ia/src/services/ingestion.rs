//! Streaming CSV ingestion
//!
//! ```text
//! source bytes -> [reader thread] -bounded channel-> validate -> batch -> write
//! ```
//!
//! The delimited reader runs on the blocking pool and hands rows over a
//! channel whose capacity is the configured read-ahead. The coordinator pulls
//! one row at a time and stops pulling while a chunk is being written, so the
//! reader parks on the full channel until the write finishes. Peak memory is
//! `chunk_size + read_ahead` records no matter how large the input is, and
//! there is never more than one write batch outstanding.
//!
//! Phases: `Idle -> Streaming <-> Flushing -> Draining -> Done`, or
//! `Streaming -> Failed` on a read error. Bad rows and failed writes are
//! counted and never leave `Streaming`/`Flushing`.

use std::io::Read;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::assignment_writer::AssignmentWriter;
use super::chunk_batcher::ChunkBatcher;
use super::record_validator::{RawRow, RecordValidator, RejectReason};
use crate::store::AssignmentStore;

pub const COMPLETED_MESSAGE: &str = "CSV processing completed";
pub const READ_FAILED_MESSAGE: &str = "Error reading file";

/// Result of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    /// Rows accepted by validation
    pub processed_rows: usize,
    /// Rows rejected by validation or unreadable as a row
    pub rows_with_error: usize,
    pub message: String,
    /// Write batches issued (full chunks plus the final partial one)
    #[serde(skip)]
    pub batches_flushed: usize,
    /// Accepted records the store failed to persist
    #[serde(skip)]
    pub write_failures: usize,
}

#[derive(Debug, Error)]
pub enum IngestError {
    /// Fatal read failure; rows flushed before it stay written
    #[error("Error reading file: {reason}")]
    StreamReadFailed {
        reason: String,
        partial: IngestSummary,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestPhase {
    Idle,
    Streaming,
    Flushing,
    Draining,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub chunk_size: usize,
    pub read_ahead: usize,
    /// End date for open-ended rows; `None` means the local date at run start
    pub today: Option<NaiveDate>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunk_size: collab_common::config::DEFAULT_CHUNK_SIZE,
            read_ahead: collab_common::config::DEFAULT_READ_AHEAD,
            today: None,
        }
    }
}

pub struct IngestionCoordinator {
    writer: AssignmentWriter,
    options: IngestOptions,
}

impl IngestionCoordinator {
    pub fn new(store: Arc<dyn AssignmentStore>, options: IngestOptions) -> Self {
        Self {
            writer: AssignmentWriter::new(store),
            options,
        }
    }

    /// Stream `source` (header line first) into storage
    pub async fn ingest<R>(&self, source: R) -> Result<IngestSummary, IngestError>
    where
        R: Read + Send + 'static,
    {
        let today = self
            .options
            .today
            .unwrap_or_else(|| Local::now().date_naive());
        let validator = RecordValidator::new(today);
        let mut batcher = ChunkBatcher::new(self.options.chunk_size);
        let mut summary = IngestSummary::default();
        let mut phase = IngestPhase::Idle;

        info!(
            chunk_size = batcher.capacity(),
            read_ahead = self.options.read_ahead,
            today = %today,
            "Starting CSV ingestion"
        );

        let mut rows = RowSource::spawn(source, self.options.read_ahead);
        enter(&mut phase, IngestPhase::Streaming);

        loop {
            match rows.next().await {
                SourceItem::Row(row) => match validator.validate(&row) {
                    Ok(record) => {
                        summary.processed_rows += 1;
                        if let Some(chunk) = batcher.push(record) {
                            enter(&mut phase, IngestPhase::Flushing);
                            debug!("Source paused for flush");
                            self.flush(&chunk, &mut summary).await;
                            summary.batches_flushed = batcher.chunks_emitted();
                            debug!("Source resumed");
                            enter(&mut phase, IngestPhase::Streaming);
                        }
                    }
                    Err(reason) => reject(&mut summary, row.line, &reason),
                },
                SourceItem::Malformed { line, reason } => {
                    reject(&mut summary, line, &RejectReason::Malformed(reason));
                }
                SourceItem::Failed(reason) => {
                    enter(&mut phase, IngestPhase::Failed);
                    summary.message = READ_FAILED_MESSAGE.to_string();
                    error!(
                        processed_rows = summary.processed_rows,
                        rows_with_error = summary.rows_with_error,
                        batches_flushed = summary.batches_flushed,
                        dropped_pending = batcher.pending_len(),
                        error = %reason,
                        "Stream error, ingestion aborted"
                    );
                    return Err(IngestError::StreamReadFailed {
                        reason,
                        partial: summary,
                    });
                }
                SourceItem::End => break,
            }
        }

        enter(&mut phase, IngestPhase::Draining);
        if let Some(chunk) = batcher.finish() {
            self.flush(&chunk, &mut summary).await;
        }
        summary.batches_flushed = batcher.chunks_emitted();
        enter(&mut phase, IngestPhase::Done);

        summary.message = COMPLETED_MESSAGE.to_string();
        info!(
            processed_rows = summary.processed_rows,
            rows_with_error = summary.rows_with_error,
            batches_flushed = summary.batches_flushed,
            write_failures = summary.write_failures,
            "CSV processing completed"
        );
        Ok(summary)
    }

    async fn flush(&self, chunk: &[collab_common::AssignmentRecord], summary: &mut IngestSummary) {
        let outcome = self.writer.write_batch(chunk).await;
        summary.write_failures += outcome.failed;
    }
}

fn enter(phase: &mut IngestPhase, next: IngestPhase) {
    debug!(from = ?*phase, to = ?next, "Ingestion phase change");
    *phase = next;
}

fn reject(summary: &mut IngestSummary, line: u64, reason: &RejectReason) {
    summary.rows_with_error += 1;
    warn!(line, kind = reason.kind(), reason = %reason, "Skipping row");
}

// ============================================================================
// Row source
// ============================================================================

#[derive(Debug)]
enum SourceItem {
    Row(RawRow),
    Malformed { line: u64, reason: String },
    Failed(String),
    End,
}

/// Pull side of the reader thread
struct RowSource {
    rx: mpsc::Receiver<SourceItem>,
    reader: Option<JoinHandle<()>>,
}

impl RowSource {
    fn spawn<R>(source: R, read_ahead: usize) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(read_ahead.max(1));
        let reader = tokio::task::spawn_blocking(move || read_rows(source, tx));
        Self {
            rx,
            reader: Some(reader),
        }
    }

    async fn next(&mut self) -> SourceItem {
        if let Some(item) = self.rx.recv().await {
            return item;
        }
        // Channel closed: clean end unless the reader thread died
        match self.reader.take() {
            Some(handle) => match handle.await {
                Ok(()) => SourceItem::End,
                Err(e) => SourceItem::Failed(format!("reader task failed: {}", e)),
            },
            None => SourceItem::End,
        }
    }
}

/// Blocking producer: parses records and parks on the channel when it is full.
/// Exits early if the consumer goes away.
fn read_rows<R: Read>(source: R, tx: mpsc::Sender<SourceItem>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);
    let mut record = csv::StringRecord::new();

    loop {
        let item = match reader.read_record(&mut record) {
            Ok(true) => {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                SourceItem::Row(RawRow::from_fields(record.iter(), line))
            }
            Ok(false) => return,
            Err(e) if e.is_io_error() => {
                let _ = tx.blocking_send(SourceItem::Failed(e.to_string()));
                return;
            }
            Err(e) => SourceItem::Malformed {
                line: e.position().map(|p| p.line()).unwrap_or_default(),
                reason: e.to_string(),
            },
        };

        if tx.blocking_send(item).is_err() {
            return;
        }
    }
}
