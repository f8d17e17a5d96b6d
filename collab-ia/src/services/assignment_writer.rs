//! Idempotent batch persistence
//!
//! For every record, in batch order: ensure the employee exists, ensure the
//! project exists, then upsert the assignment by natural key. A failure on one
//! record is logged and counted; the remaining records are still attempted.
//! There is no cross-record transaction.

use std::sync::Arc;

use collab_common::{AssignmentRecord, Result};
use tracing::{info, warn};

use crate::store::AssignmentStore;

/// Per-batch write counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub written: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct AssignmentWriter {
    store: Arc<dyn AssignmentStore>,
}

impl AssignmentWriter {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self { store }
    }

    pub async fn write_batch(&self, records: &[AssignmentRecord]) -> BatchOutcome {
        info!("Processing chunk of {} rows...", records.len());

        let mut outcome = BatchOutcome::default();
        for record in records {
            match self.write_one(record).await {
                Ok(()) => outcome.written += 1,
                Err(e) => {
                    outcome.failed += 1;
                    warn!(
                        employee_id = record.employee_id,
                        project_id = record.project_id,
                        date_from = %record.date_from,
                        date_to = %record.date_to,
                        constraint_violation = e.is_constraint_violation(),
                        error = %e,
                        "Failed to persist assignment"
                    );
                }
            }
        }

        info!(
            written = outcome.written,
            failed = outcome.failed,
            "Chunk processed"
        );
        outcome
    }

    async fn write_one(&self, record: &AssignmentRecord) -> Result<()> {
        self.store.upsert_employee(record.employee_id).await?;
        self.store.upsert_project(record.project_id).await?;
        self.store.upsert_assignment(record).await
    }
}
