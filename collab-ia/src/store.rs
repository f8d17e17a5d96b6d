//! Storage access capability
//!
//! The ingestion writer and the overlap analyzer receive an `AssignmentStore`
//! at construction instead of reaching for a shared global connection.
//! Implementations must make each upsert atomic per record: concurrent
//! ingestion runs rely on it to avoid duplicate natural keys.

use async_trait::async_trait;
use collab_common::{AssignmentRecord, Result};

#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Create the employee if absent. Never modifies or deletes an existing one.
    async fn upsert_employee(&self, employee_id: i64) -> Result<()>;

    /// Create the project if absent. Never modifies or deletes an existing one.
    async fn upsert_project(&self, project_id: i64) -> Result<()>;

    /// Create the assignment if its natural key is absent; otherwise a no-op.
    async fn upsert_assignment(&self, record: &AssignmentRecord) -> Result<()>;

    /// Every stored assignment, in insertion order.
    async fn scan_assignments(&self) -> Result<Vec<AssignmentRecord>>;
}
