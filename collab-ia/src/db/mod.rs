//! Database access for collab-ia

pub mod assignments;

pub use assignments::SqliteAssignmentStore;

use collab_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (or create) the database and its schema
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", db_path.display());
    collab_common::db::init_database(db_path).await
}
