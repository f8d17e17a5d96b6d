//! SQLite-backed assignment storage
//!
//! Each upsert is a single `INSERT ... ON CONFLICT DO NOTHING` statement, so the
//! natural-key check and the write happen atomically inside SQLite.

use async_trait::async_trait;
use chrono::NaiveDate;
use collab_common::{AssignmentRecord, Result};
use sqlx::SqlitePool;

use crate::store::AssignmentStore;

#[derive(Clone)]
pub struct SqliteAssignmentStore {
    pool: SqlitePool,
}

impl SqliteAssignmentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of stored assignment periods
    pub async fn count_assignments(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM employee_projects")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl AssignmentStore for SqliteAssignmentStore {
    async fn upsert_employee(&self, employee_id: i64) -> Result<()> {
        sqlx::query("INSERT INTO employees (id) VALUES (?) ON CONFLICT(id) DO NOTHING")
            .bind(employee_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_project(&self, project_id: i64) -> Result<()> {
        sqlx::query("INSERT INTO projects (id) VALUES (?) ON CONFLICT(id) DO NOTHING")
            .bind(project_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_assignment(&self, record: &AssignmentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO employee_projects (employee_id, project_id, date_from, date_to)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(employee_id, project_id, date_from, date_to) DO NOTHING
            "#,
        )
        .bind(record.employee_id)
        .bind(record.project_id)
        .bind(record.date_from)
        .bind(record.date_to)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn scan_assignments(&self) -> Result<Vec<AssignmentRecord>> {
        let rows = sqlx::query_as::<_, (i64, i64, NaiveDate, NaiveDate)>(
            r#"
            SELECT employee_id, project_id, date_from, date_to
            FROM employee_projects
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(employee_id, project_id, date_from, date_to)| {
                AssignmentRecord::new(employee_id, project_id, date_from, date_to)
            })
            .collect())
    }
}
