//! Queued task rows.

use crate::error::DatabaseError;
use crate::{Error, Result};

use super::{Database, TaskRow};

impl Database {
    /// Append a task at the tail of the queue, returning its sequence number
    pub fn push_task(&self, task_id: &str, kind: &str, body: &str) -> Result<i64> {
        self.block_on(async {
            let now = chrono::Utc::now().timestamp();
            let result = sqlx::query(
                "INSERT INTO tasks (task_id, kind, body, queued_at) VALUES (?, ?, ?, ?)",
            )
            .bind(task_id)
            .bind(kind)
            .bind(body)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert task: {}",
                    e
                )))
            })?;

            Ok::<_, Error>(result.last_insert_rowid())
        })
    }

    /// Remove and return the oldest task
    ///
    /// The read and the delete run in one transaction.
    pub fn pop_task(&self) -> Result<Option<TaskRow>> {
        self.block_on(async {
            let mut tx = self.pool.begin().await.map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to begin transaction: {}",
                    e
                )))
            })?;

            let row = sqlx::query_as::<_, TaskRow>(
                "SELECT seq, task_id, kind, body, queued_at FROM tasks ORDER BY seq ASC LIMIT 1",
            )
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to read queue head: {}",
                    e
                )))
            })?;

            if let Some(row) = &row {
                sqlx::query("DELETE FROM tasks WHERE seq = ?")
                    .bind(row.seq)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        Error::Database(DatabaseError::QueryFailed(format!(
                            "Failed to delete queue head: {}",
                            e
                        )))
                    })?;
            }

            tx.commit().await.map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to commit pop: {}",
                    e
                )))
            })?;

            Ok::<_, Error>(row)
        })
    }

    /// Number of queued tasks
    pub fn count_tasks(&self) -> Result<i64> {
        self.block_on(async {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to count tasks: {}",
                        e
                    )))
                })
        })
    }
}
