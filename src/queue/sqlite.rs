//! Durable FIFO queue on SQLite.

use std::path::Path;
use std::sync::Arc;

use super::TaskQueue;
use crate::config::PersistenceConfig;
use crate::db::Database;
use crate::error::{QueueError, Result};
use crate::task::Task;

/// Task queue persisted in an embedded SQLite file
///
/// Tasks are stored as JSON rows ordered by an autoincrement sequence, so the
/// queue survives restarts and keeps FIFO order. A pop reads and deletes the
/// head row in one transaction.
#[derive(Debug, Clone)]
pub struct SqliteQueue {
    db: Arc<Database>,
}

impl SqliteQueue {
    /// Use an open database
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Open (or create) a queue file
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(Database::open(path, false)?)))
    }

    /// Open the queue described by the persistence settings
    pub fn from_config(config: &PersistenceConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(Database::open(
            &config.database_path,
            config.synchronous,
        )?)))
    }

    /// Underlying database handle
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

impl TaskQueue for SqliteQueue {
    fn push(&mut self, task: Task) -> Result<()> {
        let body = serde_json::to_string(&task)?;
        self.db
            .push_task(task.id().as_str(), task.kind().as_str(), &body)
            .map_err(|e| QueueError::PushFailed {
                task_id: task.id().to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn pop(&mut self) -> Result<Option<Task>> {
        let Some(row) = self
            .db
            .pop_task()
            .map_err(|e| QueueError::PopFailed(e.to_string()))?
        else {
            return Ok(None);
        };

        let task: Task = serde_json::from_str(&row.body).map_err(|e| QueueError::Corrupt {
            seq: row.seq,
            reason: e.to_string(),
        })?;

        if task.id().as_str() != row.task_id {
            tracing::warn!(
                seq = row.seq,
                stored = %row.task_id,
                decoded = %task.id(),
                "queued task identity changed on decode"
            );
        }

        Ok(Some(task))
    }

    fn len(&self) -> Result<usize> {
        let count = self.db.count_tasks()?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
