//! Database layer for simplespider
//!
//! Embedded SQLite persistence for the durable task queue and result
//! objects. The engine is synchronous, so [`Database`] owns a private
//! current-thread tokio runtime and drives every sqlx call to completion with
//! `block_on`. Do not call it from inside another tokio runtime; dropping the
//! last handle there is fine.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`]: database lifecycle, schema migrations
//! - [`tasks`]: queued task rows (FIFO by sequence number)
//! - [`objects`]: result object rows keyed by `kind.id`

use sqlx::{FromRow, sqlite::SqlitePool};
use std::future::Future;

mod migrations;
mod objects;
mod tasks;

/// Queued task record from database
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    /// Queue position; lower is older
    pub seq: i64,
    /// Task identity (hex SHA-256)
    pub task_id: String,
    /// Task kind name
    pub kind: String,
    /// Task encoded as JSON
    pub body: String,
    /// Unix timestamp when the task was queued
    pub queued_at: i64,
}

/// Result object record from database
#[derive(Debug, Clone, FromRow)]
pub struct ObjectRow {
    /// Storage key, `kind.id`
    pub key: String,
    /// Object kind
    pub kind: String,
    /// Object encoded as JSON
    pub body: String,
    /// Unix timestamp of the last save
    pub saved_at: i64,
}

/// Database handle for simplespider
pub struct Database {
    pool: SqlitePool,
    /// Always `Some` until the handle is dropped
    runtime: Option<tokio::runtime::Runtime>,
}

impl Database {
    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match &self.runtime {
            Some(runtime) => runtime.block_on(future),
            None => unreachable!("database runtime is only taken on drop"),
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };
        if tokio::runtime::Handle::try_current().is_ok() {
            // Blocking is not allowed on a runtime thread; connections close
            // when the pool is dropped
            tracing::debug!("database dropped inside a runtime, closing in the background");
            runtime.shutdown_background();
        } else {
            runtime.block_on(self.pool.close());
        }
    }
}
