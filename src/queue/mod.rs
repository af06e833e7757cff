//! Queue adapters
//!
//! The engine keeps pending tasks in a [`TaskQueue`]. Pops must return tasks
//! in push order: the engine relies on strict FIFO for fairness between
//! retried and fresh tasks.
//!
//! - [`MemoryQueue`]: in-process `VecDeque`, the default
//! - [`SqliteQueue`]: durable queue in an embedded SQLite file

mod memory;
mod sqlite;

pub use memory::MemoryQueue;
pub use sqlite::SqliteQueue;

use crate::error::Result;
use crate::task::Task;

/// FIFO store for pending tasks
///
/// The engine calls these methods sequentially from a single thread and does
/// no locking of its own. An adapter shared with other processes is
/// responsible for its own concurrency control.
pub trait TaskQueue: Send {
    /// Append a task at the tail
    ///
    /// # Errors
    ///
    /// Adapter-specific; surfaced to the caller of `queue_task`.
    fn push(&mut self, task: Task) -> Result<()>;

    /// Remove and return the head task, or `None` when the queue is empty
    fn pop(&mut self) -> Result<Option<Task>>;

    /// Number of pending tasks
    fn len(&self) -> Result<usize>;

    /// Whether no task is pending
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Backend name for logging
    fn name(&self) -> &str;
}
