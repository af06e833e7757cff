//! Seeding, queueing and download deduplication.

use super::{Spider, SpiderState};
use crate::error::Result;
use crate::task::{Task, TaskKind};
use crate::types::Event;

impl Spider {
    /// Queue a task for `url` with the configured default retry budget
    ///
    /// Returns `false` if the task was suppressed as a duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Construction`] for kinds that cannot carry a
    /// URL-only task, or the queue adapter's error.
    pub fn seed(&mut self, url: impl Into<String>, kind: TaskKind) -> Result<bool> {
        let task = Task::builder(kind)
            .url(url)
            .default_retry(self.state.config.engine.default_retry)
            .build()?;
        self.queue_task(task)
    }

    /// Append a task to the tail of the queue
    ///
    /// A download task equal to one that already finished dispatch is dropped
    /// instead (logged, returns `false`).
    pub fn queue_task(&mut self, task: Task) -> Result<bool> {
        self.state.queue_task(task)
    }

    /// Decode a task from JSON and queue it
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TypeMismatch`] if the value is not a task object
    /// and [`crate::Error::Construction`] if its attributes are invalid.
    pub fn queue_json(&mut self, value: &serde_json::Value) -> Result<bool> {
        let task = Task::from_json_with_retry(value, self.state.config.engine.default_retry)?;
        self.queue_task(task)
    }
}

impl SpiderState {
    /// Whether a task must be suppressed as an already processed download
    pub(crate) fn is_duplicate(&self, task: &Task) -> bool {
        self.config.engine.dedup_downloads
            && *task.kind() == TaskKind::Download
            && self.processed.contains(task.id())
    }

    /// Record that dispatch of a download task has ended
    pub(crate) fn mark_processed(&mut self, task: &Task) {
        if *task.kind() == TaskKind::Download {
            self.processed.insert(task.id().clone());
        }
    }

    pub(crate) fn queue_task(&mut self, task: Task) -> Result<bool> {
        self.open_stats();
        if self.is_duplicate(&task) {
            tracing::debug!(task = %task, "task already processed, not queueing");
            self.stats.duplicates_skipped += 1;
            self.emit_event(Event::DuplicateSkipped {
                id: task.id().clone(),
                url: task.url().map(str::to_string),
            });
            return Ok(false);
        }

        let event = Event::TaskQueued {
            id: task.id().clone(),
            kind: task.kind().clone(),
            url: task.url().map(str::to_string),
        };
        tracing::debug!(task = %task, "queueing task");

        if let Err(e) = self.queue.push(task) {
            tracing::error!(error = %e, queue = self.queue.name(), "failed to queue task");
            return Err(e);
        }

        self.stats.tasks_queued += 1;
        self.emit_event(event);
        Ok(true)
    }
}
