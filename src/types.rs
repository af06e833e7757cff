//! Core types for simplespider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{TaskId, TaskKind};

/// Event emitted while the spider processes tasks
///
/// Sent on a broadcast channel; see [`crate::Spider::subscribe`]. Events are
/// informational only, the engine never waits for a receiver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task appended to the queue
    TaskQueued {
        /// Task identity
        id: TaskId,
        /// Task kind
        kind: TaskKind,
        /// Task URL, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },

    /// Download task dropped because an identical one was already processed
    DuplicateSkipped {
        /// Task identity
        id: TaskId,
        /// Task URL, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },

    /// Task popped from the queue and dispatch started
    TaskStarted {
        /// Task identity
        id: TaskId,
        /// Task kind
        kind: TaskKind,
        /// Remaining retry budget
        retry: u32,
    },

    /// A runner began executing a task
    RunnerStarted {
        /// Task identity
        id: TaskId,
        /// Runner name
        runner: String,
    },

    /// A runner stepped aside for this task
    RunnerSkipped {
        /// Task identity
        id: TaskId,
        /// Runner name
        runner: String,
        /// Reason given by the runner
        reason: String,
    },

    /// A runner aborted the task; no further runners are tried
    TaskAborted {
        /// Task identity
        id: TaskId,
        /// Runner name
        runner: String,
        /// Reason given by the runner
        reason: String,
    },

    /// Task re-queued with a decremented retry budget
    TaskRetried {
        /// Identity of the failed task
        id: TaskId,
        /// Identity of the re-queued copy
        retry_id: TaskId,
        /// Runner that asked for the retry
        runner: String,
        /// Budget left on the re-queued copy
        remaining: u32,
        /// Failure that triggered the retry
        reason: String,
    },

    /// Task permanently dropped
    TaskDropped {
        /// Task identity
        id: TaskId,
        /// Why the task was dropped (e.g., retries exhausted)
        reason: String,
    },

    /// Result object handed to storage
    ObjectStored {
        /// Object kind
        kind: String,
        /// Storage key (`kind.id`)
        key: String,
    },

    /// Runner produced something that is neither a task nor a result object
    UnrecognizedItem {
        /// Identity of the task being processed
        id: TaskId,
        /// Runner name
        runner: String,
        /// Description of the item
        description: String,
    },

    /// No registered runner matched the task
    NoRunner {
        /// Task identity
        id: TaskId,
        /// Task kind
        kind: TaskKind,
    },

    /// Dispatch of a task finished (whatever the outcome)
    TaskCompleted {
        /// Task identity
        id: TaskId,
    },

    /// Queue drained; the run loop stopped
    QueueEmpty {
        /// Tasks processed during this run
        processed: u64,
    },
}

/// Counters collected from the first task queued after the previous run up
/// to the end of [`crate::Spider::run`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Tasks popped and dispatched
    pub tasks_processed: u64,

    /// Individual runner invocations
    pub runner_invocations: u64,

    /// Tasks appended to the queue (seeds, runner output and retries)
    pub tasks_queued: u64,

    /// Download tasks suppressed as already processed
    pub duplicates_skipped: u64,

    /// Retries scheduled
    pub retries: u64,

    /// Tasks aborted by a runner
    pub aborts: u64,

    /// Runner skips
    pub skips: u64,

    /// Unexpected runner failures (each also counts as a retry or a drop)
    pub failures: u64,

    /// Tasks dropped (retries exhausted or no runner)
    pub tasks_dropped: u64,

    /// Result objects saved to storage
    pub objects_stored: u64,

    /// Runner output that was neither a task nor a result object
    pub unrecognized_items: u64,

    /// When counting started
    pub started_at: DateTime<Utc>,

    /// When the run loop stopped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunStats {
    /// Zeroed counters starting now
    pub fn started() -> Self {
        Self {
            tasks_processed: 0,
            runner_invocations: 0,
            tasks_queued: 0,
            duplicates_skipped: 0,
            retries: 0,
            aborts: 0,
            skips: 0,
            failures: 0,
            tasks_dropped: 0,
            objects_stored: 0,
            unrecognized_items: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Wall-clock time between start and finish (or now, while running)
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::started()
    }
}
