//! Run loop, runner invocation and outcome handling.

use super::{Outcome, Spider, SpiderState};
use crate::error::Result;
use crate::item::Item;
use crate::runner::{DispatchPolicy, Runner, RunnerRegistry};
use crate::task::Task;
use crate::types::{Event, RunStats};

impl Spider {
    /// Process tasks until the queue is empty
    ///
    /// Runner signals (abort, skip, retry, failures) never escape this
    /// method; they are logged, counted and turned into retries or drops.
    /// The returned counters include tasks queued since the previous run
    /// finished.
    ///
    /// # Errors
    ///
    /// Returns the queue adapter's error if a pop or a retry push fails.
    pub fn run(&mut self) -> Result<RunStats> {
        let span = self.span.clone();
        let _enter = span.enter();

        self.state.open_stats();
        tracing::info!(
            pending = self.state.queue.len().unwrap_or_default(),
            runners = self.registry.len(),
            "spider started"
        );

        while let Some(task) = self.state.queue.pop()? {
            process(&self.registry, &mut self.state, task)?;
        }

        self.state.stats.finished_at = Some(chrono::Utc::now());
        let processed = self.state.stats.tasks_processed;
        tracing::info!(
            processed,
            stored = self.state.stats.objects_stored,
            retries = self.state.stats.retries,
            dropped = self.state.stats.tasks_dropped,
            "queue empty, spider stopped"
        );
        self.state.emit_event(Event::QueueEmpty { processed });

        Ok(self.state.stats.clone())
    }

    /// Dispatch a single task right away, bypassing the queue
    ///
    /// Anything the runners emit is queued as usual. A download task that was
    /// already processed is dropped.
    ///
    /// # Errors
    ///
    /// Returns the queue adapter's error if a retry cannot be queued.
    pub fn run_task(&mut self, task: Task) -> Result<()> {
        let span = self.span.clone();
        let _enter = span.enter();
        process(&self.registry, &mut self.state, task)
    }
}

/// Dispatch one popped task to its runners
fn process(registry: &RunnerRegistry, state: &mut SpiderState, task: Task) -> Result<()> {
    state.open_stats();
    if state.is_duplicate(&task) {
        tracing::debug!(task = %task, "task already processed, dropping");
        state.stats.duplicates_skipped += 1;
        state.emit_event(Event::DuplicateSkipped {
            id: task.id().clone(),
            url: task.url().map(str::to_string),
        });
        return Ok(());
    }

    tracing::info!(task = %task, "processing task");
    state.stats.tasks_processed += 1;
    state.emit_event(Event::TaskStarted {
        id: task.id().clone(),
        kind: task.kind().clone(),
        retry: task.retry(),
    });

    let result = dispatch(registry, state, &task);

    state.mark_processed(&task);
    state.emit_event(Event::TaskCompleted {
        id: task.id().clone(),
    });
    result
}

/// Run the matching runners under the task kind's policy
fn dispatch(registry: &RunnerRegistry, state: &mut SpiderState, task: &Task) -> Result<()> {
    let policy = DispatchPolicy::for_kind(task.kind());
    let mut matched = false;

    for runner in registry.matching(task) {
        matched = true;
        match state.invoke(runner, task) {
            Outcome::Continue => {
                if policy == DispatchPolicy::SingleHomed {
                    return Ok(());
                }
            }
            Outcome::Skip { reason } => state.skipped(runner, task, reason),
            Outcome::Abort { reason } => {
                state.aborted(runner, task, reason);
                return Ok(());
            }
            Outcome::RetryWithBudget { budget, reason } => {
                tracing::debug!(runner = runner.name(), budget, "runner asked for a retry");
                return state.reschedule(runner, task, reason);
            }
            Outcome::Failed(detail) => {
                tracing::warn!(
                    runner = runner.name(),
                    task = %task,
                    error = %detail,
                    "runner failed unexpectedly"
                );
                state.stats.failures += 1;
                return state.reschedule(runner, task, detail);
            }
        }
    }

    if !matched {
        tracing::info!(task = %task, "no runner matches task, dropping");
        state.stats.tasks_dropped += 1;
        state.emit_event(Event::NoRunner {
            id: task.id().clone(),
            kind: task.kind().clone(),
        });
    } else if policy == DispatchPolicy::SingleHomed {
        tracing::info!(task = %task, "every matching runner skipped task");
    }

    Ok(())
}

impl SpiderState {
    /// Run one runner on one task and route its output
    ///
    /// Items yielded before a signal are routed; the signal then ends the
    /// invocation. A routing failure ends it as [`Outcome::Failed`].
    pub(crate) fn invoke(&mut self, runner: &dyn Runner, task: &Task) -> Outcome {
        tracing::debug!(runner = runner.name(), task = %task.id().short(), "running runner");
        self.stats.runner_invocations += 1;
        self.emit_event(Event::RunnerStarted {
            id: task.id().clone(),
            runner: runner.name().to_string(),
        });

        let stream = match runner.execute(task) {
            Ok(stream) => stream,
            Err(signal) => return Outcome::from_signal(signal, task),
        };

        for item in stream {
            match item {
                Ok(item) => {
                    if let Err(e) = self.route(runner, task, item) {
                        return Outcome::Failed(e.to_string());
                    }
                }
                Err(signal) => return Outcome::from_signal(signal, task),
            }
        }

        Outcome::Continue
    }

    /// Send one produced item where it belongs
    fn route(&mut self, runner: &dyn Runner, task: &Task, item: Item) -> Result<()> {
        match item {
            Item::Task(new_task) => {
                self.queue_task(new_task)?;
            }
            Item::Object(object) => {
                let kind = object.kind.clone();
                let key = object.storage_key();
                if let Err(e) = self.storage.save(object) {
                    tracing::error!(
                        runner = runner.name(),
                        key = %key,
                        storage = self.storage.name(),
                        error = %e,
                        "failed to store object"
                    );
                    return Err(e);
                }
                tracing::debug!(runner = runner.name(), key = %key, "stored object");
                self.stats.objects_stored += 1;
                self.emit_event(Event::ObjectStored { kind, key });
            }
            Item::Other(description) => {
                tracing::warn!(
                    runner = runner.name(),
                    task = %task.id().short(),
                    item = %description,
                    "unrecognized item, discarding"
                );
                self.stats.unrecognized_items += 1;
                self.emit_event(Event::UnrecognizedItem {
                    id: task.id().clone(),
                    runner: runner.name().to_string(),
                    description,
                });
            }
        }
        Ok(())
    }

    fn skipped(&mut self, runner: &dyn Runner, task: &Task, reason: String) {
        tracing::debug!(runner = runner.name(), task = %task.id().short(), reason = %reason, "runner skipped task");
        self.stats.skips += 1;
        self.emit_event(Event::RunnerSkipped {
            id: task.id().clone(),
            runner: runner.name().to_string(),
            reason,
        });
    }

    fn aborted(&mut self, runner: &dyn Runner, task: &Task, reason: String) {
        tracing::info!(runner = runner.name(), task = %task, reason = %reason, "task aborted");
        self.stats.aborts += 1;
        self.emit_event(Event::TaskAborted {
            id: task.id().clone(),
            runner: runner.name().to_string(),
            reason,
        });
    }

    /// Re-queue a decremented copy at the tail, or drop the task once its
    /// budget is spent
    fn reschedule(&mut self, runner: &dyn Runner, task: &Task, reason: String) -> Result<()> {
        let Some(retry) = task.retried() else {
            tracing::warn!(
                runner = runner.name(),
                task = %task,
                reason = %reason,
                "max retries exceeded, dropping task"
            );
            self.stats.tasks_dropped += 1;
            self.emit_event(Event::TaskDropped {
                id: task.id().clone(),
                reason: format!("max retries exceeded: {}", reason),
            });
            return Ok(());
        };

        let remaining = retry.retry();
        tracing::info!(
            runner = runner.name(),
            task = %task.id().short(),
            remaining,
            reason = %reason,
            "retrying task"
        );
        self.stats.retries += 1;
        self.emit_event(Event::TaskRetried {
            id: task.id().clone(),
            retry_id: retry.id().clone(),
            runner: runner.name().to_string(),
            remaining,
            reason,
        });
        self.queue_task(retry)?;
        Ok(())
    }
}
