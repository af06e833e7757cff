//! Dispatch engine split into focused submodules.
//!
//! The [`Spider`] struct and its methods are organized by domain:
//! - [`queue`]: seeding, queueing and download deduplication
//! - [`dispatch`]: the run loop, runner invocation and outcome handling
//! - [`outcome`]: the tagged result of one runner invocation
//!
//! The engine is single-threaded and synchronous. `run` pops tasks in FIFO
//! order and drains each runner's item stream completely before moving on.

mod dispatch;
mod outcome;
mod queue;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use outcome::Outcome;

use std::borrow::Cow;
use std::collections::HashSet;

use crate::config::Config;
use crate::error::Result;
use crate::item::Item;
use crate::queue::{MemoryQueue, TaskQueue};
use crate::runner::{Matcher, Runner, RunnerError, RunnerRegistry};
use crate::storage::{MemoryStorage, Storage};
use crate::task::{Task, TaskId, TaskKind};
use crate::types::{Event, RunStats};

/// Everything the run loop mutates, kept apart from the runner registry so
/// both can be borrowed at once
pub(crate) struct SpiderState {
    /// Engine configuration
    pub(crate) config: Config,
    /// Pending tasks
    pub(crate) queue: Box<dyn TaskQueue>,
    /// Sink for result objects
    pub(crate) storage: Box<dyn Storage>,
    /// Identities of download tasks whose dispatch has ended
    pub(crate) processed: HashSet<TaskId>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Counters for the current run
    pub(crate) stats: RunStats,
}

impl SpiderState {
    /// Emit an event to all subscribers
    ///
    /// Events are broadcast to all active subscribers. If there are no subscribers,
    /// the event is silently dropped (this is not an error condition).
    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    /// Start fresh counters if the last run already finished
    pub(crate) fn open_stats(&mut self) {
        if self.stats.finished_at.is_some() {
            self.stats = RunStats::started();
        }
    }
}

/// The dispatch engine
///
/// ```
/// use simplespider::item::{Item, ResultObject};
/// use simplespider::runner::Matcher;
/// use simplespider::storage::MemoryStorage;
/// use simplespider::task::{Task, TaskKind};
/// use simplespider::Spider;
///
/// let storage = MemoryStorage::new();
/// let mut spider = Spider::builder()
///     .storage(storage.clone())
///     .runner_fn("fetch", TaskKind::Download, Matcher::new(), |task| {
///         let url = task.url().unwrap_or_default();
///         let scrape = Task::builder(TaskKind::Scrape).url(url).build()?;
///         Ok(vec![Item::Task(scrape)])
///     })
///     .runner_fn("title", TaskKind::Scrape, Matcher::new(), |task| {
///         let page = ResultObject::new("page").with("url", task.url().unwrap_or_default());
///         Ok(vec![Item::Object(page)])
///     })
///     .build()?;
///
/// spider.seed("http://example.com/", TaskKind::Download)?;
/// let stats = spider.run()?;
///
/// assert_eq!(stats.tasks_processed, 2);
/// assert_eq!(storage.objects("page").len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Spider {
    /// Registered runners (fixed once the run starts)
    registry: RunnerRegistry,
    /// Queue, storage, dedup set and counters
    state: SpiderState,
    /// Span entered while the spider processes tasks
    span: tracing::Span,
}

impl Spider {
    /// Start building a spider
    pub fn builder() -> SpiderBuilder {
        SpiderBuilder::default()
    }

    /// Spider with in-memory queue and storage and no runners
    ///
    /// Register runners with [`Spider::registry_mut`].
    pub fn new(config: Config) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Subscribe to engine events
    ///
    /// Returns a receiver that will receive all events emitted after subscription.
    /// Multiple subscribers can exist simultaneously. Events emitted before this
    /// call are not delivered.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.state.event_tx.subscribe()
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Registered runners
    pub fn registry(&self) -> &RunnerRegistry {
        &self.registry
    }

    /// Registered runners, for adding more
    pub fn registry_mut(&mut self) -> &mut RunnerRegistry {
        &mut self.registry
    }

    /// Number of pending tasks
    pub fn queue_len(&self) -> Result<usize> {
        self.state.queue.len()
    }

    /// Whether an equal download task already finished dispatch
    pub fn is_processed(&self, task: &Task) -> bool {
        self.state.processed.contains(task.id())
    }

    /// Counters of the current (or last) run
    ///
    /// Counting for the next run starts with the first task queued after a
    /// run finished.
    pub fn stats(&self) -> &RunStats {
        &self.state.stats
    }

    /// Span entered while processing
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

impl std::fmt::Debug for Spider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spider")
            .field("name", &self.state.config.engine.name)
            .field("registry", &self.registry)
            .field("queue", &self.state.queue.name())
            .field("storage", &self.state.storage.name())
            .field("processed", &self.state.processed.len())
            .finish()
    }
}

/// Builder for [`Spider`]
///
/// Defaults: [`Config::default`], a [`MemoryQueue`], a [`MemoryStorage`] and
/// an `info_span!("spider", name = ...)`.
#[derive(Default)]
pub struct SpiderBuilder {
    config: Config,
    registry: RunnerRegistry,
    queue: Option<Box<dyn TaskQueue>>,
    storage: Option<Box<dyn Storage>>,
    span: Option<tracing::Span>,
}

impl SpiderBuilder {
    /// Use this configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use this queue adapter
    pub fn queue(mut self, queue: impl TaskQueue + 'static) -> Self {
        self.queue = Some(Box::new(queue));
        self
    }

    /// Use this storage adapter
    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    /// Register a runner; order of registration is order of matching
    pub fn runner(mut self, runner: impl Runner + 'static) -> Self {
        self.registry.register(runner);
        self
    }

    /// Register a closure as a runner
    pub fn runner_fn<F>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        kind: TaskKind,
        matcher: Matcher,
        f: F,
    ) -> Self
    where
        F: Fn(&Task) -> std::result::Result<Vec<Item>, RunnerError> + Send + Sync + 'static,
    {
        self.registry.register_fn(name, kind, matcher, f);
        self
    }

    /// Enter this span instead of the default one while processing
    pub fn span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Validate the configuration and build the spider
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the configuration is invalid.
    pub fn build(self) -> Result<Spider> {
        self.config.validate()?;

        let (event_tx, _rx) =
            tokio::sync::broadcast::channel(self.config.engine.event_channel_capacity);
        let span = self.span.unwrap_or_else(|| {
            tracing::info_span!("spider", name = %self.config.engine.name)
        });

        let queue = self.queue.unwrap_or_else(|| Box::new(MemoryQueue::new()));
        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(MemoryStorage::new()));

        tracing::debug!(
            runners = self.registry.len(),
            queue = queue.name(),
            storage = storage.name(),
            "spider built"
        );

        Ok(Spider {
            registry: self.registry,
            state: SpiderState {
                config: self.config,
                queue,
                storage,
                processed: HashSet::new(),
                event_tx,
                stats: RunStats::started(),
            },
            span,
        })
    }
}
