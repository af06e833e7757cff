//! # simplespider
//!
//! Task dispatch engine for download/scrape crawling pipelines.
//!
//! ## Design Philosophy
//!
//! simplespider is designed to be:
//! - **Pluggable** - Downloaders, scrapers and storage are runners and adapters you register
//! - **Predictable** - One task at a time, FIFO order, runner order is registration order
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Model
//!
//! A [`Task`] is an immutable, hashable bag of attributes with a kind
//! ([`TaskKind::Download`], [`TaskKind::Scrape`] or a custom one). The
//! [`Spider`] pops tasks from a [`queue::TaskQueue`] and hands each one to the
//! [`runner::Runner`]s registered for its kind:
//!
//! - download tasks go to the **first** matching runner that does not skip,
//! - every other kind goes to **all** matching runners.
//!
//! Runners yield new tasks (queued at the tail) and result objects (handed to
//! a [`storage::Storage`]). They steer the engine with
//! [`runner::RunnerError`]: abort the task, skip this runner, or retry the
//! task while its `retry` budget lasts.
//!
//! ## Quick Start
//!
//! ```
//! use simplespider::item::{Item, ResultObject};
//! use simplespider::runner::{Matcher, RunnerError};
//! use simplespider::storage::MemoryStorage;
//! use simplespider::{Spider, Task, TaskKind};
//!
//! let storage = MemoryStorage::new();
//! let mut spider = Spider::builder()
//!     .storage(storage.clone())
//!     .runner_fn("fetch", TaskKind::Download, Matcher::new(), |task| {
//!         let url = task.url().unwrap_or_default();
//!         if url.ends_with("/missing") {
//!             return Err(RunnerError::abort("404"));
//!         }
//!         let page = Task::builder(TaskKind::Scrape)
//!             .url(url)
//!             .response(format!("<title>{}</title>", url))
//!             .build()?;
//!         Ok(vec![Item::Task(page)])
//!     })
//!     .runner_fn("titles", TaskKind::Scrape, Matcher::new(), |task| {
//!         let title = task.response().and_then(|r| r.as_str()).unwrap_or_default();
//!         Ok(vec![Item::Object(ResultObject::new("page").with("title", title))])
//!     })
//!     .build()?;
//!
//! // Subscribe to events
//! let mut events = spider.subscribe();
//!
//! spider.seed("http://example.com/", TaskKind::Download)?;
//! spider.seed("http://example.com/missing", TaskKind::Download)?;
//! let stats = spider.run()?;
//!
//! assert_eq!(stats.aborts, 1);
//! assert_eq!(storage.objects("page").len(), 1);
//! while let Ok(event) = events.try_recv() {
//!     println!("Event: {:?}", event);
//! }
//! # Ok::<(), simplespider::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Embedded SQLite persistence layer
pub mod db;
/// Error types
pub mod error;
/// Runner output: new tasks and result objects
pub mod item;
/// Task queue adapters
pub mod queue;
/// Runners, matching and the runner registry
pub mod runner;
/// Dispatch engine (decomposed into focused submodules)
pub mod spider;
/// Result object storage adapters
pub mod storage;
/// Task model
pub mod task;
/// Core types and events
pub mod types;
/// HTTP download and link extraction runners
pub mod web;

// Re-export commonly used types
pub use config::{Config, EngineConfig, ExtractConfig, HttpConfig, PersistenceConfig};
pub use db::Database;
pub use error::{DatabaseError, Error, QueueError, Result, StorageError, TaskError};
pub use item::{Item, ResultObject};
pub use queue::{MemoryQueue, SqliteQueue, TaskQueue};
pub use runner::{FnRunner, Matcher, Runner, RunnerError, RunnerRegistry};
pub use spider::{Outcome, Spider, SpiderBuilder};
pub use storage::{MemoryStorage, SqliteStorage, Storage};
pub use task::{Task, TaskBuilder, TaskId, TaskKind, Value};
pub use types::{Event, RunStats};
