//! Runners: pluggable units of work
//!
//! A [`Runner`] decides whether it applies to a task ([`Runner::matches`]) and
//! processes it ([`Runner::execute`]), yielding a lazy [`ItemStream`] of new
//! tasks and result objects.
//!
//! ## Control flow
//!
//! Runners steer the engine by returning a [`RunnerError`], either from
//! `execute` itself or from inside the stream:
//!
//! - [`RunnerError::Abort`]: stop processing this task, no retry
//! - [`RunnerError::Skip`]: ignore this runner only, try the next one
//! - [`RunnerError::Retry`]: re-queue the task with a decremented budget
//! - [`RunnerError::Failed`]: unexpected failure, reported then retried
//!
//! Items yielded before the error are still routed.
//!
//! ## Implementations
//!
//! - [`FnRunner`]: closure-backed runner for the programmatic API
//! - [`crate::web::HttpDownloader`]: download runner over HTTP
//! - [`crate::web::LinkExtractor`]: scrape runner emitting download tasks

mod fn_runner;
mod matcher;
mod registry;

pub use fn_runner::FnRunner;
pub use matcher::{Anchor, Matcher};
pub use registry::{DispatchPolicy, RunnerRegistry};

use crate::item::Item;
use crate::task::{Task, TaskKind};
use thiserror::Error;

/// Boxed error type carried by [`RunnerError::Failed`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Lazy, single-pass sequence of runner output
///
/// The engine drains it exactly once, routing each item as it arrives. An
/// `Err` ends the runner's invocation.
pub type ItemStream<'a> = Box<dyn Iterator<Item = Result<Item, RunnerError>> + 'a>;

/// Wrap already-computed items as an [`ItemStream`]
pub fn stream<'a, I>(items: I) -> ItemStream<'a>
where
    I: IntoIterator<Item = Item>,
    I::IntoIter: 'a,
{
    Box::new(items.into_iter().map(Ok))
}

/// An [`ItemStream`] that yields nothing
pub fn empty<'a>() -> ItemStream<'a> {
    Box::new(std::iter::empty())
}

/// Signals a runner can raise
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Stop processing this task entirely; no retry, no further runners
    #[error("task aborted: {reason}")]
    Abort {
        /// Why the task was aborted
        reason: String,
    },

    /// Stop only this runner's attempt
    #[error("runner skipped: {reason}")]
    Skip {
        /// Why the runner stepped aside
        reason: String,
    },

    /// Recoverable failure; retry while the task has budget left
    #[error("retry requested: {reason}")]
    Retry {
        /// Why a retry is needed
        reason: String,
    },

    /// Unexpected failure; reported, then treated like a retry request
    #[error("runner failed: {0}")]
    Failed(#[source] BoxError),
}

impl RunnerError {
    /// Abort the current task
    pub fn abort(reason: impl Into<String>) -> Self {
        RunnerError::Abort {
            reason: reason.into(),
        }
    }

    /// Skip the current runner
    pub fn skip(reason: impl Into<String>) -> Self {
        RunnerError::Skip {
            reason: reason.into(),
        }
    }

    /// Ask for the task to be retried
    pub fn retry(reason: impl Into<String>) -> Self {
        RunnerError::Retry {
            reason: reason.into(),
        }
    }

    /// Wrap an unexpected failure
    pub fn failed(error: impl Into<BoxError>) -> Self {
        RunnerError::Failed(error.into())
    }
}

impl From<crate::Error> for RunnerError {
    fn from(error: crate::Error) -> Self {
        RunnerError::Failed(Box::new(error))
    }
}

impl From<crate::error::TaskError> for RunnerError {
    fn from(error: crate::error::TaskError) -> Self {
        RunnerError::Failed(Box::new(error))
    }
}

impl From<std::io::Error> for RunnerError {
    fn from(error: std::io::Error) -> Self {
        RunnerError::Failed(Box::new(error))
    }
}

/// A unit of work that processes tasks of one kind
///
/// Runners are built once and registered at startup. They must not keep
/// per-task state: the same runner is invoked for every matching task.
///
/// # Examples
///
/// ```
/// use simplespider::item::{Item, ResultObject};
/// use simplespider::runner::{self, ItemStream, Matcher, Runner, RunnerError};
/// use simplespider::task::{Task, TaskKind};
///
/// struct TitleScraper {
///     matcher: Matcher,
/// }
///
/// impl Runner for TitleScraper {
///     fn name(&self) -> &str {
///         "title-scraper"
///     }
///
///     fn kind(&self) -> TaskKind {
///         TaskKind::Scrape
///     }
///
///     fn matcher(&self) -> &Matcher {
///         &self.matcher
///     }
///
///     fn execute<'a>(&'a self, task: &'a Task) -> Result<ItemStream<'a>, RunnerError> {
///         let url = task.url().ok_or_else(|| RunnerError::skip("no url"))?;
///         let page = ResultObject::new("page").with("url", url);
///         Ok(runner::stream([Item::Object(page)]))
///     }
/// }
///
/// let scraper = TitleScraper { matcher: Matcher::new().url_pattern(r"https?://x/")? };
/// assert_eq!(scraper.name(), "title-scraper");
/// # Ok::<(), simplespider::Error>(())
/// ```
pub trait Runner: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    /// Kind of task this runner handles
    fn kind(&self) -> TaskKind;

    /// URL/tag predicate; defaults to matching every task of [`kind`](Self::kind)
    fn matcher(&self) -> &Matcher {
        Matcher::any_ref()
    }

    /// Whether this runner applies to the task
    ///
    /// Override to add checks beyond URL patterns and tags.
    fn matches(&self, task: &Task) -> bool {
        self.matcher().matches(task)
    }

    /// Process the task
    ///
    /// # Errors
    ///
    /// Returns a [`RunnerError`] to abort the task, skip this runner, or ask
    /// for a retry. The same errors may also be yielded from the stream.
    fn execute<'a>(&'a self, task: &'a Task) -> Result<ItemStream<'a>, RunnerError>;
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ResultObject;
    use std::error::Error as _;

    #[test]
    fn test_helpers_build_expected_variants() {
        assert!(matches!(RunnerError::abort("x"), RunnerError::Abort { reason } if reason == "x"));
        assert!(matches!(RunnerError::skip("y"), RunnerError::Skip { reason } if reason == "y"));
        assert!(matches!(RunnerError::retry("z"), RunnerError::Retry { reason } if reason == "z"));
        assert!(matches!(RunnerError::failed("boom"), RunnerError::Failed(_)));
    }

    #[test]
    fn test_failed_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        let err = RunnerError::from(io);
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "runner failed: slow");
    }

    #[test]
    fn test_stream_yields_items_in_order() {
        let items = vec![
            Item::Object(ResultObject::new("a")),
            Item::Object(ResultObject::new("b")),
        ];
        let kinds: Vec<String> = stream(items)
            .map(|item| match item.unwrap() {
                Item::Object(obj) => obj.kind,
                other => panic!("unexpected item: {:?}", other),
            })
            .collect();
        assert_eq!(kinds, vec!["a", "b"]);
        assert_eq!(empty().count(), 0);
    }
}
