//! Closure-backed runner (`FnRunner`).

use std::borrow::Cow;
use std::fmt;

use super::{ItemStream, Matcher, Runner, RunnerError, stream};
use crate::item::Item;
use crate::task::{Task, TaskKind};

/// Runner built from a predicate config and an execute function
///
/// This is the programmatic `register(kind, predicate, execute)` form. The
/// closure returns its items eagerly; implement [`Runner`] directly when
/// output should be produced lazily.
///
/// ```
/// use simplespider::item::{Item, ResultObject};
/// use simplespider::runner::{FnRunner, Matcher, Runner};
/// use simplespider::task::{Task, TaskKind};
///
/// let runner = FnRunner::new("titles", TaskKind::Scrape, Matcher::new().tag("wiki"), |task| {
///     let url = task.url().unwrap_or_default();
///     Ok(vec![Item::Object(ResultObject::new("page").with("url", url))])
/// });
///
/// let task = Task::builder(TaskKind::Scrape).url("http://x/").tag("wiki").build()?;
/// assert!(runner.matches(&task));
/// # Ok::<(), simplespider::Error>(())
/// ```
pub struct FnRunner<F> {
    name: Cow<'static, str>,
    kind: TaskKind,
    matcher: Matcher,
    f: F,
}

impl<F> FnRunner<F>
where
    F: Fn(&Task) -> Result<Vec<Item>, RunnerError> + Send + Sync,
{
    /// Create a runner for `kind` tasks accepted by `matcher`
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        kind: TaskKind,
        matcher: Matcher,
        f: F,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            matcher,
            f,
        }
    }
}

impl<F> fmt::Debug for FnRunner<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRunner")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

impl<F> Runner for FnRunner<F>
where
    F: Fn(&Task) -> Result<Vec<Item>, RunnerError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        self.kind.clone()
    }

    fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    fn execute<'a>(&'a self, task: &'a Task) -> Result<ItemStream<'a>, RunnerError> {
        (self.f)(task).map(stream)
    }
}
