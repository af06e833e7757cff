//! Ordered runner lists per task kind.

use std::collections::BTreeMap;

use super::{FnRunner, Matcher, Runner, RunnerError};
use crate::item::Item;
use crate::task::{Task, TaskKind};

/// How the engine treats several runners matching the same task
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Try runners in order; the first one that does not skip handles the task
    SingleHomed,
    /// Every matching runner processes the task independently
    FanOut,
}

impl DispatchPolicy {
    /// Policy used for a task kind
    ///
    /// Downloads are single-homed so a page is fetched once. Scrape and custom
    /// kinds fan out.
    pub fn for_kind(kind: &TaskKind) -> Self {
        match kind {
            TaskKind::Download => DispatchPolicy::SingleHomed,
            TaskKind::Scrape | TaskKind::Custom(_) => DispatchPolicy::FanOut,
        }
    }
}

/// Registered runners, grouped by kind in registration order
#[derive(Default)]
pub struct RunnerRegistry {
    runners: BTreeMap<TaskKind, Vec<Box<dyn Runner>>>,
}

impl RunnerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a runner under its own [`Runner::kind`]
    pub fn register(&mut self, runner: impl Runner + 'static) {
        self.register_boxed(Box::new(runner));
    }

    /// Register an already boxed runner
    pub fn register_boxed(&mut self, runner: Box<dyn Runner>) {
        let kind = runner.kind();
        tracing::debug!(runner = runner.name(), kind = %kind, "registering runner");
        self.runners.entry(kind).or_default().push(runner);
    }

    /// Register a closure as a runner
    pub fn register_fn<F>(
        &mut self,
        name: impl Into<std::borrow::Cow<'static, str>>,
        kind: TaskKind,
        matcher: Matcher,
        f: F,
    ) where
        F: Fn(&Task) -> Result<Vec<Item>, RunnerError> + Send + Sync + 'static,
    {
        self.register(FnRunner::new(name, kind, matcher, f));
    }

    /// All runners registered for a kind, in registration order
    pub fn runners_for(&self, kind: &TaskKind) -> &[Box<dyn Runner>] {
        self.runners.get(kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Runners whose predicate accepts the task, in registration order
    pub fn matching<'a>(&'a self, task: &'a Task) -> impl Iterator<Item = &'a dyn Runner> + 'a {
        self.runners_for(task.kind())
            .iter()
            .map(|runner| -> &'a dyn Runner { &**runner })
            .filter(move |runner| {
                let matched = runner.matches(task);
                tracing::debug!(
                    runner = runner.name(),
                    task = %task.id().short(),
                    matched,
                    "evaluated runner"
                );
                matched
            })
    }

    /// Total number of registered runners
    pub fn len(&self) -> usize {
        self.runners.values().map(Vec::len).sum()
    }

    /// Whether no runner is registered
    pub fn is_empty(&self) -> bool {
        self.runners.values().all(Vec::is_empty)
    }

    /// Kinds with at least one registered runner
    pub fn kinds(&self) -> impl Iterator<Item = &TaskKind> {
        self.runners
            .iter()
            .filter(|(_, runners)| !runners.is_empty())
            .map(|(kind, _)| kind)
    }
}

impl std::fmt::Debug for RunnerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (kind, runners) in &self.runners {
            let names: Vec<&str> = runners.iter().map(|r| r.name()).collect();
            map.entry(&kind.as_str(), &names);
        }
        map.finish()
    }
}
