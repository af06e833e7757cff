//! Shared helpers for dispatch engine tests.

mod ordering;

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result, StorageError};
use crate::item::{Item, ResultObject};
use crate::runner::{ItemStream, Matcher, Runner, RunnerError};
use crate::storage::Storage;
use crate::task::{Task, TaskKind};

/// Shared, ordered record of what the runners saw
#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub(crate) fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

pub(crate) fn download(url: &str) -> Task {
    Task::download(url).unwrap()
}

pub(crate) fn download_with_retry(url: &str, retry: u32) -> Task {
    Task::builder(TaskKind::Download)
        .url(url)
        .retry(retry)
        .build()
        .unwrap()
}

pub(crate) fn scrape(url: &str) -> Task {
    Task::builder(TaskKind::Scrape).url(url).build().unwrap()
}

/// Runner whose output is scripted per task, errors included
pub(crate) struct ScriptedRunner<F> {
    pub(crate) name: &'static str,
    pub(crate) kind: TaskKind,
    pub(crate) script: F,
}

impl<F> Runner for ScriptedRunner<F>
where
    F: Fn(&Task) -> Vec<std::result::Result<Item, RunnerError>> + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> TaskKind {
        self.kind.clone()
    }

    fn matcher(&self) -> &Matcher {
        Matcher::any_ref()
    }

    fn execute<'a>(&'a self, task: &'a Task) -> std::result::Result<ItemStream<'a>, RunnerError> {
        Ok(Box::new((self.script)(task).into_iter()))
    }
}

/// Storage that rejects every object
pub(crate) struct FailingStorage;

impl Storage for FailingStorage {
    fn save(&self, object: ResultObject) -> Result<()> {
        Err(Error::Storage(StorageError::SaveFailed {
            key: object.storage_key(),
            reason: "disk full".to_string(),
        }))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
