//! Durable queue and storage across spider restarts

mod common;

use common::config_in;
use simplespider::item::{Item, ResultObject};
use simplespider::runner::{Matcher, RunnerError};
use simplespider::task::{Task, TaskKind};
use simplespider::{Spider, SqliteQueue, SqliteStorage};
use std::sync::{Arc, Mutex};

fn page_runner(seen: Arc<Mutex<Vec<String>>>) -> impl Fn(&Task) -> Result<Vec<Item>, RunnerError> {
    move |task| {
        let url = task.url().unwrap_or_default().to_string();
        seen.lock().unwrap().push(url.clone());
        Ok(vec![Item::Object(
            ResultObject::new("page").with_id(url.clone()).with("url", url),
        )])
    }
}

#[test]
fn pending_tasks_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    {
        let mut spider = Spider::builder()
            .config(config.clone())
            .queue(SqliteQueue::from_config(&config.persistence).unwrap())
            .build()
            .unwrap();
        for url in ["http://a/", "http://b/", "http://c/"] {
            spider.seed(url, TaskKind::Download).unwrap();
        }
        assert_eq!(spider.queue_len().unwrap(), 3);
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let queue = SqliteQueue::from_config(&config.persistence).unwrap();
    let storage = SqliteStorage::new(queue.database().clone());
    let storage_view = SqliteStorage::new(queue.database().clone());
    let mut spider = Spider::builder()
        .config(config.clone())
        .queue(queue)
        .storage(storage)
        .runner_fn("pages", TaskKind::Download, Matcher::new(), page_runner(seen.clone()))
        .build()
        .unwrap();

    assert_eq!(spider.queue_len().unwrap(), 3);
    let stats = spider.run().unwrap();

    assert_eq!(stats.tasks_processed, 3);
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["http://a/", "http://b/", "http://c/"],
        "FIFO order is kept across restarts"
    );
    assert_eq!(storage_view.len().unwrap(), 3);
    assert_eq!(spider.queue_len().unwrap(), 0);
}

#[test]
fn retries_are_persisted_at_the_tail() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let attempts = Arc::new(Mutex::new(Vec::new()));
    let seen = attempts.clone();

    let mut spider = Spider::builder()
        .config(config.clone())
        .queue(SqliteQueue::from_config(&config.persistence).unwrap())
        .runner_fn("flaky", TaskKind::Download, Matcher::new(), move |task| {
            seen.lock()
                .unwrap()
                .push(format!("{} retry={}", task.url().unwrap_or_default(), task.retry()));
            if task.url() == Some("http://a/") && task.retry() > 0 {
                return Err(RunnerError::retry("flaky"));
            }
            Ok(vec![])
        })
        .build()
        .unwrap();

    spider
        .queue_task(Task::builder(TaskKind::Download).url("http://a/").retry(1).build().unwrap())
        .unwrap();
    spider
        .queue_task(Task::builder(TaskKind::Download).url("http://b/").retry(1).build().unwrap())
        .unwrap();
    let stats = spider.run().unwrap();

    assert_eq!(
        *attempts.lock().unwrap(),
        vec!["http://a/ retry=1", "http://b/ retry=1", "http://a/ retry=0"]
    );
    assert_eq!(stats.retries, 1);
}

#[test]
fn objects_are_readable_after_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    {
        let mut spider = Spider::builder()
            .config(config.clone())
            .storage(SqliteStorage::from_config(&config.persistence).unwrap())
            .runner_fn(
                "pages",
                TaskKind::Download,
                Matcher::new(),
                page_runner(Arc::new(Mutex::new(Vec::new()))),
            )
            .build()
            .unwrap();
        spider.seed("http://a/", TaskKind::Download).unwrap();
        spider.run().unwrap();
    }

    let storage = SqliteStorage::from_config(&config.persistence).unwrap();
    let page = storage.get("page", "http://a/").unwrap().unwrap();
    assert_eq!(page.get("url").and_then(|u| u.as_str()), Some("http://a/"));
    assert_eq!(storage.kinds().unwrap(), vec!["page"]);
}
