use super::*;
use crate::Spider;

#[test]
fn test_tasks_run_in_queue_order() {
    let log = CallLog::default();
    let seen = log.clone();
    let mut spider = Spider::builder()
        .runner_fn("fetch", TaskKind::Download, Matcher::new(), move |task| {
            seen.record(task.url().unwrap_or_default());
            Ok(vec![])
        })
        .build()
        .unwrap();

    for url in ["http://a/", "http://b/", "http://c/"] {
        spider.queue_task(download(url)).unwrap();
    }
    spider.run().unwrap();

    assert_eq!(log.entries(), vec!["http://a/", "http://b/", "http://c/"]);
}

#[test]
fn test_retry_goes_to_the_tail() {
    let log = CallLog::default();
    let seen = log.clone();
    let mut spider = Spider::builder()
        .runner_fn("fetch", TaskKind::Download, Matcher::new(), move |task| {
            let url = task.url().unwrap_or_default();
            seen.record(url);
            if url == "http://b/" && task.retry() == 1 {
                return Err(RunnerError::retry("timeout"));
            }
            Ok(vec![])
        })
        .build()
        .unwrap();

    for url in ["http://a/", "http://b/", "http://c/"] {
        spider
            .queue_task(download_with_retry(url, 1))
            .unwrap();
    }
    spider.run().unwrap();

    assert_eq!(
        log.entries(),
        vec!["http://a/", "http://b/", "http://c/", "http://b/"]
    );
}

#[test]
fn test_emitted_tasks_follow_already_queued_ones() {
    let log = CallLog::default();
    let (downloads, scrapes) = (log.clone(), log.clone());
    let mut spider = Spider::builder()
        .runner_fn("fetch", TaskKind::Download, Matcher::new(), move |task| {
            let url = task.url().unwrap_or_default();
            downloads.record(format!("download {}", url));
            Ok(vec![Item::Task(scrape(url))])
        })
        .runner_fn("scan", TaskKind::Scrape, Matcher::new(), move |task| {
            scrapes.record(format!("scrape {}", task.url().unwrap_or_default()));
            Ok(vec![])
        })
        .build()
        .unwrap();

    spider.queue_task(download("http://a/")).unwrap();
    spider.queue_task(download("http://b/")).unwrap();
    spider.run().unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "download http://a/",
            "download http://b/",
            "scrape http://a/",
            "scrape http://b/",
        ]
    );
}
