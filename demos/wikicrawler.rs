//! Wikipedia crawler example
//!
//! This example demonstrates a complete crawling pipeline:
//! - Downloading pages with the HTTP downloader, restricted to Wikipedia
//! - Scraping page titles into result objects
//! - Following links with the link extractor, up to a fixed depth
//! - Storing results in memory, or in SQLite when a path is given
//!
//! ```text
//! cargo run --example wikicrawler               # in-memory storage
//! cargo run --example wikicrawler -- pages.db   # SQLite storage
//! RUST_LOG=simplespider=debug cargo run --example wikicrawler
//! ```

use scraper::{Html, Selector};
use simplespider::config::{Config, ExtractConfig, HttpConfig};
use simplespider::item::{Item, ResultObject};
use simplespider::runner::{self, ItemStream, Matcher, Runner, RunnerError};
use simplespider::storage::{MemoryStorage, SqliteStorage, Storage};
use simplespider::task::{Task, TaskKind};
use simplespider::web::{HttpDownloader, HttpResponse, LinkExtractor};
use simplespider::{Event, Spider};
use tracing_subscriber::EnvFilter;

const START_URL: &str = "https://en.wikipedia.org/";

/// Namespaces that are not articles
const SPECIAL_PREFIXES: &[&str] = &[
    "Talk:",
    "Help:",
    "Category:",
    "Template:",
    "Wikipedia:",
    "User:",
    "Portal:",
    "Special:",
    "File:",
];

fn wikipedia_matcher() -> simplespider::Result<Matcher> {
    Matcher::new().url_patterns([
        r"https?://en\.wikipedia\.org/?$",
        r"https?://en\.wikipedia\.org/wiki/",
    ])
}

fn is_special_page(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let mut segments = parsed.path().trim_start_matches('/').split('/');
    match (segments.next(), segments.next()) {
        (Some("wiki"), Some(page)) => SPECIAL_PREFIXES.iter().any(|p| page.starts_with(p)),
        _ => false,
    }
}

/// HTTP downloader that leaves special pages alone
struct WikipediaDownloader {
    inner: HttpDownloader,
}

impl Runner for WikipediaDownloader {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Download
    }

    fn matcher(&self) -> &Matcher {
        self.inner.matcher()
    }

    fn matches(&self, task: &Task) -> bool {
        self.inner.matches(task) && !task.url().is_some_and(is_special_page)
    }

    fn execute<'a>(&'a self, task: &'a Task) -> Result<ItemStream<'a>, RunnerError> {
        self.inner.execute(task)
    }
}

/// Stores the title of every article page
struct WikipediaScraper {
    matcher: Matcher,
    heading: Selector,
}

impl Runner for WikipediaScraper {
    fn name(&self) -> &str {
        "wikipedia-scraper"
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Scrape
    }

    fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    fn matches(&self, task: &Task) -> bool {
        self.matcher.matches(task) && !task.url().is_some_and(is_special_page)
    }

    fn execute<'a>(&'a self, task: &'a Task) -> Result<ItemStream<'a>, RunnerError> {
        let value = task
            .response()
            .ok_or_else(|| RunnerError::skip("no response"))?;
        let response = HttpResponse::try_from(value)?;
        if response.media_type() != "text/html" {
            return Ok(runner::empty());
        }

        let document = Html::parse_document(&response.text());
        let Some(heading) = document.select(&self.heading).next() else {
            return Err(RunnerError::skip("page has no heading"));
        };
        let title = heading.text().collect::<String>().trim().to_string();
        let url = task.url().unwrap_or_default();

        let page = ResultObject::new("wikipedia_page")
            .with_id(url)
            .with("url", url)
            .with("title", title);
        Ok(runner::stream([Item::Object(page)]))
    }
}

fn crawl(storage: impl Storage + 'static) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config {
        http: HttpConfig {
            tags: vec!["wikipedia".to_string()],
            ..Default::default()
        },
        extract: ExtractConfig {
            max_depth: 3,
            ..Default::default()
        },
        ..Default::default()
    };

    let downloader = WikipediaDownloader {
        inner: HttpDownloader::new(&config.http)?
            .with_matcher(wikipedia_matcher()?)
            .named("wikipedia-downloader"),
    };
    let scraper = WikipediaScraper {
        matcher: wikipedia_matcher()?,
        heading: Selector::parse("h1#firstHeading")
            .map_err(|e| format!("invalid selector: {:?}", e))?,
    };
    let extractor = LinkExtractor::from_config(&config.extract)?;

    let mut spider = Spider::builder()
        .config(config)
        .storage(storage)
        .runner(downloader)
        .runner(scraper)
        .runner(extractor)
        .build()?;

    // Print stored pages as they arrive
    let mut events = spider.subscribe();
    let printer = std::thread::spawn(move || {
        while let Ok(event) = events.blocking_recv() {
            match event {
                Event::ObjectStored { key, .. } => println!("✓ Stored {}", key),
                Event::TaskAborted { reason, .. } => println!("✗ Aborted: {}", reason),
                Event::QueueEmpty { processed } => {
                    println!("Done: {} tasks processed", processed);
                    break;
                }
                _ => {}
            }
        }
    });

    spider.seed(START_URL, TaskKind::Download)?;
    let stats = spider.run()?;
    printer.join().ok();

    println!(
        "{} objects stored, {} retries, {} tasks dropped",
        stats.objects_stored, stats.retries, stats.tasks_dropped
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match std::env::args().nth(1) {
        Some(path) => crawl(SqliteStorage::open(std::path::Path::new(&path), false)?),
        None => crawl(MemoryStorage::new()),
    }
}
