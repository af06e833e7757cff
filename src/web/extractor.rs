//! Scrape runner that turns fetched pages into new download tasks.

use std::collections::HashSet;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::response::HttpResponse;
use crate::config::ExtractConfig;
use crate::error::{Error, Result};
use crate::item::Item;
use crate::runner::{self, ItemStream, Matcher, Runner, RunnerError};
use crate::task::{Task, TaskKind};

/// URLs recognized in plain text
const TEXT_URL_PATTERN: &str = r"((?:http|https)://[a-zA-Z0-9:/&?.=_%~+-]+)";

/// Extracts links from scraped pages and queues them as download tasks
///
/// HTML pages contribute every `a[href]`, resolved against the final response
/// URL. Other `text/*` pages are searched for absolute URLs when
/// `find_urls_in_text` is on. Fragments are dropped and only http/https
/// links are kept.
///
/// Emitted tasks carry a trail of the scrape task's trail, its url and,
/// when a redirect happened, the final response url.
pub struct LinkExtractor {
    name: String,
    matcher: Matcher,
    find_urls_in_text: bool,
    deduplicate_links: bool,
    max_depth: usize,
    anchors: Selector,
    text_urls: Regex,
}

impl LinkExtractor {
    /// Build an extractor from the extraction configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the built-in selectors fail to compile.
    pub fn from_config(config: &ExtractConfig) -> Result<Self> {
        let anchors = Selector::parse("a[href]")
            .map_err(|e| Error::config("extract", format!("invalid link selector: {:?}", e)))?;
        let text_urls = Regex::new(TEXT_URL_PATTERN)
            .map_err(|e| Error::config("extract", format!("invalid url pattern: {}", e)))?;

        Ok(Self {
            name: "link-extractor".to_string(),
            matcher: Matcher::new(),
            find_urls_in_text: config.find_urls_in_text,
            deduplicate_links: config.deduplicate_links,
            max_depth: config.max_depth,
            anchors,
            text_urls,
        })
    }

    /// Only handle tasks accepted by `matcher`
    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Use a custom runner name in logs and events
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Links found in a response, in document order
    pub fn extract_links(&self, response: &HttpResponse) -> Vec<String> {
        let media_type = response.media_type();
        let raw: Vec<String> = if media_type == "text/html" {
            self.html_links(response)
        } else if media_type.starts_with("text/") && self.find_urls_in_text {
            self.text_links(&response.text())
        } else {
            Vec::new()
        };

        let mut links: Vec<String> = raw.into_iter().filter(|link| is_web_url(link)).collect();
        if self.deduplicate_links {
            let mut seen = HashSet::new();
            links.retain(|link| seen.insert(link.clone()));
        }
        links
    }

    fn html_links(&self, response: &HttpResponse) -> Vec<String> {
        let document = Html::parse_document(&response.text());
        let base = Url::parse(&response.url).ok();

        document
            .select(&self.anchors)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| {
                let joined = match &base {
                    Some(base) => base.join(href.trim()),
                    None => Url::parse(href.trim()),
                };
                let mut url = joined.ok()?;
                url.set_fragment(None);
                Some(url.to_string())
            })
            .collect()
    }

    fn text_links(&self, text: &str) -> Vec<String> {
        self.text_urls
            .find_iter(text)
            .map(|m| {
                let url = m.as_str().trim_end_matches(['.', ',', ';', ':']);
                url.split('#').next().unwrap_or(url).to_string()
            })
            .collect()
    }
}

fn is_web_url(url: &str) -> bool {
    matches!(url.split(':').next(), Some("http" | "https"))
}

impl Runner for LinkExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Scrape
    }

    fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    fn matches(&self, task: &Task) -> bool {
        if self.max_depth > 0 && task.trail().len() >= self.max_depth {
            tracing::debug!(
                url = task.url().unwrap_or_default(),
                max_depth = self.max_depth,
                "trail too long to follow links"
            );
            return false;
        }
        self.matcher.matches(task)
    }

    fn execute<'a>(&'a self, task: &'a Task) -> std::result::Result<ItemStream<'a>, RunnerError> {
        let value = task
            .response()
            .ok_or_else(|| RunnerError::skip("scrape task has no response"))?;
        let response = HttpResponse::try_from(value)?;
        let url = task.url().unwrap_or_default();

        let mut trail: Vec<String> = task.trail().into_iter().map(str::to_string).collect();
        trail.push(url.to_string());
        if !response.url.is_empty() && response.url != url {
            trail.push(response.url.clone());
        }

        let links = self.extract_links(&response);
        tracing::debug!(url, links = links.len(), "extracted links");

        let tasks = links
            .into_iter()
            .map(|link| {
                Task::builder(TaskKind::Download)
                    .url(link)
                    .trail(trail.iter().cloned())
                    .build()
                    .map(Item::Task)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(runner::stream(tasks))
    }
}

impl std::fmt::Debug for LinkExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkExtractor")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .field("find_urls_in_text", &self.find_urls_in_text)
            .field("deduplicate_links", &self.deduplicate_links)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
