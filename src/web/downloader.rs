//! Download runner over blocking HTTP.

use std::collections::BTreeMap;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;

use super::response::{HttpResponse, charset_param};
use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::item::Item;
use crate::runner::{self, ItemStream, Matcher, Runner, RunnerError};
use crate::task::{Task, TaskKind};

/// Redirect hops followed when redirects are allowed
const MAX_REDIRECTS: usize = 10;

/// Fetches the `url` of download tasks and emits a scrape task per page
///
/// The scrape task carries the task's `url` and `trail`, the fetched
/// [`HttpResponse`] and the configured tags.
///
/// Failures map onto runner signals: timeouts, connection errors and 5xx
/// statuses ask for a retry, 4xx statuses abort the task, anything else is
/// reported as an unexpected failure.
///
/// Uses `reqwest::blocking`; do not call it from inside an async runtime.
pub struct HttpDownloader {
    name: String,
    client: Client,
    matcher: Matcher,
    max_depth: usize,
    tags: Vec<String>,
}

impl HttpDownloader {
    /// Build a downloader from the HTTP configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the HTTP client cannot be created.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let redirect = if config.allow_redirects {
            Policy::limited(MAX_REDIRECTS)
        } else {
            Policy::none()
        };

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .redirect(redirect)
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            name: "http-downloader".to_string(),
            client,
            matcher: Matcher::new(),
            max_depth: config.max_depth,
            tags: config.tags.clone(),
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

    /// Fetch a URL into an [`HttpResponse`]
    ///
    /// The status is not checked here; see [`Runner::execute`].
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Retry`] for timeouts and connection failures and
    /// [`RunnerError::Failed`] for other transport errors.
    pub fn fetch(&self, url: &str) -> std::result::Result<HttpResponse, RunnerError> {
        tracing::debug!(url, "fetching");
        let response = self.client.get(url).send().map_err(transport_error)?;

        let status = response.status();
        let final_url = response.url().to_string();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let encoding = headers.get("content-type").and_then(|ct| charset_param(ct));
        let content = response.bytes().map_err(transport_error)?.to_vec();

        tracing::debug!(
            url,
            status = status.as_u16(),
            final_url = %final_url,
            bytes = content.len(),
            "fetched"
        );

        Ok(HttpResponse {
            status_code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            url: final_url,
            headers,
            content,
            encoding,
            ok: !(status.is_client_error() || status.is_server_error()),
        })
    }
}

fn transport_error(e: reqwest::Error) -> RunnerError {
    if e.is_timeout() || e.is_connect() {
        RunnerError::retry(e.to_string())
    } else {
        RunnerError::failed(e)
    }
}

impl Runner for HttpDownloader {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Download
    }

    fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    fn matches(&self, task: &Task) -> bool {
        if self.max_depth > 0 && task.trail().len() > self.max_depth {
            tracing::debug!(
                url = task.url().unwrap_or_default(),
                max_depth = self.max_depth,
                "trail too long"
            );
            return false;
        }
        self.matcher.matches(task)
    }

    fn execute<'a>(&'a self, task: &'a Task) -> std::result::Result<ItemStream<'a>, RunnerError> {
        let url = task
            .url()
            .ok_or_else(|| RunnerError::abort("download task has no url"))?;
        let response = self.fetch(url)?;

        if response.status_code >= 500 {
            return Err(RunnerError::retry(format!(
                "server error {} {}",
                response.status_code, response.reason
            )));
        }
        if response.status_code >= 400 {
            return Err(RunnerError::abort(format!(
                "client error {} {}",
                response.status_code, response.reason
            )));
        }

        let scrape = Task::builder(TaskKind::Scrape)
            .url(url)
            .trail(task.trail())
            .tags(self.tags.iter().cloned())
            .response(response)
            .build()?;
        Ok(runner::stream([Item::Task(scrape)]))
    }
}

impl std::fmt::Debug for HttpDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDownloader")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .field("max_depth", &self.max_depth)
            .field("tags", &self.tags)
            .finish()
    }
}
