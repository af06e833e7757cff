//! URL pattern and tag predicates for runners.

use crate::error::{Error, Result};
use crate::task::Task;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

static ANY: Matcher = Matcher {
    url_patterns: Vec::new(),
    tags: BTreeSet::new(),
    anchor: Anchor::Start,
};

/// How URL patterns are anchored against the task URL
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Pattern may match anywhere in the URL
    Unanchored,
    /// Pattern must match at the start of the URL
    #[default]
    Start,
    /// Pattern must match the whole URL
    Full,
}

impl Anchor {
    fn wrap(self, pattern: &str) -> String {
        match self {
            Anchor::Unanchored => pattern.to_string(),
            Anchor::Start => format!("^(?:{})", pattern),
            Anchor::Full => format!("^(?:{})$", pattern),
        }
    }
}

/// Applicability predicate shared by all runners
///
/// - With URL patterns, the task `url` must match at least one of them.
/// - With tags, the task's tag set must share at least one tag.
/// - With neither, every task matches.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    url_patterns: Vec<Regex>,
    tags: BTreeSet<String>,
    anchor: Anchor,
}

impl Matcher {
    /// Matcher with no constraints and [`Anchor::Start`] anchoring
    pub fn new() -> Self {
        Self::default()
    }

    /// Matcher with no constraints and the given anchoring for later patterns
    pub fn anchored(anchor: Anchor) -> Self {
        Self {
            anchor,
            ..Self::default()
        }
    }

    /// Shared matcher that accepts every task
    pub fn any_ref() -> &'static Matcher {
        &ANY
    }

    /// Add a URL pattern, compiled with this matcher's anchoring
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the pattern is not a valid regex.
    pub fn url_pattern(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(&self.anchor.wrap(pattern)).map_err(|e| Error::Config {
            message: format!("invalid URL pattern {:?}: {}", pattern, e),
            key: Some("url_patterns".to_string()),
        })?;
        self.url_patterns.push(regex);
        Ok(self)
    }

    /// Add several URL patterns
    pub fn url_patterns<I, S>(self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        patterns
            .into_iter()
            .try_fold(self, |matcher, p| matcher.url_pattern(p.as_ref()))
    }

    /// Add a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Add several tags
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Anchoring used for patterns
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Whether any constraint is declared
    pub fn is_unconstrained(&self) -> bool {
        self.url_patterns.is_empty() && self.tags.is_empty()
    }

    /// Evaluate the predicate against a task
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_url(task.url()) && self.matches_tags(task)
    }

    fn matches_url(&self, url: Option<&str>) -> bool {
        if self.url_patterns.is_empty() {
            return true;
        }
        match url {
            Some(url) => self.url_patterns.iter().any(|re| re.is_match(url)),
            None => false,
        }
    }

    fn matches_tags(&self, task: &Task) -> bool {
        if self.tags.is_empty() {
            return true;
        }
        task.tags().iter().any(|tag| self.tags.contains(*tag))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskKind;

    fn download(url: &str, tags: &[&str]) -> Task {
        Task::builder(TaskKind::Download)
            .url(url)
            .tags(tags.iter().copied())
            .build()
            .unwrap()
    }

    #[test]
    fn test_unconstrained_matches_everything() {
        let matcher = Matcher::new();
        assert!(matcher.is_unconstrained());
        assert!(matcher.matches(&download("http://x/", &[])));
        assert!(Matcher::any_ref().matches(&download("ftp://y/", &["t"])));

        let custom = Task::new(TaskKind::Custom("store".into()), [("data", "x")]).unwrap();
        assert!(matcher.matches(&custom));
    }

    #[test]
    fn test_url_patterns_any_of() {
        let matcher = Matcher::new()
            .url_patterns([r"http://en\.wikipedia\.org/wiki/", r"http://x/"])
            .unwrap();
        assert!(matcher.matches(&download("http://en.wikipedia.org/wiki/Rust", &[])));
        assert!(matcher.matches(&download("http://x/page", &[])));
        assert!(!matcher.matches(&download("http://y/", &[])));
    }

    #[test]
    fn test_url_pattern_requires_url() {
        let matcher = Matcher::new().url_pattern(".*").unwrap();
        let custom = Task::new(TaskKind::Custom("store".into()), [("data", "x")]).unwrap();
        assert!(!matcher.matches(&custom));
    }

    #[test]
    fn test_anchoring() {
        let task = download("http://mirror/http://x/", &[]);

        let start = Matcher::new().url_pattern(r"http://x/").unwrap();
        assert!(!start.matches(&task));

        let loose = Matcher::anchored(Anchor::Unanchored)
            .url_pattern(r"http://x/")
            .unwrap();
        assert!(loose.matches(&task));

        let full = Matcher::anchored(Anchor::Full)
            .url_pattern(r"http://x/")
            .unwrap();
        assert!(full.matches(&download("http://x/", &[])));
        assert!(!full.matches(&download("http://x/more", &[])));
    }

    #[test]
    fn test_tags_must_intersect() {
        let matcher = Matcher::new().tags(["wikipedia", "news"]);
        assert!(matcher.matches(&download("http://x/", &["news"])));
        assert!(!matcher.matches(&download("http://x/", &["blog"])));
        assert!(!matcher.matches(&download("http://x/", &[])));
    }

    #[test]
    fn test_patterns_and_tags_combine() {
        let matcher = Matcher::new().url_pattern(r"http://x/").unwrap().tag("a");
        assert!(matcher.matches(&download("http://x/", &["a"])));
        assert!(!matcher.matches(&download("http://x/", &["b"])));
        assert!(!matcher.matches(&download("http://y/", &["a"])));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = Matcher::new().url_pattern("(unclosed").unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(k), .. } if k == "url_patterns"));
    }
}
