//! Immutable, hashable tasks
//!
//! A [`Task`] is a kind tag plus a sorted attribute map. Tasks never change
//! after construction; [`Task::clone_with`] is the only way to derive a
//! modified copy. Each task carries a [`TaskId`], a SHA-256 over a canonical
//! encoding of its kind and attributes, which is what the engine uses for
//! deduplication.
//!
//! ```
//! use simplespider::task::{Task, TaskKind};
//!
//! let task = Task::builder(TaskKind::Download)
//!     .url("http://example.com/")
//!     .tag("example")
//!     .build()?;
//! assert_eq!(task.retry(), 2);
//!
//! let retried = task.clone_with([("retry", 1)])?;
//! assert_ne!(task, retried);
//! assert_eq!(task, task.clone());
//! # Ok::<(), simplespider::task::TaskError>(())
//! ```

mod value;

pub use crate::error::TaskError;
pub use value::Value;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Retry budget given to tasks that don't specify one
pub const DEFAULT_RETRY: u32 = 2;

/// Attribute holding the URL to fetch, or the URL a page was fetched from
pub const URL: &str = "url";
/// Attribute holding the task's tag set
pub const TAGS: &str = "tags";
/// Attribute holding the URLs followed to reach this task
pub const TRAIL: &str = "trail";
/// Attribute holding the download step's response
pub const RESPONSE: &str = "response";
/// Attribute holding the remaining retry budget
pub const RETRY: &str = "retry";

/// Task kind discriminator
///
/// The kind decides which runner registry handles a task. Two tasks of
/// different kinds are never equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Fetch a URL
    Download,
    /// Examine a fetched page
    Scrape,
    /// Application-defined kind
    Custom(String),
}

impl TaskKind {
    /// Parse a kind name; unknown names become [`TaskKind::Custom`]
    pub fn from_name(name: &str) -> Self {
        match name {
            "download" => TaskKind::Download,
            "scrape" => TaskKind::Scrape,
            other => TaskKind::Custom(other.to_string()),
        }
    }

    /// Kind name as used in logs and serialized forms
    pub fn as_str(&self) -> &str {
        match self {
            TaskKind::Download => "download",
            TaskKind::Scrape => "scrape",
            TaskKind::Custom(name) => name,
        }
    }

    // Custom kinds get their own prefix so that Custom("download") never
    // shares an identity with Download.
    fn digest_into(&self, hasher: &mut Sha256) {
        match self {
            TaskKind::Download => hasher.update([0u8]),
            TaskKind::Scrape => hasher.update([1u8]),
            TaskKind::Custom(name) => {
                hasher.update([2u8]);
                value::digest_bytes(hasher, name.as_bytes());
            }
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content-derived task identity (lowercase hex SHA-256)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    fn compute(kind: &TaskKind, attributes: &BTreeMap<String, Value>) -> Self {
        let mut hasher = Sha256::new();
        kind.digest_into(&mut hasher);
        hasher.update((attributes.len() as u64).to_be_bytes());
        for (key, value) in attributes {
            value::digest_bytes(&mut hasher, key.as_bytes());
            value.digest_into(&mut hasher);
        }
        TaskId(format!("{:x}", hasher.finalize()))
    }

    /// Full hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines
    ///
    /// Ids shorter than that (only possible through deserialization) are
    /// returned whole.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable unit of queued work
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawTask")]
pub struct Task {
    kind: TaskKind,
    attributes: BTreeMap<String, Value>,
    #[serde(skip_serializing)]
    id: TaskId,
}

#[derive(Deserialize)]
struct RawTask {
    kind: TaskKind,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl TryFrom<RawTask> for Task {
    type Error = TaskError;

    fn try_from(raw: RawTask) -> std::result::Result<Self, Self::Error> {
        Task::from_parts(raw.kind, raw.attributes, DEFAULT_RETRY)
    }
}

impl Task {
    /// Create a task from key/value pairs
    ///
    /// `retry` defaults to [`DEFAULT_RETRY`]. Download and scrape tasks must
    /// carry a string `url`.
    pub fn new<I, K, V>(kind: TaskKind, attributes: I) -> std::result::Result<Self, TaskError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let attributes = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Task::from_parts(kind, attributes, DEFAULT_RETRY)
    }

    /// Start building a task of the given kind
    pub fn builder(kind: TaskKind) -> TaskBuilder {
        TaskBuilder::new(kind)
    }

    /// Shorthand for a download task with default retry budget
    pub fn download(url: impl Into<String>) -> std::result::Result<Self, TaskError> {
        Task::builder(TaskKind::Download).url(url).build()
    }

    /// Decode a task from plain JSON (`{"kind": "download", "attributes": {...}}`)
    ///
    /// Attribute values are converted with [`Value::from_json`], so floats are
    /// rejected. Anything that isn't a task object is a type mismatch.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        Task::from_json_with_retry(json, DEFAULT_RETRY)
    }

    /// [`Task::from_json`] with a custom default retry budget
    pub(crate) fn from_json_with_retry(
        json: &serde_json::Value,
        default_retry: u32,
    ) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| Error::type_mismatch("task object", json_type_name(json)))?;
        let kind = object
            .get("kind")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| Error::type_mismatch("task object", "object without a kind"))?;

        let mut attributes = BTreeMap::new();
        match object.get("attributes") {
            None | Some(serde_json::Value::Null) => {}
            Some(serde_json::Value::Object(map)) => {
                for (key, value) in map {
                    attributes.insert(key.clone(), Value::from_json(key, value)?);
                }
            }
            Some(other) => {
                return Err(Error::type_mismatch(
                    "attribute object",
                    json_type_name(other),
                ));
            }
        }

        Ok(Task::from_parts(
            TaskKind::from_name(kind),
            attributes,
            default_retry,
        )?)
    }

    /// Validate, canonicalize and hash a set of attributes
    pub(crate) fn from_parts(
        kind: TaskKind,
        mut attributes: BTreeMap<String, Value>,
        default_retry: u32,
    ) -> std::result::Result<Self, TaskError> {
        if attributes.keys().any(String::is_empty) {
            return Err(TaskError::EmptyKey);
        }

        attributes
            .entry(RETRY.to_string())
            .or_insert(Value::from(default_retry));
        validate_retry(&attributes[RETRY])?;

        match attributes.get(URL) {
            Some(Value::Str(_)) => {}
            Some(_) => {
                return Err(TaskError::InvalidAttribute {
                    key: URL.to_string(),
                    expected: "a string",
                });
            }
            None if matches!(kind, TaskKind::Download | TaskKind::Scrape) => {
                return Err(TaskError::MissingAttribute {
                    kind: kind.to_string(),
                    key: URL,
                });
            }
            None => {}
        }

        if let Some(tags) = attributes.get_mut(TAGS) {
            *tags = canonical_tags(tags)?;
        }

        if let Some(trail) = attributes.get(TRAIL) {
            let valid = trail
                .as_seq()
                .is_some_and(|items| items.iter().all(|v| v.as_str().is_some()));
            if !valid {
                return Err(TaskError::InvalidAttribute {
                    key: TRAIL.to_string(),
                    expected: "a sequence of strings",
                });
            }
        }

        let id = TaskId::compute(&kind, &attributes);
        Ok(Self {
            kind,
            attributes,
            id,
        })
    }

    /// Derive a new task of the same kind with `overrides` merged in
    ///
    /// Overrides are validated exactly like construction.
    pub fn clone_with<I, K, V>(&self, overrides: I) -> std::result::Result<Self, TaskError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut attributes = self.attributes.clone();
        for (k, v) in overrides {
            attributes.insert(k.into(), v.into());
        }
        Task::from_parts(self.kind.clone(), attributes, DEFAULT_RETRY)
    }

    /// Copy of this task with the retry budget decremented, or `None` once exhausted
    pub(crate) fn retried(&self) -> Option<Self> {
        let remaining = self.retry().checked_sub(1)?;
        let mut attributes = self.attributes.clone();
        attributes.insert(RETRY.to_string(), Value::from(remaining));
        let id = TaskId::compute(&self.kind, &attributes);
        Some(Self {
            kind: self.kind.clone(),
            attributes,
            id,
        })
    }

    /// Task kind
    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    /// Content-derived identity
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// All attributes, sorted by key
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Attribute value, if present
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Whether the attribute is present
    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Attribute keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Number of attributes (including `retry`)
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the task has no attributes; never true, `retry` is always set
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// The `url` attribute
    pub fn url(&self) -> Option<&str> {
        self.get(URL).and_then(Value::as_str)
    }

    /// The `tags` attribute as strings (empty when absent)
    pub fn tags(&self) -> BTreeSet<&str> {
        self.get(TAGS)
            .and_then(Value::as_set)
            .map(|set| set.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// The `trail` attribute as strings (empty when absent)
    pub fn trail(&self) -> Vec<&str> {
        self.get(TRAIL)
            .and_then(Value::as_seq)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// The `response` attribute
    pub fn response(&self) -> Option<&Value> {
        self.get(RESPONSE)
    }

    /// Remaining retry budget
    pub fn retry(&self) -> u32 {
        // validated at construction
        self.get(RETRY)
            .and_then(Value::as_int)
            .and_then(|r| u32::try_from(r).ok())
            .unwrap_or(0)
    }
}

fn validate_retry(value: &Value) -> std::result::Result<(), TaskError> {
    match value.as_int() {
        Some(r) if u32::try_from(r).is_ok() => Ok(()),
        _ => Err(TaskError::InvalidAttribute {
            key: RETRY.to_string(),
            expected: "a non-negative integer",
        }),
    }
}

fn canonical_tags(tags: &Value) -> std::result::Result<Value, TaskError> {
    let items: Option<Vec<&Value>> = match tags {
        Value::Set(set) => Some(set.iter().collect()),
        Value::Seq(seq) => Some(seq.iter().collect()),
        Value::Str(_) => Some(vec![tags]),
        _ => None,
    };
    match items {
        Some(items) if items.iter().all(|v| v.as_str().is_some()) => {
            Ok(Value::Set(items.into_iter().cloned().collect()))
        }
        _ => Err(TaskError::InvalidAttribute {
            key: TAGS.to_string(),
            expected: "a set of strings",
        }),
    }
}

fn json_type_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.attributes == other.attributes
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, (key, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, ")")
    }
}

/// Builder for [`Task`]
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    kind: TaskKind,
    attributes: BTreeMap<String, Value>,
    tags: BTreeSet<String>,
    default_retry: u32,
}

impl TaskBuilder {
    fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            tags: BTreeSet::new(),
            default_retry: DEFAULT_RETRY,
        }
    }

    /// Set the `url` attribute
    pub fn url(self, url: impl Into<String>) -> Self {
        self.attr(URL, url.into())
    }

    /// Add one tag
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

    /// Set the `trail` attribute
    pub fn trail<I, S>(self, trail: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attr(TRAIL, Value::strings(trail))
    }

    /// Set the `response` attribute
    pub fn response(self, response: impl Into<Value>) -> Self {
        self.attr(RESPONSE, response)
    }

    /// Set the retry budget explicitly
    pub fn retry(self, retry: u32) -> Self {
        self.attr(RETRY, retry)
    }

    /// Budget used when [`retry`](Self::retry) is not called
    pub fn default_retry(mut self, retry: u32) -> Self {
        self.default_retry = retry;
        self
    }

    /// Set an arbitrary attribute
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Validate and build the task
    pub fn build(mut self) -> std::result::Result<Task, TaskError> {
        if !self.tags.is_empty() {
            self.attributes
                .insert(TAGS.to_string(), Value::string_set(self.tags));
        }
        Task::from_parts(self.kind, self.attributes, self.default_retry)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn example() -> Task {
        Task::builder(TaskKind::Download)
            .url("http://www.example.com")
            .retry(2)
            .build()
            .unwrap()
    }

    #[test]
    fn test_retry_defaults_to_two() {
        let task = Task::download("http://www.example.com").unwrap();
        assert_eq!(task.retry(), 2);
        assert_eq!(task.get(RETRY), Some(&Value::Int(2)));
    }

    #[test]
    fn test_builder_default_retry_is_overridable() {
        let task = Task::builder(TaskKind::Download)
            .url("http://x/")
            .default_retry(5)
            .build()
            .unwrap();
        assert_eq!(task.retry(), 5);

        // An explicit retry wins over the default
        let task = Task::builder(TaskKind::Download)
            .url("http://x/")
            .default_retry(5)
            .retry(0)
            .build()
            .unwrap();
        assert_eq!(task.retry(), 0);
    }

    #[test]
    fn test_accessors() {
        let task = Task::builder(TaskKind::Scrape)
            .url("http://x/page")
            .tags(["b", "a"])
            .trail(["http://x/", "http://x/index"])
            .response(Value::Bytes(b"<html/>".to_vec()))
            .attr("hello", "world")
            .build()
            .unwrap();

        assert_eq!(task.url(), Some("http://x/page"));
        assert_eq!(task.tags().into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(task.trail(), vec!["http://x/", "http://x/index"]);
        assert_eq!(task.response(), Some(&Value::Bytes(b"<html/>".to_vec())));
        assert_eq!(task.get("hello"), Some(&Value::from("world")));
        assert!(task.contains("hello"));
        assert!(!task.contains("eggs"));
        assert_eq!(
            task.keys().collect::<Vec<_>>(),
            vec!["hello", "response", "retry", "tags", "trail", "url"]
        );
        assert_eq!(task.len(), 6);
        assert!(!task.is_empty());
    }

    #[test]
    fn test_clone_equality() {
        let task = example();
        assert_eq!(task, task.clone());
        assert_eq!(task.id(), task.clone().id());

        // clone_with without overrides is also equal
        let same = task.clone_with(Vec::<(String, Value)>::new()).unwrap();
        assert_eq!(task, same);

        let clone = task.clone_with([(URL, "http://www.example.org")]).unwrap();
        assert_ne!(task, clone);
        assert_eq!(clone.kind(), task.kind());
        assert_eq!(clone.url(), Some("http://www.example.org"));
        assert_eq!(clone.retry(), 2);
    }

    #[test]
    fn test_comparison_and_set_membership() {
        let task = example();
        let task1 = example();
        let task2 = task.clone_with([(RETRY, 1)]).unwrap();

        assert_eq!(task, task1);
        assert_ne!(task, task2);

        let set: HashSet<Task> = [task.clone(), task1, task2.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);

        let retried = task.retried().unwrap();
        assert_eq!(retried, task2);
        assert_eq!(retried.id(), task2.id());
    }

    #[test]
    fn test_different_kinds_never_equal() {
        let download = Task::new(TaskKind::Download, [(URL, "http://x/")]).unwrap();
        let scrape = Task::new(TaskKind::Scrape, [(URL, "http://x/")]).unwrap();
        let custom = Task::new(TaskKind::Custom("download".into()), [(URL, "http://x/")]).unwrap();

        assert_ne!(download, scrape);
        assert_ne!(download, custom);
        assert_ne!(download.id(), scrape.id());
        assert_ne!(download.id(), custom.id());

        let set: HashSet<Task> = [download.clone(), scrape, custom, download]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_identity_is_order_independent() {
        let a = Task::new(TaskKind::Download, [(URL, "http://x/"), ("foo", "bar")]).unwrap();
        let b = Task::new(TaskKind::Download, [("foo", "bar"), (URL, "http://x/")]).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().as_str().len(), 64);
        assert_eq!(a.id().short().len(), 12);
    }

    #[test]
    fn test_tags_are_canonicalized_to_a_set() {
        let a = Task::new(
            TaskKind::Download,
            [(URL, Value::from("http://x/")), (TAGS, Value::strings(["b", "a", "b"]))],
        )
        .unwrap();
        let b = Task::builder(TaskKind::Download)
            .url("http://x/")
            .tags(["a", "b"])
            .build()
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get(TAGS), Some(&Value::string_set(["a", "b"])));
    }

    #[test]
    fn test_invalid_attributes_fail_construction() {
        let err = Task::new(TaskKind::Download, [(URL, Value::from("http://x/")), (RETRY, Value::Int(-1))])
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidAttribute { key, .. } if key == RETRY));

        let err = Task::new(TaskKind::Download, [(URL, Value::from("http://x/")), (RETRY, Value::from("2"))])
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidAttribute { key, .. } if key == RETRY));

        let err = Task::new(TaskKind::Download, [(URL, Value::Int(1))]).unwrap_err();
        assert!(matches!(err, TaskError::InvalidAttribute { key, .. } if key == URL));

        let err = Task::new(TaskKind::Scrape, [("foo", "bar")]).unwrap_err();
        assert!(matches!(err, TaskError::MissingAttribute { key: URL, .. }));

        let err = Task::new(TaskKind::Download, [(URL, Value::from("http://x/")), (TAGS, Value::Int(3))])
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidAttribute { key, .. } if key == TAGS));

        let err = Task::new(
            TaskKind::Download,
            [(URL, Value::from("http://x/")), (TRAIL, Value::Seq(vec![Value::Int(1)]))],
        )
        .unwrap_err();
        assert!(matches!(err, TaskError::InvalidAttribute { key, .. } if key == TRAIL));

        let err = Task::new(TaskKind::Custom("x".into()), [("", "empty")]).unwrap_err();
        assert_eq!(err, TaskError::EmptyKey);
    }

    #[test]
    fn test_clone_with_validates_overrides() {
        let task = example();
        let err = task.clone_with([(RETRY, Value::Int(-3))]).unwrap_err();
        assert!(matches!(err, TaskError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_custom_kind_needs_no_url() {
        let task = Task::new(TaskKind::Custom("store".into()), [("data", "x")]).unwrap();
        assert_eq!(task.url(), None);
        assert_eq!(task.kind().as_str(), "store");
    }

    #[test]
    fn test_retried_exhausts_at_zero() {
        let task = Task::builder(TaskKind::Download)
            .url("http://x/")
            .retry(1)
            .build()
            .unwrap();
        let once = task.retried().unwrap();
        assert_eq!(once.retry(), 0);
        assert!(once.retried().is_none());
    }

    #[test]
    fn test_display_sorts_keys() {
        let task = Task::new(TaskKind::Download, [(URL, "http://x/"), ("foo", "bar")]).unwrap();
        assert_eq!(
            task.to_string(),
            "download(foo=\"bar\", retry=2, url=\"http://x/\")"
        );
    }

    #[test]
    fn test_from_json() {
        let task = Task::from_json(&json!({
            "kind": "download",
            "attributes": {"url": "http://x/", "tags": ["a"], "retry": 1}
        }))
        .unwrap();
        assert_eq!(task.kind(), &TaskKind::Download);
        assert_eq!(task.retry(), 1);
        assert_eq!(task.tags().into_iter().collect::<Vec<_>>(), vec!["a"]);

        let custom = Task::from_json(&json!({"kind": "store"})).unwrap();
        assert_eq!(custom.kind(), &TaskKind::Custom("store".into()));
    }

    #[test]
    fn test_from_json_type_mismatch() {
        let err = Task::from_json(&json!("this is not a task")).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { found, .. } if found == "string"));

        let err = Task::from_json(&json!({"url": "http://x/"})).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let err = Task::from_json(&json!({"kind": "download", "attributes": [1]})).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_from_json_rejects_floats() {
        let err = Task::from_json(&json!({
            "kind": "download",
            "attributes": {"url": "http://x/", "weight": 0.5}
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Construction(TaskError::Unhashable { key }) if key == "weight"
        ));
    }

    #[test]
    fn test_serde_round_trip_preserves_identity() {
        let task = Task::builder(TaskKind::Scrape)
            .url("http://x/")
            .tag("t")
            .response(Value::Bytes(vec![1, 2, 3]))
            .build()
            .unwrap();
        let encoded = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, task);
        assert_eq!(decoded.id(), task.id());
    }

    #[test]
    fn test_short_id_never_panics() {
        let task = Task::download("http://x/").unwrap();
        assert_eq!(task.id().short().len(), 12);
        assert!(task.id().as_str().starts_with(task.id().short()));

        let tiny: TaskId = serde_json::from_str(r#""abc""#).unwrap();
        assert_eq!(tiny.short(), "abc");
        let empty: TaskId = serde_json::from_str(r#""""#).unwrap();
        assert_eq!(empty.short(), "");
    }

    #[test]
    fn test_deserialize_validates() {
        let result: std::result::Result<Task, _> =
            serde_json::from_str(r#"{"kind":"download","attributes":{"retry":{"int":1}}}"#);
        assert!(result.is_err(), "download without url must not decode");
    }
}
