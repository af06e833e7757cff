//! Items produced by runners
//!
//! A runner yields [`Item`]s. New tasks go back to the queue, result objects
//! go to storage, anything else is logged and dropped by the engine.

use crate::task::Task;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// One element of a runner's output
#[derive(Debug, Clone)]
pub enum Item {
    /// A new task to queue
    Task(Task),
    /// Extracted data to hand to storage
    Object(ResultObject),
    /// Something the engine cannot route; logged and discarded
    Other(String),
}

impl From<Task> for Item {
    fn from(task: Task) -> Self {
        Item::Task(task)
    }
}

impl From<ResultObject> for Item {
    fn from(object: ResultObject) -> Self {
        Item::Object(object)
    }
}

/// Extracted domain data (a page title, a link between two pages, ...)
///
/// Storage backends group objects by `kind`. `id` is optional; backends that
/// need a key derive one from the content when it is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultObject {
    /// Object kind, e.g. "wikipedia_page"
    pub kind: String,
    /// Optional stable identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Object fields
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl ResultObject {
    /// Create an empty object of the given kind
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            data: serde_json::Map::new(),
        }
    }

    /// Set the identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set a field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Field value, if present
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Identifier used in the storage key
    ///
    /// The explicit id wins, then an `_id` or `id` field (string or number),
    /// then a SHA-256 of the kind and fields.
    pub fn key_id(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        let field_id = ["_id", "id"]
            .iter()
            .filter_map(|key| self.data.get(*key))
            .find_map(|value| match value {
                serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
                serde_json::Value::Number(id) => Some(id.to_string()),
                _ => None,
            });
        if let Some(id) = field_id {
            return id;
        }
        let fields: BTreeMap<&String, &serde_json::Value> = self.data.iter().collect();
        let mut hasher = Sha256::new();
        hasher.update(self.kind.as_bytes());
        for (key, value) in fields {
            hasher.update([0u8]);
            hasher.update(key.as_bytes());
            hasher.update([0u8]);
            hasher.update(value.to_string());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Storage key, `"{kind}.{id}"`
    pub fn storage_key(&self) -> String {
        format!("{}.{}", self.kind, self.key_id())
    }
}

impl fmt::Display for ResultObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, (k, v)) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        write!(f, ")")
    }
}
