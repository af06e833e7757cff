//! Hashable attribute values.

use crate::error::TaskError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A single task attribute value
///
/// Every variant is totally ordered and hashable, so a task built from
/// `Value`s can always be deduplicated. There is deliberately no float
/// variant: floats arriving through [`Value::from_json`] are rejected.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Absent / null value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// UTF-8 string
    Str(String),
    /// Opaque bytes (e.g. a fetched page body)
    Bytes(Vec<u8>),
    /// Ordered sequence
    Seq(Vec<Value>),
    /// Sorted, deduplicated set
    Set(BTreeSet<Value>),
    /// Map with sorted keys
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Convert a plain JSON value, rejecting floats
    ///
    /// `key` is only used to name the offending attribute in the error.
    /// Arrays become [`Value::Seq`], objects become [`Value::Map`].
    pub fn from_json(key: &str, json: &serde_json::Value) -> Result<Value, TaskError> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None if n.is_u64() => {
                    return Err(TaskError::InvalidAttribute {
                        key: key.to_string(),
                        expected: "an integer that fits in 64 signed bits",
                    });
                }
                None => {
                    return Err(TaskError::Unhashable {
                        key: key.to_string(),
                    });
                }
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => Value::Seq(
                items
                    .iter()
                    .map(|item| Value::from_json(key, item))
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), Value::from_json(key, v)?)))
                    .collect::<Result<_, TaskError>>()?,
            ),
        })
    }

    /// Convert into plain JSON (bytes become an array of numbers, sets become arrays)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::from(b.clone()),
            Value::Seq(items) => items.iter().map(Value::to_json).collect(),
            Value::Set(items) => items.iter().map(Value::to_json).collect(),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Build a sequence of strings
    pub fn strings<I, S>(items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Seq(items.into_iter().map(|s| Value::Str(s.into())).collect())
    }

    /// Build a set of strings
    pub fn string_set<I, S>(items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Set(items.into_iter().map(|s| Value::Str(s.into())).collect())
    }

    /// String content, if this is a [`Value::Str`]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, if this is a [`Value::Int`]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Boolean content, if this is a [`Value::Bool`]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Byte content, if this is a [`Value::Bytes`]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Items, if this is a [`Value::Seq`]
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Items, if this is a [`Value::Set`]
    pub fn as_set(&self) -> Option<&BTreeSet<Value>> {
        match self {
            Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Entries, if this is a [`Value::Map`]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Whether this is [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Feed a canonical, type-tagged encoding into the hasher
    ///
    /// Every variant writes a distinct tag byte and every variable-length
    /// payload is length-prefixed, so distinct values never share an encoding.
    pub(crate) fn digest_into(&self, hasher: &mut Sha256) {
        match self {
            Value::Null => hasher.update([0u8]),
            Value::Bool(b) => hasher.update([1u8, u8::from(*b)]),
            Value::Int(i) => {
                hasher.update([2u8]);
                hasher.update(i.to_be_bytes());
            }
            Value::Str(s) => {
                hasher.update([3u8]);
                digest_bytes(hasher, s.as_bytes());
            }
            Value::Bytes(b) => {
                hasher.update([4u8]);
                digest_bytes(hasher, b);
            }
            Value::Seq(items) => {
                hasher.update([5u8]);
                hasher.update((items.len() as u64).to_be_bytes());
                items.iter().for_each(|item| item.digest_into(hasher));
            }
            Value::Set(items) => {
                hasher.update([6u8]);
                hasher.update((items.len() as u64).to_be_bytes());
                items.iter().for_each(|item| item.digest_into(hasher));
            }
            Value::Map(map) => {
                hasher.update([7u8]);
                hasher.update((map.len() as u64).to_be_bytes());
                for (k, v) in map {
                    digest_bytes(hasher, k.as_bytes());
                    v.digest_into(hasher);
                }
            }
        }
    }
}

pub(crate) fn digest_bytes(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{:?}", s),
            // Page bodies can be large; only show the size
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Seq(items) => {
                write!(f, "[")?;
                write_joined(f, items.iter())?;
                write!(f, "]")
            }
            Value::Set(items) => {
                write!(f, "{{")?;
                write_joined(f, items.iter())?;
                write!(f, "}}")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<BTreeSet<String>> for Value {
    fn from(items: BTreeSet<String>) -> Self {
        Value::string_set(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
