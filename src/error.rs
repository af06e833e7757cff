//! Error types for simplespider
//!
//! This module provides the error taxonomy of the library:
//! - [`TaskError`] for tasks that cannot be constructed (invalid attributes)
//! - [`QueueError`] and [`StorageError`] for the queue and storage adapters
//! - [`DatabaseError`] for the embedded SQLite backends
//! - [`Error`], the top-level type returned by the public API
//!
//! Runner control-flow signals (abort, skip, retry) are *not* part of this
//! taxonomy. They live in [`crate::runner::RunnerError`] and never escape
//! [`crate::Spider::run`].

use thiserror::Error;

/// Result type alias for simplespider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for simplespider
///
/// Only construction errors, type mismatches and adapter failures reach the
/// caller. Everything a runner raises is contained by the dispatch loop.
#[derive(Debug, Error)]
pub enum Error {
    /// A task could not be built from the given attributes
    #[error("invalid task: {0}")]
    Construction(#[from] TaskError),

    /// A value handed to the engine is not a recognized task
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the API boundary expected (e.g. "task object")
        expected: String,
        /// Short description of what was received
        found: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "engine.default_retry")
        key: Option<String>,
    },

    /// Queue adapter failure
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Storage adapter failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl Error {
    /// Create a configuration error for the given key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Task construction errors
///
/// Raised when a task is built, cloned with overrides, or decoded. A task that
/// fails here never reaches a queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Floating point values have no canonical hash
    #[error("attribute {key:?} holds a floating point number, which cannot be hashed")]
    Unhashable {
        /// The offending attribute key
        key: String,
    },

    /// Attribute has the wrong shape for its well-known key
    #[error("attribute {key:?} must be {expected}")]
    InvalidAttribute {
        /// The offending attribute key
        key: String,
        /// Description of the expected value (e.g., "a non-negative integer")
        expected: &'static str,
    },

    /// A required attribute is missing
    #[error("{kind} task requires attribute {key:?}")]
    MissingAttribute {
        /// The task kind that requires the attribute
        kind: String,
        /// The missing key
        key: &'static str,
    },

    /// Attribute keys cannot be empty
    #[error("attribute keys cannot be empty")]
    EmptyKey,
}

/// Queue adapter errors
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue backend rejected a push
    #[error("failed to push task {task_id}: {reason}")]
    PushFailed {
        /// Identity of the task that could not be queued
        task_id: String,
        /// The reason the push failed
        reason: String,
    },

    /// The queue backend failed to pop
    #[error("failed to pop task: {0}")]
    PopFailed(String),

    /// A stored task could not be decoded
    #[error("corrupt queue entry {seq}: {reason}")]
    Corrupt {
        /// Sequence number of the corrupt entry
        seq: i64,
        /// The reason decoding failed
        reason: String,
    },
}

/// Storage adapter errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The storage backend failed to persist an object
    #[error("failed to save {key}: {reason}")]
    SaveFailed {
        /// Storage key of the object (e.g., "wikipedia_page.abc123")
        key: String,
        /// The reason the save failed
        reason: String,
    },

    /// Stored object could not be decoded
    #[error("corrupt object {key}: {reason}")]
    Corrupt {
        /// Storage key of the object
        key: String,
        /// The reason decoding failed
        reason: String,
    },
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Failed to start the runtime that drives the connection pool
    #[error("failed to start database runtime: {0}")]
    RuntimeFailed(String),
}
