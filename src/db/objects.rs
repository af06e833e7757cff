//! Result object rows.

use crate::error::DatabaseError;
use crate::{Error, Result};

use super::{Database, ObjectRow};

impl Database {
    /// Insert or replace an object under its storage key
    pub fn save_object(&self, key: &str, kind: &str, body: &str) -> Result<()> {
        self.block_on(async {
            let now = chrono::Utc::now().timestamp();
            sqlx::query(
                r#"
                INSERT INTO objects (key, kind, body, saved_at) VALUES (?, ?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                    kind = excluded.kind,
                    body = excluded.body,
                    saved_at = excluded.saved_at
                "#,
            )
            .bind(key)
            .bind(kind)
            .bind(body)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to save object: {}",
                    e
                )))
            })?;

            Ok::<_, Error>(())
        })
    }

    /// Get an object by storage key
    pub fn get_object(&self, key: &str) -> Result<Option<ObjectRow>> {
        self.block_on(async {
            sqlx::query_as::<_, ObjectRow>(
                "SELECT key, kind, body, saved_at FROM objects WHERE key = ?",
            )
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get object: {}",
                    e
                )))
            })
        })
    }

    /// All objects of a kind, ordered by key
    pub fn list_objects(&self, kind: &str) -> Result<Vec<ObjectRow>> {
        self.block_on(async {
            sqlx::query_as::<_, ObjectRow>(
                "SELECT key, kind, body, saved_at FROM objects WHERE kind = ? ORDER BY key",
            )
            .bind(kind)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to list objects: {}",
                    e
                )))
            })
        })
    }

    /// Distinct object kinds, sorted
    pub fn object_kinds(&self) -> Result<Vec<String>> {
        self.block_on(async {
            sqlx::query_scalar::<_, String>("SELECT DISTINCT kind FROM objects ORDER BY kind")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to list object kinds: {}",
                        e
                    )))
                })
        })
    }

    /// Number of stored objects
    pub fn count_objects(&self) -> Result<i64> {
        self.block_on(async {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM objects")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to count objects: {}",
                        e
                    )))
                })
        })
    }
}
