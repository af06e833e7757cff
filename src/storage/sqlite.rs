//! Key-value storage on SQLite.

use std::path::Path;
use std::sync::Arc;

use super::Storage;
use crate::config::PersistenceConfig;
use crate::db::{Database, ObjectRow};
use crate::error::{Result, StorageError};
use crate::item::ResultObject;

/// Result objects persisted as JSON under `"{kind}.{id}"`
///
/// Objects without an explicit id are keyed by a SHA-256 of their content, so
/// saving the same object twice keeps a single row.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db: Arc<Database>,
}

impl SqliteStorage {
    /// Use an open database
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Open (or create) a storage file
    ///
    /// With `synchronous` every save is flushed to disk before returning.
    pub fn open(path: &Path, synchronous: bool) -> Result<Self> {
        Ok(Self::new(Arc::new(Database::open(path, synchronous)?)))
    }

    /// Open the storage described by the persistence settings
    pub fn from_config(config: &PersistenceConfig) -> Result<Self> {
        Self::open(&config.database_path, config.synchronous)
    }

    /// Underlying database handle
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Object stored under `kind.id`
    pub fn get(&self, kind: &str, id: &str) -> Result<Option<ResultObject>> {
        self.db
            .get_object(&format!("{}.{}", kind, id))?
            .map(decode)
            .transpose()
    }

    /// All objects of a kind, ordered by key
    pub fn objects(&self, kind: &str) -> Result<Vec<ResultObject>> {
        self.db.list_objects(kind)?.into_iter().map(decode).collect()
    }

    /// Kinds with at least one object, sorted
    pub fn kinds(&self) -> Result<Vec<String>> {
        self.db.object_kinds()
    }

    /// Total number of stored objects
    pub fn len(&self) -> Result<usize> {
        let count = self.db.count_objects()?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Whether nothing was stored
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn decode(row: ObjectRow) -> Result<ResultObject> {
    serde_json::from_str(&row.body).map_err(|e| {
        StorageError::Corrupt {
            key: row.key,
            reason: e.to_string(),
        }
        .into()
    })
}

impl Storage for SqliteStorage {
    fn save(&self, object: ResultObject) -> Result<()> {
        let key = object.storage_key();
        let body = serde_json::to_string(&object)?;
        self.db
            .save_object(&key, &object.kind, &body)
            .map_err(|e| StorageError::SaveFailed {
                key: key.clone(),
                reason: e.to_string(),
            })?;
        tracing::debug!(key = %key, "stored object");
        Ok(())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_read_back() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::open(&dir.path().join("objects.db"), false).unwrap();

        let cat = ResultObject::new("pet").with_id("cat").with("name", "Cat");
        storage.save(cat.clone()).unwrap();

        assert_eq!(storage.get("pet", "cat").unwrap(), Some(cat));
        assert_eq!(storage.get("pet", "dog").unwrap(), None);
        assert_eq!(storage.len().unwrap(), 1);
    }

    #[test]
    fn test_missing_id_is_content_hash() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::open(&dir.path().join("objects.db"), false).unwrap();

        let page = ResultObject::new("page").with("title", "X");
        storage.save(page.clone()).unwrap();
        storage.save(page.clone()).unwrap();
        assert_eq!(storage.len().unwrap(), 1, "identical objects share a key");

        let stored = storage.get("page", &page.key_id()).unwrap().unwrap();
        assert_eq!(stored, page);

        storage.save(ResultObject::new("page").with("title", "Y")).unwrap();
        assert_eq!(storage.objects("page").unwrap().len(), 2);
        assert_eq!(storage.kinds().unwrap(), vec!["page"]);
    }

    #[test]
    fn test_objects_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("objects.db");
        {
            let storage = SqliteStorage::open(&path, true).unwrap();
            storage.save(ResultObject::new("pet").with_id("cat")).unwrap();
        }
        let storage = SqliteStorage::open(&path, true).unwrap();
        assert!(!storage.is_empty().unwrap());
        assert!(storage.get("pet", "cat").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_body_is_reported() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::open(&dir.path().join("objects.db"), false).unwrap();
        storage
            .database()
            .save_object("pet.broken", "pet", "{")
            .unwrap();

        let err = storage.get("pet", "broken").unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Corrupt { key, .. }) if key == "pet.broken"));
    }

    #[test]
    fn test_queue_and_storage_can_share_a_database() {
        use crate::queue::{SqliteQueue, TaskQueue};
        use crate::task::Task;

        let dir = tempdir().unwrap();
        let db = Arc::new(Database::open(&dir.path().join("shared.db"), false).unwrap());
        let mut queue = SqliteQueue::new(db.clone());
        let storage = SqliteStorage::new(db);

        queue.push(Task::download("http://x/").unwrap()).unwrap();
        storage.save(ResultObject::new("pet").with_id("cat")).unwrap();

        assert_eq!(queue.len().unwrap(), 1);
        assert_eq!(storage.len().unwrap(), 1);
    }
}
