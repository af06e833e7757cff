//! In-memory storage grouped by object kind.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::Storage;
use crate::error::Result;
use crate::item::ResultObject;

type Table = BTreeMap<String, Vec<ResultObject>>;

/// In-memory storage, `{kind: [objects]}`
///
/// Cloning yields another handle to the same table, so a caller can keep one
/// clone and hand the other to the spider.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    table: Arc<Mutex<Table>>,
}

impl MemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        // A panic while holding the lock cannot leave the table half-written
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Objects of one kind, in save order
    pub fn objects(&self, kind: &str) -> Vec<ResultObject> {
        self.table().get(kind).cloned().unwrap_or_default()
    }

    /// Kinds with at least one object, sorted
    pub fn kinds(&self) -> Vec<String> {
        self.table().keys().cloned().collect()
    }

    /// Total number of stored objects
    pub fn len(&self) -> usize {
        self.table().values().map(Vec::len).sum()
    }

    /// Whether nothing was stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the whole table
    pub fn snapshot(&self) -> BTreeMap<String, Vec<ResultObject>> {
        self.table().clone()
    }
}

impl Storage for MemoryStorage {
    fn save(&self, object: ResultObject) -> Result<()> {
        tracing::debug!(object = %object, "storing object in memory");
        self.table()
            .entry(object.kind.clone())
            .or_default()
            .push(object);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_by_kind() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.save(ResultObject::new("pet").with("name", "Cat")).unwrap();
        storage.save(ResultObject::new("pet").with("name", "Dog")).unwrap();
        storage.save(ResultObject::new("page").with("title", "X")).unwrap();

        assert_eq!(storage.len(), 3);
        assert_eq!(storage.kinds(), vec!["page", "pet"]);

        let names: Vec<_> = storage
            .objects("pet")
            .into_iter()
            .map(|o| o.get("name").cloned().unwrap())
            .collect();
        assert_eq!(names, vec!["Cat", "Dog"]);
        assert!(storage.objects("missing").is_empty());
    }

    #[test]
    fn test_clones_share_the_table() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        handle.save(ResultObject::new("pet")).unwrap();
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.snapshot()["pet"].len(), 1);
    }

    #[test]
    fn test_arc_storage_forwards() {
        let storage = Arc::new(MemoryStorage::new());
        Storage::save(&storage, ResultObject::new("pet")).unwrap();
        assert_eq!(Storage::name(&storage), "memory");
        assert_eq!(storage.len(), 1);
    }
}
