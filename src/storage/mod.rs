//! Storage adapters
//!
//! Result objects emitted by runners are handed to a [`Storage`] sink. No
//! query interface is needed by the engine; the concrete adapters expose
//! their own read methods for callers and tests.
//!
//! - [`MemoryStorage`]: objects grouped by kind in memory
//! - [`SqliteStorage`]: `kind.id` keyed rows in an embedded SQLite file

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::error::Result;
use crate::item::ResultObject;

/// Sink for result objects
///
/// Storage handles are shared (the caller usually keeps a clone to read the
/// results back), so `save` takes `&self` and implementations use interior
/// mutability.
pub trait Storage: Send + Sync {
    /// Persist one result object
    fn save(&self, object: ResultObject) -> Result<()>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

impl<S: Storage + ?Sized> Storage for std::sync::Arc<S> {
    fn save(&self, object: ResultObject) -> Result<()> {
        (**self).save(object)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
