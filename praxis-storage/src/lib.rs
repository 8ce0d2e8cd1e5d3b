//! Local key-value persistence for the praxis sync layer.
//!
//! The sync core only needs get/set-string semantics over a handful of
//! fixed keys: the serialized offline queue, the tombstone set, and the
//! entity collections owned by the application. There are deliberately no
//! transactional guarantees across keys.
//!
//! Two implementations are provided:
//! - [`MemoryStore`] for tests and ephemeral use
//! - [`FileStore`] backed by a single JSON object file on disk

mod error;
mod file;
mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// String-keyed persistence the offline queue writes through.
///
/// Implementations must be safe to share across threads; the queue holds
/// its store behind an `Arc`.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> StorageResult<()>;
}
