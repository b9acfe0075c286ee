//! Storage backend trait abstraction
//!
//! A minimal namespaced key-value contract: per-key get/put/delete plus
//! ordered, cursor-paginated prefix listing. There are no multi-key
//! transactions.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::keys::Namespace;

/// One page of a key listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPage {
    /// Keys in ascending order.
    pub keys: Vec<String>,
    /// Opaque position to pass back for the next page; `None` when complete.
    pub cursor: Option<String>,
    pub list_complete: bool,
}

/// Namespaced key-value store.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get the value stored under `key`.
    async fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or overwrite `key`.
    async fn put(&self, namespace: Namespace, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Returns `true` if it existed.
    async fn delete(&self, namespace: Namespace, key: &str) -> Result<bool, StorageError>;

    /// List up to `limit` keys starting with `prefix`, after `cursor`.
    async fn list(
        &self,
        namespace: Namespace,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<KeyPage, StorageError>;
}
