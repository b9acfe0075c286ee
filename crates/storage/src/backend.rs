//! Unified storage backend with enum dispatch.

#[cfg(feature = "sqlite")]
use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::keys::Namespace;
use crate::memory::MemoryStore;
use crate::traits::{KeyPage, KvStore};

macro_rules! dispatch {
    ($self:expr, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite(s) => <crate::SqliteStore as KvStore>::$method(s, $($arg),*).await,
            StorageBackend::Memory(s) => <MemoryStore as KvStore>::$method(s, $($arg),*).await,
        }
    };
}

#[derive(Clone, Debug)]
pub enum StorageBackend {
    #[cfg(feature = "sqlite")]
    Sqlite(crate::SqliteStore),
    Memory(MemoryStore),
}

impl StorageBackend {
    /// # Errors
    /// Returns an error when the database cannot be opened or migrated.
    #[cfg(feature = "sqlite")]
    pub fn new_sqlite(db_path: &Path) -> Result<Self, StorageError> {
        Ok(Self::Sqlite(crate::SqliteStore::new(db_path)?))
    }

    #[must_use]
    pub fn new_memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => "sqlite",
            Self::Memory(_) => "memory",
        }
    }
}

#[async_trait]
impl KvStore for StorageBackend {
    async fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, StorageError> {
        dispatch!(self, get(namespace, key))
    }

    async fn put(&self, namespace: Namespace, key: &str, value: &str) -> Result<(), StorageError> {
        dispatch!(self, put(namespace, key, value))
    }

    async fn delete(&self, namespace: Namespace, key: &str) -> Result<bool, StorageError> {
        dispatch!(self, delete(namespace, key))
    }

    async fn list(
        &self,
        namespace: Namespace,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<KeyPage, StorageError> {
        dispatch!(self, list(namespace, prefix, cursor, limit))
    }
}
