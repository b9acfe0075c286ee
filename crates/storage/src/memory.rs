//! In-process KV backend over ordered maps.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::keys::Namespace;
use crate::traits::{KeyPage, KvStore};

type Entries = BTreeMap<(Namespace, String), String>;

/// Volatile store used by tests and `serve --in-memory`. Clones share data.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<Entries>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(namespace, key.to_owned())).cloned())
    }

    async fn put(&self, namespace: Namespace, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        entries.insert((namespace, key.to_owned()), value.to_owned());
        Ok(())
    }

    async fn delete(&self, namespace: Namespace, key: &str) -> Result<bool, StorageError> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(&(namespace, key.to_owned())).is_some())
    }

    async fn list(
        &self,
        namespace: Namespace,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<KeyPage, StorageError> {
        let entries = self.entries.read().await;
        let start = match cursor {
            Some(after) => Bound::Excluded((namespace, after.to_owned())),
            None => Bound::Included((namespace, prefix.to_owned())),
        };
        let mut keys: Vec<String> = entries
            .range((start, Bound::Unbounded))
            .map(|((ns, key), _)| (ns, key))
            .take_while(|(ns, _)| **ns == namespace)
            .skip_while(|(_, key)| !key.starts_with(prefix))
            .take_while(|(_, key)| key.starts_with(prefix))
            .take(limit.saturating_add(1))
            .map(|(_, key)| key.clone())
            .collect();

        let list_complete = keys.len() <= limit;
        keys.truncate(limit);
        let cursor = if list_complete { None } else { keys.last().cloned() };
        Ok(KeyPage { keys, cursor, list_complete })
    }
}
