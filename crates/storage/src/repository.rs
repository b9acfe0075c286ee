//! Typed dream and project access over the raw KV store.
//!
//! Every full-namespace scan goes through [`DreamRepository::scan_dreams`],
//! which pages through the listing until exhaustion and skips records that
//! fail to decode.

use futures_util::stream::{BoxStream, StreamExt as _};
use keendreams_core::{DreamRecord, ProjectSummary};
use serde::de::DeserializeOwned;

use crate::backend::StorageBackend;
use crate::error::StorageError;
use crate::keys::{
    DREAM_KEY_PREFIX, DreamKey, Namespace, PROJECT_KEY_PREFIX, dream_key, parse_project_key,
    project_dreams_prefix, project_key,
};
use crate::traits::KvStore;

/// A dream together with the key it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDream {
    pub key: String,
    pub dream: DreamRecord,
}

/// One listing page of decoded dreams.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DreamPage {
    pub dreams: Vec<StoredDream>,
    pub cursor: Option<String>,
    pub list_complete: bool,
}

fn decode_or_skip<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Skipping corrupt record");
            None
        },
    }
}

#[derive(Clone, Debug)]
pub struct DreamRepository {
    store: StorageBackend,
    page_size: usize,
}

impl DreamRepository {
    #[must_use]
    pub fn new(store: StorageBackend, page_size: usize) -> Self {
        Self { store, page_size: page_size.max(1) }
    }

    #[must_use]
    pub const fn store(&self) -> &StorageBackend {
        &self.store
    }

    /// Every key in `namespace` starting with `prefix`, across all pages.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub async fn list_all_keys(
        &self,
        namespace: Namespace,
        prefix: &str,
    ) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.store.list(namespace, prefix, cursor.as_deref(), self.page_size).await?;
            keys.extend(page.keys);
            match page.cursor {
                Some(next) if !page.list_complete => cursor = Some(next),
                _ => break,
            }
        }
        Ok(keys)
    }

    /// # Errors
    /// Propagates backend failures.
    pub async fn dream_keys(&self) -> Result<Vec<String>, StorageError> {
        self.list_all_keys(Namespace::Dreams, DREAM_KEY_PREFIX).await
    }

    /// # Errors
    /// Propagates backend failures.
    pub async fn project_keys(&self) -> Result<Vec<String>, StorageError> {
        self.list_all_keys(Namespace::Projects, PROJECT_KEY_PREFIX).await
    }

    /// Dream keys that belong to exactly `project_path` (a longer path
    /// sharing the prefix is excluded).
    ///
    /// # Errors
    /// Propagates backend failures.
    pub async fn project_dream_keys(&self, project_path: &str) -> Result<Vec<String>, StorageError> {
        let keys =
            self.list_all_keys(Namespace::Dreams, &project_dreams_prefix(project_path)).await?;
        Ok(keys
            .into_iter()
            .filter(|k| DreamKey::parse(k).is_some_and(|dk| dk.project_path == project_path))
            .collect())
    }

    /// Decodes the dream under `key`, logging and skipping corrupt values.
    async fn load_dream_lenient(&self, key: &str) -> Result<Option<DreamRecord>, StorageError> {
        let raw = self.store.get(Namespace::Dreams, key).await?;
        Ok(raw.and_then(|raw| decode_or_skip(key, &raw)))
    }

    /// Streams every decodable dream in key order.
    #[must_use]
    pub fn scan_dreams(&self) -> BoxStream<'_, Result<StoredDream, StorageError>> {
        self.scan_prefix(DREAM_KEY_PREFIX.to_owned())
    }

    /// Streams the dreams of one project path.
    #[must_use]
    pub fn scan_project_dreams(
        &self,
        project_path: &str,
    ) -> BoxStream<'_, Result<StoredDream, StorageError>> {
        let project_path = project_path.to_owned();
        self.scan_prefix(project_dreams_prefix(&project_path))
            .filter(move |item| {
                let keep = match item {
                    Ok(stored) => stored.dream.project_path == project_path,
                    Err(_) => true,
                };
                futures_util::future::ready(keep)
            })
            .boxed()
    }

    fn scan_prefix(&self, prefix: String) -> BoxStream<'_, Result<StoredDream, StorageError>> {
        async_stream::stream! {
            let mut cursor: Option<String> = None;
            loop {
                let page = match self
                    .store
                    .list(Namespace::Dreams, &prefix, cursor.as_deref(), self.page_size)
                    .await
                {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        return;
                    },
                };
                for key in page.keys {
                    match self.load_dream_lenient(&key).await {
                        Ok(Some(dream)) => yield Ok(StoredDream { key, dream }),
                        Ok(None) => {},
                        Err(e) => {
                            yield Err(e);
                            return;
                        },
                    }
                }
                match page.cursor {
                    Some(next) if !page.list_complete => cursor = Some(next),
                    _ => break,
                }
            }
        }
        .boxed()
    }

    /// One page of decoded dreams in key order.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub async fn dreams_page(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<DreamPage, StorageError> {
        let page = self.store.list(Namespace::Dreams, DREAM_KEY_PREFIX, cursor, limit.max(1)).await?;
        let mut dreams = Vec::with_capacity(page.keys.len());
        for key in page.keys {
            if let Some(dream) = self.load_dream_lenient(&key).await? {
                dreams.push(StoredDream { key, dream });
            }
        }
        Ok(DreamPage { dreams, cursor: page.cursor, list_complete: page.list_complete })
    }

    /// Strict read: a corrupt value is an error rather than a miss.
    ///
    /// # Errors
    /// Returns [`StorageError::DataCorruption`] when the value does not decode.
    pub async fn get_dream_by_key(&self, key: &str) -> Result<Option<DreamRecord>, StorageError> {
        match self.store.get(Namespace::Dreams, key).await? {
            Some(raw) => DreamRecord::from_json_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::corrupt(key, e)),
            None => Ok(None),
        }
    }

    /// # Errors
    /// Propagates backend failures and corrupt values.
    pub async fn get_dream(
        &self,
        project_path: &str,
        id: &str,
    ) -> Result<Option<DreamRecord>, StorageError> {
        self.get_dream_by_key(&dream_key(project_path, id)).await
    }

    /// Looks a dream up by id alone by scanning dream keys for the exact id
    /// segment.
    ///
    /// # Errors
    /// Propagates backend failures and corrupt values.
    pub async fn find_dream_by_id(&self, id: &str) -> Result<Option<DreamRecord>, StorageError> {
        let keys = self.dream_keys().await?;
        let Some(key) = keys.iter().find(|k| DreamKey::parse(k).is_some_and(|dk| dk.id == id))
        else {
            return Ok(None);
        };
        self.get_dream_by_key(key).await
    }

    /// Existing dream of `project_path` carrying `commit_hash`, if any.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub async fn find_duplicate(
        &self,
        project_path: &str,
        commit_hash: &str,
    ) -> Result<Option<DreamRecord>, StorageError> {
        let mut stream = self.scan_project_dreams(project_path);
        while let Some(item) = stream.next().await {
            let stored = item?;
            if stored.dream.commit_hash() == Some(commit_hash) {
                return Ok(Some(stored.dream));
            }
        }
        Ok(None)
    }

    /// # Errors
    /// Propagates backend failures.
    pub async fn count_dreams(&self) -> Result<usize, StorageError> {
        Ok(self.dream_keys().await?.len())
    }

    /// # Errors
    /// Propagates backend failures.
    pub async fn count_project_dreams(&self, project_path: &str) -> Result<usize, StorageError> {
        Ok(self.project_dream_keys(project_path).await?.len())
    }

    /// Writes the dream under its key and returns the key.
    ///
    /// # Errors
    /// Propagates serialization and backend failures.
    pub async fn put_dream(&self, dream: &DreamRecord) -> Result<String, StorageError> {
        let key = dream_key(&dream.project_path, &dream.id);
        let value = serde_json::to_string(dream)?;
        self.store.put(Namespace::Dreams, &key, &value).await?;
        Ok(key)
    }

    /// # Errors
    /// Propagates backend failures.
    pub async fn delete_dream_key(&self, key: &str) -> Result<bool, StorageError> {
        self.store.delete(Namespace::Dreams, key).await
    }

    /// Project summary for `project_path`; a corrupt summary reads as absent.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub async fn get_project(
        &self,
        project_path: &str,
    ) -> Result<Option<ProjectSummary>, StorageError> {
        let key = project_key(project_path);
        let raw = self.store.get(Namespace::Projects, &key).await?;
        Ok(raw.and_then(|raw| decode_or_skip(&key, &raw)))
    }

    /// # Errors
    /// Propagates serialization and backend failures.
    pub async fn put_project(&self, summary: &ProjectSummary) -> Result<(), StorageError> {
        let value = serde_json::to_string(summary)?;
        self.store.put(Namespace::Projects, &project_key(&summary.path), &value).await
    }

    /// # Errors
    /// Propagates backend failures.
    pub async fn delete_project(&self, project_path: &str) -> Result<bool, StorageError> {
        self.store.delete(Namespace::Projects, &project_key(project_path)).await
    }

    /// Every decodable project summary, in key order. Summaries written
    /// without a `path` get it back from their key.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, StorageError> {
        let keys = self.project_keys().await?;
        let mut projects = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(raw) = self.store.get(Namespace::Projects, &key).await? else {
                continue;
            };
            let Some(mut summary) = decode_or_skip::<ProjectSummary>(&key, &raw) else {
                continue;
            };
            if summary.path.is_empty() {
                summary.path = parse_project_key(&key).unwrap_or_default().to_owned();
            }
            projects.push(summary);
        }
        Ok(projects)
    }

    /// # Errors
    /// Propagates backend failures.
    pub async fn get_cached(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.store.get(Namespace::Cache, key).await
    }

    /// # Errors
    /// Propagates backend failures.
    pub async fn put_cached(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.store.put(Namespace::Cache, key, value).await
    }
}
