//! Get-or-compute cache with a TTL, stored in the KV cache namespace.
//!
//! Entries are `{data, timestamp}` envelopes with a millisecond timestamp.
//! The cache is derived state: read failures and corrupt entries count as
//! misses, and write failures are only logged.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use keendreams_storage::DreamRepository;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::ServiceError;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope<T> {
    data: T,
    timestamp: i64,
}

/// Whether a value came from the cache, and how old it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit { age_secs: u64 },
    Miss,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub status: CacheStatus,
}

#[derive(Clone, Debug)]
pub struct TtlCache {
    repo: Arc<DreamRepository>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl TtlCache {
    #[must_use]
    pub fn new(repo: Arc<DreamRepository>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { repo, clock, ttl }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value and its age when younger than the TTL.
    pub async fn get_fresh<T: DeserializeOwned>(&self, key: &str) -> Option<(T, u64)> {
        let raw = match self.repo.get_cached(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache read failed, treating as miss");
                return None;
            },
        };
        let envelope: CacheEnvelope<T> = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(key, error = %e, "Corrupt cache entry, treating as miss");
                return None;
            },
        };
        let age_ms = self.clock.now().timestamp_millis().saturating_sub(envelope.timestamp);
        let age = Duration::from_millis(u64::try_from(age_ms).unwrap_or(0));
        (age < self.ttl).then_some((envelope.data, age.as_secs()))
    }

    fn envelope<T: Serialize>(&self, value: &T) -> Result<String, serde_json::Error> {
        serde_json::to_string(&CacheEnvelope {
            data: value,
            timestamp: self.clock.now().timestamp_millis(),
        })
    }

    /// Writes the value and waits for the write.
    pub async fn store<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ServiceError> {
        let raw = self.envelope(value)?;
        self.repo.put_cached(key, &raw).await?;
        Ok(())
    }

    /// Writes the value on a background task; the caller does not wait.
    pub fn store_in_background<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match self.envelope(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to serialize cache entry");
                return;
            },
        };
        let repo = Arc::clone(&self.repo);
        let key = key.to_owned();
        tokio::spawn(async move {
            if let Err(e) = repo.put_cached(&key, &raw).await {
                tracing::warn!(key = %key, error = %e, "Background cache write failed");
            }
        });
    }

    /// Serves a fresh cached value, or computes one and refreshes the cache
    /// in the background.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &str,
        compute: F,
    ) -> Result<Cached<T>, ServiceError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        if let Some((value, age_secs)) = self.get_fresh(key).await {
            return Ok(Cached { value, status: CacheStatus::Hit { age_secs } });
        }
        let value = compute().await?;
        self.store_in_background(key, &value);
        Ok(Cached { value, status: CacheStatus::Miss })
    }
}
