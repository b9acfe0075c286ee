//! Shared constants for KeenDreams.
//!
//! Centralizes the numbers the ingestion, stats and maintenance paths agree on.

/// Logical storage quota of the reference deployment (1 GiB).
pub const DEFAULT_STORAGE_LIMIT_BYTES: u64 = 1024 * 1024 * 1024;

/// Writes are rejected once estimated usage reaches this fraction of the quota.
pub const QUOTA_WRITE_THRESHOLD: f64 = 0.95;

/// `/health` warns once estimated usage passes this fraction of the quota.
pub const HEALTH_STORAGE_WARNING_THRESHOLD: f64 = 0.90;

/// `/health` warns once the store holds more dreams than this.
pub const HEALTH_HIGH_DREAM_COUNT: usize = 1000;

/// Number of dreams read to estimate the average serialized dream size.
pub const STATS_SAMPLE_SIZE: usize = 5;

/// Average dream size assumed when the store is empty.
pub const DEFAULT_AVG_DREAM_SIZE: f64 = 5000.0;

/// Flat per-project overhead added to the size estimate.
pub const PROJECT_OVERHEAD_BYTES: u64 = 1000;

/// Assumed ingestion rate used to extrapolate remaining capacity.
pub const AVG_DREAMS_PER_DAY: f64 = 3.0;

/// Stats cache lifetime.
pub const DEFAULT_STATS_CACHE_TTL_SECS: u64 = 300;

/// Interval of the background stats cache warmer. Zero disables it.
pub const DEFAULT_STATS_WARM_INTERVAL_SECS: u64 = 240;

/// Well-known cache key holding the last computed stats.
pub const STATS_CACHE_KEY: &str = "stats_v2_cache";

/// Dreams scoring below this are removed by cleanup.
pub const DEFAULT_CLEANUP_MIN_QUALITY: u8 = 20;

/// Keys requested per list page from the KV store.
pub const DEFAULT_LIST_PAGE_SIZE: usize = 1000;

/// Maximum number of results for any query (DoS protection).
pub const MAX_QUERY_LIMIT: usize = 1000;

/// Default number of search results when `limit` is not specified.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Default page size of `GET /dreams`.
pub const DEFAULT_DREAM_PAGE_LIMIT: usize = 10;

/// Minimum accepted length of a dream id.
pub const MIN_DREAM_ID_LEN: usize = 5;

/// Minimum accepted length of a context summary.
pub const MIN_SUMMARY_LEN: usize = 20;

/// Dreams considered by the preferences view.
pub const PREFERENCES_DREAM_LIMIT: usize = 100;

/// Projects listed in the portfolio overview.
pub const PORTFOLIO_PROJECT_LIMIT: usize = 15;

/// A project counts as active if its last dream is younger than this.
pub const ACTIVE_PROJECT_DAYS: i64 = 7;

/// Maximum length of an extracted search snippet, in characters.
pub const SNIPPET_MAX_CHARS: usize = 150;
