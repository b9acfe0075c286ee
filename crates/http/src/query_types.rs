//! Request/query types (Deserialize)

use keendreams_core::{DEFAULT_DREAM_PAGE_LIMIT, DEFAULT_SEARCH_LIMIT, MAX_QUERY_LIMIT};
use serde::Deserialize;

const fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

const fn default_page_limit() -> usize {
    DEFAULT_DREAM_PAGE_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub project: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

impl SearchQuery {
    /// Cap limit to prevent DoS via unbounded queries.
    pub fn capped_limit(&self) -> usize {
        self.limit.clamp(1, MAX_QUERY_LIMIT)
    }
}

#[derive(Debug, Deserialize)]
pub struct DreamsQuery {
    #[serde(default = "default_page_limit")]
    pub limit: usize,
    pub cursor: Option<String>,
}

impl DreamsQuery {
    pub fn capped_limit(&self) -> usize {
        self.limit.clamp(1, MAX_QUERY_LIMIT)
    }
}

/// Optional body of `POST /admin/update-stats`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatsRequest {
    pub source: Option<String>,
}
