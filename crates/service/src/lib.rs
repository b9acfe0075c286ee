//! Service layer for keendreams
//!
//! Centralizes business logic between the HTTP handlers and storage.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(clippy::ref_patterns, reason = "Ref patterns are clearer in some contexts")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::manual_let_else, reason = "if let is clearer")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::cognitive_complexity, reason = "Complex async flows are inherent")]
#![allow(clippy::min_ident_chars, reason = "Short error vars are idiomatic")]

pub mod cache;
pub mod clock;
mod dream_service;
mod error;
mod maintenance_service;
mod portfolio_service;
mod stats_service;

#[cfg(test)]
mod tests;

pub use cache::{CacheStatus, Cached, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dream_service::{DreamListing, DreamService, IngestOutcome, LatestDream};
pub use error::ServiceError;
pub use maintenance_service::{CleanupReport, DedupReport, MaintenanceService, RebuildReport};
pub use portfolio_service::{
    LocationsReport, PortfolioOverview, PortfolioService, Preferences, ProjectDetails, SearchHit,
    SearchResults,
};
pub use stats_service::{
    HealthReport, HealthStatus, QuotaStatus, SourceAnalysisReport, StatsService, StorageStats,
};
