//! HTTP API server for keendreams.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(unreachable_pub, reason = "pub items are re-exported")]
#![allow(clippy::absolute_paths, reason = "Explicit paths for clarity")]
#![allow(unused_results, reason = "Some results are intentionally ignored")]
#![allow(missing_copy_implementations, reason = "Types may grow")]
#![allow(clippy::ref_patterns, reason = "Ref patterns are clearer")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::min_ident_chars, reason = "Short closure params are idiomatic")]
#![allow(clippy::shadow_reuse, reason = "Shadowing for Arc clones is idiomatic")]
#![allow(clippy::exhaustive_structs, reason = "HTTP types are stable")]
#![allow(clippy::single_call_fn, reason = "Helper functions improve readability")]

pub mod api_error;
mod auth;
mod handlers;
mod query_types;
mod response_types;
mod viewer;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use keendreams_core::DreamsConfig;
use keendreams_service::{
    Clock, DreamService, MaintenanceService, PortfolioService, StatsService,
};
use keendreams_storage::DreamRepository;
use tower_http::cors::{AllowOrigin, CorsLayer};

const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Spawns a background task that refreshes the stats cache on a fixed
/// interval, so `/stats` is served from a warm cache. A zero interval
/// disables the warmer.
///
/// Errors are logged but do not stop the loop; the next tick retries.
pub fn start_stats_warmer(stats: Arc<StatsService>, every: Duration) {
    if every.is_zero() {
        tracing::info!("Stats cache warmer disabled");
        return;
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match stats.refresh_stats().await {
                Ok(refreshed) => {
                    tracing::debug!(total = refreshed.dreams.total, "Stats cache warmed");
                },
                Err(e) if e.is_transient() => {
                    tracing::debug!(error = %e, "Stats cache warm deferred, backend busy");
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Stats cache warm failed");
                },
            }
        }
    });
}

/// Shared application state for all HTTP handlers.
///
/// Wrapped in `Arc` for thread-safe sharing across handlers.
pub struct AppState {
    /// Ingestion and direct reads
    pub dream_service: Arc<DreamService>,
    /// Stats, quota, health and source analysis
    pub stats_service: Arc<StatsService>,
    /// Cleanup, dedup and summary rebuild passes
    pub maintenance_service: Arc<MaintenanceService>,
    /// Search and portfolio views
    pub portfolio_service: Arc<PortfolioService>,
    pub clock: Arc<dyn Clock>,
    /// Shared secret required on authenticated routes
    pub api_secret: String,
    /// CORS origin; `None` allows any origin
    pub allowed_origin: Option<String>,
}

impl AppState {
    /// Wires every service over one repository and clock.
    #[must_use]
    pub fn new(
        repo: Arc<DreamRepository>,
        clock: Arc<dyn Clock>,
        config: &DreamsConfig,
        api_secret: String,
        allowed_origin: Option<String>,
    ) -> Self {
        let stats_service =
            Arc::new(StatsService::new(Arc::clone(&repo), Arc::clone(&clock), config));
        Self {
            dream_service: Arc::new(DreamService::new(
                Arc::clone(&repo),
                Arc::clone(&stats_service),
                Arc::clone(&clock),
            )),
            maintenance_service: Arc::new(MaintenanceService::new(
                Arc::clone(&repo),
                Arc::clone(&clock),
                config.cleanup_min_quality,
            )),
            portfolio_service: Arc::new(PortfolioService::new(repo, Arc::clone(&clock))),
            stats_service,
            clock,
            api_secret,
            allowed_origin,
        }
    }
}

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let origin = match allowed_origin.filter(|o| *o != "*").map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Invalid CORS origin, allowing any origin");
            AllowOrigin::any()
        },
        None => AllowOrigin::any(),
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(CORS_MAX_AGE)
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let authenticated = Router::new()
        .route("/dream", post(handlers::dreams::capture_dream))
        .route("/dream/latest/{*project_path}", get(handlers::dreams::latest_dream))
        .route("/dream/{id}", get(handlers::dreams::get_dream))
        .route("/dreams", get(handlers::dreams::list_dreams))
        .route("/projects", get(handlers::dreams::list_projects))
        .route("/summary/{*project_path}", get(handlers::dreams::summary))
        .route("/cleanup", post(handlers::maintenance::cleanup))
        .route("/deduplicate", post(handlers::maintenance::deduplicate))
        .route("/analyze-dreams", get(handlers::stats::analyze_dreams))
        .route("/admin/update-stats", post(handlers::stats::update_stats))
        .route("/admin/rebuild-projects", post(handlers::maintenance::rebuild_projects))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state), auth::require_api_key));

    let cors = cors_layer(state.allowed_origin.as_deref());
    Router::new()
        .route("/", get(viewer::serve_viewer))
        .route("/health", get(handlers::stats::health))
        .route("/stats", get(handlers::stats::get_stats))
        .route("/claude/search", get(handlers::portfolio::search))
        .route("/claude/portfolio", get(handlers::portfolio::portfolio))
        .route("/claude/project/{name}", get(handlers::portfolio::project))
        .route("/claude/preferences", get(handlers::portfolio::preferences))
        .route("/claude/locations", get(handlers::portfolio::locations))
        .merge(authenticated)
        .layer(cors)
        .with_state(state)
}
