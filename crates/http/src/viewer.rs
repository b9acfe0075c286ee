//! Landing page served at `/`: what the service is and which endpoints it
//! exposes.

use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};

/// Embedded HTML for the landing page
pub const VIEWER_HTML: &str = include_str!("viewer.html");

/// Serve the landing page
pub async fn serve_viewer() -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/html; charset=utf-8")], Html(VIEWER_HTML))
        .into_response()
}
