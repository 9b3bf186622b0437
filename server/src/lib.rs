//! HTTP API for Folio.
//!
//! Serves the portfolio content document, admin mutation and persistence
//! endpoints, and the contact form. Admin routes require
//! `Authorization: Bearer <admin token>`.

mod contact;
mod content;
mod error;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::Router;
use folio_sync::ContentEngine;
use std::sync::Arc;

pub use contact::{is_valid_email, ContactLog, ContactRequest, ContactSubmission};
pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ContentEngine>,
    /// Bearer token for admin routes. `None` disables them.
    pub admin_token: Option<Arc<str>>,
    pub contacts: ContactLog,
}

impl AppState {
    pub fn new(engine: Arc<ContentEngine>, admin_token: Option<String>) -> Self {
        Self {
            engine,
            admin_token: admin_token.map(Arc::from),
            contacts: ContactLog::new(),
        }
    }
}

/// Loads the initial content and starts following the remote store.
/// Returns whether stored content was found or seeded.
///
/// Live sync runs for every identity; only writes need admin.
pub async fn start_engine(engine: &ContentEngine) -> bool {
    let loaded = engine.initialize().await;
    engine.start_live_sync();
    loaded
}

/// Extractor that rejects requests without the admin bearer token.
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Err(ApiError::Unauthorized(
                "Admin access is not configured".to_string(),
            ));
        };
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match presented {
            Some(token) if token == expected => Ok(RequireAdmin),
            _ => Err(ApiError::Unauthorized("Admin access required".to_string())),
        }
    }
}

/// Build the HTTP API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/content", get(content::get_content))
        .route("/api/content/status", get(content::get_status))
        .route("/api/content/sections/{section}", get(content::get_section))
        .route("/api/content/updates", post(content::apply_updates))
        .route("/api/content/save", post(content::save))
        .route("/api/content/reset", post(content::reset))
        .route("/api/content/export", get(content::export))
        .route("/api/content/import", post(content::import))
        .route("/api/contact", post(contact::submit))
        .route("/api/contact/submissions", get(contact::submissions))
        .with_state(state)
}
