//! dat-web library - DAT score calculator web front end
//!
//! Upload a CSV table, pick the columns holding the words, score every row,
//! download the table with a `creativity_score` column appended.

pub mod api;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use dat_common::SessionStore;
use tower_http::trace::TraceLayer;

/// Transport-level settings
#[derive(Debug, Clone)]
pub struct WebSettings {
    /// Add `Secure` to the session cookie
    pub cookie_secure: bool,
    /// Request bodies above this size are rejected with 413
    pub max_upload_bytes: usize,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            cookie_secure: false,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Live workflow sessions
    pub sessions: SessionStore,
    pub settings: WebSettings,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(sessions: SessionStore, settings: WebSettings) -> Self {
        Self {
            sessions,
            settings,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.settings.max_upload_bytes;

    Router::new()
        .merge(api::workflow_routes())
        .merge(api::ui_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
