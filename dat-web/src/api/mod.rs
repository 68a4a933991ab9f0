//! HTTP API handlers for dat-web

pub mod cookie;
pub mod download;
pub mod form;
pub mod health;
pub mod select;
pub mod ui;
pub mod upload;

use axum::{routing::get, routing::post, Router};

use crate::AppState;

pub use download::download_artifact;
pub use health::health_routes;
pub use select::select_columns;
pub use ui::ui_routes;
pub use upload::upload_table;

/// Build the upload → select → download routes
pub fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(ui::upload_page).post(upload_table))
        .route("/select", post(select_columns))
        .route("/download", get(download_artifact))
}
