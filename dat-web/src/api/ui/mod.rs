//! UI routes - HTML pages and stylesheet
//!
//! - **Upload page** (`GET /`): file picker and initial skip count
//! - **Selection page**: returned by the upload and by preview refreshes
//! - **Results page**: returned by a score computation

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

use crate::AppState;

pub mod pages;

const APP_CSS: &str = include_str!("dat_score_app.css");

/// Build UI asset routes
pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/static/dat_score_app.css", get(serve_app_css))
}

/// GET /
pub async fn upload_page() -> Html<String> {
    Html(pages::upload_page())
}

/// GET /static/dat_score_app.css
pub async fn serve_app_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        APP_CSS,
    )
        .into_response()
}
