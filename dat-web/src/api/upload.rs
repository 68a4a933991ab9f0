//! Table upload

use axum::{
    extract::{Multipart, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{Html, IntoResponse},
};
use tracing::debug;

use super::cookie::{session_cookie, session_token};
use super::form::{parse_bounded, DEFAULT_MIN_WORD_COUNT, SKIP_ROWS_RANGE};
use super::ui::pages;
use crate::{ApiError, ApiResult, AppState};

const NOT_A_CSV: &str = "Please upload a CSV file.";

/// POST /
///
/// Multipart fields: `file` (name must end in `.csv`), optional `skip_rows`.
/// Responds with the column selection page and binds the session cookie.
pub async fn upload_table(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut upload = None;
    let mut skip_rows = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let is_csv = field
                    .file_name()
                    .map(|name| name.to_ascii_lowercase().ends_with(".csv"))
                    .unwrap_or(false);
                if is_csv {
                    upload = Some(field.bytes().await?);
                }
            }
            Some("skip_rows") => skip_rows = Some(field.text().await?),
            _ => {}
        }
    }

    let bytes = upload.ok_or_else(|| ApiError::BadRequest(NOT_A_CSV.to_string()))?;
    let (min, max) = SKIP_ROWS_RANGE;
    let skip_count = parse_bounded("skip_rows", skip_rows.as_deref(), min, max)?.unwrap_or(0);

    let (token, preview) = state
        .sessions
        .begin_upload(session_token(&headers), &bytes, skip_count)
        .await?;
    debug!(session = %token, bytes = bytes.len(), "Upload accepted");

    let cookie = session_cookie(token, state.settings.cookie_secure);
    let page = pages::selection_page(&preview, &[], DEFAULT_MIN_WORD_COUNT);

    Ok(([(SET_COOKIE, cookie)], Html(page)))
}
