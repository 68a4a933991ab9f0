//! Artifact download

use axum::{
    extract::State,
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
};
use dat_common::{Error, DOWNLOAD_FILENAME};

use super::cookie::session_token;
use crate::{ApiResult, AppState};

/// GET /download
///
/// Sends the scored table as an attachment. Without an artifact the client is
/// sent back to the upload page.
pub async fn download_artifact(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let token = session_token(&headers).ok_or(Error::ArtifactNotFound)?;
    let bytes = state.sessions.fetch_artifact(token).await?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILENAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
