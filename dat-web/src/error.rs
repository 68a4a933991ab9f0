//! Error types for dat-web

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use dat_common::Error;
use thiserror::Error;
use tracing::{error, warn};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Workflow error from dat-common
    #[error(transparent)]
    Workflow(#[from] Error),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Multipart body could not be read (status decided by axum, e.g. 413)
    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Workflow(Error::ArtifactNotFound) => {
                return Redirect::to("/").into_response();
            }
            ApiError::Workflow(
                err @ (Error::InputValidation(_)
                | Error::SessionExpired(_)
                | Error::ColumnResolution(_)),
            ) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Workflow(err) => {
                error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Multipart(err) => {
                warn!(error = %err, "Multipart upload rejected");
                (err.status(), err.body_text())
            }
        };

        (status, message).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn test_client_errors_are_bad_request() {
        let response =
            ApiError::from(Error::ColumnResolution("w9".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::from(Error::unknown_session()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_artifact_redirects_home() {
        let response = ApiError::from(Error::ArtifactNotFound).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/");
    }

    #[test]
    fn test_infrastructure_errors_are_hidden() {
        let response = ApiError::from(Error::Internal("disk on fire".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
