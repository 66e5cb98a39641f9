//! API error types and handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledgersplit::{ErrorKind, SplitError};
use serde::Serialize;
use tracing::error;

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from client.
    BadRequest(String),
    /// Upload larger than the configured limit.
    TooLarge(String),
    /// Internal server error.
    Internal(String),
    /// Error from the splitter.
    Split(SplitError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::TooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "too_large"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            ApiError::Split(e) => match e.kind() {
                ErrorKind::Schema => (StatusCode::BAD_REQUEST, "missing_columns"),
                ErrorKind::Config => (StatusCode::BAD_REQUEST, "bad_config"),
                ErrorKind::UnsupportedInput => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_input")
                }
                ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.parts();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let message = match self {
            ApiError::BadRequest(msg) | ApiError::TooLarge(msg) | ApiError::Internal(msg) => msg,
            ApiError::Split(e) => e.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<SplitError> for ApiError {
    fn from(err: SplitError) -> Self {
        ApiError::Split(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::TooLarge(msg) => write!(f, "Too large: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Split(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let missing = ApiError::Split(SplitError::MissingColumns {
            missing: vec!["VAT".into()],
        });
        assert_eq!(missing.parts(), (StatusCode::BAD_REQUEST, "missing_columns"));

        let unsupported = ApiError::Split(SplitError::UnsupportedFormat("xlsx".into()));
        assert_eq!(unsupported.parts().0, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let internal = ApiError::Split(SplitError::Internal("boom".into()));
        assert_eq!(internal.parts().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
