use crate::{
    auth::AuthError, services::thumbnail_store::ThumbnailError, services::video_store::StoreError,
};
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{fmt, io};

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 403 Forbidden
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, msg)
    }

    /// Log `cause` alongside the message that will be sent to the client.
    pub fn with_cause(self, cause: &dyn std::error::Error) -> Self {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), error = %cause, "{}", self.message);
        } else {
            tracing::warn!(status = self.status.as_u16(), error = %cause, "{}", self.message);
        }
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = match &err {
            AuthError::MissingHeader | AuthError::MalformedHeader => "Couldn't find JWT",
            AuthError::InvalidToken(_) => "Couldn't validate JWT",
        };
        AppError::new(StatusCode::UNAUTHORIZED, message).with_cause(&err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::VideoNotFound(_) => {
                AppError::new(StatusCode::NOT_FOUND, err.to_string()).with_cause(&err)
            }
            StoreError::Sqlx(_) => AppError::internal("Video store unavailable").with_cause(&err),
        }
    }
}

impl From<ThumbnailError> for AppError {
    fn from(err: ThumbnailError) -> Self {
        let app_err = match &err {
            ThumbnailError::UnsupportedMediaType(_) => AppError::bad_request(err.to_string()),
            ThumbnailError::TooLarge { .. } => {
                AppError::new(StatusCode::PAYLOAD_TOO_LARGE, err.to_string())
            }
            ThumbnailError::Read(io_err) => match multipart_cause(io_err) {
                Some(cause) if cause.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                    AppError::new(StatusCode::PAYLOAD_TOO_LARGE, BODY_TOO_LARGE)
                }
                _ => AppError::bad_request("Unable to read image data"),
            },
            ThumbnailError::Io(_) => AppError::internal("Unable to store thumbnail"),
        };
        app_err.with_cause(&err)
    }
}

const BODY_TOO_LARGE: &str = "Request body too large";

/// Multipart errors carry their own status: the body limit surfaces as 413,
/// everything else as a malformed form.
impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
            BODY_TOO_LARGE
        } else {
            "Unable to parse form file"
        };
        AppError::new(status, message).with_cause(&err)
    }
}

fn multipart_cause(err: &io::Error) -> Option<&MultipartError> {
    err.get_ref()?.downcast_ref::<MultipartError>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (AuthError::MissingHeader.into(), StatusCode::UNAUTHORIZED),
            (
                AuthError::InvalidToken("expired".into()).into(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                StoreError::VideoNotFound(Uuid::nil()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                StoreError::Sqlx(sqlx::Error::PoolClosed).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ThumbnailError::UnsupportedMediaType("text/plain".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ThumbnailError::TooLarge { limit: 1 }.into(),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                ThumbnailError::Io(io::Error::other("disk full")).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status, expected, "{}", err.message);
        }
    }

    #[test]
    fn plain_read_errors_are_bad_requests() {
        let err: AppError =
            ThumbnailError::Read(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Unable to read image data");
    }

    #[test]
    fn internal_details_stay_out_of_the_message() {
        let err: AppError = StoreError::Sqlx(sqlx::Error::PoolClosed).into();
        assert_eq!(err.message, "Video store unavailable");
    }
}
