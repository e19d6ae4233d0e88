use crate::repositories::RepositoryError;
use crate::services::feedback_service::FeedbackServiceError;
use crate::services::media_store::MediaError;
use crate::services::note_service::NoteServiceError;
use crate::services::user_service::UserServiceError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// Bad credentials or a bad verification token.
    #[error("{0}")]
    Authentication(String),

    /// Missing or rejected bearer token.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("File too large")]
    PayloadTooLarge,

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Authentication(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upload(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(msg)
            | AppError::Authentication(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => json!({ "message": msg }),
            AppError::PayloadTooLarge => json!({ "message": "File too large" }),
            AppError::Upload(detail) => {
                tracing::error!("Upload failed: {}", detail);
                json!({ "message": "Error uploading file", "error": detail })
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                json!({ "message": "Internal server error" })
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                json!({ "message": "Internal server error", "error": detail })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => AppError::Database(e),
            RepositoryError::NotFound => AppError::NotFound("Record not found".to_string()),
            RepositoryError::AlreadyExists => {
                AppError::Conflict("Record already exists".to_string())
            }
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        AppError::Upload(err.to_string())
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        let msg = err.to_string();
        match err {
            UserServiceError::MissingField(_)
            | UserServiceError::InvalidEmail
            | UserServiceError::WeakPassword => AppError::Validation(msg),
            UserServiceError::EmailTaken
            | UserServiceError::UsernameTaken
            | UserServiceError::AlreadyVerified => AppError::Conflict(msg),
            UserServiceError::UnknownLogin
            | UserServiceError::EmailNotVerified
            | UserServiceError::InvalidPassword
            | UserServiceError::InvalidToken
            | UserServiceError::TokenExpired => AppError::Authentication(msg),
            UserServiceError::UserNotFound => AppError::NotFound(msg),
            UserServiceError::Forbidden => AppError::Forbidden(msg),
            UserServiceError::HashingError(_) | UserServiceError::Token(_) => {
                AppError::Internal(msg)
            }
            UserServiceError::RepositoryError(e) => e.into(),
        }
    }
}

impl From<NoteServiceError> for AppError {
    fn from(err: NoteServiceError) -> Self {
        let msg = err.to_string();
        match err {
            NoteServiceError::MissingFile
            | NoteServiceError::NotPdf
            | NoteServiceError::MissingField(_)
            | NoteServiceError::InvalidPagination(_) => AppError::Validation(msg),
            NoteServiceError::NotFound => AppError::NotFound(msg),
            NoteServiceError::Media(e) => e.into(),
            NoteServiceError::Repository(e) => e.into(),
        }
    }
}

impl From<FeedbackServiceError> for AppError {
    fn from(err: FeedbackServiceError) -> Self {
        let msg = err.to_string();
        match err {
            FeedbackServiceError::MissingMessage => AppError::Validation(msg),
            FeedbackServiceError::NotFound => AppError::NotFound(msg),
            FeedbackServiceError::Repository(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_map_to_expected_status() {
        let cases = [
            (UserServiceError::EmailTaken, StatusCode::CONFLICT),
            (UserServiceError::AlreadyVerified, StatusCode::CONFLICT),
            (UserServiceError::EmailNotVerified, StatusCode::BAD_REQUEST),
            (UserServiceError::TokenExpired, StatusCode::BAD_REQUEST),
            (UserServiceError::Forbidden, StatusCode::FORBIDDEN),
            (UserServiceError::UserNotFound, StatusCode::NOT_FOUND),
            (UserServiceError::WeakPassword, StatusCode::BAD_REQUEST),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_note_errors_map_to_expected_status() {
        assert_eq!(
            AppError::from(NoteServiceError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(NoteServiceError::MissingFile).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(NoteServiceError::Media(MediaError::InvalidResponse(
                "no url".to_string()
            )))
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_json_rejection_becomes_validation_error() {
        use axum::{body::Body, extract::FromRequest, http::Request};

        let request = Request::builder()
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let rejection = axum::Json::<serde_json::Value>::from_request(request, &())
            .await
            .unwrap_err();

        let err = AppError::from(rejection);
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_error_body_is_json_message() {
        let response = AppError::NotFound("Note not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "Note not found");
        assert!(value.get("error").is_none());
    }
}
