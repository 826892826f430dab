use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("URL validation failed: {0}")]
    ValidationError(#[from] crate::validation::ValidationError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Not found")]
    NotFound,

    #[error("Invalid recipient email")]
    UnknownRecipient,

    #[error("Record {0} is already being processed")]
    AlreadyProcessing(i32),

    #[error("Record {0} was modified concurrently")]
    VersionConflict(i32),

    #[error("{error}")]
    Failure { error: String, details: String },

    #[error("Internal server error")]
    InternalError,
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            ApiError::ValidationError(ref err) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            ApiError::BadRequest(ref message) => (StatusCode::BAD_REQUEST, message.clone(), None),
            ApiError::Unauthorized(ref message) => {
                (StatusCode::UNAUTHORIZED, message.clone(), None)
            }
            ApiError::NotFound | ApiError::UnknownRecipient => {
                (StatusCode::NOT_FOUND, self.to_string(), None)
            }
            ApiError::AlreadyProcessing(_) | ApiError::VersionConflict(_) => {
                (StatusCode::CONFLICT, self.to_string(), None)
            }
            ApiError::Failure { error, details } => {
                error!(error = %error, details = %details, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, error, Some(details))
            }
            ApiError::DatabaseError(ref err) => {
                // Log the detailed error but don't expose it to the client
                error!(error = %err, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None),
        };

        let body = match details {
            Some(details) => Json(json!({ "error": error_message, "details": details })),
            None => Json(json!({ "error": error_message })),
        };

        (status, body).into_response()
    }
}
