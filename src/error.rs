use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::{repo::StoreError, validation::FieldErrors};

/// Failures a handler can answer with. Client-facing variants render as a
/// field -> message map, the rest as `{"error": ..}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("malformed request body: {0}")]
    MalformedBody(#[from] JsonRejection),

    #[error("email already exists")]
    EmailTaken,

    #[error("user not found")]
    UserNotFound,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

fn field(name: &str, msg: &str) -> serde_json::Value {
    json!({ name: msg })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, json!(errors)),
            AppError::MalformedBody(rejection) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": rejection.body_text() }),
            ),
            AppError::EmailTaken => (
                StatusCode::BAD_REQUEST,
                field("email", "Email already exists"),
            ),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, field("email", "User Not Found")),
            AppError::IncorrectPassword => (
                StatusCode::BAD_REQUEST,
                field("password", "Incorrect Password"),
            ),
            AppError::Unauthorized(reason) => {
                (StatusCode::UNAUTHORIZED, json!({ "error": reason }))
            }
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken => AppError::EmailTaken,
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e).context("user store")),
        }
    }
}
