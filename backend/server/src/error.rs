use axum::{
    http::{StatusCode, header::ALLOW},
    response::{IntoResponse, Response},
};
use redis::RedisError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("use POST")]
    MethodNotAllowed,

    #[error("must be json")]
    UnsupportedContentType,

    #[error("Malformed payload")]
    UnreadableBody,

    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Unit is required")]
    MissingUnit,

    #[error("Slug not found")]
    MissingSlug,

    #[error("Store error: {0}")]
    Store(#[from] RedisError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::UnsupportedContentType
            | AppError::UnreadableBody
            | AppError::MalformedPayload(_)
            | AppError::MissingUnit
            | AppError::MissingSlug => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::MethodNotAllowed => {
                (status, [(ALLOW, "POST")], self.to_string()).into_response()
            }
            AppError::Store(e) => {
                error!("Store failure: {e}");

                (status, "Internal error").into_response()
            }
            _ => (status, self.to_string()).into_response(),
        }
    }
}
