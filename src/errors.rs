use crate::{auth::TokenError, store::StoreError};
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str),
    UserAlreadyExists,
    UserNotFound,
    PostNotFound,
    PayloadTooLarge,
    ValidationError(String),
    InternalError(String),
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::Unauthorized("Token expired"),
            TokenError::InvalidToken => ApiError::Unauthorized("Could not validate user"),
            TokenError::TtlOutOfRange | TokenError::Encode(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => ApiError::UserAlreadyExists,
            StoreError::NotFound => ApiError::PostNotFound,
            StoreError::PayloadTooLarge { .. } => ApiError::PayloadTooLarge,
            StoreError::Hash(_) | StoreError::SessionTimeout(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

/// Convert our custom errors to HTTP responses
///
/// Body is always `{"error": "<message>"}`; internal details stay in the log.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => {
                debug!("Rejected request: {}", msg);
                let mut response = (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({
                      "error": msg
                    })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                return response;
            }
            ApiError::UserAlreadyExists => (StatusCode::BAD_REQUEST, "User already exists"),
            ApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            ApiError::PostNotFound => (StatusCode::NOT_FOUND, "Post not found"),
            ApiError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Text exceeds 1MB size limit.")
            }
            ApiError::ValidationError(msg) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                      "error": msg
                    })),
                )
                    .into_response();
            }
            ApiError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (
            status,
            Json(serde_json::json!({
              "error": message
            })),
        )
            .into_response()
    }
}
