use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::{debug, error};

use crate::errors::Error;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Gone { message: String, expired_at: i64 },
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Gone { .. } => StatusCode::GONE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn forbidden<S: Into<String>>(msg: S) -> Self {
        ApiError::Forbidden(msg.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expired_at: Option<i64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let error_kind = match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Gone { .. } => "gone",
            ApiError::Internal(_) => "internal_error",
        };

        let (message, expired_at) = match self {
            ApiError::Gone { message, expired_at } => (message, Some(expired_at)),
            ApiError::BadRequest(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => (msg, None),
        };

        (status, Json(ErrorBody { error: error_kind, message, expired_at })).into_response()
    }
}

/// Server-side failures keep their detail in the log only.
impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_recoverable() {
            debug!(error = %err, "Request rejected; caller may retry");
        }

        match err {
            Error::Validation { message, .. } => ApiError::BadRequest(message),
            Error::PasswordRequired | Error::InvalidPassword => {
                ApiError::BadRequest(err.to_string())
            }
            Error::NotFound { .. } => ApiError::NotFound(err.to_string()),
            Error::Expired { expired_at, .. } => {
                ApiError::Gone { message: err.to_string(), expired_at }
            }
            Error::SystemLayer { ref message } => {
                error!(reason = %message, "System layer failure");
                ApiError::Internal("System decryption failed".to_string())
            }
            Error::Store { ref source, ref context } => {
                error!(error = %source, context = %context, "Secret store failure");
                ApiError::Internal("Secret store unavailable".to_string())
            }
            Error::Config(_) | Error::Transport(_) | Error::Internal(_) => {
                error!(error = %err, "Internal failure while handling request");
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_gone_carries_expiry() {
        let (status, body) =
            body_json(ApiError::from(Error::expired("id", 1_700_000_000))).await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body["error"], "gone");
        assert_eq!(body["message"], "Secret has expired and has been deleted");
        assert_eq!(body["expired_at"], 1_700_000_000);
    }

    #[tokio::test]
    async fn test_password_errors_are_bad_requests() {
        let (status, body) = body_json(ApiError::from(Error::PasswordRequired)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Password required for encrypted secret");
        assert!(body.get("expired_at").is_none());

        let (status, _) = body_json(ApiError::from(Error::InvalidPassword)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err = Error::store(
            StoreError::backend_error("vault at 10.0.0.4 said no"),
            "Failed to read secret value",
        );
        let (status, body) = body_json(ApiError::from(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("10.0.0.4"));

        let (_, body) = body_json(ApiError::from(Error::system_layer("tag mismatch"))).await;
        assert_eq!(body["message"], "System decryption failed");
    }

    #[tokio::test]
    async fn test_validation_message_is_passed_through() {
        let err = Error::validation_field("expires_at must be in the future", "expires_at");
        let (status, body) = body_json(ApiError::from(err)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["message"], "expires_at must be in the future");
    }

    #[tokio::test]
    async fn test_not_found() {
        let (status, body) = body_json(ApiError::from(Error::not_found("abc"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "Secret not found or already accessed");
    }
}
