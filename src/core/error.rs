use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde_json::json;

use crate::storage::StoreError;

/// Failure of a single API call, rendered at the request boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn required(field: &str) -> Self {
        Self::Validation(format!("{field} is required"))
    }

    /// Column widths are counted in characters, not bytes.
    pub fn check_length(value: &str, field: &str, max: usize) -> Result<(), Self> {
        if value.chars().count() > max {
            Err(Self::Validation(format!(
                "{field} must be at most {max} characters"
            )))
        } else {
            Ok(())
        }
    }

    pub fn unauthenticated() -> Self {
        Self::Unauthenticated("Authentication required".to_string())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("Admin privileges required".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!("Request failed: {detail}");
        }
        let status = self.status_code();
        let body = Json(json!({
            "error": self.message(),
            "code": self.error_code(),
        }));
        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Self::NotFound(entity),
            StoreError::Conflict(message) => Self::Conflict(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// `Json` whose rejection renders as an `ApiError` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path ids that are not UUIDs can never match a row.
pub fn parse_id(raw: &str, entity: &'static str) -> ApiResult<uuid::Uuid> {
    uuid::Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(entity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::required("title").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthenticated().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden().status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("Ticket").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::required("title").message(), "title is required");
        assert_eq!(ApiError::NotFound("Ticket").message(), "Ticket not found");
        assert_eq!(
            ApiError::Internal("pool exhausted".into()).message(),
            "An internal error occurred"
        );
    }

    #[test]
    fn test_check_length_counts_characters() {
        assert!(ApiError::check_length("ééé", "name", 3).is_ok());
        let err = ApiError::check_length("abcd", "name", 3).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "name must be at most 3 characters");
    }

    #[test]
    fn test_parse_id() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "Ticket").expect("valid"), id);
        let err = parse_id("1001", "Ticket").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Ticket not found");
    }

    #[test]
    fn test_store_error_conversion() {
        let err: ApiError = StoreError::Conflict("email taken".into()).into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err: ApiError = StoreError::NotFound("User").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
