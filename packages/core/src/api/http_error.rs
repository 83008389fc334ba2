//! HTTP error handling for the REST API
//!
//! Provides consistent JSON error responses with a machine-readable
//! code, mapped to HTTP status codes.

use crate::services::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    /// Create a new HTTP error
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create a new HTTP error with details
    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "TODO_NOT_FOUND" | "ARTICLE_NOT_FOUND" | "RESOURCE_NOT_FOUND" => {
                StatusCode::NOT_FOUND
            }
            "INVALID_INPUT" | "INVALID_PARENT" | "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CIRCULAR_MOVE" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        use crate::hierarchy::HierarchyError;

        match err {
            ServiceError::TodoNotFound { id } => {
                HttpError::new(format!("Todo not found: {}", id), "TODO_NOT_FOUND")
            }
            ServiceError::ArticleNotFound { id } => {
                HttpError::new(format!("Article not found: {}", id), "ARTICLE_NOT_FOUND")
            }
            ServiceError::InvalidParent { parent_id } => HttpError::new(
                format!("Invalid parent todo: {}", parent_id),
                "INVALID_PARENT",
            ),
            ServiceError::InvalidInput(message) => HttpError::new(message, "INVALID_INPUT"),
            ServiceError::Hierarchy(HierarchyError::CircularMove { id, parent }) => {
                HttpError::new(
                    format!("Moving todo {} under {} would create a cycle", id, parent),
                    "CIRCULAR_MOVE",
                )
            }
            // Internal failures are logged with full detail; the client
            // only learns that something went wrong.
            ServiceError::Hierarchy(inner) => {
                tracing::error!("Internal hierarchy failure: {}", inner);
                HttpError::new("Internal hierarchy error", "INTERNAL_ERROR")
            }
            ServiceError::Store(inner) => {
                tracing::error!("Store failure behind API request: {}", inner);
                HttpError::new("Storage operation failed", "STORAGE_ERROR")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyError;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: HttpError = ServiceError::todo_not_found(9).into();
        assert_eq!(err.code, "TODO_NOT_FOUND");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_circular_move_maps_to_409() {
        let err: HttpError = ServiceError::from(HierarchyError::circular_move(1, 3)).into();
        assert_eq!(err.code, "CIRCULAR_MOVE");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_corruption_does_not_leak_detail() {
        let err: HttpError = ServiceError::from(HierarchyError::corrupted_topology(5)).into();
        assert_eq!(err.code, "INTERNAL_ERROR");
        assert!(!err.message.contains('5'));
    }
}
