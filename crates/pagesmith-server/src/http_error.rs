//! JSON error responses for the HTTP API.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use pagesmith_export::AssembleError;

use crate::deploy::DeployError;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

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

    fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_STATE" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<AssembleError> for HttpError {
    fn from(err: AssembleError) -> Self {
        match err {
            AssembleError::Emit { .. } | AssembleError::Component { .. } => {
                HttpError::new(err.to_string(), "VALIDATION_ERROR")
            }
            other => HttpError::with_details("Export failed", "EXPORT_ERROR", other.to_string()),
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::with_details("Invalid request body", "VALIDATION_ERROR", rejection.body_text())
    }
}

impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        HttpError::with_details("Invalid path parameter", "VALIDATION_ERROR", rejection.body_text())
    }
}

impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        HttpError::with_details("Invalid query string", "VALIDATION_ERROR", rejection.body_text())
    }
}

impl From<DeployError> for HttpError {
    fn from(err: DeployError) -> Self {
        match err {
            DeployError::NotFound(_) => HttpError::new(err.to_string(), "NOT_FOUND"),
            DeployError::NothingToRollback(_) | DeployError::InvalidTransition { .. } => {
                HttpError::new(err.to_string(), "INVALID_STATE")
            }
            DeployError::Closed => HttpError::new(err.to_string(), "INTERNAL_ERROR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn maps_codes_to_status() {
        assert_eq!(
            HttpError::new("x", "NOT_FOUND").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HttpError::new("x", "INVALID_STATE").into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            HttpError::new("x", "SOMETHING").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn converts_deploy_errors() {
        let err: HttpError = DeployError::NotFound(Uuid::nil()).into();
        assert_eq!(err.code, "NOT_FOUND");

        let err: HttpError = DeployError::NothingToRollback(Uuid::nil()).into();
        assert_eq!(err.code, "INVALID_STATE");
    }
}
