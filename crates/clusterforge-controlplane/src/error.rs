//! Control plane error types

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use clusterforge_cloud::CloudError;
use serde_json::json;
use thiserror::Error;

/// Control plane errors
///
/// Anything that reaches the HTTP facade as an error is fatal to that request
/// only. Expected outcomes (conflict, in-progress, missing) are not errors;
/// they are variants of the reconciler's outcome types.
#[derive(Error, Debug)]
pub enum ControlPlaneError {
    #[error("Invalid cluster name: {0}")]
    InvalidClusterName(String),

    #[error(transparent)]
    Cloud(#[from] CloudError),
}

pub type Result<T> = std::result::Result<T, ControlPlaneError>;

impl ControlPlaneError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ControlPlaneError::InvalidClusterName(_) => StatusCode::BAD_REQUEST,
            ControlPlaneError::Cloud(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ControlPlaneError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ControlPlaneError::InvalidClusterName("a_b".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ControlPlaneError::from(CloudError::ApiError("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_cloud_error_message_is_transparent() {
        let err = ControlPlaneError::from(CloudError::Timeout("throttled".into()));
        assert_eq!(err.to_string(), "Timeout: throttled");
    }
}
