//! Mapping from gate errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inner_circle_gate::GateError;
use serde_json::json;

/// A gate failure on its way out as an HTTP response.
///
/// The gate classifies; this layer only picks a status code and renders the
/// human-readable message as JSON.
#[derive(Debug)]
pub struct ApiError(pub GateError);

impl ApiError {
    /// The status code this error renders with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GateError::PaymentNotFound { .. } => StatusCode::NOT_FOUND,
            GateError::IdentityCreationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GateError::LinkageFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GateError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            GateError::SignOutFailed { .. } | GateError::LookupFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            GateError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
