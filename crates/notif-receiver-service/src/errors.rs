//! Maps [`NotifierError`] onto HTTP responses.
//!
//! The body never repeats the underlying error's text verbatim, for any
//! status code — store, configuration, and request-validation errors can all
//! carry details (object names, namespaces, header contents) that are fine
//! to log but not to hand back to an arbitrary webhook caller. Only the
//! stable category name and a fixed, per-category message cross that
//! boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use notif_receiver_core::NotifierError;
use serde_json::json;

pub struct ApiError(pub NotifierError);

impl From<NotifierError> for ApiError {
    fn from(err: NotifierError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.0.is_operational_failure() {
            tracing::error!(category = self.0.category(), error = %self.0, "request failed");
        } else {
            tracing::info!(category = self.0.category(), error = %self.0, "request rejected");
        }

        let message = match &self.0 {
            NotifierError::NotFound => "no receiver registered for this path",
            NotifierError::NotReady => "receiver is suspended or not ready",
            NotifierError::InvalidRequest(_) => "the request could not be authenticated or validated",
            NotifierError::ConfigError(_) | NotifierError::ExpressionError(_) | NotifierError::StoreError(_) => {
                "internal error processing webhook request"
            }
        };

        let body = Json(json!({
            "error": message,
            "category": self.0.category(),
        }));

        (status, body).into_response()
    }
}
