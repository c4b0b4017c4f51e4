//! Route handlers.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};

use notif_receiver_core::IncomingRequest;

use crate::errors::ApiError;
use crate::AppState;

/// `POST /hook/{path}` — the sole webhook ingestion endpoint.
///
/// Every successful delivery responds `200 OK` with an empty body; the
/// notified/skipped counts are available only in the request's trace span,
/// not in the response, since the caller is a webhook source that doesn't
/// read response bodies.
#[tracing::instrument(skip(state, headers, body), fields(path = %path))]
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: bytes::Bytes,
) -> Result<StatusCode, ApiError> {
    let header_map: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let request = IncomingRequest::new(format!("/hook/{path}"), header_map, body);
    let reconcile_value = chrono::Utc::now().to_rfc3339();

    let outcome = notif_receiver_core::handle_request(
        &state.store,
        &request,
        &reconcile_value,
        &state.cancellation,
    )
    .await?;

    tracing::info!(notified = outcome.notified, skipped_by_filter = outcome.skipped_by_filter, "webhook processed");

    Ok(StatusCode::OK)
}

/// `GET /healthz` — process-level liveness; does not touch the store.
pub async fn healthz() -> &'static str {
    "ok"
}

/// `GET /readyz` — confirms the configured store is reachable.
pub async fn readyz(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    state
        .store
        .receivers_by_webhook_path("__readiness_probe__")
        .await
        .map_err(|e| notif_receiver_core::NotifierError::StoreError(e.to_string()))?;
    Ok("ok")
}
